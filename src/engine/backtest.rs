//! Grading analyses against final scores.
//!
//! Win rates are bucketed by flag count (0, 1, 2, 3+) and by decision label,
//! counting only games at or above a probability threshold. Brier score and
//! log-loss are computed over every graded game.
use chrono::NaiveDate;
use serde::Serialize;

use super::decision::Decision;
use super::SimulationResult;
use crate::data::models::GameRecord;

/// Only games at or above this hit probability enter the buckets by default
pub const DEFAULT_MIN_PROBABILITY: f64 = 88.0;

const EPS: f64 = 1e-6;
const FLAG_BUCKETS: [&str; 4] = ["0 flags", "1 flag", "2 flags", "3+ flags"];

/// One analysis paired with what actually happened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedGame {
    pub away_team: String,
    pub home_team: String,
    pub minimum_line: f64,
    pub hit_probability: f64,
    pub flag_count: usize,
    pub decision: Decision,
    pub actual_total: f64,
}

impl GradedGame {
    pub fn new(result: &SimulationResult, actual_total: f64) -> Self {
        Self {
            away_team: result.away_team.clone(),
            home_team: result.home_team.clone(),
            minimum_line: result.minimum_line,
            hit_probability: result.hit_probability,
            flag_count: result.flag_count,
            decision: result.decision,
            actual_total,
        }
    }

    pub fn won(&self) -> bool {
        self.actual_total > self.minimum_line
    }
}

/// Final total of `away @ home` on `date`, if the game is in the table
pub fn actual_total(
    games: &[GameRecord],
    away: &str,
    home: &str,
    date: NaiveDate,
) -> Option<u32> {
    games
        .iter()
        .find(|g| g.date == date && g.visitor == away && g.home == home)
        .map(GameRecord::total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub label: String,
    pub bets: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent; `None` for an empty bucket
    pub win_rate: Option<f64>,
}

impl BucketStats {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            bets: 0,
            wins: 0,
            losses: 0,
            win_rate: None,
        }
    }

    fn record(&mut self, won: bool) {
        self.bets += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.win_rate = Some(self.wins as f64 / self.bets as f64 * 100.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub min_probability: f64,
    pub graded: usize,
    pub considered: usize,
    pub by_flags: Vec<BucketStats>,
    pub by_decision: Vec<BucketStats>,
    pub brier_score: Option<f64>,
    pub log_loss: Option<f64>,
}

impl BacktestReport {
    pub fn flag_bucket(&self, flags: usize) -> &BucketStats {
        &self.by_flags[flags.min(FLAG_BUCKETS.len() - 1)]
    }

    pub fn decision_bucket(&self, decision: Decision) -> Option<&BucketStats> {
        self.by_decision
            .iter()
            .find(|b| b.label == decision.as_str())
    }
}

pub fn grade(games: &[GradedGame], min_probability: f64) -> BacktestReport {
    let mut by_flags: Vec<BucketStats> = FLAG_BUCKETS.iter().map(|l| BucketStats::new(l)).collect();
    let mut by_decision: Vec<BucketStats> = Decision::ALL
        .iter()
        .map(|d| BucketStats::new(d.as_str()))
        .collect();

    let mut considered = 0;
    for game in games.iter().filter(|g| g.hit_probability >= min_probability) {
        considered += 1;
        let won = game.won();
        by_flags[game.flag_count.min(FLAG_BUCKETS.len() - 1)].record(won);
        if let Some(i) = Decision::ALL.iter().position(|d| *d == game.decision) {
            by_decision[i].record(won);
        }
    }

    let samples: Vec<(f64, f64)> = games
        .iter()
        .map(|g| (g.hit_probability / 100.0, if g.won() { 1.0 } else { 0.0 }))
        .collect();
    let n = samples.len() as f64;
    let (brier_score, log_loss) = if samples.is_empty() {
        (None, None)
    } else {
        let brier = samples.iter().map(|(p, y)| (p - y).powi(2)).sum::<f64>() / n;
        let ll = samples.iter().map(|(p, y)| logloss(*p, *y)).sum::<f64>() / n;
        (Some(brier), Some(ll))
    };

    BacktestReport {
        min_probability,
        graded: games.len(),
        considered,
        by_flags,
        by_decision,
        brier_score,
        log_loss,
    }
}

/// Cross-entropy of one outcome, with the probability kept off 0 and 1
fn logloss(p: f64, y: f64) -> f64 {
    let p = p.clamp(EPS, 1.0 - EPS);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}
