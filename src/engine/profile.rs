//! Team profiles: season efficiency ratings joined with the variance observed
//! in each team's completed games.
//!
//! Profiles are built once per dataset and never mutated. A team missing from
//! the stats table resolves to a league-average profile instead of failing.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{info, warn};

use super::config::{EngineConfig, FlagThresholds, ProfileSettings, VarianceBasis};
use super::error::EngineError;
use super::stats::mean_and_std;
use crate::data::models::{GameRecord, TeamStat};

/// Name carried by the profile substituted for unknown teams
pub const LEAGUE_AVERAGE: &str = "League Average";

/// League-wide means over the stats table and game history
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeagueAverages {
    pub pace: f64,
    pub ortg: f64,
    pub drtg: f64,
    pub ppg: f64,
    pub game_total: f64,
}

impl LeagueAverages {
    pub fn compute(stats: &[TeamStat], games: &[GameRecord], settings: &ProfileSettings) -> Self {
        let avg = |f: fn(&TeamStat) -> f64, fallback: f64| {
            if stats.is_empty() {
                fallback
            } else {
                stats.iter().map(f).sum::<f64>() / stats.len() as f64
            }
        };
        let totals: Vec<f64> = games.iter().map(|g| g.total() as f64).collect();
        Self {
            pace: avg(|s| s.pace, settings.default_pace),
            ortg: avg(|s| s.ortg, settings.default_ortg),
            drtg: avg(|s| s.drtg, settings.default_drtg),
            ppg: avg(|s| s.ppg, settings.default_ppg),
            game_total: mean_and_std(&totals)
                .map(|(mean, _)| mean)
                .unwrap_or(settings.default_game_total),
        }
    }
}

/// Whether a team's games tend to land over or under typical totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TotalsTrend {
    OverTeam,
    UnderTeam,
    Neutral,
}

/// Reject a stats row whose ratings are not positive finite numbers
pub fn check_stat(stat: &TeamStat) -> Result<(), EngineError> {
    for (field, value) in [
        ("PPG", stat.ppg),
        ("ORtg", stat.ortg),
        ("DRtg", stat.drtg),
        ("Pace", stat.pace),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(EngineError::InvalidTeamStat {
                team: stat.team.clone(),
                field,
                value,
            });
        }
    }
    Ok(())
}

/// Combined-total history of the games a team played in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameTotalHistory {
    pub mean: f64,
    pub std_dev: f64,
    /// Share of games above the configured over mark, in percent
    pub over_pct: Option<f64>,
    /// Share of games below the configured under mark, in percent
    pub under_pct: Option<f64>,
    pub trend: TotalsTrend,
}

/// Boolean classifications derived once from the flag thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamClasses {
    pub is_elite_defense: bool,
    pub is_good_defense: bool,
    pub is_slow_pace: bool,
    pub is_weak_offense: bool,
    pub is_mediocre_offense: bool,
    pub is_high_variance: bool,
    pub is_extreme_variance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProfile {
    pub team: String,
    pub ortg: f64,
    pub drtg: f64,
    pub pace: f64,
    pub ppg: f64,
    /// Mean of the team's own points across its completed games
    pub scoring_mean: f64,
    /// Floored standard deviation of the team's own points
    pub scoring_std_dev: f64,
    pub min_score: Option<u32>,
    pub max_score: Option<u32>,
    pub games_played: usize,
    pub variance_reliable: bool,
    pub totals: GameTotalHistory,
    pub classes: TeamClasses,
    /// True for the league-average stand-in used for unknown teams
    pub is_default: bool,
}

impl TeamProfile {
    /// Build one team's profile from its stats row and the full game history
    pub fn build(stat: &TeamStat, games: &[GameRecord], config: &EngineConfig) -> Self {
        let settings = &config.profile;
        let mut scores = Vec::new();
        let mut totals = Vec::new();
        for game in games {
            if let Some(pts) = game.points_for(&stat.team) {
                scores.push(pts);
                totals.push(game.total() as f64);
            }
        }
        let points: Vec<f64> = scores.iter().map(|&p| p as f64).collect();

        let scoring_mean = mean_and_std(&points)
            .map(|(mean, _)| mean)
            .unwrap_or(stat.ppg);
        let raw_std = if points.len() >= 2 {
            mean_and_std(&points).map_or(settings.fallback_std_dev, |(_, std)| std)
        } else {
            settings.fallback_std_dev
        };

        let mut profile = Self {
            team: stat.team.clone(),
            ortg: stat.ortg,
            drtg: stat.drtg,
            pace: stat.pace,
            ppg: stat.ppg,
            scoring_mean,
            scoring_std_dev: raw_std.max(settings.min_std_dev),
            min_score: scores.iter().min().copied(),
            max_score: scores.iter().max().copied(),
            games_played: scores.len(),
            variance_reliable: scores.len() >= settings.min_reliable_games,
            totals: total_history(&totals, settings),
            classes: TeamClasses::default(),
            is_default: false,
        };
        profile.classes = classify(&profile, &config.flags);
        profile
    }

    /// League-average stand-in for a team missing from the stats table
    pub fn league_default(league: &LeagueAverages, config: &EngineConfig) -> Self {
        let settings = &config.profile;
        let mut profile = Self {
            team: LEAGUE_AVERAGE.to_string(),
            ortg: league.ortg,
            drtg: league.drtg,
            pace: league.pace,
            ppg: league.ppg,
            scoring_mean: league.ppg,
            scoring_std_dev: settings.fallback_std_dev.max(settings.min_std_dev),
            min_score: None,
            max_score: None,
            games_played: 0,
            variance_reliable: false,
            totals: GameTotalHistory {
                mean: league.game_total,
                std_dev: settings.fallback_total_std_dev,
                over_pct: None,
                under_pct: None,
                trend: TotalsTrend::Neutral,
            },
            classes: TeamClasses::default(),
            is_default: true,
        };
        profile.classes = classify(&profile, &config.flags);
        profile
    }

    /// Standard deviation the variance flags compare against
    pub fn variance(&self, basis: VarianceBasis) -> f64 {
        match basis {
            VarianceBasis::Scoring => self.scoring_std_dev,
            VarianceBasis::GameTotal => self.totals.std_dev,
        }
    }
}

fn total_history(totals: &[f64], settings: &ProfileSettings) -> GameTotalHistory {
    let Some((mean, std)) = mean_and_std(totals) else {
        return GameTotalHistory {
            mean: settings.default_game_total,
            std_dev: settings.fallback_total_std_dev,
            over_pct: None,
            under_pct: None,
            trend: TotalsTrend::Neutral,
        };
    };
    let n = totals.len() as f64;
    let over = totals.iter().filter(|&&t| t > settings.over_mark).count() as f64;
    let under = totals.iter().filter(|&&t| t < settings.under_mark).count() as f64;
    let trend = if mean > settings.over_team_average {
        TotalsTrend::OverTeam
    } else if mean < settings.under_team_average {
        TotalsTrend::UnderTeam
    } else {
        TotalsTrend::Neutral
    };
    GameTotalHistory {
        mean,
        std_dev: if totals.len() >= settings.min_reliable_games.max(2) {
            std
        } else {
            settings.fallback_total_std_dev
        },
        over_pct: Some(over / n * 100.0),
        under_pct: Some(under / n * 100.0),
        trend,
    }
}

pub(crate) fn below(value: f64, threshold: Option<f64>) -> bool {
    threshold.is_some_and(|t| value < t)
}

pub(crate) fn above(value: f64, threshold: Option<f64>) -> bool {
    threshold.is_some_and(|t| value > t)
}

pub(crate) fn classify(profile: &TeamProfile, thresholds: &FlagThresholds) -> TeamClasses {
    let variance = profile.variance(thresholds.variance_basis);
    let elevated = thresholds
        .both_elevated_variance
        .or(thresholds.extreme_variance);
    TeamClasses {
        is_elite_defense: below(profile.drtg, thresholds.elite_defense),
        is_good_defense: below(profile.drtg, thresholds.both_good_defense),
        is_slow_pace: below(profile.pace, thresholds.slow_pace),
        is_weak_offense: below(profile.ortg, thresholds.weak_offense),
        is_mediocre_offense: below(profile.ortg, thresholds.both_mediocre_offense),
        is_high_variance: above(variance, elevated),
        is_extreme_variance: above(variance, thresholds.extreme_variance),
    }
}

/// Read-only map of every team's profile plus the league-average fallback
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: HashMap<String, TeamProfile>,
    league: LeagueAverages,
    fallback: TeamProfile,
}

impl ProfileSet {
    pub fn build(stats: &[TeamStat], games: &[GameRecord], config: &EngineConfig) -> Self {
        let league = LeagueAverages::compute(stats, games, &config.profile);
        info!(
            "League averages: pace {:.1}, ORtg {:.1}, DRtg {:.1}, game total {:.1}",
            league.pace, league.ortg, league.drtg, league.game_total
        );

        let profiles: HashMap<String, TeamProfile> = stats
            .iter()
            .map(|stat| (stat.team.clone(), TeamProfile::build(stat, games, config)))
            .collect();

        let count = |f: fn(&TeamClasses) -> bool| profiles.values().filter(|p| f(&p.classes)).count();
        info!(
            "Built {} team profiles ({} elite defenses, {} slow pace, {} weak offenses, {} high variance)",
            profiles.len(),
            count(|c| c.is_elite_defense),
            count(|c| c.is_slow_pace),
            count(|c| c.is_weak_offense),
            count(|c| c.is_high_variance),
        );
        let thin = profiles.values().filter(|p| !p.variance_reliable).count();
        if thin > 0 {
            warn!(
                "{} teams have fewer than {} games; their variance is unreliable",
                thin, config.profile.min_reliable_games
            );
        }

        Self {
            profiles,
            fallback: TeamProfile::league_default(&league, config),
            league,
        }
    }

    pub fn league(&self) -> &LeagueAverages {
        &self.league
    }

    pub fn get(&self, team: &str) -> Option<&TeamProfile> {
        self.profiles.get(team)
    }

    /// The team's profile, or the league-average stand-in carrying the
    /// requested name when the team is unknown
    pub fn get_or_default(&self, team: &str) -> Cow<'_, TeamProfile> {
        match self.profiles.get(team) {
            Some(profile) => Cow::Borrowed(profile),
            None => {
                warn!("No stats for '{}', using league-average profile", team);
                Cow::Owned(TeamProfile {
                    team: team.to_string(),
                    ..self.fallback.clone()
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles sorted by team name
    pub fn iter_sorted(&self) -> Vec<&TeamProfile> {
        let mut all: Vec<&TeamProfile> = self.profiles.values().collect();
        all.sort_by(|a, b| a.team.cmp(&b.team));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn stat(team: &str, ortg: f64, drtg: f64, pace: f64) -> TeamStat {
        TeamStat {
            team: team.into(),
            ppg: 112.0,
            ortg,
            drtg,
            pace,
        }
    }

    fn game(day: u32, visitor: &str, vp: u32, home: &str, hp: u32) -> GameRecord {
        GameRecord {
            date: NaiveDate::from_ymd_opt(2025, 11, day).unwrap(),
            visitor: visitor.into(),
            visitor_pts: vp,
            home: home.into(),
            home_pts: hp,
        }
    }

    #[test]
    fn scores_come_from_both_sides() {
        let games = vec![
            game(1, "A", 100, "B", 110),
            game(3, "B", 120, "A", 130),
            game(5, "C", 90, "B", 95),
        ];
        let p = TeamProfile::build(&stat("A", 115.0, 112.0, 100.0), &games, &EngineConfig::default());
        assert_eq!(p.games_played, 2);
        assert_relative_eq!(p.scoring_mean, 115.0);
        assert_eq!(p.min_score, Some(100));
        assert_eq!(p.max_score, Some(130));
        // raw std 15 is above the floor
        assert_relative_eq!(p.scoring_std_dev, 15.0);
        assert_relative_eq!(p.totals.mean, 230.0);
        assert!(!p.variance_reliable);
    }

    #[test]
    fn std_dev_is_floored() {
        let games: Vec<GameRecord> = (1..=6).map(|d| game(d, "A", 110, "B", 111)).collect();
        let p = TeamProfile::build(&stat("A", 115.0, 112.0, 100.0), &games, &EngineConfig::default());
        assert_relative_eq!(p.scoring_std_dev, 8.0);
        assert!(p.variance_reliable);
    }

    #[test]
    fn single_game_uses_fallback_std() {
        let games = vec![game(1, "A", 100, "B", 110)];
        let p = TeamProfile::build(&stat("A", 115.0, 112.0, 100.0), &games, &EngineConfig::default());
        assert_relative_eq!(p.scoring_std_dev, 10.0);
        assert_relative_eq!(p.totals.std_dev, 15.0);
        assert_eq!(p.totals.over_pct, Some(0.0));
    }

    #[test]
    fn thin_history_uses_fallback_total_std() {
        // totals 190 and 250: raw std 30, but two games are not enough
        let games = vec![game(1, "A", 90, "B", 100), game(3, "B", 120, "A", 130)];
        let p = TeamProfile::build(&stat("A", 115.0, 112.0, 100.0), &games, &EngineConfig::default());
        assert!(!p.variance_reliable);
        assert_relative_eq!(p.totals.mean, 220.0);
        assert_relative_eq!(p.totals.std_dev, 15.0);
        assert!(!p.classes.is_extreme_variance);
        assert!(!p.classes.is_high_variance);
    }

    #[test]
    fn reliable_history_uses_observed_total_std() {
        let games: Vec<GameRecord> = (1..=6)
            .map(|d| if d % 2 == 0 { game(d, "A", 90, "B", 100) } else { game(d, "A", 120, "B", 130) })
            .collect();
        let p = TeamProfile::build(&stat("A", 115.0, 112.0, 100.0), &games, &EngineConfig::default());
        assert!(p.variance_reliable);
        assert_relative_eq!(p.totals.std_dev, 30.0);
        assert!(p.classes.is_extreme_variance);
    }

    #[test]
    fn non_finite_ratings_are_rejected() {
        assert!(check_stat(&stat("A", 115.0, 112.0, 100.0)).is_ok());
        assert!(matches!(
            check_stat(&stat("A", f64::NAN, 112.0, 100.0)),
            Err(EngineError::InvalidTeamStat { field: "ORtg", .. })
        ));
        assert!(matches!(
            check_stat(&stat("A", 115.0, f64::INFINITY, 100.0)),
            Err(EngineError::InvalidTeamStat { field: "DRtg", .. })
        ));
        assert!(matches!(
            check_stat(&stat("A", 115.0, 112.0, 0.0)),
            Err(EngineError::InvalidTeamStat { field: "Pace", .. })
        ));
    }

    #[test]
    fn no_games_falls_back_to_ppg() {
        let p = TeamProfile::build(&stat("A", 115.0, 112.0, 100.0), &[], &EngineConfig::default());
        assert_relative_eq!(p.scoring_mean, 112.0);
        assert_eq!(p.games_played, 0);
        assert_eq!(p.totals.over_pct, None);
        assert_eq!(p.totals.trend, TotalsTrend::Neutral);
    }

    #[test]
    fn classes_can_overlap() {
        let p = TeamProfile::build(&stat("A", 106.0, 105.0, 93.0), &[], &EngineConfig::default());
        assert!(p.classes.is_elite_defense);
        assert!(p.classes.is_good_defense);
        assert!(p.classes.is_slow_pace);
        assert!(p.classes.is_weak_offense);
        assert!(p.classes.is_mediocre_offense);
        assert!(!p.classes.is_high_variance);
    }

    #[test]
    fn trend_follows_average_total() {
        let over: Vec<GameRecord> = (1..=3).map(|d| game(d, "A", 120, "B", 120)).collect();
        let under: Vec<GameRecord> = (1..=3).map(|d| game(d, "A", 100, "B", 105)).collect();
        let cfg = EngineConfig::default();
        let s = stat("A", 115.0, 112.0, 100.0);
        assert_eq!(TeamProfile::build(&s, &over, &cfg).totals.trend, TotalsTrend::OverTeam);
        assert_eq!(TeamProfile::build(&s, &under, &cfg).totals.trend, TotalsTrend::UnderTeam);
    }

    #[test]
    fn unknown_team_gets_league_average() {
        let stats = vec![stat("A", 110.0, 110.0, 98.0), stat("B", 120.0, 116.0, 102.0)];
        let games = vec![game(1, "A", 100, "B", 120)];
        let set = ProfileSet::build(&stats, &games, &EngineConfig::default());
        assert_eq!(set.len(), 2);
        let league = *set.league();
        assert_relative_eq!(league.ortg, 115.0);
        assert_relative_eq!(league.pace, 100.0);
        assert_relative_eq!(league.game_total, 220.0);

        assert!(set.get("Seattle SuperSonics").is_none());
        let fallback = set.get_or_default("Seattle SuperSonics");
        assert!(fallback.is_default);
        assert_eq!(fallback.team, "Seattle SuperSonics");
        assert!(!fallback.variance_reliable);
        assert_relative_eq!(fallback.ortg, 115.0);
        assert_relative_eq!(fallback.drtg, 113.0);
    }

    #[test]
    fn empty_tables_use_configured_defaults() {
        let set = ProfileSet::build(&[], &[], &EngineConfig::default());
        assert!(set.is_empty());
        let p = set.get_or_default("Anyone");
        assert_relative_eq!(p.pace, 100.0);
        assert_relative_eq!(p.ortg, 114.0);
        assert_relative_eq!(p.totals.mean, 220.0);
    }
}
