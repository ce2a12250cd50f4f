//! Stochastic game simulator.
//!
//! Every trial perturbs the matchup expectation with a shared pace draw,
//! back-to-back fatigue, Normal scoring noise, occasional bad nights,
//! spread-driven blowouts and rare slugfests, then clamps each score to a
//! realistic range. The random source is always supplied by the caller so a
//! seeded generator reproduces a run exactly.

use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use super::config::SimulationSettings;
use super::error::{ensure_finite, EngineError};
use super::stats::{mean_and_std, percentile_sorted};

/// One game to analyze, as requested by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub away_team: String,
    pub home_team: String,
    pub minimum_line: f64,
    #[serde(default)]
    pub away_rest_days: Option<u32>,
    #[serde(default)]
    pub home_rest_days: Option<u32>,
    /// Point spread; only its magnitude matters
    #[serde(default)]
    pub spread: Option<f64>,
    /// Star players ruled out, as reported by the injury source
    #[serde(default)]
    pub away_stars_out: u32,
    #[serde(default)]
    pub home_stars_out: u32,
    /// Explicit std-dev multiplier; overrides the stars-out boost
    #[serde(default)]
    pub away_variance_boost: Option<f64>,
    #[serde(default)]
    pub home_variance_boost: Option<f64>,
}

impl SimulationRequest {
    pub fn new(away_team: impl Into<String>, home_team: impl Into<String>, minimum_line: f64) -> Self {
        Self {
            away_team: away_team.into(),
            home_team: home_team.into(),
            minimum_line,
            away_rest_days: None,
            home_rest_days: None,
            spread: None,
            away_stars_out: 0,
            home_stars_out: 0,
            away_variance_boost: None,
            home_variance_boost: None,
        }
    }

    pub fn with_rest_days(mut self, away: Option<u32>, home: Option<u32>) -> Self {
        self.away_rest_days = away;
        self.home_rest_days = home;
        self
    }

    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = Some(spread);
        self
    }

    pub fn with_stars_out(mut self, away: u32, home: u32) -> Self {
        self.away_stars_out = away;
        self.home_stars_out = home;
        self
    }

    pub fn with_variance_boosts(mut self, away: f64, home: f64) -> Self {
        self.away_variance_boost = Some(away);
        self.home_variance_boost = Some(home);
        self
    }

    /// Fail fast on inputs that indicate a caller bug
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.minimum_line.is_finite() || self.minimum_line <= 0.0 {
            return Err(EngineError::InvalidLine(self.minimum_line));
        }
        if let Some(spread) = self.spread {
            ensure_finite("spread", spread)?;
        }
        for boost in [self.away_variance_boost, self.home_variance_boost]
            .into_iter()
            .flatten()
        {
            if !boost.is_finite() || boost <= 0.0 {
                return Err(EngineError::InvalidVarianceBoost(boost));
            }
        }
        Ok(())
    }

    /// Probability that starters sit for part of the game
    pub fn blowout_probability(&self, settings: &SimulationSettings) -> f64 {
        let spread = self.spread.unwrap_or(0.0).abs();
        (spread * settings.blowout_probability_per_point).min(settings.blowout_max_probability)
    }
}

/// Std-dev multiplier for one side: explicit boost, else the injury boost when a star is out
pub fn variance_boost(explicit: Option<f64>, stars_out: u32, settings: &SimulationSettings) -> f64 {
    match explicit {
        Some(boost) => boost,
        None if stars_out > 0 => settings.injury_variance_boost,
        None => 1.0,
    }
}

/// Whether `rest_days` puts a team on the second night of a back-to-back
pub fn is_back_to_back(rest_days: Option<u32>, settings: &SimulationSettings) -> bool {
    rest_days.is_some_and(|d| d <= settings.back_to_back_max_rest)
}

/// Resolved per-team inputs of one simulated game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideSetup {
    pub expected: f64,
    pub std_dev: f64,
    pub fatigue: f64,
}

impl SideSetup {
    pub fn new(
        expected: f64,
        std_dev: f64,
        rest_days: Option<u32>,
        boost: f64,
        settings: &SimulationSettings,
    ) -> Self {
        let fatigue = if is_back_to_back(rest_days, settings) {
            settings.back_to_back_multiplier
        } else {
            1.0
        };
        Self {
            expected,
            std_dev: std_dev * boost,
            fatigue,
        }
    }
}

/// Everything the trial loop needs for one game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameSetup {
    pub away: SideSetup,
    pub home: SideSetup,
    pub minimum_line: f64,
    pub blowout_probability: f64,
    pub trials: usize,
}

/// Summary statistics of the simulated game totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_5: f64,
    pub percentile_10: f64,
    pub percentile_25: f64,
    pub percentile_50: f64,
    pub percentile_75: f64,
    pub percentile_90: f64,
    pub percentile_95: f64,
}

impl DistributionSummary {
    /// Summarize a non-empty set of totals (sorted in place)
    fn from_totals(totals: &mut [f64]) -> Self {
        totals.sort_by(|a, b| a.total_cmp(b));
        let totals: &[f64] = totals;
        let (mean, std_dev) = mean_and_std(totals).unwrap_or((f64::NAN, f64::NAN));
        let pct = |q| percentile_sorted(totals, q);
        Self {
            mean,
            std_dev,
            min: totals.first().copied().unwrap_or(f64::NAN),
            max: totals.last().copied().unwrap_or(f64::NAN),
            percentile_5: pct(5.0),
            percentile_10: pct(10.0),
            percentile_25: pct(25.0),
            percentile_50: pct(50.0),
            percentile_75: pct(75.0),
            percentile_90: pct(90.0),
            percentile_95: pct(95.0),
        }
    }
}

/// Hit count and distribution of one simulated game
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub trials: usize,
    pub hits: usize,
    pub distribution: DistributionSummary,
}

impl SimulationOutcome {
    /// Share of trials whose total cleared the line, in percent
    pub fn hit_probability(&self) -> f64 {
        self.hits as f64 / self.trials as f64 * 100.0
    }
}

pub struct Simulator<'a> {
    settings: &'a SimulationSettings,
    standard: Normal,
}

impl<'a> Simulator<'a> {
    pub fn new(settings: &'a SimulationSettings) -> Result<Self, EngineError> {
        let standard =
            Normal::new(0.0, 1.0).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Ok(Self { settings, standard })
    }

    /// Simulate the game and summarize the totals
    pub fn run<R: Rng + ?Sized>(
        &self,
        game: &GameSetup,
        rng: &mut R,
    ) -> Result<SimulationOutcome, EngineError> {
        let (mut totals, hits) = self.sample_totals(game, rng)?;
        Ok(SimulationOutcome {
            trials: game.trials,
            hits,
            distribution: DistributionSummary::from_totals(&mut totals),
        })
    }

    /// Raw per-trial totals together with the hit count
    pub fn sample_totals<R: Rng + ?Sized>(
        &self,
        game: &GameSetup,
        rng: &mut R,
    ) -> Result<(Vec<f64>, usize), EngineError> {
        if game.trials == 0 {
            return Err(EngineError::ZeroTrials);
        }
        if !game.minimum_line.is_finite() || game.minimum_line <= 0.0 {
            return Err(EngineError::InvalidLine(game.minimum_line));
        }
        let mut totals = Vec::with_capacity(game.trials);
        let mut hits = 0usize;
        for _ in 0..game.trials {
            let total = self.trial(game, rng);
            if total > game.minimum_line {
                hits += 1;
            }
            totals.push(total);
        }
        Ok((totals, hits))
    }

    fn trial<R: Rng + ?Sized>(&self, game: &GameSetup, rng: &mut R) -> f64 {
        let s = self.settings;
        let pace = 1.0 + s.pace_std_dev * self.standard.sample(rng);

        let away_adj = game.away.expected * pace * game.away.fatigue;
        let home_adj = game.home.expected * pace * game.home.fatigue;

        let mut away = away_adj + game.away.std_dev * self.standard.sample(rng);
        let mut home = home_adj + game.home.std_dev * self.standard.sample(rng);

        if rng.gen::<f64>() < s.bad_night_probability {
            away = away_adj * rng.gen_range(s.bad_night_min_scale..s.bad_night_max_scale);
        }
        if rng.gen::<f64>() < s.bad_night_probability {
            home = home_adj * rng.gen_range(s.bad_night_min_scale..s.bad_night_max_scale);
        }

        if rng.gen::<f64>() < game.blowout_probability {
            away -= s.blowout_reduction;
            home -= s.blowout_reduction;
        }

        if rng.gen::<f64>() < s.slugfest_probability {
            let reduction = rng.gen_range(s.slugfest_min_reduction..s.slugfest_max_reduction);
            away -= reduction / 2.0;
            home -= reduction / 2.0;
        }

        away.clamp(s.score_floor, s.score_ceiling) + home.clamp(s.score_floor, s.score_ceiling)
    }
}
