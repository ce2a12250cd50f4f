//! Engine configuration: every tunable constant of the model in one value
//! object, with named presets for the threshold sets the model has been run
//! with.
//!
//! Presets:
//! - **strict**: tight thresholds, per-team scoring variance, flagged games can
//!   still reach `MAYBE`.
//! - **loosened**: relaxed defense/pace/variance thresholds, any flag means `NO`.
//! - **smart_variance** (default): variance flags only for extreme single-team
//!   or jointly elevated game-total variance.

use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Complete configuration injected into [`TotalsEngine`](super::TotalsEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    pub profile: ProfileSettings,
    pub matchup: MatchupSettings,
    pub simulation: SimulationSettings,
    pub flags: FlagThresholds,
    pub decision: DecisionTiers,
}

/// Settings for building team profiles from the input tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Scoring std-dev never drops below this, whatever the sample says
    pub min_std_dev: f64,
    /// Scoring std-dev used when a team has fewer than two games
    pub fallback_std_dev: f64,
    /// Game-total std-dev used until a team has `min_reliable_games` games
    pub fallback_total_std_dev: f64,
    /// Games needed before a team's variance is considered reliable
    pub min_reliable_games: usize,
    /// Used for league averages when the team stats table is empty
    pub default_pace: f64,
    pub default_ortg: f64,
    pub default_drtg: f64,
    pub default_ppg: f64,
    /// Used for the league game-total average when no games are completed
    pub default_game_total: f64,
    /// A team's games count as "over" above this combined total
    pub over_mark: f64,
    /// A team's games count as "under" below this combined total
    pub under_mark: f64,
    /// Average combined total above which a team trends over
    pub over_team_average: f64,
    /// Average combined total below which a team trends under
    pub under_team_average: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            min_std_dev: 8.0,
            fallback_std_dev: 10.0,
            fallback_total_std_dev: 15.0,
            min_reliable_games: 5,
            default_pace: 100.0,
            default_ortg: 114.0,
            default_drtg: 114.0,
            default_ppg: 112.0,
            default_game_total: 220.0,
            over_mark: 220.0,
            under_mark: 210.0,
            over_team_average: 230.0,
            under_team_average: 215.0,
        }
    }
}

/// Weights and home-court constants for the expected-score formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchupSettings {
    pub home_pace_weight: f64,
    pub away_pace_weight: f64,
    pub league_pace_weight: f64,
    /// Points added to the home team's expectation
    pub home_court_bonus: f64,
    /// Points taken off the away team's expectation
    pub road_penalty: f64,
}

impl Default for MatchupSettings {
    fn default() -> Self {
        Self {
            home_pace_weight: 0.4,
            away_pace_weight: 0.4,
            league_pace_weight: 0.2,
            home_court_bonus: 1.5,
            road_penalty: 1.0,
        }
    }
}

/// Per-trial perturbations of the stochastic simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub trials: usize,
    /// Std-dev of the shared pace multiplier drawn around 1.0
    pub pace_std_dev: f64,
    /// Rest days at or below this count as a back-to-back
    pub back_to_back_max_rest: u32,
    pub back_to_back_multiplier: f64,
    pub bad_night_probability: f64,
    pub bad_night_min_scale: f64,
    pub bad_night_max_scale: f64,
    /// Blowout probability added per point of absolute spread
    pub blowout_probability_per_point: f64,
    pub blowout_max_probability: f64,
    /// Points removed from each team when starters sit in a blowout
    pub blowout_reduction: f64,
    /// Blowout probability above which an advisory is attached
    pub blowout_advisory_probability: f64,
    pub slugfest_probability: f64,
    /// Joint reduction range, split evenly between both teams
    pub slugfest_min_reduction: f64,
    pub slugfest_max_reduction: f64,
    pub score_floor: f64,
    pub score_ceiling: f64,
    /// Std-dev multiplier applied when a team is missing a star
    pub injury_variance_boost: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            trials: 10_000,
            pace_std_dev: 0.03,
            back_to_back_max_rest: 1,
            back_to_back_multiplier: 0.97,
            bad_night_probability: 0.05,
            bad_night_min_scale: 0.75,
            bad_night_max_scale: 0.88,
            blowout_probability_per_point: 0.02,
            blowout_max_probability: 0.25,
            blowout_reduction: 4.0,
            blowout_advisory_probability: 0.15,
            slugfest_probability: 0.02,
            slugfest_min_reduction: 8.0,
            slugfest_max_reduction: 15.0,
            score_floor: 75.0,
            score_ceiling: 155.0,
            injury_variance_boost: 1.3,
        }
    }
}

/// Which standard deviation the variance flags look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceBasis {
    /// The team's own points per game
    Scoring,
    /// Combined totals of the games the team played in
    GameTotal,
}

/// Risk flag thresholds. `None` disables the corresponding check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    /// Either team's DRtg below this
    pub elite_defense: Option<f64>,
    /// Both teams' DRtg below this
    pub both_good_defense: Option<f64>,
    /// Away DRtg below this (and not already elite)
    pub road_good_defense: Option<f64>,
    /// Either team's ORtg below this
    pub weak_offense: Option<f64>,
    /// Both teams' ORtg below this
    pub both_mediocre_offense: Option<f64>,
    /// Either team's pace below this
    pub slow_pace: Option<f64>,
    /// Both teams' pace below this
    pub both_below_average_pace: Option<f64>,
    /// Absolute pace difference above this
    pub pace_mismatch: Option<f64>,
    /// Either team's std-dev above this
    pub extreme_variance: Option<f64>,
    /// Both teams' std-dev above this (and neither extreme)
    pub both_elevated_variance: Option<f64>,
    pub variance_basis: VarianceBasis,
    /// Flag when the simulated 10th percentile misses the line
    pub floor_risk: bool,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            elite_defense: Some(108.0),
            both_good_defense: Some(110.0),
            road_good_defense: Some(109.0),
            weak_offense: Some(110.0),
            both_mediocre_offense: Some(111.0),
            slow_pace: Some(95.0),
            both_below_average_pace: Some(98.0),
            pace_mismatch: Some(6.0),
            extreme_variance: Some(22.0),
            both_elevated_variance: Some(18.0),
            variance_basis: VarianceBasis::GameTotal,
            floor_risk: true,
        }
    }
}

/// Probability cutoffs used once a game carries one or more flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedTier {
    /// At or above this the result is tagged as a high-probability caution
    pub caution: f64,
    /// Minimum probability for `MAYBE`; `None` means flagged games are always `NO`
    pub maybe: Option<f64>,
}

/// Probability tier boundaries (percent) of the decision policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTiers {
    pub strong_yes: f64,
    pub yes: f64,
    pub lean_yes: f64,
    /// Clean games below `lean_yes` but at or above this are `MAYBE`
    pub maybe: Option<f64>,
    pub single_flag: FlaggedTier,
    pub multi_flag: FlaggedTier,
    /// Floor-unsafe games at or above this are `MAYBE`, otherwise `NO`
    pub floor_unsafe_maybe: Option<f64>,
}

impl Default for DecisionTiers {
    fn default() -> Self {
        Self {
            strong_yes: 95.0,
            yes: 92.0,
            lean_yes: 88.0,
            maybe: Some(80.0),
            single_flag: FlaggedTier {
                caution: 95.0,
                maybe: Some(87.0),
            },
            multi_flag: FlaggedTier {
                caution: 95.0,
                maybe: Some(85.0),
            },
            floor_unsafe_maybe: Some(80.0),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::smart_variance()
    }
}

impl EngineConfig {
    pub const PRESETS: [&'static str; 3] = ["strict", "loosened", "smart_variance"];

    /// Look up a preset by name
    pub fn preset(name: &str) -> Result<Self, EngineError> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(Self::strict()),
            "loosened" => Ok(Self::loosened()),
            "smart_variance" | "smart" | "default" => Ok(Self::smart_variance()),
            _ => Err(EngineError::UnknownPreset(name.to_string())),
        }
    }

    pub fn smart_variance() -> Self {
        Self {
            name: "smart_variance".into(),
            profile: ProfileSettings::default(),
            matchup: MatchupSettings::default(),
            simulation: SimulationSettings::default(),
            flags: FlagThresholds::default(),
            decision: DecisionTiers::default(),
        }
    }

    pub fn strict() -> Self {
        Self {
            name: "strict".into(),
            flags: FlagThresholds {
                elite_defense: Some(108.0),
                both_good_defense: Some(114.0),
                road_good_defense: Some(113.0),
                weak_offense: Some(110.0),
                both_mediocre_offense: Some(112.0),
                slow_pace: Some(98.0),
                both_below_average_pace: Some(100.0),
                pace_mismatch: Some(3.0),
                extreme_variance: Some(12.0),
                both_elevated_variance: None,
                variance_basis: VarianceBasis::Scoring,
                floor_risk: true,
            },
            decision: DecisionTiers {
                single_flag: FlaggedTier {
                    caution: 95.0,
                    maybe: Some(85.0),
                },
                ..DecisionTiers::default()
            },
            ..Self::smart_variance()
        }
    }

    pub fn loosened() -> Self {
        Self {
            name: "loosened".into(),
            flags: FlagThresholds {
                elite_defense: Some(108.0),
                both_good_defense: Some(111.0),
                road_good_defense: Some(110.0),
                weak_offense: Some(108.0),
                both_mediocre_offense: Some(112.0),
                slow_pace: Some(96.0),
                both_below_average_pace: Some(98.0),
                pace_mismatch: Some(5.0),
                extreme_variance: Some(14.0),
                both_elevated_variance: None,
                variance_basis: VarianceBasis::Scoring,
                floor_risk: true,
            },
            decision: DecisionTiers {
                maybe: None,
                single_flag: FlaggedTier {
                    caution: 95.0,
                    maybe: None,
                },
                multi_flag: FlaggedTier {
                    caution: 95.0,
                    maybe: None,
                },
                floor_unsafe_maybe: None,
                ..DecisionTiers::default()
            },
            ..Self::smart_variance()
        }
    }

    /// Reject settings that would make the model meaningless
    pub fn validate(&self) -> Result<(), EngineError> {
        let bad = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        let p = &self.profile;
        finite_all(
            "profile",
            &[
                ("min_std_dev", p.min_std_dev),
                ("fallback_std_dev", p.fallback_std_dev),
                ("fallback_total_std_dev", p.fallback_total_std_dev),
                ("default_pace", p.default_pace),
                ("default_ortg", p.default_ortg),
                ("default_drtg", p.default_drtg),
                ("default_ppg", p.default_ppg),
                ("default_game_total", p.default_game_total),
                ("over_mark", p.over_mark),
                ("under_mark", p.under_mark),
                ("over_team_average", p.over_team_average),
                ("under_team_average", p.under_team_average),
            ],
        )?;
        if !(p.min_std_dev > 0.0) {
            return bad("profile.min_std_dev must be positive");
        }
        if !(p.fallback_std_dev > 0.0) || !(p.fallback_total_std_dev > 0.0) {
            return bad("profile fallback std-devs must be positive");
        }

        let m = &self.matchup;
        finite_all(
            "matchup",
            &[
                ("home_pace_weight", m.home_pace_weight),
                ("away_pace_weight", m.away_pace_weight),
                ("league_pace_weight", m.league_pace_weight),
                ("home_court_bonus", m.home_court_bonus),
                ("road_penalty", m.road_penalty),
            ],
        )?;
        let weights = m.home_pace_weight + m.away_pace_weight + m.league_pace_weight;
        if (weights - 1.0).abs() > 1e-6 {
            return bad("matchup pace weights must sum to 1.0");
        }

        let s = &self.simulation;
        if s.trials == 0 {
            return Err(EngineError::ZeroTrials);
        }
        finite_all(
            "simulation",
            &[
                ("pace_std_dev", s.pace_std_dev),
                ("back_to_back_multiplier", s.back_to_back_multiplier),
                ("bad_night_min_scale", s.bad_night_min_scale),
                ("bad_night_max_scale", s.bad_night_max_scale),
                ("blowout_probability_per_point", s.blowout_probability_per_point),
                ("blowout_reduction", s.blowout_reduction),
                ("slugfest_min_reduction", s.slugfest_min_reduction),
                ("slugfest_max_reduction", s.slugfest_max_reduction),
                ("score_floor", s.score_floor),
                ("score_ceiling", s.score_ceiling),
                ("injury_variance_boost", s.injury_variance_boost),
            ],
        )?;
        for (name, prob) in [
            ("bad_night_probability", s.bad_night_probability),
            ("blowout_max_probability", s.blowout_max_probability),
            ("blowout_advisory_probability", s.blowout_advisory_probability),
            ("slugfest_probability", s.slugfest_probability),
        ] {
            if !(0.0..=1.0).contains(&prob) {
                return Err(EngineError::InvalidConfig(format!(
                    "simulation.{name} must be between 0.0 and 1.0"
                )));
            }
        }
        if !(s.pace_std_dev > 0.0) {
            return bad("simulation.pace_std_dev must be positive");
        }
        if !(s.back_to_back_multiplier > 0.0) {
            return bad("simulation.back_to_back_multiplier must be positive");
        }
        if s.blowout_probability_per_point < 0.0 {
            return bad("simulation.blowout_probability_per_point must not be negative");
        }
        if s.blowout_reduction < 0.0 {
            return bad("simulation.blowout_reduction must not be negative");
        }
        if !(s.bad_night_min_scale > 0.0 && s.bad_night_min_scale < s.bad_night_max_scale) {
            return bad("simulation bad-night scale range must be positive and non-empty");
        }
        if !(s.slugfest_min_reduction >= 0.0 && s.slugfest_min_reduction < s.slugfest_max_reduction) {
            return bad("simulation slugfest reduction range must be non-negative and non-empty");
        }
        if !(s.score_floor < s.score_ceiling) {
            return bad("simulation.score_floor must be below score_ceiling");
        }
        if !(s.injury_variance_boost > 0.0) {
            return bad("simulation.injury_variance_boost must be positive");
        }

        let f = &self.flags;
        let thresholds = [
            ("elite_defense", f.elite_defense),
            ("both_good_defense", f.both_good_defense),
            ("road_good_defense", f.road_good_defense),
            ("weak_offense", f.weak_offense),
            ("both_mediocre_offense", f.both_mediocre_offense),
            ("slow_pace", f.slow_pace),
            ("both_below_average_pace", f.both_below_average_pace),
            ("pace_mismatch", f.pace_mismatch),
            ("extreme_variance", f.extreme_variance),
            ("both_elevated_variance", f.both_elevated_variance),
        ];
        for (name, value) in thresholds {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(EngineError::InvalidConfig(format!(
                        "flags.{name} must be a non-negative finite number, got {v}"
                    )));
                }
            }
        }

        let d = &self.decision;
        let mut cutoffs = vec![d.strong_yes, d.yes, d.lean_yes];
        cutoffs.extend(d.maybe);
        if cutoffs.windows(2).any(|w| w[0] < w[1]) {
            return bad("decision tiers must be descending");
        }
        let flagged = [
            d.single_flag.caution,
            d.multi_flag.caution,
            d.single_flag.maybe.unwrap_or(0.0),
            d.multi_flag.maybe.unwrap_or(0.0),
            d.floor_unsafe_maybe.unwrap_or(0.0),
        ];
        if cutoffs
            .iter()
            .chain(flagged.iter())
            .any(|c| !(0.0..=100.0).contains(c))
        {
            return bad("decision cutoffs must be percentages");
        }
        Ok(())
    }
}

fn finite_all(section: &str, values: &[(&str, f64)]) -> Result<(), EngineError> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(EngineError::InvalidConfig(format!(
            "{section}.{name} must be finite, got {v}"
        ))),
        None => Ok(()),
    }
}
