//! Matchup-specific expected scoring.
//!
//! Each side's expectation is its own offensive efficiency against the
//! opponent's defensive efficiency, scaled by a shared game tempo:
//!
//!   tempo    = home_pace·0.4 + away_pace·0.4 + league_pace·0.2
//!   expected = (ORtg · opp_DRtg / 100) · tempo / 100
//!
//! then shifted by fixed home-court constants.

use serde::Serialize;

use super::config::MatchupSettings;
use super::profile::TeamProfile;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchupExpectation {
    pub away_expected: f64,
    pub home_expected: f64,
    pub game_tempo: f64,
}

impl MatchupExpectation {
    pub fn total_expected(&self) -> f64 {
        self.away_expected + self.home_expected
    }
}

/// Expected points for both sides of `away @ home`
pub fn expected(
    away: &TeamProfile,
    home: &TeamProfile,
    league_avg_pace: f64,
    settings: &MatchupSettings,
) -> MatchupExpectation {
    let game_tempo = home.pace * settings.home_pace_weight
        + away.pace * settings.away_pace_weight
        + league_avg_pace * settings.league_pace_weight;

    let away_expected = efficiency_points(away.ortg, home.drtg, game_tempo) - settings.road_penalty;
    let home_expected =
        efficiency_points(home.ortg, away.drtg, game_tempo) + settings.home_court_bonus;

    MatchupExpectation {
        away_expected,
        home_expected,
        game_tempo,
    }
}

fn efficiency_points(ortg: f64, opp_drtg: f64, tempo: f64) -> f64 {
    (ortg * opp_drtg / 100.0) * tempo / 100.0
}
