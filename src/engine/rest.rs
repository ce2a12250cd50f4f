//! Rest days between games, derived from the completed-games table.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::models::GameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FatigueLevel {
    BackToBack,
    ShortRest,
    Rested,
}

impl FatigueLevel {
    /// Back-to-back at or below `back_to_back_max_rest` days, short rest one
    /// day above it. `None` means no prior game, which counts as fully rested.
    pub fn from_rest_days(rest_days: Option<u32>, back_to_back_max_rest: u32) -> Self {
        match rest_days {
            Some(d) if d <= back_to_back_max_rest => Self::BackToBack,
            Some(d) if d == back_to_back_max_rest.saturating_add(1) => Self::ShortRest,
            _ => Self::Rested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestInfo {
    pub team: String,
    pub last_game: Option<NaiveDate>,
    pub rest_days: Option<u32>,
    pub fatigue: FatigueLevel,
}

/// Most recent game `team` played strictly before `date`
pub fn last_game_before(team: &str, date: NaiveDate, games: &[GameRecord]) -> Option<NaiveDate> {
    games
        .iter()
        .filter(|g| g.date < date && g.involves(team))
        .map(|g| g.date)
        .max()
}

/// Days since the team's last game before `date` and the resulting fatigue
pub fn rest_info(
    team: &str,
    date: NaiveDate,
    games: &[GameRecord],
    back_to_back_max_rest: u32,
) -> RestInfo {
    let last_game = last_game_before(team, date, games);
    let rest_days = last_game.map(|last| (date - last).num_days() as u32);
    RestInfo {
        team: team.to_string(),
        last_game,
        rest_days,
        fatigue: FatigueLevel::from_rest_days(rest_days, back_to_back_max_rest),
    }
}
