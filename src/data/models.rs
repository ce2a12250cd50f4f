use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Season-level efficiency line for one team (one row of the team stats table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStat {
    /// Full team name, e.g. "Denver Nuggets". Unique key of the table.
    #[serde(rename = "Team")]
    pub team: String,
    /// Season points per game
    #[serde(rename = "PPG")]
    pub ppg: f64,
    /// Points scored per 100 possessions
    #[serde(rename = "ORtg")]
    pub ortg: f64,
    /// Points allowed per 100 possessions
    #[serde(rename = "DRtg")]
    pub drtg: f64,
    /// Possessions per 48 minutes
    #[serde(rename = "Pace")]
    pub pace: f64,
}

/// One completed game from the season history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Visitor")]
    pub visitor: String,
    #[serde(rename = "Visitor_PTS")]
    pub visitor_pts: u32,
    #[serde(rename = "Home")]
    pub home: String,
    #[serde(rename = "Home_PTS")]
    pub home_pts: u32,
}

impl GameRecord {
    /// Combined final score of both teams
    pub fn total(&self) -> u32 {
        self.visitor_pts + self.home_pts
    }

    /// Whether `team` played in this game on either side
    pub fn involves(&self, team: &str) -> bool {
        self.visitor == team || self.home == team
    }

    /// Points scored by `team` in this game, if it played
    pub fn points_for(&self, team: &str) -> Option<u32> {
        if self.visitor == team {
            Some(self.visitor_pts)
        } else if self.home == team {
            Some(self.home_pts)
        } else {
            None
        }
    }
}

/// A game on the upcoming slate, as listed by the caller's odds source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlateEntry {
    #[serde(rename = "Away")]
    pub away: String,
    #[serde(rename = "Home")]
    pub home: String,
    /// Minimum alternate total offered for this game
    #[serde(rename = "Line")]
    pub line: f64,
    #[serde(rename = "Date", default)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Spread", default)]
    pub spread: Option<f64>,
    /// Star players ruled out, per side
    #[serde(rename = "Away_Stars_Out", default)]
    pub away_stars_out: u32,
    #[serde(rename = "Home_Stars_Out", default)]
    pub home_stars_out: u32,
    /// American price offered for the line
    #[serde(rename = "Odds", default)]
    pub odds: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> GameRecord {
        GameRecord {
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            visitor: "Utah Jazz".into(),
            visitor_pts: 104,
            home: "Boston Celtics".into(),
            home_pts: 121,
        }
    }

    #[test]
    fn total_sums_both_sides() {
        assert_eq!(game().total(), 225);
    }

    #[test]
    fn points_for_picks_the_right_side() {
        let g = game();
        assert_eq!(g.points_for("Utah Jazz"), Some(104));
        assert_eq!(g.points_for("Boston Celtics"), Some(121));
        assert_eq!(g.points_for("Miami Heat"), None);
        assert!(g.involves("Utah Jazz"));
        assert!(!g.involves("Miami Heat"));
    }
}
