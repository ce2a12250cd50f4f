//! Risk flags and advisories.
//!
//! Flags are independent boolean checks over the two profiles and the
//! simulated floor. They accumulate, none short-circuits another, and the
//! decision policy treats any of them as a hard gate. Advisories are
//! informational only and never change the flag count.

use serde::Serialize;
use std::fmt;

use super::config::{FlagThresholds, SimulationSettings};
use super::profile::{classify, TeamProfile};
use super::simulation::{is_back_to_back, variance_boost, SimulationRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum RiskFlag {
    EliteDefense { team: String, drtg: f64 },
    BothGoodDefense { away_drtg: f64, home_drtg: f64 },
    RoadGoodDefense { team: String, drtg: f64 },
    WeakOffense { team: String, ortg: f64 },
    BothMediocreOffense { away_ortg: f64, home_ortg: f64 },
    SlowPace { team: String, pace: f64 },
    BothBelowAveragePace { away_pace: f64, home_pace: f64 },
    PaceMismatch { difference: f64 },
    ExtremeVariance { team: String, std_dev: f64 },
    BothElevatedVariance { away_std_dev: f64, home_std_dev: f64 },
    FloorRisk { percentile_10: f64, line: f64 },
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EliteDefense { team, drtg } => {
                write!(f, "Elite defense: {} (DRtg {:.1})", team, drtg)
            }
            Self::BothGoodDefense { away_drtg, home_drtg } => write!(
                f,
                "Both teams good defense (DRtg {:.1} / {:.1})",
                away_drtg, home_drtg
            ),
            Self::RoadGoodDefense { team, drtg } => {
                write!(f, "Good road defense: {} (DRtg {:.1})", team, drtg)
            }
            Self::WeakOffense { team, ortg } => {
                write!(f, "Weak offense: {} (ORtg {:.1})", team, ortg)
            }
            Self::BothMediocreOffense { away_ortg, home_ortg } => write!(
                f,
                "Both teams mediocre offense (ORtg {:.1} / {:.1})",
                away_ortg, home_ortg
            ),
            Self::SlowPace { team, pace } => write!(f, "Slow pace: {} ({:.1})", team, pace),
            Self::BothBelowAveragePace { away_pace, home_pace } => write!(
                f,
                "Both teams below-average pace ({:.1} / {:.1})",
                away_pace, home_pace
            ),
            Self::PaceMismatch { difference } => {
                write!(f, "Pace mismatch: {:.1} possessions apart", difference)
            }
            Self::ExtremeVariance { team, std_dev } => {
                write!(f, "Extreme variance: {} (std {:.1})", team, std_dev)
            }
            Self::BothElevatedVariance {
                away_std_dev,
                home_std_dev,
            } => write!(
                f,
                "Both teams elevated variance (std {:.1} / {:.1})",
                away_std_dev, home_std_dev
            ),
            Self::FloorRisk {
                percentile_10,
                line,
            } => write!(
                f,
                "Floor risk: 10th percentile {:.1} below line {:.1}",
                percentile_10, line
            ),
        }
    }
}

/// Flags raised for one matchup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagReport {
    pub flags: Vec<RiskFlag>,
}

impl FlagReport {
    pub fn count(&self) -> usize {
        self.flags.len()
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.flags.iter().map(ToString::to_string).collect()
    }
}

/// Run every enabled check for `away @ home`
pub fn evaluate(
    away: &TeamProfile,
    home: &TeamProfile,
    percentile_10: f64,
    minimum_line: f64,
    thresholds: &FlagThresholds,
) -> FlagReport {
    // `thresholds` need not be the set the profiles were classified with
    let away_c = classify(away, thresholds);
    let home_c = classify(home, thresholds);
    let mut flags = Vec::new();

    for (p, c) in [(away, &away_c), (home, &home_c)] {
        if c.is_elite_defense {
            flags.push(RiskFlag::EliteDefense {
                team: p.team.clone(),
                drtg: p.drtg,
            });
        }
    }
    if away_c.is_good_defense && home_c.is_good_defense {
        flags.push(RiskFlag::BothGoodDefense {
            away_drtg: away.drtg,
            home_drtg: home.drtg,
        });
    }
    if let Some(road) = thresholds.road_good_defense {
        if away.drtg < road && !away_c.is_elite_defense {
            flags.push(RiskFlag::RoadGoodDefense {
                team: away.team.clone(),
                drtg: away.drtg,
            });
        }
    }

    for (p, c) in [(away, &away_c), (home, &home_c)] {
        if c.is_weak_offense {
            flags.push(RiskFlag::WeakOffense {
                team: p.team.clone(),
                ortg: p.ortg,
            });
        }
    }
    if away_c.is_mediocre_offense && home_c.is_mediocre_offense {
        flags.push(RiskFlag::BothMediocreOffense {
            away_ortg: away.ortg,
            home_ortg: home.ortg,
        });
    }

    for (p, c) in [(away, &away_c), (home, &home_c)] {
        if c.is_slow_pace {
            flags.push(RiskFlag::SlowPace {
                team: p.team.clone(),
                pace: p.pace,
            });
        }
    }
    if let Some(limit) = thresholds.both_below_average_pace {
        if away.pace < limit && home.pace < limit {
            flags.push(RiskFlag::BothBelowAveragePace {
                away_pace: away.pace,
                home_pace: home.pace,
            });
        }
    }
    let difference = (away.pace - home.pace).abs();
    if thresholds.pace_mismatch.is_some_and(|t| difference > t) {
        flags.push(RiskFlag::PaceMismatch { difference });
    }

    let basis = thresholds.variance_basis;
    for (p, c) in [(away, &away_c), (home, &home_c)] {
        if c.is_extreme_variance {
            flags.push(RiskFlag::ExtremeVariance {
                team: p.team.clone(),
                std_dev: p.variance(basis),
            });
        }
    }
    if thresholds.both_elevated_variance.is_some()
        && away_c.is_high_variance
        && home_c.is_high_variance
        && !away_c.is_extreme_variance
        && !home_c.is_extreme_variance
    {
        flags.push(RiskFlag::BothElevatedVariance {
            away_std_dev: away.variance(basis),
            home_std_dev: home.variance(basis),
        });
    }

    if thresholds.floor_risk && percentile_10 < minimum_line {
        flags.push(RiskFlag::FloorRisk {
            percentile_10,
            line: minimum_line,
        });
    }

    FlagReport { flags }
}

/// Informational risk notes that do not count as flags
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    BackToBack { team: String, rest_days: u32 },
    InjuryBoost { team: String, multiplier: f64 },
    BlowoutRisk { probability: f64 },
    LimitedData { team: String, games_played: usize },
    UnknownTeam { team: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackToBack { team, rest_days } => {
                write!(f, "{} on a back-to-back ({} days rest)", team, rest_days)
            }
            Self::InjuryBoost { team, multiplier } => {
                write!(f, "{} variance boosted {:.2}x for injuries", team, multiplier)
            }
            Self::BlowoutRisk { probability } => {
                write!(f, "Blowout risk {:.0}%", probability * 100.0)
            }
            Self::LimitedData { team, games_played } => {
                write!(f, "Limited data for {} ({} games)", team, games_played)
            }
            Self::UnknownTeam { team } => {
                write!(f, "No stats for {}, league-average profile used", team)
            }
        }
    }
}

pub fn advisories(
    away: &TeamProfile,
    home: &TeamProfile,
    request: &SimulationRequest,
    settings: &SimulationSettings,
) -> Vec<Advisory> {
    let mut notes = Vec::new();
    let sides = [
        (
            &request.away_team,
            away,
            request.away_rest_days,
            variance_boost(request.away_variance_boost, request.away_stars_out, settings),
        ),
        (
            &request.home_team,
            home,
            request.home_rest_days,
            variance_boost(request.home_variance_boost, request.home_stars_out, settings),
        ),
    ];

    for (name, profile, rest, boost) in sides {
        if profile.is_default {
            notes.push(Advisory::UnknownTeam { team: name.clone() });
        } else if !profile.variance_reliable {
            notes.push(Advisory::LimitedData {
                team: name.clone(),
                games_played: profile.games_played,
            });
        }
        if is_back_to_back(rest, settings) {
            notes.push(Advisory::BackToBack {
                team: name.clone(),
                rest_days: rest.unwrap_or_default(),
            });
        }
        if boost != 1.0 {
            notes.push(Advisory::InjuryBoost {
                team: name.clone(),
                multiplier: boost,
            });
        }
    }

    let blowout = request.blowout_probability(settings);
    if blowout > settings.blowout_advisory_probability {
        notes.push(Advisory::BlowoutRisk {
            probability: blowout,
        });
    }
    notes
}
