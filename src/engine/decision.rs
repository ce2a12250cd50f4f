//! Decision policy: maps hit probability, flag count and floor safety to a
//! betting label.
//!
//! Precedence is floor safety, then 2+ flags, then a single flag, then the
//! clean tiers. A game is only ever `STRONG_YES` or `YES` when it is both
//! high-probability and flag-free.

use serde::Serialize;
use std::fmt;

use super::config::{DecisionTiers, FlaggedTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    No,
    Maybe,
    LeanYes,
    Yes,
    StrongYes,
}

impl Decision {
    pub const ALL: [Decision; 5] = [
        Decision::StrongYes,
        Decision::Yes,
        Decision::LeanYes,
        Decision::Maybe,
        Decision::No,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::StrongYes => "STRONG_YES",
            Decision::Yes => "YES",
            Decision::LeanYes => "LEAN_YES",
            Decision::Maybe => "MAYBE",
            Decision::No => "NO",
        }
    }

    /// `YES` or `STRONG_YES`
    pub fn is_bet(&self) -> bool {
        *self >= Decision::Yes
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a label was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    EliteClean,
    HighClean,
    MediumClean,
    Medium,
    Low,
    FlagCaution,
    FlagPenalty,
    LowWithFlag,
    MultiFlagHigh,
    MultiFlag,
    MultiFlagLow,
    FloorRisk,
    FloorUnsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub decision: Decision,
    pub confidence: Confidence,
}

impl Verdict {
    fn new(decision: Decision, confidence: Confidence) -> Self {
        Self {
            decision,
            confidence,
        }
    }
}

/// Classify one game. Total for any input: NaN probability lands on `NO`.
pub fn decide(
    hit_probability: f64,
    flag_count: usize,
    floor_safe: bool,
    tiers: &DecisionTiers,
) -> Verdict {
    let p = hit_probability;
    let reaches = |cutoff: Option<f64>| cutoff.is_some_and(|c| p >= c);

    if !floor_safe {
        return if reaches(tiers.floor_unsafe_maybe) {
            Verdict::new(Decision::Maybe, Confidence::FloorRisk)
        } else {
            Verdict::new(Decision::No, Confidence::FloorUnsafe)
        };
    }

    if flag_count >= 2 {
        return flagged(
            p,
            &tiers.multi_flag,
            [
                Confidence::MultiFlagHigh,
                Confidence::MultiFlag,
                Confidence::MultiFlagLow,
            ],
        );
    }
    if flag_count == 1 {
        return flagged(
            p,
            &tiers.single_flag,
            [
                Confidence::FlagCaution,
                Confidence::FlagPenalty,
                Confidence::LowWithFlag,
            ],
        );
    }

    if p >= tiers.strong_yes {
        Verdict::new(Decision::StrongYes, Confidence::EliteClean)
    } else if p >= tiers.yes {
        Verdict::new(Decision::Yes, Confidence::HighClean)
    } else if p >= tiers.lean_yes {
        Verdict::new(Decision::LeanYes, Confidence::MediumClean)
    } else if reaches(tiers.maybe) {
        Verdict::new(Decision::Maybe, Confidence::Medium)
    } else {
        Verdict::new(Decision::No, Confidence::Low)
    }
}

/// Flagged games top out at `MAYBE`; tags are `[caution, penalty, low]`
fn flagged(p: f64, tier: &FlaggedTier, tags: [Confidence; 3]) -> Verdict {
    let decision = if tier.maybe.is_some_and(|c| p >= c) {
        Decision::Maybe
    } else {
        Decision::No
    };
    let confidence = if p >= tier.caution {
        tags[0]
    } else if decision == Decision::Maybe {
        tags[1]
    } else {
        tags[2]
    };
    Verdict::new(decision, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::EngineConfig;

    fn d(p: f64, flags: usize, safe: bool) -> Verdict {
        decide(p, flags, safe, &DecisionTiers::default())
    }

    #[test]
    fn clean_tiers() {
        assert_eq!(d(97.0, 0, true), Verdict::new(Decision::StrongYes, Confidence::EliteClean));
        assert_eq!(d(95.0, 0, true).decision, Decision::StrongYes);
        assert_eq!(d(93.0, 0, true), Verdict::new(Decision::Yes, Confidence::HighClean));
        assert_eq!(d(89.0, 0, true), Verdict::new(Decision::LeanYes, Confidence::MediumClean));
        assert_eq!(d(82.0, 0, true), Verdict::new(Decision::Maybe, Confidence::Medium));
        assert_eq!(d(60.0, 0, true), Verdict::new(Decision::No, Confidence::Low));
    }

    #[test]
    fn floor_unsafe_never_bets() {
        for p in [0.0, 50.0, 80.0, 92.0, 99.9, 100.0] {
            for flags in 0..4 {
                assert!(!d(p, flags, false).decision.is_bet(), "p={p} flags={flags}");
            }
        }
        assert_eq!(d(99.0, 0, false), Verdict::new(Decision::Maybe, Confidence::FloorRisk));
        assert_eq!(d(70.0, 0, false), Verdict::new(Decision::No, Confidence::FloorUnsafe));
    }

    #[test]
    fn any_flag_blocks_strong_yes() {
        for p in [88.0, 95.0, 97.0, 100.0] {
            for flags in 1..6 {
                let v = d(p, flags, true);
                assert_ne!(v.decision, Decision::StrongYes);
                assert!(v.decision <= Decision::Maybe);
            }
        }
    }

    #[test]
    fn single_flag_needs_higher_cutoff_than_multi() {
        assert_eq!(d(96.0, 1, true), Verdict::new(Decision::Maybe, Confidence::FlagCaution));
        assert_eq!(d(86.0, 1, true), Verdict::new(Decision::No, Confidence::LowWithFlag));
        assert_eq!(d(87.5, 1, true), Verdict::new(Decision::Maybe, Confidence::FlagPenalty));
        assert_eq!(d(86.0, 2, true), Verdict::new(Decision::Maybe, Confidence::MultiFlag));
        assert_eq!(d(96.0, 3, true), Verdict::new(Decision::Maybe, Confidence::MultiFlagHigh));
        assert_eq!(d(70.0, 2, true), Verdict::new(Decision::No, Confidence::MultiFlagLow));
    }

    #[test]
    fn loosened_preset_rejects_every_flagged_game() {
        let tiers = EngineConfig::loosened().decision;
        assert_eq!(decide(99.0, 1, true, &tiers).decision, Decision::No);
        assert_eq!(decide(99.0, 3, true, &tiers).decision, Decision::No);
        assert_eq!(decide(99.0, 0, false, &tiers).decision, Decision::No);
        assert_eq!(decide(85.0, 0, true, &tiers).decision, Decision::No);
        assert_eq!(decide(93.0, 0, true, &tiers).decision, Decision::Yes);
    }

    #[test]
    fn nan_probability_is_no() {
        assert_eq!(d(f64::NAN, 0, true).decision, Decision::No);
    }

    #[test]
    fn labels_serialize_screaming_snake() {
        assert_eq!(serde_json::to_string(&Decision::StrongYes).unwrap(), "\"STRONG_YES\"");
        assert_eq!(Decision::LeanYes.to_string(), "LEAN_YES");
        assert_eq!(
            serde_json::to_string(&Confidence::MultiFlagHigh).unwrap(),
            "\"MULTI_FLAG_HIGH\""
        );
    }
}
