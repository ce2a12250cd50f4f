//! Parlay probability and pricing.
//!
//! `combine` treats legs as independent. Legs sharing a team are reported
//! by [`analyze`] with a correlation-discounted figure next to the
//! independent one, never in place of it.

use serde::Serialize;

use super::error::EngineError;
use super::SimulationResult;

/// Combined probability at or above this is `RECOMMENDED`
pub const RECOMMENDED_MIN: f64 = 75.0;
/// Combined probability at or above this is `ACCEPTABLE`
pub const ACCEPTABLE_MIN: f64 = 65.0;

const SHARED_TEAM_CORRELATION: f64 = 80.0;
const INDEPENDENT_CORRELATION: f64 = 20.0;

/// Product of independent leg probabilities (percent in, percent out).
/// An empty parlay is certain.
pub fn combine(probabilities: &[f64]) -> Result<f64, EngineError> {
    let mut product = 1.0;
    for &p in probabilities {
        if !p.is_finite() || !(0.0..=100.0).contains(&p) {
            return Err(EngineError::InvalidLegProbability(p));
        }
        product *= p / 100.0;
    }
    Ok(product * 100.0)
}

/// American odds to decimal odds (stake included). `None` for 0, which is not a price.
pub fn american_to_decimal(odds: i32) -> Option<f64> {
    match odds {
        0 => None,
        o if o > 0 => Some(1.0 + o as f64 / 100.0),
        o => Some(1.0 + 100.0 / (o as f64).abs()),
    }
}

/// Decimal odds back to American odds, rounded to the nearest point
pub fn decimal_to_american(decimal: f64) -> Option<i32> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return None;
    }
    let american = if decimal >= 2.0 {
        (decimal - 1.0) * 100.0
    } else {
        -100.0 / (decimal - 1.0)
    };
    Some(american.round() as i32)
}

/// Expected profit per unit staked
pub fn expected_value(probability_pct: f64, decimal_odds: f64) -> f64 {
    let p = probability_pct / 100.0;
    p * (decimal_odds - 1.0) - (1.0 - p)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParlayLeg {
    pub away_team: String,
    pub home_team: String,
    pub minimum_line: f64,
    pub hit_probability: f64,
    /// Offered price for the leg, if known
    pub american_odds: Option<i32>,
}

impl ParlayLeg {
    pub fn from_result(result: &SimulationResult, american_odds: Option<i32>) -> Self {
        Self {
            away_team: result.away_team.clone(),
            home_team: result.home_team.clone(),
            minimum_line: result.minimum_line,
            hit_probability: result.hit_probability,
            american_odds,
        }
    }

    fn label(&self) -> String {
        format!("{} @ {} o{:.1}", self.away_team, self.home_team, self.minimum_line)
    }

    fn shares_team_with(&self, other: &ParlayLeg) -> Option<String> {
        [&self.away_team, &self.home_team]
            .into_iter()
            .find(|t| **t == other.away_team || **t == other.home_team)
            .cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Recommended,
    Acceptable,
    NotRecommended,
}

impl Recommendation {
    pub fn for_probability(combined: f64) -> Self {
        if combined >= RECOMMENDED_MIN {
            Self::Recommended
        } else if combined >= ACCEPTABLE_MIN {
            Self::Acceptable
        } else {
            Self::NotRecommended
        }
    }
}

/// Two legs that involve the same team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedTeam {
    pub first: usize,
    pub second: usize,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParlayAnalysis {
    pub legs: Vec<String>,
    pub combined_probability: f64,
    /// Independent probability discounted by the average pairwise correlation
    pub correlation_adjusted_probability: f64,
    pub weakest_leg: Option<String>,
    pub weakest_probability: Option<f64>,
    pub recommendation: Recommendation,
    pub shared_teams: Vec<SharedTeam>,
    pub decimal_odds: Option<f64>,
    pub american_odds: Option<i32>,
    pub expected_value: Option<f64>,
}

/// Pairwise correlation score in 0..=100
fn correlation(a: &ParlayLeg, b: &ParlayLeg) -> f64 {
    if a.shares_team_with(b).is_some() {
        SHARED_TEAM_CORRELATION
    } else {
        INDEPENDENT_CORRELATION
    }
}

pub fn analyze(legs: &[ParlayLeg]) -> Result<ParlayAnalysis, EngineError> {
    let probabilities: Vec<f64> = legs.iter().map(|l| l.hit_probability).collect();
    let combined = combine(&probabilities)?;

    let mut shared_teams = Vec::new();
    let mut correlations = Vec::new();
    for (i, a) in legs.iter().enumerate() {
        for (j, b) in legs.iter().enumerate().skip(i + 1) {
            if let Some(team) = a.shares_team_with(b) {
                shared_teams.push(SharedTeam {
                    first: i,
                    second: j,
                    team,
                });
            }
            correlations.push(correlation(a, b));
        }
    }
    let correlation_adjusted_probability = if correlations.is_empty() {
        combined
    } else {
        let avg = correlations.iter().sum::<f64>() / correlations.len() as f64;
        combined * (1.0 - avg / 200.0)
    };

    let weakest = legs
        .iter()
        .min_by(|a, b| a.hit_probability.total_cmp(&b.hit_probability));

    // Price only when every leg is priced
    let decimal_odds = if legs.is_empty() {
        None
    } else {
        legs.iter()
            .map(|l| l.american_odds.and_then(american_to_decimal))
            .try_fold(1.0, |acc, d| d.map(|d| acc * d))
    };

    Ok(ParlayAnalysis {
        legs: legs.iter().map(ParlayLeg::label).collect(),
        combined_probability: combined,
        correlation_adjusted_probability,
        weakest_leg: weakest.map(ParlayLeg::label),
        weakest_probability: weakest.map(|l| l.hit_probability),
        recommendation: Recommendation::for_probability(combined),
        shared_teams,
        decimal_odds,
        american_odds: decimal_odds.and_then(decimal_to_american),
        expected_value: decimal_odds.map(|d| expected_value(combined, d)),
    })
}

/// Every `size`-leg combination of `legs`, best expected value first
/// (combined probability when unpriced)
pub fn best_parlays(legs: &[ParlayLeg], size: usize) -> Result<Vec<ParlayAnalysis>, EngineError> {
    if size == 0 || size > legs.len() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut picked = Vec::with_capacity(size);
    collect_combinations(legs, size, 0, &mut picked, &mut out)?;
    out.sort_by(|a, b| {
        let key = |p: &ParlayAnalysis| p.expected_value.unwrap_or(f64::NEG_INFINITY);
        key(b)
            .total_cmp(&key(a))
            .then(b.combined_probability.total_cmp(&a.combined_probability))
    });
    Ok(out)
}

fn collect_combinations(
    legs: &[ParlayLeg],
    size: usize,
    start: usize,
    picked: &mut Vec<ParlayLeg>,
    out: &mut Vec<ParlayAnalysis>,
) -> Result<(), EngineError> {
    if picked.len() == size {
        out.push(analyze(picked)?);
        return Ok(());
    }
    for i in start..legs.len() {
        picked.push(legs[i].clone());
        collect_combinations(legs, size, i + 1, picked, out)?;
        picked.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn leg(away: &str, home: &str, p: f64, odds: Option<i32>) -> ParlayLeg {
        ParlayLeg {
            away_team: away.into(),
            home_team: home.into(),
            minimum_line: 210.5,
            hit_probability: p,
            american_odds: odds,
        }
    }

    #[test]
    fn combine_multiplies_fractions() {
        assert_relative_eq!(combine(&[100.0, 100.0]).unwrap(), 100.0);
        assert_relative_eq!(combine(&[50.0, 50.0]).unwrap(), 25.0);
        assert_relative_eq!(combine(&[90.0, 80.0, 50.0]).unwrap(), 36.0, epsilon = 1e-9);
        assert_relative_eq!(combine(&[]).unwrap(), 100.0);
    }

    #[test]
    fn combine_rejects_bad_legs() {
        assert_eq!(combine(&[101.0]), Err(EngineError::InvalidLegProbability(101.0)));
        assert!(combine(&[50.0, -1.0]).is_err());
        assert!(combine(&[f64::NAN]).is_err());
    }

    #[test]
    fn odds_conversion() {
        assert_relative_eq!(american_to_decimal(150).unwrap(), 2.5);
        assert_relative_eq!(american_to_decimal(-400).unwrap(), 1.25);
        assert_eq!(american_to_decimal(0), None);
        assert_eq!(decimal_to_american(2.5), Some(150));
        assert_eq!(decimal_to_american(1.25), Some(-400));
        assert_eq!(decimal_to_american(1.0), None);
    }

    #[test]
    fn expected_value_is_zero_at_fair_price() {
        assert_relative_eq!(expected_value(50.0, 2.0), 0.0);
        assert_relative_eq!(expected_value(80.0, 1.5), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn analysis_reports_weakest_leg_and_shared_teams() {
        let legs = vec![
            leg("Boston Celtics", "Miami Heat", 92.0, Some(-900)),
            leg("Denver Nuggets", "Boston Celtics", 88.0, Some(-700)),
            leg("Utah Jazz", "Phoenix Suns", 95.0, Some(-1200)),
        ];
        let a = analyze(&legs).unwrap();
        assert_relative_eq!(a.combined_probability, 92.0 * 88.0 * 95.0 / 10_000.0, epsilon = 1e-9);
        assert_eq!(a.weakest_probability, Some(88.0));
        assert_eq!(a.weakest_leg.as_deref(), Some("Denver Nuggets @ Boston Celtics o210.5"));
        assert_eq!(a.recommendation, Recommendation::Recommended);
        assert_eq!(
            a.shared_teams,
            vec![SharedTeam {
                first: 0,
                second: 1,
                team: "Boston Celtics".into()
            }]
        );
        assert!(a.correlation_adjusted_probability < a.combined_probability);
        assert!(a.decimal_odds.is_some());
        assert!(a.expected_value.is_some());
    }

    #[test]
    fn unpriced_leg_leaves_parlay_unpriced() {
        let a = analyze(&[leg("A", "B", 90.0, Some(-500)), leg("C", "D", 90.0, None)]).unwrap();
        assert_eq!(a.decimal_odds, None);
        assert_eq!(a.expected_value, None);
        assert_eq!(a.recommendation, Recommendation::Recommended);
        assert!(a.shared_teams.is_empty());
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(Recommendation::for_probability(75.0), Recommendation::Recommended);
        assert_eq!(Recommendation::for_probability(70.0), Recommendation::Acceptable);
        assert_eq!(Recommendation::for_probability(64.9), Recommendation::NotRecommended);
    }

    #[test]
    fn best_parlays_enumerates_combinations() {
        let legs = vec![
            leg("A", "B", 95.0, None),
            leg("C", "D", 90.0, None),
            leg("E", "F", 85.0, None),
            leg("G", "H", 80.0, None),
        ];
        let pairs = best_parlays(&legs, 2).unwrap();
        assert_eq!(pairs.len(), 6);
        assert_relative_eq!(pairs[0].combined_probability, 85.5, epsilon = 1e-9);
        assert_eq!(best_parlays(&legs, 4).unwrap().len(), 1);
        assert!(best_parlays(&legs, 5).unwrap().is_empty());
    }
}
