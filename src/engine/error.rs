use thiserror::Error;

/// Invalid input handed to the engine by its caller.
///
/// Gaps in the sports data (unknown teams, thin game history) are never
/// errors; they degrade to league-average assumptions instead.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("minimum line must be a positive finite number, got {0}")]
    InvalidLine(f64),

    #[error("trial count must be at least 1")]
    ZeroTrials,

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("variance boost must be positive, got {0}")]
    InvalidVarianceBoost(f64),

    #[error("parlay leg probability must be within 0..=100, got {0}")]
    InvalidLegProbability(f64),

    #[error("team '{team}' has an invalid {field} of {value}")]
    InvalidTeamStat {
        team: String,
        field: &'static str,
        value: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown preset '{0}' (expected strict, loosened or smart_variance)")]
    UnknownPreset(String),
}

/// Reject NaN and infinities for a named numeric input
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::NonFinite { field, value })
    }
}
