//! Monte Carlo engine for NBA minimum alternate totals.
//!
//! Loads season efficiency ratings and completed games, simulates each
//! requested matchup many times, and gates the resulting hit probability
//! behind risk flags before issuing a betting label.

pub mod data;
pub mod engine;

pub use engine::{
    Decision, EngineConfig, EngineError, SimulationRequest, SimulationResult, TotalsEngine,
};
