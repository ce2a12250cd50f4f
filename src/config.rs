use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use minimum_totals::engine::EngineConfig;

/// Monte Carlo analyzer for NBA minimum alternate totals
#[derive(Parser, Debug, Clone)]
#[command(name = "minimum-totals", version, about)]
pub struct Config {
    /// Team statistics CSV (Team, PPG, ORtg, DRtg, Pace)
    #[arg(long, env = "TEAM_STATS_PATH", default_value = "data/team_stats.csv")]
    pub team_stats_path: PathBuf,

    /// Completed games CSV (Date, Visitor, Visitor_PTS, Home, Home_PTS)
    #[arg(long, env = "COMPLETED_GAMES_PATH", default_value = "data/completed_games.csv")]
    pub games_path: PathBuf,

    /// Threshold preset: strict, loosened or smart_variance
    #[arg(long, env = "ENGINE_PRESET", default_value = "smart_variance")]
    pub preset: String,

    /// JSON file overriding individual engine settings on top of the preset
    #[arg(long, env = "ENGINE_CONFIG")]
    pub engine_config: Option<PathBuf>,

    /// Simulated trials per game (overrides the preset)
    #[arg(long, env = "TRIALS")]
    pub trials: Option<usize>,

    /// Base RNG seed; slate game `i` uses `seed + i`
    #[arg(long, env = "SEED", default_value = "42")]
    pub seed: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a single game and print the result as JSON
    Analyze {
        #[arg(long)]
        away: String,
        #[arg(long)]
        home: String,
        /// Minimum alternate total to clear
        #[arg(long)]
        line: f64,
        /// Game date, used to derive rest days from the completed games
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, allow_hyphen_values = true)]
        spread: Option<f64>,
        #[arg(long, default_value = "0")]
        away_stars_out: u32,
        #[arg(long, default_value = "0")]
        home_stars_out: u32,
    },
    /// Analyze every game of a slate CSV (Away, Home, Line, optional Date, Spread, Odds)
    Slate {
        #[arg(long)]
        games: PathBuf,
        /// Legs per suggested parlay
        #[arg(long, env = "PARLAY_LEGS", default_value = "2")]
        parlay_legs: usize,
    },
    /// Print league averages and team classifications
    Profiles,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(0) = self.trials {
            anyhow::bail!("trials must be at least 1");
        }
        if EngineConfig::preset(&self.preset).is_err() {
            anyhow::bail!(
                "unknown preset '{}', expected one of {}",
                self.preset,
                EngineConfig::PRESETS.join(", ")
            );
        }
        match &self.command {
            Command::Analyze { line, spread, .. } => {
                if !line.is_finite() || *line <= 0.0 {
                    anyhow::bail!("line must be a positive number");
                }
                if spread.is_some_and(|s| !s.is_finite()) {
                    anyhow::bail!("spread must be finite");
                }
            }
            Command::Slate { parlay_legs, .. } => {
                if *parlay_legs < 2 {
                    anyhow::bail!("parlay_legs must be at least 2");
                }
            }
            Command::Profiles => {}
        }
        Ok(())
    }

    /// Preset, then the JSON override file, then `--trials`
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = EngineConfig::preset(&self.preset)?;
        if let Some(path) = &self.engine_config {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let patch: Value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            config = apply_override(&config, patch)?;
        }
        if let Some(trials) = self.trials {
            config.simulation.trials = trials;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Overlay `patch` onto `base` key by key; `null` clears optional thresholds
fn apply_override(base: &EngineConfig, patch: Value) -> anyhow::Result<EngineConfig> {
    let mut merged = serde_json::to_value(base)?;
    merge(&mut merged, patch);
    serde_json::from_value(merged).context("invalid engine config override")
}

fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("minimum-totals").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn analyze_arguments() {
        let c = parse(&[
            "analyze", "--away", "Utah Jazz", "--home", "Boston Celtics", "--line", "205.5",
            "--spread", "-11.5", "--date", "2025-12-03",
        ]);
        c.validate().unwrap();
        match c.command {
            Command::Analyze {
                line, spread, date, ..
            } => {
                assert_eq!(line, 205.5);
                assert_eq!(spread, Some(-11.5));
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_preset_and_zero_trials() {
        assert!(parse(&["--preset", "v9", "profiles"]).validate().is_err());
        assert!(parse(&["--trials", "0", "profiles"]).validate().is_err());
        assert!(parse(&["--preset", "strict", "profiles"]).validate().is_ok());
    }

    #[test]
    fn override_patches_the_preset() {
        let base = EngineConfig::strict();
        let cfg = apply_override(
            &base,
            json!({"simulation": {"trials": 500}, "flags": {"slow_pace": null}}),
        )
        .unwrap();
        assert_eq!(cfg.name, "strict");
        assert_eq!(cfg.simulation.trials, 500);
        assert_eq!(cfg.flags.slow_pace, None);
        assert_eq!(cfg.flags.pace_mismatch, Some(3.0));
        assert_eq!(cfg.decision, base.decision);
    }

    #[test]
    fn trials_flag_wins() {
        let c = parse(&["--trials", "2500", "--preset", "loosened", "profiles"]);
        let cfg = c.engine_config().unwrap();
        assert_eq!(cfg.simulation.trials, 2500);
        assert_eq!(cfg.name, "loosened");
    }
}
