use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

mod config;

use config::{Command, Config};
use minimum_totals::data::{self, models::SlateEntry};
use minimum_totals::engine::parlay::{self, ParlayLeg};
use minimum_totals::engine::TotalsEngine;

const TOP_PARLAYS: usize = 5;

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let engine_config = config.engine_config()?;
    info!(
        "Preset {} with {} trials per game, seed {}",
        engine_config.name, engine_config.simulation.trials, config.seed
    );

    let stats = data::load_team_stats(&config.team_stats_path)?;
    let games = data::load_completed_games(&config.games_path)?;
    let engine = TotalsEngine::new(&stats, games, engine_config)?;

    match &config.command {
        Command::Analyze {
            away,
            home,
            line,
            date,
            spread,
            away_stars_out,
            home_stars_out,
        } => {
            let entry = SlateEntry {
                away: away.clone(),
                home: home.clone(),
                line: *line,
                date: *date,
                spread: *spread,
                away_stars_out: *away_stars_out,
                home_stars_out: *home_stars_out,
                odds: None,
            };
            let result = engine.analyze_seeded(&engine.request_for(&entry), config.seed)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Slate { games, parlay_legs } => {
            let slate = data::load_slate(games)?;
            let requests: Vec<_> = slate.iter().map(|e| engine.request_for(e)).collect();

            let mut results = Vec::with_capacity(slate.len());
            let mut legs = Vec::new();
            for (entry, outcome) in slate.iter().zip(engine.analyze_slate(&requests, config.seed)) {
                match outcome {
                    Ok(result) => {
                        if result.decision.is_bet() {
                            legs.push(ParlayLeg::from_result(&result, entry.odds));
                        }
                        results.push(result);
                    }
                    Err(e) => warn!("Skipping {} @ {}: {}", entry.away, entry.home, e),
                }
            }

            let parlays = parlay::best_parlays(&legs, *parlay_legs)?;
            if parlays.is_empty() {
                info!(
                    "{} YES-or-better legs, not enough for a {}-leg parlay",
                    legs.len(),
                    parlay_legs
                );
            }
            let top: Vec<_> = parlays.into_iter().take(TOP_PARLAYS).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "results": results, "parlays": top }))?
            );
        }
        Command::Profiles => {
            println!("{}", serde_json::to_string_pretty(&engine.summary())?);
        }
    }

    Ok(())
}
