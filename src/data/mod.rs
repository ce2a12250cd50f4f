use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub mod models;
use models::*;

/// Read every row of a headed CSV file into `T`
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize().enumerate() {
        let row: T = record.with_context(|| format!("{} row {}", path.display(), idx + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load the team statistics table. Later duplicates of a team name are dropped.
pub fn load_team_stats(path: &Path) -> Result<Vec<TeamStat>> {
    let rows: Vec<TeamStat> = read_rows(path)?;
    let mut seen = HashSet::new();
    let mut stats = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(row.team.clone()) {
            stats.push(row);
        } else {
            warn!("Duplicate team stats row for {} ignored", row.team);
        }
    }
    info!("Loaded stats for {} teams from {}", stats.len(), path.display());
    Ok(stats)
}

/// Load the completed-games table, dropping repeated (visitor, home, date) rows.
pub fn load_completed_games(path: &Path) -> Result<Vec<GameRecord>> {
    let rows: Vec<GameRecord> = read_rows(path)?;
    let before = rows.len();
    let games = dedup_games(rows);
    if games.len() < before {
        warn!("Dropped {} duplicate game rows", before - games.len());
    }
    info!("Loaded {} completed games from {}", games.len(), path.display());
    Ok(games)
}

/// Load a slate of upcoming games to analyze
pub fn load_slate(path: &Path) -> Result<Vec<SlateEntry>> {
    read_rows(path)
}

fn dedup_games(rows: Vec<GameRecord>) -> Vec<GameRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|g| seen.insert((g.visitor.clone(), g.home.clone(), g.date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let g = |home_pts| GameRecord {
            date,
            visitor: "Orlando Magic".into(),
            visitor_pts: 100,
            home: "Chicago Bulls".into(),
            home_pts,
        };
        let games = dedup_games(vec![g(110), g(999)]);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home_pts, 110);
    }
}
