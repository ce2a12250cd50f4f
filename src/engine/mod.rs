pub mod backtest;
pub mod config;
pub mod decision;
pub mod error;
pub mod flags;
pub mod matchup;
pub mod parlay;
pub mod profile;
pub mod rest;
pub mod simulation;
mod stats;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::data::models::{GameRecord, SlateEntry, TeamStat};

pub use config::EngineConfig;
pub use decision::{Confidence, Decision};
pub use error::EngineError;
pub use flags::Advisory;
pub use profile::{LeagueAverages, ProfileSet, TeamProfile};
pub use rest::FatigueLevel;
pub use simulation::{DistributionSummary, SimulationRequest};

use simulation::{variance_boost, GameSetup, SideSetup, Simulator};

/// Everything the engine says about one requested game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub away_team: String,
    pub home_team: String,
    pub minimum_line: f64,
    pub preset: String,
    pub away_expected: f64,
    pub home_expected: f64,
    pub total_expected: f64,
    pub game_tempo: f64,
    pub trials: usize,
    pub hits: usize,
    /// Percent of trials whose total cleared the line
    pub hit_probability: f64,
    pub distribution: DistributionSummary,
    pub flag_count: usize,
    pub flags: Vec<String>,
    pub advisories: Vec<Advisory>,
    pub floor_safe: bool,
    pub decision: Decision,
    pub confidence: Confidence,
    pub away_rest_days: Option<u32>,
    pub home_rest_days: Option<u32>,
    pub away_fatigue: FatigueLevel,
    pub home_fatigue: FatigueLevel,
    pub blowout_probability: f64,
    pub away_variance_reliable: bool,
    pub home_variance_reliable: bool,
    pub away_is_default: bool,
    pub home_is_default: bool,
}

/// League overview of the loaded dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSummary {
    pub preset: String,
    pub teams: usize,
    pub completed_games: usize,
    pub league: LeagueAverages,
    pub elite_defenses: Vec<String>,
    pub slow_pace: Vec<String>,
    pub weak_offenses: Vec<String>,
    pub high_variance: Vec<String>,
    pub unreliable_variance: Vec<String>,
}

/// Monte Carlo engine for minimum alternate totals.
///
/// Profiles are built once at construction and shared read-only by every
/// call, so analyses may run concurrently as long as each has its own RNG.
pub struct TotalsEngine {
    config: EngineConfig,
    profiles: ProfileSet,
    games: Vec<GameRecord>,
}

impl TotalsEngine {
    pub fn new(
        stats: &[TeamStat],
        games: Vec<GameRecord>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        for stat in stats {
            profile::check_stat(stat)?;
        }
        let profiles = ProfileSet::build(stats, &games, &config);
        info!(
            "Totals engine ready: preset {}, {} teams, {} games, {} trials per game",
            config.name,
            profiles.len(),
            games.len(),
            config.simulation.trials
        );
        Ok(Self {
            config,
            profiles,
            games,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Simulate one game and run it through flags and the decision policy
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        request: &SimulationRequest,
        rng: &mut R,
    ) -> Result<SimulationResult, EngineError> {
        request.validate()?;
        let settings = &self.config.simulation;
        let away = self.profiles.get_or_default(&request.away_team);
        let home = self.profiles.get_or_default(&request.home_team);

        let expectation =
            matchup::expected(&away, &home, self.profiles.league().pace, &self.config.matchup);
        let blowout_probability = request.blowout_probability(settings);
        let game = GameSetup {
            away: SideSetup::new(
                expectation.away_expected,
                away.scoring_std_dev,
                request.away_rest_days,
                variance_boost(request.away_variance_boost, request.away_stars_out, settings),
                settings,
            ),
            home: SideSetup::new(
                expectation.home_expected,
                home.scoring_std_dev,
                request.home_rest_days,
                variance_boost(request.home_variance_boost, request.home_stars_out, settings),
                settings,
            ),
            minimum_line: request.minimum_line,
            blowout_probability,
            trials: settings.trials,
        };
        let outcome = Simulator::new(settings)?.run(&game, rng)?;
        let distribution = outcome.distribution;
        let hit_probability = outcome.hit_probability();

        let report = flags::evaluate(
            &away,
            &home,
            distribution.percentile_10,
            request.minimum_line,
            &self.config.flags,
        );
        let floor_safe = distribution.percentile_10 >= request.minimum_line;
        let verdict = decision::decide(
            hit_probability,
            report.count(),
            floor_safe,
            &self.config.decision,
        );

        debug!(
            "{} @ {} o{:.1}: mean {:.1}, p10 {:.1}, {:.1}% with {} flags -> {}",
            request.away_team,
            request.home_team,
            request.minimum_line,
            distribution.mean,
            distribution.percentile_10,
            hit_probability,
            report.count(),
            verdict.decision
        );

        Ok(SimulationResult {
            away_team: request.away_team.clone(),
            home_team: request.home_team.clone(),
            minimum_line: request.minimum_line,
            preset: self.config.name.clone(),
            away_expected: expectation.away_expected,
            home_expected: expectation.home_expected,
            total_expected: expectation.total_expected(),
            game_tempo: expectation.game_tempo,
            trials: outcome.trials,
            hits: outcome.hits,
            hit_probability,
            distribution,
            flag_count: report.count(),
            flags: report.descriptions(),
            advisories: flags::advisories(&away, &home, request, settings),
            floor_safe,
            decision: verdict.decision,
            confidence: verdict.confidence,
            away_rest_days: request.away_rest_days,
            home_rest_days: request.home_rest_days,
            away_fatigue: FatigueLevel::from_rest_days(
                request.away_rest_days,
                settings.back_to_back_max_rest,
            ),
            home_fatigue: FatigueLevel::from_rest_days(
                request.home_rest_days,
                settings.back_to_back_max_rest,
            ),
            blowout_probability,
            away_variance_reliable: away.variance_reliable,
            home_variance_reliable: home.variance_reliable,
            away_is_default: away.is_default,
            home_is_default: home.is_default,
        })
    }

    pub fn analyze_seeded(
        &self,
        request: &SimulationRequest,
        seed: u64,
    ) -> Result<SimulationResult, EngineError> {
        self.analyze(request, &mut StdRng::seed_from_u64(seed))
    }

    /// Analyze a slate in parallel. Request `i` uses its own generator seeded
    /// `seed + i`, so results do not depend on thread scheduling.
    pub fn analyze_slate(
        &self,
        requests: &[SimulationRequest],
        seed: u64,
    ) -> Vec<Result<SimulationResult, EngineError>> {
        let results: Vec<_> = requests
            .par_iter()
            .enumerate()
            .map(|(i, request)| self.analyze_seeded(request, seed.wrapping_add(i as u64)))
            .collect();
        let bets = results
            .iter()
            .filter(|r| r.as_ref().is_ok_and(|r| r.decision.is_bet()))
            .count();
        info!("Analyzed {} games, {} rated YES or better", results.len(), bets);
        results
    }

    /// Build a request from a slate row, filling rest days from the game
    /// history when the row carries a date
    pub fn request_for(&self, entry: &SlateEntry) -> SimulationRequest {
        let mut request = SimulationRequest::new(&entry.away, &entry.home, entry.line)
            .with_stars_out(entry.away_stars_out, entry.home_stars_out);
        request.spread = entry.spread;
        if let Some(date) = entry.date {
            let max_rest = self.config.simulation.back_to_back_max_rest;
            let away = rest::rest_info(&entry.away, date, &self.games, max_rest);
            let home = rest::rest_info(&entry.home, date, &self.games, max_rest);
            for side in [&away, &home] {
                debug!(
                    "{} on {}: last game {:?}, {:?}",
                    side.team, date, side.last_game, side.fatigue
                );
            }
            request = request.with_rest_days(away.rest_days, home.rest_days);
        }
        request
    }

    pub fn summary(&self) -> EngineSummary {
        let teams = self.profiles.iter_sorted();
        let names = |f: fn(&TeamProfile) -> bool| {
            teams
                .iter()
                .filter(|p| f(p))
                .map(|p| p.team.clone())
                .collect::<Vec<_>>()
        };
        EngineSummary {
            preset: self.config.name.clone(),
            teams: self.profiles.len(),
            completed_games: self.games.len(),
            league: *self.profiles.league(),
            elite_defenses: names(|p| p.classes.is_elite_defense),
            slow_pace: names(|p| p.classes.is_slow_pace),
            weak_offenses: names(|p| p.classes.is_weak_offense),
            high_variance: names(|p| p.classes.is_high_variance),
            unreliable_variance: names(|p| !p.variance_reliable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stat(team: &str, ortg: f64, drtg: f64, pace: f64) -> TeamStat {
        TeamStat {
            team: team.into(),
            ppg: 115.0,
            ortg,
            drtg,
            pace,
        }
    }

    fn engine() -> TotalsEngine {
        let stats = vec![
            stat("Shooters", 118.0, 110.0, 100.0),
            stat("Gunners", 118.0, 110.0, 100.0),
            stat("Bricklayers", 109.0, 115.0, 100.0),
            stat("Wall", 116.0, 106.0, 100.0),
        ];
        let day = |d| NaiveDate::from_ymd_opt(2025, 12, d).unwrap();
        let games = vec![
            GameRecord {
                date: day(1),
                visitor: "Shooters".into(),
                visitor_pts: 121,
                home: "Wall".into(),
                home_pts: 104,
            },
            GameRecord {
                date: day(2),
                visitor: "Gunners".into(),
                visitor_pts: 117,
                home: "Shooters".into(),
                home_pts: 125,
            },
        ];
        TotalsEngine::new(&stats, games, EngineConfig::default()).unwrap()
    }

    #[test]
    fn clean_high_scoring_matchup() {
        let e = engine();
        let r = e
            .analyze_seeded(&SimulationRequest::new("Shooters", "Gunners", 215.0), 42)
            .unwrap();
        assert!((r.total_expected - 260.1).abs() < 1e-9);
        assert!((r.distribution.mean - r.total_expected).abs() < 5.0);
        assert!(r.distribution.percentile_50 > 215.0);
        assert!(r.hit_probability > 50.0);
        assert_eq!(r.hits, (r.hit_probability * r.trials as f64 / 100.0).round() as usize);
        assert!(r.floor_safe);
        assert_eq!(r.flag_count, 0);
        assert_eq!(r.decision, Decision::StrongYes);
    }

    #[test]
    fn same_seed_same_result() {
        let e = engine();
        let req = SimulationRequest::new("Wall", "Bricklayers", 221.5).with_spread(-6.5);
        assert_eq!(e.analyze_seeded(&req, 9).unwrap(), e.analyze_seeded(&req, 9).unwrap());
    }

    #[test]
    fn elite_defense_against_weak_offense_is_never_a_bet() {
        let e = engine();
        let r = e
            .analyze_seeded(&SimulationRequest::new("Bricklayers", "Wall", 150.0), 3)
            .unwrap();
        assert!(r.hit_probability > 95.0);
        assert!(r.flag_count >= 2);
        assert_eq!(r.flag_count, r.flags.len());
        assert!(!r.decision.is_bet());
        assert_eq!(r.decision, Decision::Maybe);
    }

    #[test]
    fn unknown_team_degrades_to_league_average() {
        let e = engine();
        let r = e
            .analyze_seeded(&SimulationRequest::new("Expansion Club", "Shooters", 210.0), 1)
            .unwrap();
        assert!(r.away_is_default);
        assert!(!r.away_variance_reliable);
        assert!(r.away_expected.is_finite() && r.away_expected > 0.0);
        assert!(r.advisories.contains(&Advisory::UnknownTeam {
            team: "Expansion Club".into()
        }));
    }

    #[test]
    fn invalid_request_fails_fast() {
        let e = engine();
        assert!(matches!(
            e.analyze_seeded(&SimulationRequest::new("Shooters", "Gunners", f64::NAN), 1),
            Err(EngineError::InvalidLine(_))
        ));
    }

    #[test]
    fn unknown_team_flags_use_the_requested_name() {
        let stats = vec![stat("Lockdown", 112.0, 105.0, 100.0), stat("Clamps", 112.0, 105.0, 100.0)];
        let e = TotalsEngine::new(&stats, Vec::new(), EngineConfig::default()).unwrap();
        let r = e
            .analyze_seeded(&SimulationRequest::new("Expansion Club", "Lockdown", 200.0), 2)
            .unwrap();
        assert!(r.away_is_default);
        assert!(r.flags.iter().any(|f| f == "Elite defense: Expansion Club (DRtg 105.0)"));
        assert!(r.flags.iter().all(|f| !f.contains(profile::LEAGUE_AVERAGE)));
    }

    #[test]
    fn non_finite_team_ratings_fail_fast() {
        let stats = vec![stat("Shooters", f64::NAN, 110.0, 100.0), stat("Wall", 116.0, 106.0, 100.0)];
        assert!(matches!(
            TotalsEngine::new(&stats, Vec::new(), EngineConfig::default()),
            Err(EngineError::InvalidTeamStat { field: "ORtg", .. })
        ));
        let stats = vec![stat("Shooters", 118.0, 110.0, f64::INFINITY)];
        assert!(TotalsEngine::new(&stats, Vec::new(), EngineConfig::default()).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.simulation.trials = 0;
        assert!(TotalsEngine::new(&[], Vec::new(), config).is_err());
    }

    #[test]
    fn slate_matches_individual_seeds() {
        let e = engine();
        let requests = vec![
            SimulationRequest::new("Shooters", "Gunners", 230.0),
            SimulationRequest::new("Wall", "Bricklayers", 205.0),
            SimulationRequest::new("Gunners", "Wall", 215.5),
        ];
        let slate = e.analyze_slate(&requests, 100);
        assert_eq!(slate.len(), 3);
        for (i, result) in slate.into_iter().enumerate() {
            let alone = e.analyze_seeded(&requests[i], 100 + i as u64).unwrap();
            assert_eq!(result.unwrap(), alone);
        }
    }

    #[test]
    fn slate_rows_pick_up_rest_days() {
        let e = engine();
        let entry = SlateEntry {
            away: "Shooters".into(),
            home: "Bricklayers".into(),
            line: 212.5,
            date: NaiveDate::from_ymd_opt(2025, 12, 3),
            spread: Some(4.5),
            away_stars_out: 1,
            home_stars_out: 0,
            odds: None,
        };
        let req = e.request_for(&entry);
        assert_eq!(req.away_rest_days, Some(1));
        assert_eq!(req.home_rest_days, None);
        assert_eq!(req.spread, Some(4.5));
        assert_eq!(req.away_stars_out, 1);

        let r = e.analyze_seeded(&req, 5).unwrap();
        assert!(r.advisories.iter().any(|a| matches!(a, Advisory::BackToBack { .. })));
        assert_eq!(r.away_fatigue, FatigueLevel::BackToBack);
        assert_eq!(r.home_fatigue, FatigueLevel::Rested);
    }

    #[test]
    fn summary_lists_classifications() {
        let s = engine().summary();
        assert_eq!(s.teams, 4);
        assert_eq!(s.completed_games, 2);
        assert_eq!(s.elite_defenses, vec!["Wall".to_string()]);
        assert_eq!(s.weak_offenses, vec!["Bricklayers".to_string()]);
        assert_eq!(s.unreliable_variance.len(), 4);
    }
}
