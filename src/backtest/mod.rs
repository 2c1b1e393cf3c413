//! Historical backtesting engine.
//!
//! Replays a strategy over a match history in four one-way stages:
//! chronological sort → predicate filter → bet generation → aggregation.
//! The engine is synchronous and pure; inputs are never mutated, so one
//! dataset can back many concurrent runs.

pub mod bets;
pub mod filter;
pub mod report;

use std::cmp::Ordering;

use tracing::{debug, info};

use crate::strategy::{Strategy, StrategyError};
use crate::types::{AwayRanking, GameData, HomeRanking};
use bets::generate_bets;
use filter::{MatchFilter, RankingIndex};
pub use report::BacktestReport;

// ---------------------------------------------------------------------------
// Backtester
// ---------------------------------------------------------------------------

/// Engine bound to one pair of ranking tables.
///
/// Build once per dataset and reuse across strategies; the ranking lookup is
/// only indexed here.
#[derive(Debug, Clone, Default)]
pub struct Backtester {
    rankings: RankingIndex,
}

impl Backtester {
    pub fn new(home_rankings: &[HomeRanking], away_rankings: &[AwayRanking]) -> Self {
        let rankings = RankingIndex::build(home_rankings, away_rankings);
        let (home, away) = rankings.sizes();
        debug!(home_rankings = home, away_rankings = away, "Ranking index built");
        Self { rankings }
    }

    /// Run a strategy over a set of matches in any order.
    pub fn run(
        &self,
        strategy: &Strategy,
        matches: &[GameData],
    ) -> Result<BacktestReport, StrategyError> {
        strategy.validate()?;

        let ordered = chronological(matches);
        let filtered = filter::apply(&MatchFilter::new(strategy, &self.rankings), ordered);
        debug!(
            strategy = %strategy.name,
            total = matches.len(),
            kept = filtered.len(),
            "Matches filtered"
        );

        let bets = generate_bets(strategy, &filtered);
        let mut report = report::aggregate(&bets, strategy);
        report.total_matches = matches.len();

        info!(
            strategy = %strategy.name,
            market = %strategy.market,
            matches = report.filtered_matches,
            valid_bets = report.valid_bets,
            hit_rate = format!("{:.1}%", report.hit_rate),
            profit = format!("{:.2}", report.total_profit),
            roi = format!("{:.1}%", report.roi),
            "Backtest complete"
        );

        Ok(report)
    }
}

/// Run a single backtest without keeping the ranking index around.
pub fn run_backtest(
    strategy: &Strategy,
    matches: &[GameData],
    home_rankings: &[HomeRanking],
    away_rankings: &[AwayRanking],
) -> Result<BacktestReport, StrategyError> {
    Backtester::new(home_rankings, away_rankings).run(strategy, matches)
}

/// Matches by date ascending. Stable; undated matches go last in input order.
pub fn chronological(matches: &[GameData]) -> Vec<&GameData> {
    let mut ordered: Vec<&GameData> = matches.iter().collect();
    ordered.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
