//! Dataset loading.
//!
//! Defines the `DataSource` trait the engine's callers load matches,
//! rankings and saved strategies through, plus a JSON directory
//! implementation. The engine itself never touches I/O.

pub mod json;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::strategy::Strategy;
use crate::types::{AwayRanking, GameData, HomeRanking};

pub use json::JsonDirSource;

/// Abstraction over wherever uploaded matches and saved strategies live.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> String;

    async fn load_matches(&self) -> Result<Vec<GameData>>;

    async fn load_home_rankings(&self) -> Result<Vec<HomeRanking>>;

    async fn load_away_rankings(&self) -> Result<Vec<AwayRanking>>;

    async fn load_strategies(&self) -> Result<Vec<Strategy>>;
}

/// Everything one batch of backtests needs.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub matches: Vec<GameData>,
    pub home_rankings: Vec<HomeRanking>,
    pub away_rankings: Vec<AwayRanking>,
    pub strategies: Vec<Strategy>,
}

/// Load all four collections concurrently.
pub async fn load_dataset(source: &dyn DataSource) -> Result<Dataset> {
    let (matches, home_rankings, away_rankings, strategies) = tokio::try_join!(
        source.load_matches(),
        source.load_home_rankings(),
        source.load_away_rankings(),
        source.load_strategies(),
    )?;

    info!(
        source = %source.name(),
        matches = matches.len(),
        home_rankings = home_rankings.len(),
        away_rankings = away_rankings.len(),
        strategies = strategies.len(),
        "Dataset loaded"
    );

    Ok(Dataset {
        matches,
        home_rankings,
        away_rankings,
        strategies,
    })
}
