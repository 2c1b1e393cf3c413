//! Batch runner: many strategies over one shared dataset.
//!
//! Loads the dataset once, indexes the rankings once, then runs every saved
//! strategy on the blocking pool. The backtest itself is CPU-only, so each
//! run goes through `spawn_blocking` rather than occupying an async worker.

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{error, info};

use crate::backtest::{BacktestReport, Backtester};
use crate::data::{load_dataset, DataSource, Dataset};
use crate::strategy::{Strategy, StrategyError};

/// Why a single strategy produced no report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
    #[error("backtest task failed: {0}")]
    Task(String),
}

/// One strategy and its outcome.
#[derive(Debug)]
pub struct StrategyRun {
    pub strategy: Strategy,
    pub result: Result<BacktestReport, RunError>,
}

impl StrategyRun {
    pub fn report(&self) -> Option<&BacktestReport> {
        self.result.as_ref().ok()
    }
}

pub struct BatchRunner {
    max_concurrent: usize,
}

impl BatchRunner {
    /// `max_concurrent` is clamped to at least one.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Load from `source` and run every strategy it holds.
    pub async fn run_all(&self, source: &dyn DataSource) -> Result<Vec<StrategyRun>> {
        let dataset = load_dataset(source).await?;
        Ok(self.run_dataset(dataset).await)
    }

    /// Run every strategy in `dataset`. Results come back in strategy order;
    /// one failing strategy does not affect the others.
    pub async fn run_dataset(&self, dataset: Dataset) -> Vec<StrategyRun> {
        let Dataset {
            matches,
            home_rankings,
            away_rankings,
            strategies,
        } = dataset;

        let backtester = Arc::new(Backtester::new(&home_rankings, &away_rankings));
        let matches = Arc::new(matches);
        let total = strategies.len();

        info!(
            strategies = total,
            matches = matches.len(),
            max_concurrent = self.max_concurrent,
            "Starting batch"
        );

        let runs: Vec<StrategyRun> = stream::iter(strategies)
            .map(|strategy| {
                let backtester = Arc::clone(&backtester);
                let matches = Arc::clone(&matches);
                async move { run_one(backtester, matches, strategy).await }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let failed = runs.iter().filter(|r| r.result.is_err()).count();
        info!(completed = total - failed, failed, "Batch complete");
        runs
    }
}

async fn run_one(
    backtester: Arc<Backtester>,
    matches: Arc<Vec<crate::types::GameData>>,
    strategy: Strategy,
) -> StrategyRun {
    let task_strategy = strategy.clone();
    let joined =
        tokio::task::spawn_blocking(move || backtester.run(&task_strategy, &matches)).await;

    let result = match joined {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => Err(RunError::from(e)),
        Err(e) => Err(RunError::Task(e.to_string())),
    };

    if let Err(e) = &result {
        error!(strategy = %strategy.name, error = %e, "Strategy run failed");
    }

    StrategyRun { strategy, result }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
