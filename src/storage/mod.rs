//! Persistence of finished backtests.
//!
//! Each run is written as a standalone pretty-printed JSON file named after
//! its id, holding the strategy name, market and the report verbatim.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backtest::BacktestReport;
use crate::types::Market;

/// A backtest report as it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRun {
    pub id: Uuid,
    pub strategy_name: String,
    pub market: Market,
    pub created_at: DateTime<Utc>,
    pub report: BacktestReport,
}

impl SavedRun {
    pub fn new(strategy_name: &str, report: BacktestReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy_name: strategy_name.to_string(),
            market: report.market,
            created_at: Utc::now(),
            report,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }
}

/// Write a run into `dir`, creating the directory if needed.
pub fn save_run(run: &SavedRun, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(run.file_name());
    let json = serde_json::to_string_pretty(run).context("Failed to serialise backtest run")?;
    std::fs::write(&path, &json)
        .with_context(|| format!("Failed to write run to {}", path.display()))?;

    debug!(path = %path.display(), strategy = %run.strategy_name, "Run saved");
    Ok(path)
}

/// Load a run. Returns None if the file doesn't exist.
pub fn load_run(path: &Path) -> Result<Option<SavedRun>> {
    if !path.exists() {
        info!(path = %path.display(), "No saved run found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run from {}", path.display()))?;
    let run: SavedRun = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse run from {}", path.display()))?;

    debug!(
        path = %path.display(),
        strategy = %run.strategy_name,
        valid_bets = run.report.valid_bets,
        "Run loaded from disk"
    );
    Ok(Some(run))
}

/// Delete a saved run. Missing files are fine.
pub fn delete_run(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete run file {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
