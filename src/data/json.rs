//! JSON directory data source.
//!
//! Reads a dataset exported as four JSON arrays:
//!
//! | File                 | Contents          |
//! |----------------------|-------------------|
//! | `matches.json`       | `[GameData]`      |
//! | `rankings_home.json` | `[HomeRanking]`   |
//! | `rankings_away.json` | `[AwayRanking]`   |
//! | `strategies.json`    | `[Strategy]`      |
//!
//! Ranking files are optional; a missing one is an empty table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::DataSource;
use crate::strategy::Strategy;
use crate::types::{AwayRanking, GameData, HomeRanking};

pub const MATCHES_FILE: &str = "matches.json";
pub const HOME_RANKINGS_FILE: &str = "rankings_home.json";
pub const AWAY_RANKINGS_FILE: &str = "rankings_away.json";
pub const STRATEGIES_FILE: &str = "strategies.json";

pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_required<T: DeserializeOwned + Send>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let items: Vec<T> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(path = %path.display(), count = items.len(), "Loaded JSON file");
        Ok(items)
    }

    async fn read_optional<T: DeserializeOwned + Send>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if !exists {
            warn!(
                path = %path.display(),
                "Ranking file not found, ranking filters will reject every match"
            );
            return Ok(Vec::new());
        }
        self.read_required(file).await
    }
}

#[async_trait]
impl DataSource for JsonDirSource {
    fn name(&self) -> String {
        format!("json:{}", self.dir.display())
    }

    async fn load_matches(&self) -> Result<Vec<GameData>> {
        self.read_required(MATCHES_FILE).await
    }

    async fn load_home_rankings(&self) -> Result<Vec<HomeRanking>> {
        self.read_optional(HOME_RANKINGS_FILE).await
    }

    async fn load_away_rankings(&self) -> Result<Vec<AwayRanking>> {
        self.read_optional(AWAY_RANKINGS_FILE).await
    }

    async fn load_strategies(&self) -> Result<Vec<Strategy>> {
        self.read_required(STRATEGIES_FILE).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
