//! Shared types for the backtesting engine.
//!
//! Match records, ranking tables, the closed set of betting markets and the
//! three-valued bet outcome. Everything here is immutable input data or a
//! plain value type, so the filter, bet and report stages can depend on it
//! without depending on each other.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Match data
// ---------------------------------------------------------------------------

/// One historical fixture with final scores, closing odds and pre-match stats.
///
/// Uploaded datasets are spreadsheet exports, so every numeric column is
/// optional and deserialized leniently: numbers, numeric strings and blanks
/// are all accepted, anything unusable becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameData {
    pub league: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub season: String,
    #[serde(deserialize_with = "de::flexible_datetime")]
    pub date: Option<NaiveDateTime>,
    /// Matchday within the season.
    #[serde(deserialize_with = "de::lenient_f64")]
    pub rodada: Option<f64>,
    pub home: String,
    pub away: String,

    // Goals
    #[serde(deserialize_with = "de::lenient_u32")]
    pub goals_ht_home: Option<u32>,
    #[serde(deserialize_with = "de::lenient_u32")]
    pub goals_ht_away: Option<u32>,
    #[serde(deserialize_with = "de::lenient_u32")]
    pub goals_ft_home: Option<u32>,
    #[serde(deserialize_with = "de::lenient_u32")]
    pub goals_ft_away: Option<u32>,

    // Odds, one column per market
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_h_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_d_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_a_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_h_ht: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_d_ht: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_a_ht: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_over15_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_over25_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_under15_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_under25_ft: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_btts_yes: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_btts_no: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_dc_1x: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_dc_12: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub odd_dc_x2: Option<f64>,

    // Pre-match statistics
    #[serde(deserialize_with = "de::lenient_f64")]
    pub ppg_home: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub ppg_away: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub xg_home: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub xg_away: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub shots_on_target_home: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub shots_on_target_away: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub shots_off_target_home: Option<f64>,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub shots_off_target_away: Option<f64>,
}

impl fmt::Display for GameData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "????-??-??".to_string());
        write!(f, "[{} {}] {} {}", self.league, self.season, date, self.fixture())?;
        if let Some(score) = self.score() {
            write!(f, " ({score})")?;
        }
        Ok(())
    }
}

impl GameData {
    /// `"home vs away"` label.
    pub fn fixture(&self) -> String {
        format!("{} vs {}", self.home, self.away)
    }

    /// Full-time goals for both sides, if both are known.
    pub fn ft_goals(&self) -> Option<(u32, u32)> {
        Some((self.goals_ft_home?, self.goals_ft_away?))
    }

    /// Half-time goals for both sides, if both are known.
    pub fn ht_goals(&self) -> Option<(u32, u32)> {
        Some((self.goals_ht_home?, self.goals_ht_away?))
    }

    pub fn goals_ft_total(&self) -> Option<u32> {
        self.ft_goals().map(|(h, a)| h + a)
    }

    pub fn goals_ht_total(&self) -> Option<u32> {
        self.ht_goals().map(|(h, a)| h + a)
    }

    /// Full-time scoreline as `"H-A"`.
    pub fn score(&self) -> Option<String> {
        self.ft_goals().map(|(h, a)| format!("{h}-{a}"))
    }

    /// Closing odds for a market, if the column was filled.
    pub fn odds_for(&self, market: Market) -> Option<f64> {
        match market {
            Market::HomeWin => self.odd_h_ft,
            Market::Draw => self.odd_d_ft,
            Market::AwayWin => self.odd_a_ft,
            Market::HomeWinHt => self.odd_h_ht,
            Market::DrawHt => self.odd_d_ht,
            Market::AwayWinHt => self.odd_a_ht,
            Market::Over15 => self.odd_over15_ft,
            Market::Over25 => self.odd_over25_ft,
            Market::Under15 => self.odd_under15_ft,
            Market::Under25 => self.odd_under25_ft,
            Market::BttsYes => self.odd_btts_yes,
            Market::BttsNo => self.odd_btts_no,
            Market::Dc1x => self.odd_dc_1x,
            Market::Dc12 => self.odd_dc_12,
            Market::DcX2 => self.odd_dc_x2,
        }
    }

    /// Key used to look the home side up in a ranking table.
    pub fn home_key(&self) -> RankingKey {
        RankingKey::new(&self.league, &self.season, &self.home)
    }

    /// Key used to look the away side up in a ranking table.
    pub fn away_key(&self) -> RankingKey {
        RankingKey::new(&self.league, &self.season, &self.away)
    }
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// Home-table position of a team in a given league and season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeRanking {
    pub league: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub season: String,
    pub team: String,
    #[serde(default, deserialize_with = "de::lenient_u32")]
    pub ranking_home: Option<u32>,
}

/// Away-table position of a team in a given league and season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwayRanking {
    pub league: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub season: String,
    pub team: String,
    #[serde(default, deserialize_with = "de::lenient_u32")]
    pub ranking_away: Option<u32>,
}

/// `(league, season, team)` lookup key shared by both ranking tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankingKey {
    pub league: String,
    pub season: String,
    pub team: String,
}

impl RankingKey {
    pub fn new(league: &str, season: &str, team: &str) -> Self {
        Self {
            league: league.to_string(),
            season: season.to_string(),
            team: team.to_string(),
        }
    }
}

impl fmt::Display for RankingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.league, self.season, self.team)
    }
}

impl From<&HomeRanking> for RankingKey {
    fn from(r: &HomeRanking) -> Self {
        RankingKey::new(&r.league, &r.season, &r.team)
    }
}

impl From<&AwayRanking> for RankingKey {
    fn from(r: &AwayRanking) -> Self {
        RankingKey::new(&r.league, &r.season, &r.team)
    }
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Betting market a strategy is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "home_win")]
    HomeWin,
    #[serde(rename = "draw")]
    Draw,
    #[serde(rename = "away_win")]
    AwayWin,
    #[serde(rename = "home_win_ht")]
    HomeWinHt,
    #[serde(rename = "draw_ht")]
    DrawHt,
    #[serde(rename = "away_win_ht")]
    AwayWinHt,
    #[serde(rename = "over_15")]
    Over15,
    #[serde(rename = "over_25")]
    Over25,
    #[serde(rename = "under_15")]
    Under15,
    #[serde(rename = "under_25")]
    Under25,
    #[serde(rename = "btts_yes")]
    BttsYes,
    #[serde(rename = "btts_no")]
    BttsNo,
    #[serde(rename = "dc_1x")]
    Dc1x,
    #[serde(rename = "dc_12")]
    Dc12,
    #[serde(rename = "dc_x2")]
    DcX2,
}

impl Market {
    /// All supported markets (useful for iteration).
    pub const ALL: &'static [Market] = &[
        Market::HomeWin,
        Market::Draw,
        Market::AwayWin,
        Market::HomeWinHt,
        Market::DrawHt,
        Market::AwayWinHt,
        Market::Over15,
        Market::Over25,
        Market::Under15,
        Market::Under25,
        Market::BttsYes,
        Market::BttsNo,
        Market::Dc1x,
        Market::Dc12,
        Market::DcX2,
    ];

    /// Wire identifier, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::HomeWin => "home_win",
            Market::Draw => "draw",
            Market::AwayWin => "away_win",
            Market::HomeWinHt => "home_win_ht",
            Market::DrawHt => "draw_ht",
            Market::AwayWinHt => "away_win_ht",
            Market::Over15 => "over_15",
            Market::Over25 => "over_25",
            Market::Under15 => "under_15",
            Market::Under25 => "under_25",
            Market::BttsYes => "btts_yes",
            Market::BttsNo => "btts_no",
            Market::Dc1x => "dc_1x",
            Market::Dc12 => "dc_12",
            Market::DcX2 => "dc_x2",
        }
    }

    /// Whether the market settles on the half-time score.
    pub fn is_half_time(&self) -> bool {
        matches!(self, Market::HomeWinHt | Market::DrawHt | Market::AwayWinHt)
    }

    /// Settle the market against a match's goals.
    ///
    /// Returns [`BetOutcome::Undefined`] when the goals the market needs are
    /// missing.
    pub fn settle(&self, game: &GameData) -> BetOutcome {
        let goals = if self.is_half_time() {
            game.ht_goals()
        } else {
            game.ft_goals()
        };
        let Some((home, away)) = goals else {
            return BetOutcome::Undefined;
        };
        let total = home + away;

        let won = match self {
            Market::HomeWin | Market::HomeWinHt => home > away,
            Market::Draw | Market::DrawHt => home == away,
            Market::AwayWin | Market::AwayWinHt => away > home,
            Market::Over15 => total >= 2,
            Market::Over25 => total >= 3,
            Market::Under15 => total < 2,
            Market::Under25 => total < 3,
            Market::BttsYes => home >= 1 && away >= 1,
            Market::BttsNo => home == 0 || away == 0,
            // A draw wins both 1X and X2.
            Market::Dc1x => home >= away,
            Market::Dc12 => home != away,
            Market::DcX2 => away >= home,
        };

        if won {
            BetOutcome::Win
        } else {
            BetOutcome::Loss
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a market identifier (case-insensitive, `-` and `_` interchangeable).
impl std::str::FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Market::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Unknown market: {s}"))
    }
}

/// Settlement of a single bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Win,
    Loss,
    /// The goals needed to settle the market are missing.
    Undefined,
}

impl fmt::Display for BetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetOutcome::Win => write!(f, "win"),
            BetOutcome::Loss => write!(f, "loss"),
            BetOutcome::Undefined => write!(f, "undefined"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

/// Serde helpers for spreadsheet-sourced columns.
///
/// None of these fail on bad cell contents: a value that cannot be read as
/// the target type deserializes to `None` (or an empty string).
pub mod de {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_f64(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value_to_f64(&value))
    }

    /// Non-negative whole numbers only (goals, table positions).
    pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value_to_f64(&value)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32))
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Parse the date formats seen in match exports.
    pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(dt);
            }
        }
        for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
                return d.and_hms_opt(0, 0, 0);
            }
        }
        None
    }

    pub fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => parse_datetime(&s),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
