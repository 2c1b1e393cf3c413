//! Strategy definition: the declarative filter set a backtest runs on.
//!
//! A strategy is a flat record of optional constraints plus the market to
//! bet and the flat stake. It mirrors the saved-strategy JSON one-to-one:
//! every `min_*`/`max_*` pair is an `Option<f64>` and absent means "no
//! restriction". Blank or non-numeric bounds read as absent, and a stake that
//! is missing or unreadable fails validation for that strategy alone.

pub mod bounds;

use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::types::{de, GameData, Market};
pub use bounds::Bound;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration problems that make a strategy impossible to evaluate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("unit stake must be a positive number, got {0}")]
    InvalidStake(f64),
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// A saved set of filter predicates, a target market and a flat stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default)]
    pub name: String,
    pub market: Market,
    #[serde(default = "missing_stake", deserialize_with = "lenient_stake")]
    pub unit_stake: f64,

    /// Allowed seasons. Accepts a single value or a list on the wire.
    #[serde(default, deserialize_with = "season_list")]
    pub season: Vec<String>,
    #[serde(default)]
    pub leagues: Vec<String>,
    #[serde(default)]
    pub home_teams: Vec<String>,
    #[serde(default)]
    pub away_teams: Vec<String>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_rodada: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_rodada: Option<f64>,

    // Pre-match statistics
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_ppg_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_ppg_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_ppg_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_ppg_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_xg_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_xg_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_xg_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_xg_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_shots_on_target_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_shots_on_target_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_shots_on_target_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_shots_on_target_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_shots_off_target_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_shots_off_target_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_shots_off_target_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_shots_off_target_away: Option<f64>,

    // Goals
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_goals_ht_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_goals_ht_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_goals_ht_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_goals_ht_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_goals_ht_total: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_goals_ht_total: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_goals_ft_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_goals_ft_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_goals_ft_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_goals_ft_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_goals_ft_total: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_goals_ft_total: Option<f64>,

    // Table positions
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_ranking_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_ranking_home: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_ranking_away: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_ranking_away: Option<f64>,

    /// Bounds on the odds of the strategy's own market.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odds: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odds: Option<f64>,

    // Per-market odds, applied whatever market is being bet
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_h_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_h_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_d_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_d_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_a_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_a_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_h_ht: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_h_ht: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_d_ht: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_d_ht: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_a_ht: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_a_ht: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_over15_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_over15_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_over25_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_over25_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_under15_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_under15_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_under25_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_under25_ft: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_btts_yes: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_btts_yes: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_btts_no: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_btts_no: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_dc_1x: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_dc_1x: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_dc_12: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_dc_12: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_odd_dc_x2: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_odd_dc_x2: Option<f64>,
}

impl Strategy {
    /// An unrestricted strategy: every match with a price for `market` passes.
    pub fn new(name: &str, market: Market, unit_stake: f64) -> Self {
        Self {
            name: name.to_string(),
            market,
            unit_stake,
            season: Vec::new(),
            leagues: Vec::new(),
            home_teams: Vec::new(),
            away_teams: Vec::new(),
            start_date: None,
            end_date: None,
            min_rodada: None,
            max_rodada: None,
            min_ppg_home: None,
            max_ppg_home: None,
            min_ppg_away: None,
            max_ppg_away: None,
            min_xg_home: None,
            max_xg_home: None,
            min_xg_away: None,
            max_xg_away: None,
            min_shots_on_target_home: None,
            max_shots_on_target_home: None,
            min_shots_on_target_away: None,
            max_shots_on_target_away: None,
            min_shots_off_target_home: None,
            max_shots_off_target_home: None,
            min_shots_off_target_away: None,
            max_shots_off_target_away: None,
            min_goals_ht_home: None,
            max_goals_ht_home: None,
            min_goals_ht_away: None,
            max_goals_ht_away: None,
            min_goals_ht_total: None,
            max_goals_ht_total: None,
            min_goals_ft_home: None,
            max_goals_ft_home: None,
            min_goals_ft_away: None,
            max_goals_ft_away: None,
            min_goals_ft_total: None,
            max_goals_ft_total: None,
            min_ranking_home: None,
            max_ranking_home: None,
            min_ranking_away: None,
            max_ranking_away: None,
            min_odds: None,
            max_odds: None,
            min_odd_h_ft: None,
            max_odd_h_ft: None,
            min_odd_d_ft: None,
            max_odd_d_ft: None,
            min_odd_a_ft: None,
            max_odd_a_ft: None,
            min_odd_h_ht: None,
            max_odd_h_ht: None,
            min_odd_d_ht: None,
            max_odd_d_ht: None,
            min_odd_a_ht: None,
            max_odd_a_ht: None,
            min_odd_over15_ft: None,
            max_odd_over15_ft: None,
            min_odd_over25_ft: None,
            max_odd_over25_ft: None,
            min_odd_under15_ft: None,
            max_odd_under15_ft: None,
            min_odd_under25_ft: None,
            max_odd_under25_ft: None,
            min_odd_btts_yes: None,
            max_odd_btts_yes: None,
            min_odd_btts_no: None,
            max_odd_btts_no: None,
            min_odd_dc_1x: None,
            max_odd_dc_1x: None,
            min_odd_dc_12: None,
            max_odd_dc_12: None,
            min_odd_dc_x2: None,
            max_odd_dc_x2: None,
        }
    }

    /// Reject configurations the engine cannot evaluate.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !self.unit_stake.is_finite() || self.unit_stake <= 0.0 {
            return Err(StrategyError::InvalidStake(self.unit_stake));
        }
        Ok(())
    }

    pub fn rodada_bound(&self) -> Bound {
        Bound::new(self.min_rodada, self.max_rodada)
    }

    pub fn ranking_home_bound(&self) -> Bound {
        Bound::new(self.min_ranking_home, self.max_ranking_home)
    }

    pub fn ranking_away_bound(&self) -> Bound {
        Bound::new(self.min_ranking_away, self.max_ranking_away)
    }

    /// Bounds on the price of the market being bet.
    pub fn odds_bound(&self) -> Bound {
        Bound::new(self.min_odds, self.max_odds)
    }

    /// Bounds on a specific market's price, independent of the bet market.
    pub fn market_odds_bound(&self, market: Market) -> Bound {
        match market {
            Market::HomeWin => Bound::new(self.min_odd_h_ft, self.max_odd_h_ft),
            Market::Draw => Bound::new(self.min_odd_d_ft, self.max_odd_d_ft),
            Market::AwayWin => Bound::new(self.min_odd_a_ft, self.max_odd_a_ft),
            Market::HomeWinHt => Bound::new(self.min_odd_h_ht, self.max_odd_h_ht),
            Market::DrawHt => Bound::new(self.min_odd_d_ht, self.max_odd_d_ht),
            Market::AwayWinHt => Bound::new(self.min_odd_a_ht, self.max_odd_a_ht),
            Market::Over15 => Bound::new(self.min_odd_over15_ft, self.max_odd_over15_ft),
            Market::Over25 => Bound::new(self.min_odd_over25_ft, self.max_odd_over25_ft),
            Market::Under15 => Bound::new(self.min_odd_under15_ft, self.max_odd_under15_ft),
            Market::Under25 => Bound::new(self.min_odd_under25_ft, self.max_odd_under25_ft),
            Market::BttsYes => Bound::new(self.min_odd_btts_yes, self.max_odd_btts_yes),
            Market::BttsNo => Bound::new(self.min_odd_btts_no, self.max_odd_btts_no),
            Market::Dc1x => Bound::new(self.min_odd_dc_1x, self.max_odd_dc_1x),
            Market::Dc12 => Bound::new(self.min_odd_dc_12, self.max_odd_dc_12),
            Market::DcX2 => Bound::new(self.min_odd_dc_x2, self.max_odd_dc_x2),
        }
    }

    /// Bounds for one per-match statistic.
    pub fn stat_bound(&self, stat: MatchStat) -> Bound {
        match stat {
            MatchStat::PpgHome => Bound::new(self.min_ppg_home, self.max_ppg_home),
            MatchStat::PpgAway => Bound::new(self.min_ppg_away, self.max_ppg_away),
            MatchStat::XgHome => Bound::new(self.min_xg_home, self.max_xg_home),
            MatchStat::XgAway => Bound::new(self.min_xg_away, self.max_xg_away),
            MatchStat::ShotsOnTargetHome => {
                Bound::new(self.min_shots_on_target_home, self.max_shots_on_target_home)
            }
            MatchStat::ShotsOnTargetAway => {
                Bound::new(self.min_shots_on_target_away, self.max_shots_on_target_away)
            }
            MatchStat::ShotsOffTargetHome => {
                Bound::new(self.min_shots_off_target_home, self.max_shots_off_target_home)
            }
            MatchStat::ShotsOffTargetAway => {
                Bound::new(self.min_shots_off_target_away, self.max_shots_off_target_away)
            }
            MatchStat::GoalsHtHome => Bound::new(self.min_goals_ht_home, self.max_goals_ht_home),
            MatchStat::GoalsHtAway => Bound::new(self.min_goals_ht_away, self.max_goals_ht_away),
            MatchStat::GoalsHtTotal => Bound::new(self.min_goals_ht_total, self.max_goals_ht_total),
            MatchStat::GoalsFtHome => Bound::new(self.min_goals_ft_home, self.max_goals_ft_home),
            MatchStat::GoalsFtAway => Bound::new(self.min_goals_ft_away, self.max_goals_ft_away),
            MatchStat::GoalsFtTotal => Bound::new(self.min_goals_ft_total, self.max_goals_ft_total),
        }
    }

    /// Start of the date window (inclusive, midnight).
    pub fn window_start(&self) -> Option<chrono::NaiveDateTime> {
        self.start_date.map(|d| d.and_time(NaiveTime::MIN))
    }

    /// End of the date window (inclusive, last millisecond of the day).
    pub fn window_end(&self) -> Option<chrono::NaiveDateTime> {
        self.end_date
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
    }
}

// ---------------------------------------------------------------------------
// Per-match statistics
// ---------------------------------------------------------------------------

/// Numeric match columns a strategy can bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStat {
    PpgHome,
    PpgAway,
    XgHome,
    XgAway,
    ShotsOnTargetHome,
    ShotsOnTargetAway,
    ShotsOffTargetHome,
    ShotsOffTargetAway,
    GoalsHtHome,
    GoalsHtAway,
    GoalsHtTotal,
    GoalsFtHome,
    GoalsFtAway,
    GoalsFtTotal,
}

impl MatchStat {
    /// Evaluation order used by the filter.
    pub const ALL: &'static [MatchStat] = &[
        MatchStat::PpgHome,
        MatchStat::PpgAway,
        MatchStat::XgHome,
        MatchStat::XgAway,
        MatchStat::ShotsOnTargetHome,
        MatchStat::ShotsOnTargetAway,
        MatchStat::ShotsOffTargetHome,
        MatchStat::ShotsOffTargetAway,
        MatchStat::GoalsHtHome,
        MatchStat::GoalsHtAway,
        MatchStat::GoalsHtTotal,
        MatchStat::GoalsFtHome,
        MatchStat::GoalsFtAway,
        MatchStat::GoalsFtTotal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MatchStat::PpgHome => "ppg_home",
            MatchStat::PpgAway => "ppg_away",
            MatchStat::XgHome => "xg_home",
            MatchStat::XgAway => "xg_away",
            MatchStat::ShotsOnTargetHome => "shots_on_target_home",
            MatchStat::ShotsOnTargetAway => "shots_on_target_away",
            MatchStat::ShotsOffTargetHome => "shots_off_target_home",
            MatchStat::ShotsOffTargetAway => "shots_off_target_away",
            MatchStat::GoalsHtHome => "goals_ht_home",
            MatchStat::GoalsHtAway => "goals_ht_away",
            MatchStat::GoalsHtTotal => "goals_ht_total",
            MatchStat::GoalsFtHome => "goals_ft_home",
            MatchStat::GoalsFtAway => "goals_ft_away",
            MatchStat::GoalsFtTotal => "goals_ft_total",
        }
    }

    /// Read the statistic off a match.
    pub fn value(&self, game: &GameData) -> Option<f64> {
        match self {
            MatchStat::PpgHome => game.ppg_home,
            MatchStat::PpgAway => game.ppg_away,
            MatchStat::XgHome => game.xg_home,
            MatchStat::XgAway => game.xg_away,
            MatchStat::ShotsOnTargetHome => game.shots_on_target_home,
            MatchStat::ShotsOnTargetAway => game.shots_on_target_away,
            MatchStat::ShotsOffTargetHome => game.shots_off_target_home,
            MatchStat::ShotsOffTargetAway => game.shots_off_target_away,
            MatchStat::GoalsHtHome => game.goals_ht_home.map(f64::from),
            MatchStat::GoalsHtAway => game.goals_ht_away.map(f64::from),
            MatchStat::GoalsHtTotal => game.goals_ht_total().map(f64::from),
            MatchStat::GoalsFtHome => game.goals_ft_home.map(f64::from),
            MatchStat::GoalsFtAway => game.goals_ft_away.map(f64::from),
            MatchStat::GoalsFtTotal => game.goals_ft_total().map(f64::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// Season filter as a list: `"2023"`, `2023` and `["2023", 2024]` all work.
fn season_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    fn one(value: Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter_map(one).collect(),
        other => one(other).into_iter().collect(),
    })
}

fn missing_stake() -> f64 {
    f64::NAN
}

fn lenient_stake<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de::lenient_f64(deserializer)?.unwrap_or(f64::NAN))
}

/// Calendar date of a window bound. Offset timestamps keep their local date.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let Some(raw) = value.as_str().map(str::trim) else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.date_naive()));
    }
    Ok(de::parse_datetime(raw).map(|dt| dt.date()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
