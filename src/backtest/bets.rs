//! Bet generation.
//!
//! Turns each eligible match into one flat-stake bet on the strategy's
//! market: resolved odds, settled outcome and signed profit.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::prelude::*;

use crate::strategy::Strategy;
use crate::types::{BetOutcome, GameData};

/// A hypothetical bet placed on one historical match.
#[derive(Debug, Clone, PartialEq)]
pub struct Bet<'a> {
    pub game: &'a GameData,
    /// Price for the strategy's market; 0 when the column is empty.
    pub odds: f64,
    pub outcome: BetOutcome,
    pub stake: Decimal,
    pub profit: Decimal,
    pub date: Option<NaiveDateTime>,
    /// `"home vs away"`
    pub label: String,
    /// Full-time `"H-A"`, when known.
    pub score: Option<String>,
}

impl<'a> Bet<'a> {
    /// Place a flat-stake bet on `game` for the strategy's market.
    pub fn place(strategy: &Strategy, game: &'a GameData) -> Self {
        let odds = game.odds_for(strategy.market).unwrap_or(0.0);
        let outcome = strategy.market.settle(game);
        let stake = to_decimal(strategy.unit_stake);
        let profit = settle_profit(outcome, odds, stake);

        Self {
            game,
            odds,
            outcome,
            stake,
            profit,
            date: game.date,
            label: game.fixture(),
            score: game.score(),
        }
    }

    /// Counts towards statistics: settled and priced.
    pub fn is_valid(&self) -> bool {
        self.outcome != BetOutcome::Undefined && has_price(self.odds)
    }

    pub fn is_win(&self) -> bool {
        self.outcome == BetOutcome::Win
    }
}

fn has_price(odds: f64) -> bool {
    odds.is_finite() && odds > 0.0
}

/// Decimal value of a price or stake as written in the source data.
///
/// Goes through the shortest `f64` rendering so `1.01` stays `1.01`
/// rather than its binary expansion.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64_retain(value))
        .unwrap_or(Decimal::ZERO)
}

/// Signed profit of a settled bet at decimal `odds`.
pub fn settle_profit(outcome: BetOutcome, odds: f64, stake: Decimal) -> Decimal {
    match outcome {
        BetOutcome::Undefined => Decimal::ZERO,
        _ if !has_price(odds) => -stake,
        BetOutcome::Win => (to_decimal(odds) - Decimal::ONE).saturating_mul(stake),
        BetOutcome::Loss => -stake,
    }
}

/// One bet per match, in input order.
pub fn generate_bets<'a>(strategy: &Strategy, matches: &[&'a GameData]) -> Vec<Bet<'a>> {
    matches.iter().copied().map(|game| Bet::place(strategy, game)).collect()
}
