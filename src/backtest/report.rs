//! Result aggregation.
//!
//! Reduces a bet list into the performance report: hit rate, ROI, streaks,
//! league and team breakdowns, common scorelines, a recent-bet sample and
//! the equity curve. Only valid bets (settled, priced) are counted.
//! Nothing here fails; empty input yields a zeroed report.
//!
//! Money (stakes, profits, drawdown) is summed in `Decimal` so break-even
//! tallies land on exactly zero. Rates are converted to `f64` at the end.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::bets::{to_decimal, Bet};
use crate::strategy::Strategy;
use crate::types::{BetOutcome, Market};

/// Entries kept in each best/worst breakdown list.
pub const BREAKDOWN_SIZE: usize = 10;
/// Scorelines kept in the common-score list.
pub const COMMON_SCORES_SIZE: usize = 5;
/// Bets kept in the recent sample.
pub const RECENT_SAMPLE_SIZE: usize = 20;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Complete backtest performance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub market: Market,
    pub unit_stake: Decimal,
    /// Matches handed to the engine.
    pub total_matches: usize,
    /// Matches that passed every filter.
    pub filtered_matches: usize,
    /// One per filtered match.
    pub total_bets: usize,
    pub valid_bets: usize,
    /// Bets that could not be settled for lack of goal data.
    pub undefined_bets: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent of valid bets won.
    pub hit_rate: f64,
    pub total_profit: Decimal,
    pub total_staked: Decimal,
    /// Percent return on total stake.
    pub roi: f64,
    pub average_odds: f64,
    /// Largest peak-to-trough fall of the equity curve.
    pub max_drawdown: Decimal,
    #[serde(flatten)]
    pub streaks: Streaks,
    pub best_leagues: Vec<Breakdown>,
    pub worst_leagues: Vec<Breakdown>,
    pub best_teams: Vec<Breakdown>,
    pub worst_teams: Vec<Breakdown>,
    pub common_scores: Vec<ScoreFrequency>,
    /// Most recent first.
    pub recent_bets: Vec<RecentBet>,
    /// Chronological, one point per valid bet.
    pub evolution: Vec<EquityPoint>,
}

/// Longest winning and losing runs and what they were worth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streaks {
    pub max_winning_streak: usize,
    pub max_winning_streak_profit: Decimal,
    pub max_losing_streak: usize,
    /// Sum of the losing run's profits (zero or negative).
    pub max_losing_streak_loss: Decimal,
}

/// Profit tally for one league or team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub name: String,
    pub profit: Decimal,
    pub bets: usize,
    pub avg_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFrequency {
    pub score: String,
    pub count: usize,
    /// Share of valid bets, one decimal (`"30.0"`).
    pub percentage: String,
}

/// Display row for the recent-bet sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentBet {
    pub date: Option<NaiveDateTime>,
    pub league: String,
    pub season: String,
    #[serde(rename = "match")]
    pub label: String,
    pub score: Option<String>,
    pub odds: f64,
    pub result: BetOutcome,
    pub profit: Decimal,
}

/// One point of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 1-based.
    pub bet_number: usize,
    pub cumulative_profit: Decimal,
    /// ROI against the stake committed up to this bet.
    pub roi: f64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Build the report from bets in chronological order.
///
/// `total_matches` and `filtered_matches` are both set to the bet count; the
/// orchestrator overwrites `total_matches` with the input size.
pub fn aggregate(bets: &[Bet<'_>], strategy: &Strategy) -> BacktestReport {
    let stake = to_decimal(strategy.unit_stake);
    let valid: Vec<&Bet<'_>> = bets.iter().filter(|b| b.is_valid()).collect();
    let valid_count = valid.len();

    let wins = valid.iter().filter(|b| b.is_win()).count();
    let losses = valid_count - wins;
    let undefined_bets = bets
        .iter()
        .filter(|b| b.outcome == BetOutcome::Undefined)
        .count();

    let total_profit: Decimal = valid.iter().map(|b| b.profit).sum();
    let total_staked = stake * Decimal::from(valid_count);

    let hit_rate = percent(wins as f64, valid_count as f64);
    let roi = money_percent(total_profit, total_staked);
    let average_odds = if valid_count > 0 {
        valid.iter().map(|b| b.odds).sum::<f64>() / valid_count as f64
    } else {
        0.0
    };

    let (evolution, max_drawdown) = equity_curve(&valid, stake);

    let mut leagues = Tally::default();
    let mut teams = Tally::default();
    for bet in &valid {
        leagues.add(&bet.game.league, bet.profit);
        teams.add(&bet.game.home, bet.profit);
        teams.add(&bet.game.away, bet.profit);
    }
    let (best_leagues, worst_leagues) = leagues.ranked();
    let (best_teams, worst_teams) = teams.ranked();

    BacktestReport {
        market: strategy.market,
        unit_stake: stake,
        total_matches: bets.len(),
        filtered_matches: bets.len(),
        total_bets: bets.len(),
        valid_bets: valid_count,
        undefined_bets,
        wins,
        losses,
        hit_rate,
        total_profit,
        total_staked,
        roi,
        average_odds,
        max_drawdown,
        streaks: compute_streaks(&valid),
        best_leagues,
        worst_leagues,
        best_teams,
        worst_teams,
        common_scores: common_scores(&valid),
        recent_bets: recent_sample(&valid),
        evolution,
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn money_percent(part: Decimal, whole: Decimal) -> f64 {
    if whole > Decimal::ZERO {
        (part / whole * dec!(100)).to_f64().unwrap_or(0.0)
    } else {
        0.0
    }
}

/// Single forward pass over valid bets.
///
/// A run longer than the recorded maximum replaces it. A run of equal
/// length replaces only the associated amount, and only when it is more
/// extreme: higher profit for wins, lower for losses.
pub fn compute_streaks(valid: &[&Bet<'_>]) -> Streaks {
    let mut streaks = Streaks::default();
    let mut win_run = 0usize;
    let mut win_profit = Decimal::ZERO;
    let mut loss_run = 0usize;
    let mut loss_amount = Decimal::ZERO;

    for bet in valid {
        if bet.is_win() {
            win_run += 1;
            win_profit += bet.profit;
            loss_run = 0;
            loss_amount = Decimal::ZERO;

            if win_run > streaks.max_winning_streak {
                streaks.max_winning_streak = win_run;
                streaks.max_winning_streak_profit = win_profit;
            } else if win_run == streaks.max_winning_streak
                && win_profit > streaks.max_winning_streak_profit
            {
                streaks.max_winning_streak_profit = win_profit;
            }
        } else {
            loss_run += 1;
            loss_amount += bet.profit;
            win_run = 0;
            win_profit = Decimal::ZERO;

            if loss_run > streaks.max_losing_streak {
                streaks.max_losing_streak = loss_run;
                streaks.max_losing_streak_loss = loss_amount;
            } else if loss_run == streaks.max_losing_streak
                && loss_amount < streaks.max_losing_streak_loss
            {
                streaks.max_losing_streak_loss = loss_amount;
            }
        }
    }

    streaks
}

/// Cumulative profit per bet plus the largest drawdown along the way.
fn equity_curve(valid: &[&Bet<'_>], stake: Decimal) -> (Vec<EquityPoint>, Decimal) {
    let mut points = Vec::with_capacity(valid.len());
    let mut cumulative = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;

    for (i, bet) in valid.iter().enumerate() {
        cumulative += bet.profit;
        let bet_number = i + 1;
        points.push(EquityPoint {
            bet_number,
            cumulative_profit: cumulative,
            roi: money_percent(cumulative, stake * Decimal::from(bet_number)),
        });

        peak = peak.max(cumulative);
        max_drawdown = max_drawdown.max(peak - cumulative);
    }

    (points, max_drawdown)
}

/// Top scorelines by count; ties keep first-seen order.
fn common_scores(valid: &[&Bet<'_>]) -> Vec<ScoreFrequency> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for score in valid.iter().filter_map(|b| b.score.as_ref()) {
        match index.get(score) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(score.clone(), order.len());
                order.push((score.clone(), 1));
            }
        }
    }

    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(COMMON_SCORES_SIZE)
        .map(|(score, count)| ScoreFrequency {
            score,
            count,
            percentage: format!("{:.1}", percent(count as f64, valid.len() as f64)),
        })
        .collect()
}

/// Most recent valid bets, newest first. Undated bets sort last.
fn recent_sample(valid: &[&Bet<'_>]) -> Vec<RecentBet> {
    let mut by_date: Vec<&Bet<'_>> = valid.to_vec();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));
    by_date
        .into_iter()
        .take(RECENT_SAMPLE_SIZE)
        .map(|bet| RecentBet {
            date: bet.date,
            league: bet.game.league.clone(),
            season: bet.game.season.clone(),
            label: bet.label.clone(),
            score: bet.score.clone(),
            odds: bet.odds,
            result: bet.outcome,
            profit: bet.profit,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Breakdown tally
// ---------------------------------------------------------------------------

/// Profit and bet count per name, in first-seen order.
#[derive(Debug, Default)]
struct Tally {
    entries: Vec<(String, Decimal, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, name: &str, profit: Decimal) {
        match self.index.get(name) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.1 += profit;
                entry.2 += 1;
            }
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), profit, 1));
            }
        }
    }

    /// (best, worst): positive profit descending, negative profit ascending.
    /// Break-even entries appear in neither list.
    fn ranked(&self) -> (Vec<Breakdown>, Vec<Breakdown>) {
        let to_breakdown = |(name, profit, bets): &(String, Decimal, usize)| Breakdown {
            name: name.clone(),
            profit: *profit,
            bets: *bets,
            avg_profit: (*profit / Decimal::from(*bets)).to_f64().unwrap_or(0.0),
        };

        let mut best: Vec<Breakdown> = self
            .entries
            .iter()
            .filter(|e| e.1 > Decimal::ZERO)
            .map(to_breakdown)
            .collect();
        best.sort_by(|a, b| b.profit.cmp(&a.profit));
        best.truncate(BREAKDOWN_SIZE);

        let mut worst: Vec<Breakdown> = self
            .entries
            .iter()
            .filter(|e| e.1 < Decimal::ZERO)
            .map(to_breakdown)
            .collect();
        worst.sort_by(|a, b| a.profit.cmp(&b.profit));
        worst.truncate(BREAKDOWN_SIZE);

        (best, worst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameData;
    use chrono::NaiveDate;

    /// Build settled home-win games: `true` = home won.
    fn games(results: &[bool]) -> Vec<GameData> {
        results
            .iter()
            .enumerate()
            .map(|(i, won)| GameData {
                league: "L".into(),
                season: "2024".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32)
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
                home: format!("H{i}"),
                away: format!("A{i}"),
                goals_ft_home: Some(if *won { 1 } else { 0 }),
                goals_ft_away: Some(0),
                odd_h_ft: Some(2.0),
                ..GameData::default()
            })
            .collect()
    }

    fn report_for(games: &[GameData], stake: f64) -> BacktestReport {
        let strategy = Strategy::new("t", Market::HomeWin, stake);
        let bets: Vec<Bet<'_>> = games.iter().map(|g| Bet::place(&strategy, g)).collect();
        aggregate(&bets, &strategy)
    }

    #[test]
    fn test_empty_report_is_zeroed() {
        let r = report_for(&[], 10.0);
        assert_eq!(r.total_bets, 0);
        assert_eq!(r.valid_bets, 0);
        assert_eq!(r.hit_rate, 0.0);
        assert_eq!(r.roi, 0.0);
        assert_eq!(r.average_odds, 0.0);
        assert_eq!(r.streaks, Streaks::default());
        assert!(r.best_leagues.is_empty());
        assert!(r.common_scores.is_empty());
        assert!(r.recent_bets.is_empty());
        assert!(r.evolution.is_empty());
    }

    #[test]
    fn test_streak_sequence() {
        let r = report_for(&games(&[true, true, false, true, true, true, false]), 10.0);
        assert_eq!(r.streaks.max_winning_streak, 3);
        assert_eq!(r.streaks.max_winning_streak_profit, dec!(30));
        assert_eq!(r.streaks.max_losing_streak, 1);
        assert_eq!(r.streaks.max_losing_streak_loss, dec!(-10));
    }

    #[test]
    fn test_equal_streak_keeps_more_profitable() {
        let mut g = games(&[true, true, false, true, true]);
        // Second two-win run pays more.
        g[3].odd_h_ft = Some(3.0);
        g[4].odd_h_ft = Some(3.0);
        let r = report_for(&g, 10.0);
        assert_eq!(r.streaks.max_winning_streak, 2);
        assert_eq!(r.streaks.max_winning_streak_profit, dec!(40));

        // Reversed: the first run pays more and is kept.
        let mut g = games(&[true, true, false, true, true]);
        g[0].odd_h_ft = Some(3.0);
        g[1].odd_h_ft = Some(3.0);
        let r = report_for(&g, 10.0);
        assert_eq!(r.streaks.max_winning_streak_profit, dec!(40));
    }

    #[test]
    fn test_equal_losing_streak_keeps_most_negative() {
        let g = games(&[false, false, true, false, false]);
        let strategy = Strategy::new("t", Market::HomeWin, 10.0);
        let mut bets: Vec<Bet<'_>> = g.iter().map(|g| Bet::place(&strategy, g)).collect();
        bets[3].profit = dec!(-15);
        bets[4].profit = dec!(-15);

        let refs: Vec<&Bet<'_>> = bets.iter().collect();
        let streaks = compute_streaks(&refs);
        assert_eq!(streaks.max_losing_streak, 2);
        assert_eq!(streaks.max_losing_streak_loss, dec!(-30));

        // A shallower run of the same length does not replace it.
        let refs: Vec<&Bet<'_>> = bets.iter().rev().collect();
        assert_eq!(compute_streaks(&refs).max_losing_streak_loss, dec!(-30));
    }

    #[test]
    fn test_roi_scenario() {
        let r = report_for(&games(&[true, false, true, false]), 10.0);
        assert_eq!(r.valid_bets, 4);
        assert_eq!(r.total_profit, Decimal::ZERO);
        assert_eq!(r.roi, 0.0);
        assert_eq!(r.hit_rate, 50.0);
        assert_eq!(r.total_staked, dec!(40));
        assert_eq!(r.average_odds, 2.0);
    }

    #[test]
    fn test_undefined_and_unpriced_excluded() {
        let mut g = games(&[true, true, false]);
        g[0].goals_ft_home = None;
        g[1].odd_h_ft = None;
        let r = report_for(&g, 10.0);
        assert_eq!(r.total_bets, 3);
        assert_eq!(r.undefined_bets, 1);
        assert_eq!(r.valid_bets, 1);
        assert_eq!(r.losses, 1);
        assert_eq!(r.total_profit, dec!(-10));
        assert_eq!(r.evolution.len(), 1);
    }

    #[test]
    fn test_common_score_percentage() {
        let mut g = games(&[true; 10]);
        for (i, game) in g.iter_mut().enumerate() {
            let (h, a) = match i {
                0..=2 => (1, 0),
                3..=4 => (2, 0),
                _ => (3 + i as u32, 1),
            };
            game.goals_ft_home = Some(h);
            game.goals_ft_away = Some(a);
        }
        let r = report_for(&g, 10.0);
        assert_eq!(r.common_scores.len(), 5);
        assert_eq!(r.common_scores[0].score, "1-0");
        assert_eq!(r.common_scores[0].count, 3);
        assert_eq!(r.common_scores[0].percentage, "30.0");
        assert_eq!(r.common_scores[1].score, "2-0");
        assert_eq!(r.common_scores[1].percentage, "20.0");
        // Singletons in first-seen order.
        assert_eq!(r.common_scores[2].score, "8-1");
        assert_eq!(r.common_scores[2].percentage, "10.0");
    }

    #[test]
    fn test_breakdowns_split_by_sign() {
        let mut g = games(&[true, false, true, false]);
        g[0].league = "Up".into();
        g[1].league = "Down".into();
        g[2].league = "Flat".into();
        g[3].league = "Flat".into();
        g[0].home = "Winner".into();
        g[2].home = "Winner".into();
        let r = report_for(&g, 10.0);

        assert_eq!(r.best_leagues.len(), 1);
        assert_eq!(r.best_leagues[0].name, "Up");
        assert_eq!(r.worst_leagues.len(), 1);
        assert_eq!(r.worst_leagues[0].name, "Down");
        assert_eq!(r.worst_leagues[0].avg_profit, -10.0);

        let winner = r.best_teams.iter().find(|t| t.name == "Winner").unwrap();
        assert_eq!(winner.bets, 2);
        assert_eq!(winner.profit, dec!(20));
        assert_eq!(r.best_teams[0].name, "Winner");
        // Away sides share the tally of the same bets.
        assert!(r.best_teams.iter().any(|t| t.name == "A0"));
        assert!(r.worst_teams.iter().any(|t| t.name == "A1"));
    }

    #[test]
    fn test_breakdowns_capped_and_ordered() {
        let mut g = games(&[true; 12]);
        for (i, game) in g.iter_mut().enumerate() {
            game.league = format!("L{i}");
            game.odd_h_ft = Some(1.5 + i as f64 * 0.1);
        }
        let r = report_for(&g, 10.0);
        assert_eq!(r.best_leagues.len(), BREAKDOWN_SIZE);
        assert_eq!(r.best_leagues[0].name, "L11");
        assert!(r
            .best_leagues
            .windows(2)
            .all(|w| w[0].profit >= w[1].profit));
    }

    #[test]
    fn test_equity_curve_and_drawdown() {
        let r = report_for(&games(&[true, false, false, true]), 10.0);
        let cumulative: Vec<Decimal> = r.evolution.iter().map(|p| p.cumulative_profit).collect();
        assert_eq!(cumulative, vec![dec!(10), dec!(0), dec!(-10), dec!(0)]);
        assert_eq!(r.evolution[0].bet_number, 1);
        assert_eq!(r.evolution[0].roi, 100.0);
        assert!((r.evolution[2].roi + 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(r.evolution[3].roi, 0.0);
        assert_eq!(r.max_drawdown, dec!(20));
    }

    #[test]
    fn test_recent_sample_newest_first() {
        let r = report_for(&games(&[true; 25]), 1.0);
        assert_eq!(r.recent_bets.len(), RECENT_SAMPLE_SIZE);
        assert_eq!(r.recent_bets[0].label, "H24 vs A24");
        assert!(r.recent_bets.windows(2).all(|w| w[0].date >= w[1].date));
        // Evolution stays chronological.
        assert_eq!(r.evolution.len(), 25);
        assert_eq!(r.evolution[24].cumulative_profit, dec!(25));
    }

    #[test]
    fn test_break_even_league_is_exactly_zero() {
        // 0.1 + 1.2 + 8.7 - 10 sums to zero only in decimal arithmetic.
        let mut g = games(&[true, true, true, false]);
        for (game, odds) in g.iter_mut().zip([1.01, 1.12, 1.87, 2.0]) {
            game.league = "Flat".into();
            game.odd_h_ft = Some(odds);
        }
        let r = report_for(&g, 10.0);
        assert_eq!(r.total_profit, Decimal::ZERO);
        assert_eq!(r.roi, 0.0);
        assert!(r.best_leagues.is_empty());
        assert!(r.worst_leagues.is_empty());
        assert_eq!(r.evolution[3].cumulative_profit, Decimal::ZERO);
    }

    #[test]
    fn test_report_serializes_flat_streak_fields() {
        let r = report_for(&games(&[true]), 10.0);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["max_winning_streak"], 1);
        assert_eq!(json["market"], "home_win");
        assert_eq!(json["total_profit"], 10.0);
        assert_eq!(json["recent_bets"][0]["match"], "H0 vs A0");
        assert_eq!(json["recent_bets"][0]["result"], "win");
    }
}
