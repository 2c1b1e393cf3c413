//! Single-strategy engine behaviour.

use oddslab::backtest::bets::{generate_bets, settle_profit};
use oddslab::backtest::filter::filter_matches;
use oddslab::{run_backtest, BetOutcome, GameData, Market, Strategy, StrategyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{game, home_ranking, home_sequence};

fn home_win(stake: f64) -> Strategy {
    Strategy::new("home", Market::HomeWin, stake)
}

#[test]
fn test_streaks_over_sequence() {
    let mut games = home_sequence(&[true, true, false, true, true, true, false]);
    // Input order must not matter, only kickoff order.
    games.reverse();

    let report = run_backtest(&home_win(10.0), &games, &[], &[]).unwrap();

    assert_eq!(report.valid_bets, 7);
    assert_eq!(report.streaks.max_winning_streak, 3);
    assert_eq!(report.streaks.max_winning_streak_profit, dec!(30));
    assert_eq!(report.streaks.max_losing_streak, 1);
    assert_eq!(report.streaks.max_losing_streak_loss, dec!(-10));
    assert_eq!(report.total_profit, dec!(30));
}

#[test]
fn test_roi_break_even() {
    let games = home_sequence(&[true, false, true, false]);
    let report = run_backtest(&home_win(10.0), &games, &[], &[]).unwrap();

    assert_eq!(report.valid_bets, 4);
    assert_eq!(report.total_profit, Decimal::ZERO);
    assert_eq!(report.roi, 0.0);
    assert_eq!(report.hit_rate, 50.0);
    assert_eq!(report.total_staked, dec!(40));
    assert_eq!(report.average_odds, 2.0);
    assert_eq!(report.max_drawdown, dec!(10));
}

#[test]
fn test_identical_runs_serialise_identically() {
    let mut games = home_sequence(&[true, false, false, true, true]);
    games.push(game(9, "Roma", "Lazio", (1, 1)));
    games.push(GameData {
        date: None,
        ..game(10, "Inter", "Milan", (3, 2))
    });
    let strategy = home_win(5.0);

    let run = || {
        let report = run_backtest(&strategy, &games, &[], &[]).unwrap();
        serde_json::to_string(&report).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_extra_bounds_never_widen_filter() {
    let games: Vec<GameData> = (1..=12)
        .map(|d| {
            let mut g = game(d, &format!("H{d}"), &format!("A{d}"), (d % 3, 1));
            g.odd_h_ft = Some(1.5 + d as f64 * 0.1);
            g.ppg_home = if d % 4 == 0 { None } else { Some(d as f64 * 0.2) };
            g
        })
        .collect();

    let mut strategy = home_win(10.0);
    let mut previous = filter_matches(&strategy, &games, &[], &[]).len();
    assert_eq!(previous, 12);

    let steps: Vec<Box<dyn Fn(&mut Strategy)>> = vec![
        Box::new(|s: &mut Strategy| s.min_odds = Some(1.8)),
        Box::new(|s: &mut Strategy| s.max_odd_d_ft = Some(3.5)),
        Box::new(|s: &mut Strategy| s.min_ppg_home = Some(1.0)),
        Box::new(|s: &mut Strategy| s.max_rodada = Some(10.0)),
        Box::new(|s: &mut Strategy| s.leagues = vec!["Serie A".into()]),
    ];

    for step in steps {
        step(&mut strategy);
        let count = filter_matches(&strategy, &games, &[], &[]).len();
        assert!(count <= previous, "bound widened the filter: {count} > {previous}");
        previous = count;
    }
    assert!(previous > 0);
}

#[test]
fn test_profit_follows_outcome() {
    let mut games = home_sequence(&[true, false]);
    games.push(GameData {
        goals_ft_home: None,
        ..game(5, "Napoli", "Genoa", (0, 0))
    });
    let strategy = home_win(10.0);
    let refs: Vec<&GameData> = games.iter().collect();

    for bet in generate_bets(&strategy, &refs) {
        let expected = match bet.outcome {
            BetOutcome::Win => dec!(10),
            BetOutcome::Loss => dec!(-10),
            BetOutcome::Undefined => Decimal::ZERO,
        };
        assert_eq!(bet.profit, expected);
        assert_eq!(bet.profit, settle_profit(bet.outcome, bet.odds, dec!(10)));
    }

    let report = run_backtest(&strategy, &games, &[], &[]).unwrap();
    assert_eq!(report.undefined_bets, 1);
    assert_eq!(report.valid_bets, 2);
}

#[test]
fn test_missing_ranking_excludes_match() {
    let games = vec![
        game(1, "Juventus", "Torino", (1, 0)),
        game(2, "Atalanta", "Bologna", (1, 0)),
    ];
    let mut strategy = home_win(10.0);
    strategy.min_ranking_home = Some(1.0);

    let rankings = vec![home_ranking("Juventus", 2)];
    let report = run_backtest(&strategy, &games, &rankings, &[]).unwrap();

    assert_eq!(report.total_matches, 2);
    assert_eq!(report.filtered_matches, 1);
    assert_eq!(report.recent_bets[0].label, "Juventus vs Torino");
}

#[test]
fn test_zero_primary_odds_excluded() {
    let mut unpriced = game(2, "Cagliari", "Empoli", (2, 0));
    unpriced.odd_h_ft = Some(0.0);
    let games = vec![game(1, "Lecce", "Monza", (2, 0)), unpriced];

    let report = run_backtest(&home_win(10.0), &games, &[], &[]).unwrap();
    assert_eq!(report.filtered_matches, 1);
    assert_eq!(report.total_profit, dec!(10));
}

#[test]
fn test_common_score_percentage() {
    let scores = [(1, 0), (1, 0), (1, 0), (2, 0), (2, 0), (0, 1), (0, 2), (3, 1), (2, 1), (0, 0)];
    let games: Vec<GameData> = scores
        .iter()
        .enumerate()
        .map(|(i, &s)| game(i as u32 + 1, &format!("H{i}"), &format!("A{i}"), s))
        .collect();

    let report = run_backtest(&home_win(10.0), &games, &[], &[]).unwrap();
    assert_eq!(report.valid_bets, 10);

    let top = &report.common_scores[0];
    assert_eq!(top.score, "1-0");
    assert_eq!(top.count, 3);
    assert_eq!(top.percentage, "30.0");
    assert_eq!(report.common_scores[1].percentage, "20.0");
    assert_eq!(report.common_scores.len(), 5);
}

#[test]
fn test_empty_input_has_zeroed_report() {
    let report = run_backtest(&home_win(10.0), &[], &[], &[]).unwrap();
    assert_eq!(report.valid_bets, 0);
    assert_eq!(report.roi, 0.0);
    assert_eq!(report.hit_rate, 0.0);
    assert!(report.evolution.is_empty());
    assert!(report.common_scores.is_empty());
}

#[test]
fn test_non_positive_stake_rejected() {
    let err = run_backtest(&home_win(0.0), &home_sequence(&[true]), &[], &[]).unwrap_err();
    assert_eq!(err, StrategyError::InvalidStake(0.0));
}

#[test]
fn test_strategy_from_json() {
    let json = r#"{
        "name": "Home favourites",
        "market": "home_win",
        "unit_stake": 25,
        "season": 2024,
        "leagues": ["Serie A"],
        "start_date": "2024-03-02",
        "end_date": "2024-03-04",
        "max_odds": 2.5
    }"#;
    let strategy: Strategy = serde_json::from_str(json).unwrap();
    assert_eq!(strategy.season, vec!["2024".to_string()]);

    let games = home_sequence(&[true, true, false, true, false]);
    let report = run_backtest(&strategy, &games, &[], &[]).unwrap();
    // Days 2, 3 and 4 inclusive.
    assert_eq!(report.filtered_matches, 3);
    assert_eq!(report.wins, 2);
    assert_eq!(report.total_profit, dec!(25));
}

#[test]
fn test_break_even_league_not_ranked() {
    let mut games = home_sequence(&[true, true, true, false]);
    for (g, odds) in games.iter_mut().zip([1.01, 1.12, 1.87, 2.4]) {
        g.league = "Flat".into();
        g.odd_h_ft = Some(odds);
    }

    let report = run_backtest(&home_win(10.0), &games, &[], &[]).unwrap();
    assert_eq!(report.total_profit, Decimal::ZERO);
    assert_eq!(report.roi, 0.0);
    assert!(report.best_leagues.is_empty());
    assert!(report.worst_leagues.is_empty());
}

#[test]
fn test_lenient_bounds_do_not_break_strategy() {
    let json = r#"{"market": "home_win", "unit_stake": 10, "min_odds": "", "max_odds": "2.5"}"#;
    let strategy: Strategy = serde_json::from_str(json).unwrap();
    assert_eq!(strategy.min_odds, None);
    assert_eq!(strategy.max_odds, Some(2.5));

    let mut games = home_sequence(&[true, true]);
    games[1].odd_h_ft = Some(3.0);
    let report = run_backtest(&strategy, &games, &[], &[]).unwrap();
    assert_eq!(report.filtered_matches, 1);
}
