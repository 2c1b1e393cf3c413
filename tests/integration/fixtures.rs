//! Shared match builders.

use chrono::{NaiveDate, NaiveDateTime};
use oddslab::{GameData, HomeRanking};

pub fn kickoff(day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 3, day).and_then(|d| d.and_hms_opt(20, 0, 0))
}

/// A fully-played Serie A match priced at 2.0 on every 1X2 outcome.
pub fn game(day: u32, home: &str, away: &str, goals: (u32, u32)) -> GameData {
    GameData {
        league: "Serie A".into(),
        season: "2024".into(),
        date: kickoff(day),
        rodada: Some(day as f64),
        home: home.into(),
        away: away.into(),
        goals_ht_home: Some(0),
        goals_ht_away: Some(0),
        goals_ft_home: Some(goals.0),
        goals_ft_away: Some(goals.1),
        odd_h_ft: Some(2.0),
        odd_d_ft: Some(3.2),
        odd_a_ft: Some(3.8),
        odd_over25_ft: Some(1.9),
        ppg_home: Some(1.5),
        xg_home: Some(1.4),
        ..GameData::default()
    }
}

/// Home-win sequence: `true` is a 2-0 home win, `false` a 0-1 home loss.
pub fn home_sequence(results: &[bool]) -> Vec<GameData> {
    results
        .iter()
        .enumerate()
        .map(|(i, &won)| {
            let goals = if won { (2, 0) } else { (0, 1) };
            game(i as u32 + 1, &format!("Home{i}"), &format!("Away{i}"), goals)
        })
        .collect()
}

pub fn home_ranking(team: &str, position: u32) -> HomeRanking {
    HomeRanking {
        league: "Serie A".into(),
        season: "2024".into(),
        team: team.into(),
        ranking_home: Some(position),
    }
}
