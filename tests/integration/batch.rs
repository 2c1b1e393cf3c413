//! JSON dataset on disk through the batch runner and into saved runs.

use std::path::{Path, PathBuf};

use oddslab::data::{json, DataSource, JsonDirSource};
use oddslab::engine::BatchRunner;
use oddslab::storage::{self, SavedRun};
use oddslab::Market;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn temp_dir(label: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("oddslab_it_{label}_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&p).unwrap();
    p
}

const MATCHES: &str = r#"[
    {"league": "Brasileirao", "season": 2023, "date": "2023-05-01 19:00:00", "rodada": "1",
     "home": "Palmeiras", "away": "Santos",
     "goals_ht_home": 1, "goals_ht_away": 0, "goals_ft_home": 2, "goals_ft_away": 1,
     "odd_h_ft": 1.8, "odd_d_ft": 3.4, "odd_a_ft": 4.5, "odd_over25_ft": "2.05"},
    {"league": "Brasileirao", "season": "2023", "date": "2023-05-08", "rodada": 2,
     "home": "Flamengo", "away": "Gremio",
     "goals_ht_home": 0, "goals_ht_away": 0, "goals_ft_home": 0, "goals_ft_away": 0,
     "odd_h_ft": 1.6, "odd_d_ft": 3.9, "odd_a_ft": 5.5, "odd_over25_ft": 1.85},
    {"league": "Brasileirao", "season": "2023", "date": "2023-05-15T21:30:00", "rodada": 3,
     "home": "Santos", "away": "Flamengo",
     "goals_ht_home": 1, "goals_ht_away": 2, "goals_ft_home": 1, "goals_ft_away": 3,
     "odd_h_ft": 2.9, "odd_d_ft": 3.3, "odd_a_ft": 2.4, "odd_over25_ft": 1.95},
    {"league": "Brasileirao", "season": "2023", "date": "", "home": "Gremio", "away": "Palmeiras",
     "odd_h_ft": "", "odd_over25_ft": 1.9}
]"#;

const HOME_RANKINGS: &str = r#"[
    {"league": "Brasileirao", "season": 2023, "team": "Palmeiras", "ranking_home": 1},
    {"league": "Brasileirao", "season": "2023", "team": "Flamengo", "ranking_home": "2"}
]"#;

const STRATEGIES: &str = r#"[
    {"name": "Top home sides", "market": "home_win", "unit_stake": 10,
     "max_ranking_home": 4},
    {"name": "Goals", "market": "over_25", "unit_stake": 10, "season": ["2023"],
     "min_odds": "", "max_odds": "10"},
    {"name": "Broken", "market": "draw", "unit_stake": -5}
]"#;

fn write_dataset(dir: &Path) {
    std::fs::write(dir.join(json::MATCHES_FILE), MATCHES).unwrap();
    std::fs::write(dir.join(json::HOME_RANKINGS_FILE), HOME_RANKINGS).unwrap();
    std::fs::write(dir.join(json::STRATEGIES_FILE), STRATEGIES).unwrap();
}

#[tokio::test]
async fn test_batch_over_json_directory() {
    let dir = temp_dir("batch");
    write_dataset(&dir);
    let source = JsonDirSource::new(&dir);

    // Away rankings are absent on disk.
    assert!(source.load_away_rankings().await.unwrap().is_empty());

    let runs = BatchRunner::new(2).run_all(&source).await.unwrap();
    assert_eq!(runs.len(), 3);

    let home = runs[0].report().unwrap();
    assert_eq!(home.total_matches, 4);
    assert_eq!(home.filtered_matches, 2);
    assert_eq!(home.wins, 1);
    assert_eq!(home.losses, 1);
    assert_eq!(home.total_profit, dec!(-2));

    let goals = runs[1].report().unwrap();
    assert_eq!(goals.market, Market::Over25);
    assert_eq!(goals.filtered_matches, 4);
    assert_eq!(goals.undefined_bets, 1);
    assert_eq!(goals.valid_bets, 3);
    assert_eq!(goals.wins, 2);
    // Undated match sorts last, so the newest valid bet leads the sample.
    assert_eq!(goals.recent_bets[0].label, "Santos vs Flamengo");

    assert!(runs[2].report().is_none());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_missing_matches_file_is_error() {
    let dir = temp_dir("empty");
    std::fs::write(dir.join(json::STRATEGIES_FILE), STRATEGIES).unwrap();
    let source = JsonDirSource::new(&dir);
    let err = BatchRunner::new(1).run_all(&source).await.unwrap_err();
    assert!(format!("{err:#}").contains(json::MATCHES_FILE));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_reports_saved_and_reloaded() {
    let data_dir = temp_dir("data");
    let out_dir = temp_dir("out");
    write_dataset(&data_dir);

    let runs = tokio_test::block_on(BatchRunner::new(4).run_all(&JsonDirSource::new(&data_dir)))
        .unwrap();

    let mut paths = Vec::new();
    for (run, report) in runs.iter().filter_map(|r| r.report().map(|rep| (r, rep))) {
        let saved = SavedRun::new(&run.strategy.name, report.clone());
        paths.push((storage::save_run(&saved, &out_dir).unwrap(), saved));
    }
    assert_eq!(paths.len(), 2);

    for (path, saved) in &paths {
        let loaded = storage::load_run(path).unwrap().unwrap();
        assert_eq!(&loaded, saved);
        storage::delete_run(path).unwrap();
        assert!(storage::load_run(path).unwrap().is_none());
    }

    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::remove_dir_all(&out_dir).unwrap();
}
