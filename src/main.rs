//! oddslab: football strategy backtester.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! loads the match dataset and saved strategies, backtests every strategy
//! and writes the reports to disk.

use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};

use oddslab::config::AppConfig;
use oddslab::data::JsonDirSource;
use oddslab::engine::{BatchRunner, StrategyRun};
use oddslab::storage::{self, SavedRun};

const BANNER: &str = r#"
           _     _     _       _
  ___   __| | __| |___| | __ _| |__
 / _ \ / _` |/ _` / __| |/ _` | '_ \
| (_) | (_| | (_| \__ \ | (_| | |_) |
 \___/ \__,_|\__,_|___/_|\__,_|_.__/

  Strategy backtesting over historical match data
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::path_from_env();
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        data_dir = %cfg.data.dir,
        output_dir = %cfg.output.dir,
        max_concurrent = cfg.runner.max_concurrent,
        "oddslab starting up"
    );

    let source = JsonDirSource::new(&cfg.data.dir);
    let runner = BatchRunner::new(cfg.runner.max_concurrent);
    let runs = runner.run_all(&source).await?;

    if runs.is_empty() {
        warn!("No strategies found, nothing to backtest");
        return Ok(());
    }

    let output_dir = Path::new(&cfg.output.dir);
    let mut saved = 0usize;
    for run in &runs {
        log_run(run);

        if !cfg.output.save_reports {
            continue;
        }
        if let Some(report) = run.report() {
            let record = SavedRun::new(&run.strategy.name, report.clone());
            match storage::save_run(&record, output_dir) {
                Ok(path) => {
                    saved += 1;
                    info!(strategy = %run.strategy.name, path = %path.display(), "Report saved");
                }
                Err(e) => {
                    error!(strategy = %run.strategy.name, error = %e, "Failed to save report")
                }
            }
        }
    }

    let failed = runs.iter().filter(|r| r.report().is_none()).count();
    info!(
        strategies = runs.len(),
        failed,
        saved,
        "oddslab finished."
    );

    Ok(())
}

/// Log a human-readable summary of one strategy run.
fn log_run(run: &StrategyRun) {
    match &run.result {
        Ok(report) => info!(
            strategy = %run.strategy.name,
            market = %report.market,
            matches = report.filtered_matches,
            bets = report.valid_bets,
            wins = report.wins,
            losses = report.losses,
            hit_rate = format!("{:.1}%", report.hit_rate),
            profit = format!("{:.2}", report.total_profit),
            roi = format!("{:.1}%", report.roi),
            best_streak = report.streaks.max_winning_streak,
            worst_streak = report.streaks.max_losing_streak,
            drawdown = format!("{:.2}", report.max_drawdown),
            "Strategy summary"
        ),
        Err(e) => warn!(strategy = %run.strategy.name, error = %e, "Strategy skipped"),
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("oddslab=info"));

    let json_logging = std::env::var("ODDSLAB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
