//! oddslab: football strategy backtester.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod strategy;
pub mod backtest;
pub mod data;
pub mod engine;
pub mod storage;

pub use backtest::{run_backtest, BacktestReport, Backtester};
pub use strategy::{Strategy, StrategyError};
pub use types::{AwayRanking, BetOutcome, GameData, HomeRanking, Market};
