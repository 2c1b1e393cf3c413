//! End-to-end tests against the public `oddslab` API.
//!
//! Each submodule covers one surface: the single-strategy engine, the
//! JSON data source with the batch runner, and saved runs.

mod backtest;
mod batch;
mod fixtures;
