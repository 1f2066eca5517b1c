//! Backtest and scoring engine for crypto trading strategies.
//!
//! A strategy's signal table is validated, replayed per symbol through a
//! flat/long position machine, aggregated into return, Sharpe and drawdown
//! metrics, and mapped onto a bounded competition score with pass/fail gates.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod functions;
pub mod types;

pub use config::{AppConfig, ConfigManager, PriceResolution};
pub use data::{CoinMetadata, PriceTable};
pub use engines::evaluation::Backtester;
pub use error::{Result, SignalbenchError, Stage};
pub use types::{EvaluationReport, Metrics, Scores, Signal, SignalRecord};
