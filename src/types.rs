use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading instruction emitted by a strategy for one (timestamp, symbol) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "HOLD" => Ok(Self::Hold),
            other => Err(format!("unknown signal '{}', expected BUY, SELL or HOLD", other)),
        }
    }
}

/// One row of a strategy's signal table. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: i64,
    pub symbol: String,
    pub signal: Signal,
    pub position_size: f64,
}

impl SignalRecord {
    pub fn new(timestamp: i64, symbol: impl Into<String>, signal: Signal, position_size: f64) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            signal,
            position_size,
        }
    }
}

/// A resolved close price for a symbol at a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: i64,
    pub symbol: String,
    pub close_price: f64,
}

/// A completed BUY -> SELL round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub symbol: String,
    pub entry_timestamp: i64,
    pub exit_timestamp: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    /// (exit - entry) / entry, before sizing.
    pub trade_return: f64,
}

impl TradeOutcome {
    /// Realized contribution to the portfolio: trade return scaled by entry size.
    pub fn contribution(&self) -> f64 {
        self.trade_return * self.size
    }
}

/// Aggregate performance of one evaluation. All fields are zero when no trade closed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub num_trades: usize,
    pub win_rate: f64,
}

/// Bounded competition points derived from [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub profitability: f64,
    pub sharpe: f64,
    pub drawdown: f64,
    pub total: f64,
}

/// One of the independent qualification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    Profitability,
    Sharpe,
    Drawdown,
    Total,
}

impl Gate {
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Profitability => "Increase profitability: adjust take-profit levels or trade frequency",
            Self::Sharpe => "Improve Sharpe ratio: reduce position sizes or improve entry timing",
            Self::Drawdown => "Reduce drawdown: tighten stop-losses or add more exit conditions",
            Self::Total => "Raise the overall score across all three categories",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Qualification {
    pub qualifies: bool,
    pub failed_gates: Vec<Gate>,
}

/// Per-symbol summary of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub records: usize,
    pub round_trips: usize,
    /// A BUY was still open when the records ran out; its return was discarded.
    pub open_at_end: bool,
    /// Records dropped or forward-filled under lenient price resolution.
    pub skipped_records: usize,
    pub filled_records: usize,
    /// Why the symbol was left out of the evaluation, if it was.
    pub failure: Option<String>,
}

/// Everything an evaluation produces for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub generated_at: String,
    pub metrics: Metrics,
    pub scores: Scores,
    pub qualification: Qualification,
    pub symbols: Vec<SymbolSummary>,
    pub trades: Vec<TradeOutcome>,
    pub trajectory: Vec<f64>,
}

impl EvaluationReport {
    pub fn qualifies(&self) -> bool {
        self.qualification.qualifies
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Renders an epoch-millisecond timestamp as RFC 3339, falling back to the raw number.
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}
