// src/engines/metrics/engine.rs
use crate::engines::metrics::{ProfitabilityMetrics, RiskMetrics};
use crate::types::{Metrics, TradeOutcome};

/// Portfolio value before any trade.
pub const STARTING_VALUE: f64 = 1.0;

/// Stateless aggregation of realized per-trade returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compound realized contributions into a value trajectory starting at 1.0.
    pub fn trajectory(returns: &[f64]) -> Vec<f64> {
        let mut values = Vec::with_capacity(returns.len() + 1);
        values.push(STARTING_VALUE);
        let mut value = STARTING_VALUE;
        for r in returns {
            value *= 1.0 + r;
            values.push(value);
        }
        values
    }

    pub fn calculate(&self, returns: &[f64], trajectory: &[f64]) -> Metrics {
        if returns.is_empty() {
            return Metrics::default();
        }

        Metrics {
            total_return_pct: ProfitabilityMetrics::total_return_pct(trajectory),
            sharpe_ratio: RiskMetrics::sharpe_ratio(returns),
            max_drawdown_pct: RiskMetrics::max_drawdown_pct(trajectory),
            num_trades: returns.len(),
            win_rate: ProfitabilityMetrics::win_rate(returns),
        }
    }

    /// Metrics plus the trajectory they were derived from, in outcome order.
    pub fn from_outcomes(&self, outcomes: &[TradeOutcome]) -> (Metrics, Vec<f64>) {
        let returns: Vec<f64> = outcomes.iter().map(TradeOutcome::contribution).collect();
        let trajectory = Self::trajectory(&returns);
        (self.calculate(&returns, &trajectory), trajectory)
    }
}
