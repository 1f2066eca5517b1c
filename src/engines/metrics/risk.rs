// src/engines/metrics/risk.rs

/// Periods per year used to annualize the per-trade Sharpe ratio.
///
/// Every closed trade counts as one period regardless of how long it was held,
/// so the figure is an approximation. Competition scores depend on it as is.
pub const ANNUALIZATION_PERIODS: f64 = 252.0;

pub struct RiskMetrics;

impl RiskMetrics {
    /// mean / population std-dev * sqrt(252); zero when there is no dispersion.
    pub fn sharpe_ratio(returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let std_dev = Self::std_dev(returns);
        if std_dev > 0.0 {
            Self::mean(returns) / std_dev * ANNUALIZATION_PERIODS.sqrt()
        } else {
            0.0
        }
    }

    /// Largest peak-to-trough decline as a positive percentage, with the
    /// running peak seeded at the starting value of 1.0.
    pub fn max_drawdown_pct(trajectory: &[f64]) -> f64 {
        let mut peak = 1.0_f64;
        let mut worst = 0.0_f64;

        for &value in trajectory {
            peak = peak.max(value);
            let drawdown = (value - peak) / peak;
            worst = worst.min(drawdown);
        }

        (worst * 100.0).abs()
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn std_dev(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }

        let mean = Self::mean(values);
        let variance = values.iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>() / values.len() as f64;

        variance.sqrt()
    }
}
