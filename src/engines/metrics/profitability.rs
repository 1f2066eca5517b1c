// src/engines/metrics/profitability.rs

pub struct ProfitabilityMetrics;

impl ProfitabilityMetrics {
    /// Compounded return of the trajectory in percent; zero for an empty or unit trajectory.
    pub fn total_return_pct(trajectory: &[f64]) -> f64 {
        match trajectory.last() {
            Some(&final_value) if trajectory.len() > 1 => (final_value - 1.0) * 100.0,
            _ => 0.0,
        }
    }

    /// Fraction (not percent) of realized returns strictly above zero.
    pub fn win_rate(returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let wins = returns.iter().filter(|&&r| r > 0.0).count();
        wins as f64 / returns.len() as f64
    }
}
