use crate::config::ScoringConfig;
use crate::types::{Gate, Metrics, Qualification, Scores};

/// Maps metrics onto the bounded competition point scale and gates qualification.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, metrics: &Metrics) -> Scores {
        let c = &self.config;
        let profitability = clamp(metrics.total_return_pct * c.profitability_multiplier, c.profitability_cap);
        let sharpe = clamp(metrics.sharpe_ratio * c.sharpe_multiplier, c.sharpe_cap);
        let drawdown = clamp(c.drawdown_cap - metrics.max_drawdown_pct, c.drawdown_cap);

        Scores {
            profitability,
            sharpe,
            drawdown,
            total: profitability + sharpe + drawdown,
        }
    }

    /// Every gate is checked on its own; a high total never rescues a failed category.
    pub fn qualify(&self, scores: &Scores) -> Qualification {
        let c = &self.config;
        let gates = [
            (Gate::Profitability, scores.profitability >= c.min_profitability),
            (Gate::Sharpe, scores.sharpe >= c.min_sharpe),
            (Gate::Drawdown, scores.drawdown >= c.min_drawdown),
            (Gate::Total, scores.total >= c.min_total),
        ];

        let failed_gates: Vec<Gate> = gates
            .iter()
            .filter(|(_, passed)| !passed)
            .map(|(gate, _)| *gate)
            .collect();

        Qualification {
            qualifies: failed_gates.is_empty(),
            failed_gates,
        }
    }

    pub fn evaluate(&self, metrics: &Metrics) -> (Scores, Qualification) {
        let scores = self.score(metrics);
        let qualification = self.qualify(&scores);
        (scores, qualification)
    }
}

/// Clamp into [0, cap]; NaN collapses to 0.
fn clamp(value: f64, cap: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(cap)
}
