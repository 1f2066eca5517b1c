use super::traits::ConfigSection;
use crate::error::SignalbenchError;
use serde::{Deserialize, Serialize};

/// Linear point maps and qualification gates of the competition score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub profitability_multiplier: f64,
    pub profitability_cap: f64,
    pub sharpe_multiplier: f64,
    pub sharpe_cap: f64,
    /// Points for zero drawdown; each drawdown percent costs one point.
    pub drawdown_cap: f64,
    pub min_profitability: f64,
    pub min_sharpe: f64,
    pub min_drawdown: f64,
    pub min_total: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            profitability_multiplier: 2.25,
            profitability_cap: 45.0,
            sharpe_multiplier: 17.5,
            sharpe_cap: 35.0,
            drawdown_cap: 20.0,
            min_profitability: 9.0,
            min_sharpe: 10.0,
            min_drawdown: 5.0,
            min_total: 50.0,
        }
    }
}

impl ConfigSection for ScoringConfig {
    fn section_name() -> &'static str {
        "scoring"
    }

    fn validate(&self) -> Result<(), SignalbenchError> {
        let positive = [
            ("profitability_multiplier", self.profitability_multiplier),
            ("profitability_cap", self.profitability_cap),
            ("sharpe_multiplier", self.sharpe_multiplier),
            ("sharpe_cap", self.sharpe_cap),
            ("drawdown_cap", self.drawdown_cap),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(SignalbenchError::Configuration(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let thresholds = [
            ("min_profitability", self.min_profitability),
            ("min_sharpe", self.min_sharpe),
            ("min_drawdown", self.min_drawdown),
            ("min_total", self.min_total),
        ];
        for (name, value) in thresholds {
            if !(value >= 0.0) {
                return Err(SignalbenchError::Configuration(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
