use super::traits::ConfigSection;
use crate::error::SignalbenchError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestingConfig {
    pub price_resolution: PriceResolution,
    pub max_rows: usize,
    pub min_round_trips: usize,
    pub parallel: bool,
    /// Leave a symbol out of the evaluation when one of its prices cannot be
    /// resolved, instead of failing the whole run.
    pub skip_failed_symbols: bool,
}

/// What the simulator does when an actionable record has no usable price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceResolution {
    /// Fail the symbol with a price resolution error.
    Strict,
    /// Forward-fill the symbol's last known price, or skip the record if there is none.
    Lenient,
}

impl Default for BacktestingConfig {
    fn default() -> Self {
        Self {
            price_resolution: PriceResolution::Strict,
            max_rows: 5_000_000,
            min_round_trips: 0,
            parallel: true,
            skip_failed_symbols: false,
        }
    }
}

impl ConfigSection for BacktestingConfig {
    fn section_name() -> &'static str {
        "backtesting"
    }

    fn validate(&self) -> Result<(), SignalbenchError> {
        if self.max_rows == 0 {
            return Err(SignalbenchError::Configuration(
                "max_rows must be at least 1".to_string()
            ));
        }
        Ok(())
    }
}
