use crate::error::{Result, SignalbenchError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const MAX_TARGETS: usize = 3;
pub const MAX_ANCHORS: usize = 5;

/// Candle interval of a price column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1H")]
    H1,
    #[serde(rename = "2H")]
    H2,
    #[serde(rename = "4H")]
    H4,
    #[serde(rename = "12H")]
    H12,
    #[serde(rename = "1D")]
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H1 => "1H",
            Self::H2 => "2H",
            Self::H4 => "4H",
            Self::H12 => "12H",
            Self::D1 => "1D",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OHLCV fields a price table may carry per asset.
pub const PRICE_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl AssetSpec {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }

    /// Column name for one field of this asset, e.g. `close_LDO_1H`.
    pub fn column(&self, field: &str) -> String {
        format!("{}_{}_{}", field, self.symbol, self.timeframe)
    }

    pub fn close_column(&self) -> String {
        self.column("close")
    }
}

/// The traded targets and the context-only anchors a strategy declares.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoinMetadata {
    pub targets: Vec<AssetSpec>,
    #[serde(default)]
    pub anchors: Vec<AssetSpec>,
}

impl CoinMetadata {
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(SignalbenchError::Configuration(
                "At least one target asset is required".to_string(),
            ));
        }
        if self.targets.len() > MAX_TARGETS {
            return Err(SignalbenchError::Configuration(format!(
                "At most {} target assets allowed, got {}",
                MAX_TARGETS,
                self.targets.len()
            )));
        }
        if self.anchors.len() > MAX_ANCHORS {
            return Err(SignalbenchError::Configuration(format!(
                "At most {} anchor assets allowed, got {}",
                MAX_ANCHORS,
                self.anchors.len()
            )));
        }

        for asset in self.targets.iter().chain(self.anchors.iter()) {
            let valid = !asset.symbol.is_empty()
                && asset
                    .symbol
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if !valid {
                return Err(SignalbenchError::Configuration(format!(
                    "Invalid symbol '{}': expected upper-case alphanumerics",
                    asset.symbol
                )));
            }
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.symbol.as_str()) {
                return Err(SignalbenchError::Configuration(format!(
                    "Target symbol '{}' listed more than once",
                    target.symbol
                )));
            }
        }
        Ok(())
    }

    pub fn target(&self, symbol: &str) -> Option<&AssetSpec> {
        self.targets.iter().find(|t| t.symbol == symbol)
    }
}
