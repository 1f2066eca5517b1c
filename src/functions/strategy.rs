use crate::data::universe::{AssetSpec, CoinMetadata, Timeframe};
use crate::data::connectors::TIMESTAMP_COLUMN;
use polars::prelude::*;

/// A pluggable signal generator.
///
/// Receives the anchor and target views of the price table and returns a
/// signal table with exactly `timestamp`, `symbol`, `signal`, `position_size`.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Which assets the strategy trades and which it only reads.
    fn coin_metadata(&self) -> CoinMetadata;

    fn generate_signals(&self, anchor: &DataFrame, target: &DataFrame) -> anyhow::Result<DataFrame>;
}

/// Starting point for new strategies: holds on every target timestamp.
pub struct HoldTemplate {
    metadata: CoinMetadata,
}

impl HoldTemplate {
    pub fn new(metadata: CoinMetadata) -> Self {
        Self { metadata }
    }
}

impl Default for HoldTemplate {
    fn default() -> Self {
        Self::new(CoinMetadata {
            targets: vec![AssetSpec::new("BONK", Timeframe::H1)],
            anchors: vec![
                AssetSpec::new("BTC", Timeframe::H4),
                AssetSpec::new("ETH", Timeframe::H4),
            ],
        })
    }
}

impl Strategy for HoldTemplate {
    fn name(&self) -> &str {
        "hold_template"
    }

    fn coin_metadata(&self) -> CoinMetadata {
        self.metadata.clone()
    }

    fn generate_signals(&self, _anchor: &DataFrame, target: &DataFrame) -> anyhow::Result<DataFrame> {
        let timestamps = target.column(TIMESTAMP_COLUMN)?;
        let height = target.height();
        let symbol = self
            .metadata
            .targets
            .first()
            .map(|t| t.symbol.as_str())
            .ok_or_else(|| anyhow::anyhow!("template has no target asset"))?;

        let frame = DataFrame::new(vec![
            timestamps.clone(),
            Column::new("symbol".into(), vec![symbol; height]),
            Column::new("signal".into(), vec!["HOLD"; height]),
            Column::new("position_size".into(), vec![0.0f64; height]),
        ])?;
        Ok(frame)
    }
}
