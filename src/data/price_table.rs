use crate::data::connectors::{validator::timestamps_ms, TIMESTAMP_COLUMN};
use crate::data::universe::{AssetSpec, CoinMetadata, PRICE_FIELDS};
use crate::error::{Result, SignalbenchError};
use crate::types::PricePoint;
use polars::prelude::*;
use std::collections::HashMap;

/// Aligned market data keyed by timestamp, one `{field}_{SYMBOL}_{TF}` column per series.
///
/// Wraps the frame handed over by the data provider and indexes the close of
/// every target so the simulator can look up a (symbol, timestamp) price.
pub struct PriceTable {
    frame: DataFrame,
    closes: HashMap<String, HashMap<i64, f64>>,
}

impl PriceTable {
    pub fn new(frame: DataFrame, metadata: &CoinMetadata) -> Result<Self> {
        metadata.validate()?;

        let column = frame.column(TIMESTAMP_COLUMN).map_err(|_| {
            SignalbenchError::schema(TIMESTAMP_COLUMN, None, "price table has no timestamp column")
        })?;
        let timestamps = timestamps_ms(column, TIMESTAMP_COLUMN)?;

        let mut closes = HashMap::with_capacity(metadata.targets.len());
        for target in &metadata.targets {
            let index = Self::index_close(&frame, &timestamps, target)?;
            log::debug!(
                "Indexed {} prices for {} from {}",
                index.len(),
                target.symbol,
                target.close_column()
            );
            closes.insert(target.symbol.clone(), index);
        }

        Ok(Self { frame, closes })
    }

    /// Builds a table straight from resolved points, one symbol per target.
    pub fn from_points(points: &[PricePoint]) -> Self {
        let mut closes: HashMap<String, HashMap<i64, f64>> = HashMap::new();
        for point in points {
            if is_usable(point.close_price) {
                closes
                    .entry(point.symbol.clone())
                    .or_default()
                    .insert(point.timestamp, point.close_price);
            }
        }
        Self {
            frame: DataFrame::empty(),
            closes,
        }
    }

    fn index_close(
        frame: &DataFrame,
        timestamps: &Int64Chunked,
        target: &AssetSpec,
    ) -> Result<HashMap<i64, f64>> {
        let name = target.close_column();
        let series = frame.column(&name).map_err(|_| {
            SignalbenchError::schema(name.as_str(), None, "price table has no close column for target")
        })?;
        if !series.dtype().is_primitive_numeric() {
            return Err(SignalbenchError::schema(
                name.as_str(),
                None,
                format!("close prices must be numeric, found {:?}", series.dtype()),
            ));
        }
        let cast = series.cast(&DataType::Float64)?;
        let prices = cast.f64()?;

        let mut index = HashMap::with_capacity(prices.len());
        for (ts, price) in timestamps.into_iter().zip(prices.into_iter()) {
            if let (Some(ts), Some(price)) = (ts, price) {
                if is_usable(price) {
                    index.insert(ts, price);
                }
            }
        }
        Ok(index)
    }

    /// Close price of `symbol` at exactly `timestamp`, if the provider had a usable one.
    pub fn close(&self, symbol: &str, timestamp: i64) -> Option<f64> {
        self.closes.get(symbol)?.get(&timestamp).copied()
    }

    /// Split the table into the anchor and target views a strategy receives.
    /// Each view holds `timestamp` plus every OHLCV column present for its assets.
    pub fn split(&self, metadata: &CoinMetadata) -> Result<(DataFrame, DataFrame)> {
        let anchors = self.select_assets(&metadata.anchors)?;
        let targets = self.select_assets(&metadata.targets)?;
        log::info!(
            "Split price table - anchor: {:?}, target: {:?}",
            anchors.shape(),
            targets.shape()
        );
        Ok((anchors, targets))
    }

    fn select_assets(&self, assets: &[AssetSpec]) -> Result<DataFrame> {
        let present = self.frame.get_column_names();
        let mut columns = vec![TIMESTAMP_COLUMN.to_string()];
        for asset in assets {
            for field in PRICE_FIELDS {
                let name = asset.column(field);
                if present.iter().any(|c| c.as_str() == name) {
                    columns.push(name);
                }
            }
        }
        Ok(self.frame.select(columns)?)
    }
}

fn is_usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
