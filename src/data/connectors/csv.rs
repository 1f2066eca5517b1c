use crate::data::price_table::PriceTable;
use crate::data::universe::CoinMetadata;
use crate::error::{Result, SignalbenchError};
use crate::types::SignalRecord;
use polars::prelude::*;
use std::path::Path;
use super::validator::SignalValidator;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| SignalbenchError::Configuration(format!(
                "Failed to read CSV {}: {}",
                path.as_ref().display(),
                e
            )))?;

        Ok(df)
    }

    /// Load an aligned price export and index the targets' closes.
    pub fn load_price_table<P: AsRef<Path>>(path: P, metadata: &CoinMetadata) -> Result<PriceTable> {
        let df = Self::load(&path)?;

        let null_report = Self::null_counts(&df);
        if !null_report.is_empty() {
            log::warn!("Null values detected in price table: {:?}", null_report);
        }

        PriceTable::new(df, metadata)
    }

    /// Load a saved signal table and validate it.
    pub fn load_signals<P: AsRef<Path>>(path: P) -> Result<Vec<SignalRecord>> {
        let df = Self::load(&path)?;
        SignalValidator::validate_frame(&df)
    }

    fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }
}
