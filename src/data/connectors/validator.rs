use crate::error::{Result, SignalbenchError};
use crate::types::{Signal, SignalRecord};
use polars::prelude::*;
use super::types::SignalColumn;

pub struct SignalValidator;

impl SignalValidator {
    /// Check a strategy's signal table and convert it into typed records.
    ///
    /// The table must have exactly the four signal columns. Records come back in
    /// table order; sorting is the simulator's job.
    pub fn validate_frame(df: &DataFrame) -> Result<Vec<SignalRecord>> {
        Self::check_columns(df)?;

        let timestamps = timestamps_ms(df.column(SignalColumn::Timestamp.as_str())?, SignalColumn::Timestamp.as_str())?;
        let symbols = Self::string_column(df, SignalColumn::Symbol)?;
        let signals = Self::string_column(df, SignalColumn::Signal)?;
        let sizes = Self::size_column(df)?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let timestamp = timestamps.get(i).ok_or_else(|| {
                SignalbenchError::schema(SignalColumn::Timestamp.as_str(), Some(i), "null timestamp")
            })?;

            let symbol = symbols.get(i).ok_or_else(|| {
                SignalbenchError::schema(SignalColumn::Symbol.as_str(), Some(i), "null symbol")
            })?;

            let signal = signals
                .get(i)
                .ok_or_else(|| SignalbenchError::schema(SignalColumn::Signal.as_str(), Some(i), "null signal"))?
                .parse::<Signal>()
                .map_err(|reason| SignalbenchError::schema(SignalColumn::Signal.as_str(), Some(i), reason))?;

            let position_size = sizes.get(i).ok_or_else(|| {
                SignalbenchError::schema(SignalColumn::PositionSize.as_str(), Some(i), "null position size")
            })?;

            let record = SignalRecord::new(timestamp, symbol, signal, position_size);
            Self::check_record(&record, i)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Value checks for records that did not come from a DataFrame.
    pub fn validate_records(records: &[SignalRecord]) -> Result<()> {
        for (i, record) in records.iter().enumerate() {
            Self::check_record(record, i)?;
        }
        Ok(())
    }

    /// Number of complete buy-sell pairs the table can at most produce.
    pub fn count_round_trips(records: &[SignalRecord]) -> usize {
        let buys = records.iter().filter(|r| r.signal == Signal::Buy).count();
        let sells = records.iter().filter(|r| r.signal == Signal::Sell).count();
        buys.min(sells)
    }

    fn check_columns(df: &DataFrame) -> Result<()> {
        let names = df.get_column_names();
        for required in SignalColumn::all() {
            if !names.iter().any(|name| name.as_str() == required.as_str()) {
                return Err(SignalbenchError::schema(
                    required.as_str(),
                    None,
                    "missing required column",
                ));
            }
        }

        if let Some(extra) = names
            .iter()
            .find(|name| !SignalColumn::all().iter().any(|c| c.as_str() == name.as_str()))
        {
            return Err(SignalbenchError::schema(
                extra.as_str(),
                None,
                "unexpected column, expected exactly timestamp, symbol, signal, position_size",
            ));
        }
        Ok(())
    }

    fn check_record(record: &SignalRecord, row: usize) -> Result<()> {
        if record.symbol.trim().is_empty() {
            return Err(SignalbenchError::schema(
                SignalColumn::Symbol.as_str(),
                Some(row),
                "empty symbol",
            ));
        }
        let size = record.position_size;
        if !size.is_finite() || !(0.0..=1.0).contains(&size) {
            return Err(SignalbenchError::schema(
                SignalColumn::PositionSize.as_str(),
                Some(row),
                format!("position size {} outside [0, 1]", size),
            ));
        }
        Ok(())
    }

    fn string_column(df: &DataFrame, column: SignalColumn) -> Result<StringChunked> {
        let series = df.column(column.as_str())?;
        if !matches!(series.dtype(), DataType::String) {
            return Err(SignalbenchError::schema(
                column.as_str(),
                None,
                format!("must be a string column, found {:?}", series.dtype()),
            ));
        }
        Ok(series.str()?.clone())
    }

    fn size_column(df: &DataFrame) -> Result<Float64Chunked> {
        let name = SignalColumn::PositionSize.as_str();
        let series = df.column(name)?;
        if !series.dtype().is_primitive_numeric() {
            return Err(SignalbenchError::schema(
                name,
                None,
                format!("must be numeric, found {:?}", series.dtype()),
            ));
        }
        let cast = series.cast(&DataType::Float64)?;
        Ok(cast.f64()?.clone())
    }
}

/// Read a time key column as epoch milliseconds. Integer columns are taken as
/// milliseconds already; date and datetime columns are converted.
pub(crate) fn timestamps_ms(series: &Column, name: &str) -> Result<Int64Chunked> {
    let millis = match series.dtype() {
        DataType::Int64 | DataType::Int32 | DataType::UInt32 | DataType::UInt64 => {
            series.cast(&DataType::Int64)?
        }
        DataType::Datetime(_, tz) => series
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, tz.clone()))?
            .cast(&DataType::Int64)?,
        DataType::Date => series
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .cast(&DataType::Int64)?,
        other => {
            return Err(SignalbenchError::schema(
                name,
                None,
                format!("must be an integer or datetime column, found {:?}", other),
            ));
        }
    };
    Ok(millis.i64()?.clone())
}
