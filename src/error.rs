use std::fmt;
use thiserror::Error;

/// Pipeline stage an evaluation failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SignalGeneration,
    Validation,
    Simulation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SignalGeneration => "signal generation",
            Stage::Validation => "validation",
            Stage::Simulation => "simulation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SignalbenchError {
    #[error("Schema error in column '{column}'{}: {reason}", row_suffix(.row))]
    Schema {
        column: String,
        row: Option<usize>,
        reason: String,
    },

    #[error("No price for {symbol} at {}", display_time(.timestamp))]
    PriceResolution { symbol: String, timestamp: i64 },

    #[error("Signal table has {rows} rows, limit is {limit}")]
    RowLimit { rows: usize, limit: usize },

    #[error("Signal table has {pairs} buy-sell pairs, at least {required} required")]
    InsufficientActivity { pairs: usize, required: usize },

    #[error("Strategy '{name}' failed: {message}")]
    Strategy { name: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{stage} stage failed: {source}")]
    Evaluation {
        stage: Stage,
        #[source]
        source: Box<SignalbenchError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" at row {}", row),
        None => String::new(),
    }
}

fn display_time(timestamp: &i64) -> String {
    crate::types::format_timestamp(*timestamp)
}

impl SignalbenchError {
    pub fn schema(column: impl Into<String>, row: Option<usize>, reason: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
            row,
            reason: reason.into(),
        }
    }

    /// Tags an error with the stage it surfaced in. Already tagged errors keep their stage.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            tagged @ Self::Evaluation { .. } => tagged,
            other => Self::Evaluation {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage of a tagged error, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Evaluation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Strips the stage tag, returning the underlying error.
    pub fn root(&self) -> &SignalbenchError {
        match self {
            Self::Evaluation { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalbenchError>;
