mod csv;
mod types;
pub(crate) mod validator;

pub use csv::CsvConnector;
pub use types::{SignalColumn, TIMESTAMP_COLUMN};
pub use validator::SignalValidator;
