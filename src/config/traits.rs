use crate::error::SignalbenchError;
use serde::{de::DeserializeOwned, Serialize};

/// A top-level table of the config file, e.g. `[backtesting]`.
pub trait ConfigSection: Serialize + DeserializeOwned + Default + Clone {
    /// Table name used in the file and in validation messages.
    fn section_name() -> &'static str;

    /// Rejects values the engines cannot run with.
    fn validate(&self) -> Result<(), SignalbenchError>;
}
