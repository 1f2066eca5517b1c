pub mod connectors;
pub mod price_table;
pub mod universe;

pub use connectors::{CsvConnector, SignalColumn, SignalValidator};
pub use price_table::PriceTable;
pub use universe::{AssetSpec, CoinMetadata, Timeframe};
