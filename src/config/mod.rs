pub mod traits;
pub mod backtesting;
pub mod scoring;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use backtesting::{BacktestingConfig, PriceResolution};
pub use scoring::ScoringConfig;
pub use traits::ConfigSection;
