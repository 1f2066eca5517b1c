/// Columns a strategy's signal table must carry, and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalColumn {
    Timestamp,
    Symbol,
    Signal,
    PositionSize,
}

impl SignalColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Symbol => "symbol",
            Self::Signal => "signal",
            Self::PositionSize => "position_size",
        }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::Timestamp,
            Self::Symbol,
            Self::Signal,
            Self::PositionSize,
        ]
    }
}

/// Name of the shared time key in price and signal tables.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
