use crate::{
    config::PriceResolution,
    data::PriceTable,
    error::{Result, SignalbenchError},
    types::{Signal, SignalRecord, SymbolSummary, TradeOutcome},
};

/// Position of a single symbol during replay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long {
        entry_price: f64,
        size: f64,
        entry_index: usize,
        entry_timestamp: i64,
    },
}

/// What a record asks the position to do, given the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Close,
    Ignore,
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Long { .. })
    }

    /// A BUY only opens from flat with a positive size; a SELL only closes a long.
    /// Everything else (HOLD, repeated BUY, SELL while flat) is ignored.
    pub fn action_for(&self, record: &SignalRecord) -> Action {
        match (self, record.signal) {
            (Self::Flat, Signal::Buy) if record.position_size > 0.0 => Action::Open,
            (Self::Long { .. }, Signal::Sell) => Action::Close,
            _ => Action::Ignore,
        }
    }

    /// Apply a record whose price has been resolved.
    ///
    /// Returns the next state and, on a close, the realized round trip.
    pub fn step(self, record: &SignalRecord, index: usize, price: f64) -> (Self, Option<TradeOutcome>) {
        match (self.action_for(record), self) {
            (Action::Open, _) => {
                let next = Self::Long {
                    entry_price: price,
                    size: record.position_size,
                    entry_index: index,
                    entry_timestamp: record.timestamp,
                };
                (next, None)
            }
            (
                Action::Close,
                Self::Long {
                    entry_price,
                    size,
                    entry_timestamp,
                    ..
                },
            ) => {
                let outcome = TradeOutcome {
                    symbol: record.symbol.clone(),
                    entry_timestamp,
                    exit_timestamp: record.timestamp,
                    entry_price,
                    exit_price: price,
                    size,
                    trade_return: (price - entry_price) / entry_price,
                };
                (Self::Flat, Some(outcome))
            }
            _ => (self, None),
        }
    }
}

/// Result of replaying one symbol's records.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRun {
    pub symbol: String,
    pub records: usize,
    pub outcomes: Vec<TradeOutcome>,
    pub final_state: PositionState,
    pub skipped_records: usize,
    pub filled_records: usize,
    pub failure: Option<String>,
}

impl SymbolRun {
    /// A symbol whose replay failed and was left out of the evaluation.
    pub fn excluded(symbol: &str, records: usize, reason: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            records,
            outcomes: Vec::new(),
            final_state: PositionState::Flat,
            skipped_records: 0,
            filled_records: 0,
            failure: Some(reason),
        }
    }

    pub fn summary(&self) -> SymbolSummary {
        SymbolSummary {
            symbol: self.symbol.clone(),
            records: self.records,
            round_trips: self.outcomes.len(),
            open_at_end: self.final_state.is_open(),
            skipped_records: self.skipped_records,
            filled_records: self.filled_records,
            failure: self.failure.clone(),
        }
    }
}

/// Fold state threaded through a symbol's replay.
struct Replay {
    state: PositionState,
    outcomes: Vec<TradeOutcome>,
    last_price: Option<f64>,
    skipped: usize,
    filled: usize,
}

/// Replay one symbol's records, already sorted by timestamp, through the
/// flat/long state machine.
///
/// Prices are only looked up for records that change state. A position still
/// open after the last record is reported but never realized.
pub fn simulate_symbol(
    symbol: &str,
    records: &[&SignalRecord],
    prices: &PriceTable,
    policy: PriceResolution,
) -> Result<SymbolRun> {
    let initial = Replay {
        state: PositionState::Flat,
        outcomes: Vec::new(),
        last_price: None,
        skipped: 0,
        filled: 0,
    };

    let replay = records
        .iter()
        .enumerate()
        .try_fold(initial, |mut replay, (index, record)| -> Result<Replay> {
            let observed = prices.close(symbol, record.timestamp);
            if observed.is_some() {
                replay.last_price = observed;
            }

            if replay.state.action_for(record) == Action::Ignore {
                if record.signal != Signal::Hold {
                    log::debug!(
                        "{} {} at {} ignored while {:?}",
                        symbol,
                        record.signal,
                        record.timestamp,
                        replay.state
                    );
                }
                return Ok(replay);
            }

            let price = match (observed, policy) {
                (Some(price), _) => price,
                (None, PriceResolution::Strict) => {
                    return Err(SignalbenchError::PriceResolution {
                        symbol: symbol.to_string(),
                        timestamp: record.timestamp,
                    });
                }
                (None, PriceResolution::Lenient) => match replay.last_price {
                    Some(price) => {
                        log::warn!(
                            "{} {} at {}: no price, forward-filling {}",
                            symbol,
                            record.signal,
                            record.timestamp,
                            price
                        );
                        replay.filled += 1;
                        price
                    }
                    None => {
                        log::warn!(
                            "{} {} at {}: no price and nothing to forward-fill, skipping",
                            symbol,
                            record.signal,
                            record.timestamp
                        );
                        replay.skipped += 1;
                        return Ok(replay);
                    }
                },
            };

            let (next, outcome) = replay.state.step(record, index, price);
            if let Some(outcome) = outcome {
                log::debug!(
                    "{} closed at {}: entry {} exit {} return {:.4}",
                    symbol,
                    record.timestamp,
                    outcome.entry_price,
                    outcome.exit_price,
                    outcome.trade_return
                );
                replay.outcomes.push(outcome);
            } else {
                log::debug!("{} opened at {} price {}", symbol, record.timestamp, price);
            }
            replay.state = next;
            Ok(replay)
        })?;

    if replay.state.is_open() {
        log::info!("{}: open position at end of records discarded", symbol);
    }

    Ok(SymbolRun {
        symbol: symbol.to_string(),
        records: records.len(),
        outcomes: replay.outcomes,
        final_state: replay.state,
        skipped_records: replay.skipped,
        filled_records: replay.filled,
        failure: None,
    })
}
