use crate::{
    config::{AppConfig, BacktestingConfig},
    data::{CoinMetadata, PriceTable, SignalValidator},
    engines::evaluation::portfolio::{simulate_symbol, SymbolRun},
    engines::metrics::MetricsEngine,
    engines::scoring::Scorer,
    error::{Result, SignalbenchError, Stage},
    functions::Strategy,
    types::{EvaluationReport, SignalRecord, TradeOutcome},
};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;

/// Runs the validate -> simulate -> metrics -> score pipeline for one strategy.
pub struct Backtester {
    config: BacktestingConfig,
    metrics: MetricsEngine,
    scorer: Scorer,
}

impl Default for Backtester {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Backtester {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: config.backtesting,
            metrics: MetricsEngine::new(),
            scorer: Scorer::new(config.scoring),
        }
    }

    /// Split the price frame, run the strategy on it and score its signals.
    pub fn evaluate_strategy(&self, strategy: &dyn Strategy, price_frame: &DataFrame) -> Result<EvaluationReport> {
        let metadata = strategy.coin_metadata();
        let prices = PriceTable::new(price_frame.clone(), &metadata)
            .map_err(|e| e.at_stage(Stage::SignalGeneration))?;
        let (anchor, target) = prices
            .split(&metadata)
            .map_err(|e| e.at_stage(Stage::SignalGeneration))?;

        log::info!("Generating signals with strategy '{}'", strategy.name());
        let signals = strategy
            .generate_signals(&anchor, &target)
            .map_err(|e| {
                SignalbenchError::Strategy {
                    name: strategy.name().to_string(),
                    message: format!("{:#}", e),
                }
                .at_stage(Stage::SignalGeneration)
            })?;

        let records = self.records_from_frame(&signals)?;
        warn_untraded_symbols(&records, &metadata);
        self.evaluate_records(&records, &prices)
    }

    /// Score a strategy's signal table against resolved prices.
    pub fn evaluate_signals(&self, signals: &DataFrame, prices: &PriceTable) -> Result<EvaluationReport> {
        let records = self.records_from_frame(signals)?;
        self.evaluate_records(&records, prices)
    }

    fn records_from_frame(&self, signals: &DataFrame) -> Result<Vec<SignalRecord>> {
        self.check_row_limit(signals.height())
            .and_then(|_| SignalValidator::validate_frame(signals))
            .map_err(|e| e.at_stage(Stage::Validation))
    }

    /// Score typed signal records; they are validated here as well.
    pub fn evaluate_records(&self, records: &[SignalRecord], prices: &PriceTable) -> Result<EvaluationReport> {
        self.validate(records).map_err(|e| e.at_stage(Stage::Validation))?;

        log::info!("Simulating {} signal records", records.len());
        let runs = self.simulate(records, prices)?;

        let outcomes: Vec<TradeOutcome> = runs
            .iter()
            .flat_map(|run| run.outcomes.iter().cloned())
            .collect();
        let (metrics, trajectory) = self.metrics.from_outcomes(&outcomes);

        let (scores, qualification) = self.scorer.evaluate(&metrics);
        log::info!(
            "Evaluation finished: {} trades, return {:.2}%, sharpe {:.3}, drawdown {:.2}%, score {:.1}, qualifies: {}",
            metrics.num_trades,
            metrics.total_return_pct,
            metrics.sharpe_ratio,
            metrics.max_drawdown_pct,
            scores.total,
            qualification.qualifies
        );
        for gate in &qualification.failed_gates {
            log::info!("{:?} gate failed: {}", gate, gate.suggestion());
        }

        Ok(EvaluationReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            metrics,
            scores,
            qualification,
            symbols: runs.iter().map(SymbolRun::summary).collect(),
            trades: outcomes,
            trajectory,
        })
    }

    fn validate(&self, records: &[SignalRecord]) -> Result<()> {
        self.check_row_limit(records.len())?;
        SignalValidator::validate_records(records)?;

        if self.config.min_round_trips > 0 {
            let pairs = SignalValidator::count_round_trips(records);
            if pairs < self.config.min_round_trips {
                return Err(SignalbenchError::InsufficientActivity {
                    pairs,
                    required: self.config.min_round_trips,
                });
            }
        }
        Ok(())
    }

    fn check_row_limit(&self, rows: usize) -> Result<()> {
        if rows > self.config.max_rows {
            return Err(SignalbenchError::RowLimit {
                rows,
                limit: self.config.max_rows,
            });
        }
        Ok(())
    }

    /// Replay every symbol independently. Runs come back in first-seen symbol
    /// order; when several symbols fail, the first one in that order is reported
    /// unless `skip_failed_symbols` excludes price failures from the run.
    fn simulate(&self, records: &[SignalRecord], prices: &PriceTable) -> Result<Vec<SymbolRun>> {
        let groups = group_by_symbol(records);
        let policy = self.config.price_resolution;
        let run_one = |(symbol, group): &(String, Vec<&SignalRecord>)| {
            simulate_symbol(symbol, group, prices, policy)
        };

        let results: Vec<Result<SymbolRun>> = if self.config.parallel && groups.len() > 1 {
            groups.par_iter().map(run_one).collect()
        } else {
            groups.iter().map(run_one).collect()
        };

        let mut runs = Vec::with_capacity(results.len());
        for ((symbol, group), result) in groups.iter().zip(results) {
            match result {
                Ok(run) => runs.push(run),
                Err(err @ SignalbenchError::PriceResolution { .. }) if self.config.skip_failed_symbols => {
                    log::warn!("{} excluded from evaluation: {}", symbol, err);
                    runs.push(SymbolRun::excluded(symbol, group.len(), err.to_string()));
                }
                Err(err) => return Err(err.at_stage(Stage::Simulation)),
            }
        }
        Ok(runs)
    }
}

/// Signals for anything but a declared target have no price to trade at.
fn warn_untraded_symbols(records: &[SignalRecord], metadata: &CoinMetadata) {
    let mut reported: Vec<&str> = Vec::new();
    for record in records {
        let symbol = record.symbol.as_str();
        if metadata.target(symbol).is_none() && !reported.contains(&symbol) {
            log::warn!("Signals reference {}, which is not a declared target", symbol);
            reported.push(symbol);
        }
    }
}

/// Group records per symbol in order of first appearance, each group stably
/// sorted by timestamp so ties keep their input order.
pub fn group_by_symbol(records: &[SignalRecord]) -> Vec<(String, Vec<&SignalRecord>)> {
    let mut groups: Vec<(String, Vec<&SignalRecord>)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for record in records {
        match slots.get(record.symbol.as_str()) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                slots.insert(record.symbol.as_str(), groups.len());
                groups.push((record.symbol.clone(), vec![record]));
            }
        }
    }
    for (_, group) in groups.iter_mut() {
        group.sort_by_key(|r| r.timestamp);
    }
    groups
}
