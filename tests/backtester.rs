use polars::df;
use polars::prelude::*;
use signalbench::{
    config::BacktestingConfig,
    data::{AssetSpec, Timeframe},
    functions::{HoldTemplate, Strategy},
    types::{Gate, PricePoint},
    AppConfig, Backtester, CoinMetadata, PriceResolution, PriceTable, Signal, SignalRecord,
    SignalbenchError, Stage,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ldo_metadata() -> CoinMetadata {
    CoinMetadata {
        targets: vec![AssetSpec::new("LDO", Timeframe::H1)],
        anchors: vec![AssetSpec::new("BTC", Timeframe::H4)],
    }
}

fn price_frame() -> DataFrame {
    df! {
        "timestamp" => &[1_000i64, 2_000, 3_000, 4_000],
        "open_LDO_1H" => &[99.0, 100.0, 104.0, 106.0],
        "close_LDO_1H" => &[100.0, 105.0, 103.0, 110.0],
        "close_BTC_4H" => &[60_000.0, 60_100.0, 60_200.0, 60_300.0],
    }
    .unwrap()
}

fn with_config(backtesting: BacktestingConfig) -> Backtester {
    Backtester::new(AppConfig {
        backtesting,
        ..AppConfig::default()
    })
}

fn record(timestamp: i64, symbol: &str, signal: Signal) -> SignalRecord {
    let size = if signal == Signal::Buy { 1.0 } else { 0.0 };
    SignalRecord::new(timestamp, symbol, signal, size)
}

#[test]
fn test_evaluate_signal_frame() {
    init_logger();
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let signals = df! {
        "timestamp" => &[1_000i64, 2_000, 3_000, 4_000],
        "symbol" => &["LDO", "LDO", "LDO", "LDO"],
        "signal" => &["BUY", "SELL", "HOLD", "HOLD"],
        "position_size" => &[1.0, 0.0, 0.0, 0.0],
    }
    .unwrap();

    let report = Backtester::default().evaluate_signals(&signals, &prices).unwrap();

    assert_eq!(report.metrics.num_trades, 1);
    assert!((report.metrics.total_return_pct - 5.0).abs() < 1e-9);
    assert_eq!(report.symbols.len(), 1);
    assert_eq!(report.symbols[0].records, 4);
    assert!(!report.symbols[0].open_at_end);
}

#[test]
fn test_hold_template_end_to_end() {
    init_logger();
    let frame = df! {
        "timestamp" => &[1_000i64, 2_000, 3_000],
        "close_BONK_1H" => &[0.00002, 0.000021, 0.000019],
        "volume_BONK_1H" => &[1.0e9, 1.1e9, 0.9e9],
        "close_BTC_4H" => &[60_000.0, 60_100.0, 60_200.0],
        "close_ETH_4H" => &[3_000.0, 3_010.0, 3_020.0],
    }
    .unwrap();

    let report = Backtester::default()
        .evaluate_strategy(&HoldTemplate::default(), &frame)
        .unwrap();

    assert_eq!(report.metrics.num_trades, 0);
    assert_eq!(report.scores.drawdown, 20.0);
    assert_eq!(report.scores.total, 20.0);
    assert!(!report.qualifies());
    assert!(report.qualification.failed_gates.contains(&Gate::Profitability));
    assert!(report.qualification.failed_gates.contains(&Gate::Sharpe));
    assert!(report.qualification.failed_gates.contains(&Gate::Total));
    assert!(!report.qualification.failed_gates.contains(&Gate::Drawdown));
}

struct FailingStrategy;

impl Strategy for FailingStrategy {
    fn name(&self) -> &str {
        "failing"
    }

    fn coin_metadata(&self) -> CoinMetadata {
        ldo_metadata()
    }

    fn generate_signals(&self, _anchor: &DataFrame, _target: &DataFrame) -> anyhow::Result<DataFrame> {
        anyhow::bail!("indicator warmup longer than history")
    }
}

/// Emits a signal table with a stray column.
struct ChattyStrategy;

impl Strategy for ChattyStrategy {
    fn name(&self) -> &str {
        "chatty"
    }

    fn coin_metadata(&self) -> CoinMetadata {
        ldo_metadata()
    }

    fn generate_signals(&self, _anchor: &DataFrame, target: &DataFrame) -> anyhow::Result<DataFrame> {
        let height = target.height();
        let frame = DataFrame::new(vec![
            target.column("timestamp")?.clone(),
            Column::new("symbol".into(), vec!["LDO"; height]),
            Column::new("signal".into(), vec!["HOLD"; height]),
            Column::new("position_size".into(), vec![0.0f64; height]),
            Column::new("confidence".into(), vec![0.9f64; height]),
        ])?;
        Ok(frame)
    }
}

/// Reads the anchor view it is handed and trades the target on BTC momentum.
struct AnchorMomentum;

impl Strategy for AnchorMomentum {
    fn name(&self) -> &str {
        "anchor_momentum"
    }

    fn coin_metadata(&self) -> CoinMetadata {
        ldo_metadata()
    }

    fn generate_signals(&self, anchor: &DataFrame, target: &DataFrame) -> anyhow::Result<DataFrame> {
        let btc = anchor.column("close_BTC_4H")?.f64()?;
        let mut signals = Vec::with_capacity(btc.len());
        let mut sizes = Vec::with_capacity(btc.len());
        let mut previous: Option<f64> = None;
        for close in btc {
            let signal = match (previous, close) {
                (None, _) => "BUY",
                (Some(prev), Some(now)) if now < prev => "SELL",
                _ => "HOLD",
            };
            sizes.push(if signal == "BUY" { 0.5 } else { 0.0 });
            signals.push(signal);
            previous = close;
        }

        let height = target.height();
        let frame = DataFrame::new(vec![
            target.column("timestamp")?.clone(),
            Column::new("symbol".into(), vec!["LDO"; height]),
            Column::new("signal".into(), signals),
            Column::new("position_size".into(), sizes),
        ])?;
        Ok(frame)
    }
}

#[test]
fn test_strategy_sees_split_views() {
    init_logger();
    let frame = df! {
        "timestamp" => &[1_000i64, 2_000, 3_000],
        "close_LDO_1H" => &[100.0, 120.0, 110.0],
        "close_BTC_4H" => &[60_000.0, 61_000.0, 59_000.0],
    }
    .unwrap();

    let report = Backtester::default()
        .evaluate_strategy(&AnchorMomentum, &frame)
        .unwrap();

    // BUY at 100 with half size, SELL at 110 when BTC drops
    assert_eq!(report.metrics.num_trades, 1);
    assert!((report.metrics.total_return_pct - 5.0).abs() < 1e-9);
    assert_eq!(report.trades[0].size, 0.5);
}

#[test]
fn test_strategy_failure_is_tagged_with_generation_stage() {
    init_logger();
    let err = Backtester::default()
        .evaluate_strategy(&FailingStrategy, &price_frame())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::SignalGeneration));
    match err.root() {
        SignalbenchError::Strategy { name, message } => {
            assert_eq!(name, "failing");
            assert!(message.contains("warmup"));
        }
        other => panic!("expected strategy error, got {other:?}"),
    }
}

#[test]
fn test_extra_column_is_a_validation_failure() {
    init_logger();
    let err = Backtester::default()
        .evaluate_strategy(&ChattyStrategy, &price_frame())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Validation));
    match err.root() {
        SignalbenchError::Schema { column, .. } => assert_eq!(column, "confidence"),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_bad_signal_value_is_a_validation_failure() {
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let signals = df! {
        "timestamp" => &[1_000i64, 2_000],
        "symbol" => &["LDO", "LDO"],
        "signal" => &["buy", "SELL"],
        "position_size" => &[1.0, 0.0],
    }
    .unwrap();

    let err = Backtester::default().evaluate_signals(&signals, &prices).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Validation));
    assert!(matches!(err.root(), SignalbenchError::Schema { row: Some(0), .. }));
}

#[test]
fn test_strict_missing_price_names_symbol_and_time() {
    init_logger();
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let records = vec![
        record(1_000, "LDO", Signal::Buy),
        record(2_500, "LDO", Signal::Sell),
    ];

    let err = Backtester::default().evaluate_records(&records, &prices).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Simulation));
    match err.root() {
        SignalbenchError::PriceResolution { symbol, timestamp } => {
            assert_eq!(symbol, "LDO");
            assert_eq!(*timestamp, 2_500);
        }
        other => panic!("expected price resolution error, got {other:?}"),
    }
    assert!(err.to_string().contains("simulation"));
}

#[test]
fn test_unknown_symbol_has_no_price() {
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let records = vec![record(1_000, "BTC", Signal::Buy)];

    let err = Backtester::default().evaluate_records(&records, &prices).unwrap_err();
    assert!(matches!(err.root(), SignalbenchError::PriceResolution { .. }));
}

#[test]
fn test_lenient_forward_fill_closes_trade() {
    init_logger();
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let records = vec![
        record(1_000, "LDO", Signal::Buy),
        record(2_000, "LDO", Signal::Hold),
        record(2_500, "LDO", Signal::Sell),
    ];
    let backtester = with_config(BacktestingConfig {
        price_resolution: PriceResolution::Lenient,
        ..BacktestingConfig::default()
    });

    let report = backtester.evaluate_records(&records, &prices).unwrap();

    assert_eq!(report.metrics.num_trades, 1);
    assert_eq!(report.trades[0].exit_price, 105.0);
    assert_eq!(report.symbols[0].filled_records, 1);
}

#[test]
fn test_row_limit() {
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let records: Vec<SignalRecord> = (0..5)
        .map(|i| record(1_000 * (i + 1), "LDO", Signal::Hold))
        .collect();
    let backtester = with_config(BacktestingConfig {
        max_rows: 4,
        ..BacktestingConfig::default()
    });

    let err = backtester.evaluate_records(&records, &prices).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Validation));
    assert!(matches!(
        err.root(),
        SignalbenchError::RowLimit { rows: 5, limit: 4 }
    ));
}

#[test]
fn test_min_round_trips() {
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let records = vec![
        record(1_000, "LDO", Signal::Buy),
        record(2_000, "LDO", Signal::Sell),
    ];
    let backtester = with_config(BacktestingConfig {
        min_round_trips: 2,
        ..BacktestingConfig::default()
    });

    let err = backtester.evaluate_records(&records, &prices).unwrap_err();
    assert!(matches!(
        err.root(),
        SignalbenchError::InsufficientActivity { pairs: 1, required: 2 }
    ));
}

fn two_symbol_setup() -> (PriceTable, Vec<SignalRecord>) {
    let mut points = Vec::new();
    for (ts, ldo, pepe) in [(1, 100.0, 10.0), (2, 110.0, 9.0), (3, 99.0, 9.9), (4, 120.0, 9.0)] {
        points.push(PricePoint { timestamp: ts, symbol: "LDO".to_string(), close_price: ldo });
        points.push(PricePoint { timestamp: ts, symbol: "PEPE".to_string(), close_price: pepe });
    }
    let records = vec![
        record(1, "PEPE", Signal::Buy),
        record(1, "LDO", Signal::Buy),
        record(2, "LDO", Signal::Sell),
        record(2, "PEPE", Signal::Sell),
        record(3, "LDO", Signal::Buy),
        record(3, "PEPE", Signal::Buy),
        record(4, "PEPE", Signal::Sell),
        record(4, "LDO", Signal::Sell),
    ];
    (PriceTable::from_points(&points), records)
}

#[test]
fn test_trades_follow_first_seen_symbol_order() {
    init_logger();
    let (prices, records) = two_symbol_setup();

    let report = Backtester::default().evaluate_records(&records, &prices).unwrap();

    let symbols: Vec<&str> = report.trades.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["PEPE", "PEPE", "LDO", "LDO"]);
    let summaries: Vec<&str> = report.symbols.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(summaries, vec!["PEPE", "LDO"]);
    assert_eq!(report.metrics.num_trades, 4);
    assert_eq!(report.trajectory.len(), 5);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let (prices, records) = two_symbol_setup();
    let sequential = with_config(BacktestingConfig {
        parallel: false,
        ..BacktestingConfig::default()
    });

    let a = Backtester::default().evaluate_records(&records, &prices).unwrap();
    let b = sequential.evaluate_records(&records, &prices).unwrap();

    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.trajectory, b.trajectory);
}

#[test]
fn test_evaluation_is_repeatable() {
    let (prices, records) = two_symbol_setup();
    let backtester = Backtester::default();

    let first = backtester.evaluate_records(&records, &prices).unwrap();
    let second = backtester.evaluate_records(&records, &prices).unwrap();

    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.scores, second.scores);
    assert_eq!(first.qualification, second.qualification);
}

#[test]
fn test_consistent_winner_qualifies() {
    init_logger();
    let mut points = Vec::new();
    let mut records = Vec::new();
    for (i, exit) in [110.0, 112.0, 111.0, 113.0].into_iter().enumerate() {
        let entry_ts = (i as i64) * 2;
        points.push(PricePoint { timestamp: entry_ts, symbol: "LDO".to_string(), close_price: 100.0 });
        points.push(PricePoint { timestamp: entry_ts + 1, symbol: "LDO".to_string(), close_price: exit });
        records.push(record(entry_ts, "LDO", Signal::Buy));
        records.push(record(entry_ts + 1, "LDO", Signal::Sell));
    }
    let prices = PriceTable::from_points(&points);

    let report = Backtester::default().evaluate_records(&records, &prices).unwrap();

    assert_eq!(report.metrics.num_trades, 4);
    assert_eq!(report.metrics.max_drawdown_pct, 0.0);
    assert_eq!(report.metrics.win_rate, 1.0);
    assert!(report.metrics.sharpe_ratio > 2.0);
    assert_eq!(report.scores.profitability, 45.0);
    assert_eq!(report.scores.sharpe, 35.0);
    assert_eq!(report.scores.drawdown, 20.0);
    assert_eq!(report.scores.total, 100.0);
    assert!(report.qualifies());
    assert!(report.qualification.failed_gates.is_empty());
}

#[test]
fn test_report_serializes() {
    let (prices, records) = two_symbol_setup();
    let report = Backtester::default().evaluate_records(&records, &prices).unwrap();

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["metrics"]["num_trades"], 4);
    assert_eq!(value["symbols"][0]["symbol"], "PEPE");
    assert!(value["qualification"]["qualifies"].is_boolean());
    assert_eq!(value["trajectory"][0], 1.0);
}

#[test]
fn test_skip_failed_symbols_keeps_the_rest() {
    init_logger();
    let points = vec![
        PricePoint { timestamp: 1, symbol: "LDO".to_string(), close_price: 100.0 },
        PricePoint { timestamp: 2, symbol: "LDO".to_string(), close_price: 110.0 },
        PricePoint { timestamp: 1, symbol: "PEPE".to_string(), close_price: 10.0 },
    ];
    let prices = PriceTable::from_points(&points);
    let records = vec![
        record(1, "PEPE", Signal::Buy),
        record(1, "LDO", Signal::Buy),
        record(2, "PEPE", Signal::Sell),
        record(2, "LDO", Signal::Sell),
    ];

    let err = Backtester::default().evaluate_records(&records, &prices).unwrap_err();
    assert!(matches!(err.root(), SignalbenchError::PriceResolution { .. }));

    let skipping = with_config(BacktestingConfig {
        skip_failed_symbols: true,
        ..BacktestingConfig::default()
    });
    let report = skipping.evaluate_records(&records, &prices).unwrap();

    assert_eq!(report.metrics.num_trades, 1);
    assert!((report.metrics.total_return_pct - 10.0).abs() < 1e-9);
    assert_eq!(report.symbols[0].symbol, "PEPE");
    assert_eq!(report.symbols[0].records, 2);
    assert!(report.symbols[0].failure.as_deref().unwrap().contains("PEPE"));
    assert_eq!(report.symbols[1].failure, None);
}

#[test]
fn test_skip_failed_symbols_leaves_schema_errors_fatal() {
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let records = vec![SignalRecord::new(1_000, "LDO", Signal::Buy, 2.0)];
    let skipping = with_config(BacktestingConfig {
        skip_failed_symbols: true,
        ..BacktestingConfig::default()
    });

    let err = skipping.evaluate_records(&records, &prices).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Validation));
}

#[test]
fn test_datetime_signal_frame_against_epoch_ms_prices() {
    let prices = PriceTable::new(price_frame(), &ldo_metadata()).unwrap();
    let timestamps = Column::new("timestamp".into(), &[1_000_000i64, 2_000_000])
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .unwrap();
    let signals = DataFrame::new(vec![
        timestamps,
        Column::new("symbol".into(), &["LDO", "LDO"]),
        Column::new("signal".into(), &["BUY", "SELL"]),
        Column::new("position_size".into(), &[1.0, 0.0]),
    ])
    .unwrap();

    let report = Backtester::default().evaluate_signals(&signals, &prices).unwrap();

    assert_eq!(report.trades[0].entry_timestamp, 1_000);
    assert_eq!(report.trades[0].exit_timestamp, 2_000);
    assert!((report.metrics.total_return_pct - 5.0).abs() < 1e-9);
}
