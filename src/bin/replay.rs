use anyhow::{Context, Result};
use clap::Parser;
use price_estimator::{
    run_replay, Column, EstimatorConfig, PriceEstimator, PriceInterval, PriceVal, ReplayInputs,
    ReplayParams, TimestampNs, DEFAULT_CONF_TOLERANCE, NS_PER_MS, NS_PER_SEC,
};
use std::path::PathBuf;
use tracing::info;

/// Replay recorded trade and evaluation columns through the price estimator
/// and check every emitted estimate against the expected sequence.
#[derive(Parser, Debug)]
#[command(name = "replay", version)]
struct Args {
    /// Column file of trade prices (i64, little-endian)
    #[arg(long)]
    trade_prices: PathBuf,

    /// Column file of trade timestamps (u64 nanoseconds)
    #[arg(long)]
    trade_times: PathBuf,

    /// Column file of evaluation timestamps (u64 nanoseconds)
    #[arg(long)]
    eval_times: PathBuf,

    /// Column file of expected prices (i64; 0 paired with a 0 interval encodes "no estimate")
    #[arg(long)]
    eval_prices: PathBuf,

    /// Column file of expected confidence intervals (f64)
    #[arg(long)]
    eval_intervals: PathBuf,

    /// Optional JSON file with estimator defaults; explicit flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Relative tolerance for confidence comparisons
    #[arg(long)]
    conf_tolerance: Option<f64>,

    /// Fallback annualised volatility while the candle model warms up
    #[arg(long)]
    init_volatility: Option<f64>,

    /// Floor on emitted confidence intervals
    #[arg(long)]
    min_interval: Option<f64>,

    /// Minimum projection slot, milliseconds
    #[arg(long)]
    min_slot_ms: Option<i64>,

    /// Staleness timeout, milliseconds
    #[arg(long)]
    timeout_ms: Option<i64>,

    /// Candle duration, seconds
    #[arg(long)]
    candle_secs: Option<u64>,

    /// Historical candles used by the volatility estimator
    #[arg(long)]
    lookback: Option<usize>,

    /// Print a table row per evaluation
    #[arg(long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<EstimatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {:?}", path))?;
            let cfg: EstimatorConfig = serde_json::from_str(&contents)
                .with_context(|| format!("parsing config {:?}", path))?;
            info!("Loaded config from {:?}", path);
            cfg
        }
        None => EstimatorConfig::default(),
    };

    if let Some(v) = args.min_interval {
        config.min_conf_interval = v;
    }
    if let Some(v) = args.init_volatility {
        config.init_volatility = v;
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout_ns = ms * NS_PER_MS as i64;
    }
    if let Some(ms) = args.min_slot_ms {
        config.min_slot_ns = ms * NS_PER_MS as i64;
    }
    if let Some(secs) = args.candle_secs {
        config.candle.candle_duration_ns = secs * NS_PER_SEC;
    }
    if let Some(lookback) = args.lookback {
        config.candle.lookback = lookback;
    }

    Ok(config)
}

fn main() -> Result<()> {
    price_estimator::init_logging();
    let args = Args::parse();

    let config = load_config(&args)?;
    let conf_tolerance = args.conf_tolerance.unwrap_or(DEFAULT_CONF_TOLERANCE);

    let trade_prices: Column<PriceVal> = Column::open(&args.trade_prices)?;
    let trade_times: Column<TimestampNs> = Column::open(&args.trade_times)?;
    let eval_times: Column<TimestampNs> = Column::open(&args.eval_times)?;
    let eval_prices: Column<PriceVal> = Column::open(&args.eval_prices)?;
    let eval_intervals: Column<PriceInterval> = Column::open(&args.eval_intervals)?;

    info!(
        "Replaying {} trades against {} evaluations (tolerance {})",
        trade_prices.len(),
        eval_times.len(),
        conf_tolerance
    );

    let estimator = PriceEstimator::new(&config)?;
    let report = run_replay(ReplayParams {
        inputs: ReplayInputs {
            trade_prices: trade_prices.as_slice(),
            trade_times: trade_times.as_slice(),
            eval_times: eval_times.as_slice(),
            eval_prices: eval_prices.as_slice(),
            eval_intervals: eval_intervals.as_slice(),
        },
        estimator,
        conf_tolerance,
        verbose: args.verbose,
    })?;

    println!("\n{:-<60}", "");
    println!("REPLAY SUMMARY");
    println!("{:-<60}", "");
    println!("Trades fed:            {}", report.trades_fed);
    println!("Evaluations checked:   {}", report.evals_checked);
    println!("Estimates emitted:     {}", report.estimates_emitted);
    println!("Absent (warm-up/stale): {}", report.absent_evals);
    println!("Confidence tolerance:  {}", conf_tolerance);

    Ok(())
}
