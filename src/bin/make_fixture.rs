use anyhow::{Context, Result};
use clap::Parser;
use price_estimator::{
    write_column, EstimatorConfig, PriceEstimator, PriceInterval, PriceVal, TimestampNs, Trade,
    NS_PER_SEC,
};
use std::path::PathBuf;
use tracing::info;

/// Deterministic price steps for the synthetic walk, in instrument units.
const PRICE_STEPS: [i64; 7] = [3, -2, 5, -4, 1, 2, -3];

/// Generate a self-consistent set of column files for the replay binary:
/// a synthetic trade stream plus the expected estimates the default
/// estimator produces for it.
#[derive(Parser, Debug)]
#[command(name = "make_fixture", version)]
struct Args {
    /// Directory to write the column files into
    #[arg(long, default_value = "fixtures")]
    out_dir: PathBuf,

    /// Number of synthetic trades
    #[arg(long, default_value_t = 600)]
    trades: usize,

    /// Seconds between consecutive trades
    #[arg(long, default_value_t = 5)]
    trade_gap_secs: u64,

    /// Seconds between consecutive evaluations
    #[arg(long, default_value_t = 7)]
    eval_gap_secs: u64,
}

fn main() -> Result<()> {
    price_estimator::init_logging();
    let args = Args::parse();

    let mut trade_prices: Vec<PriceVal> = Vec::with_capacity(args.trades);
    let mut trade_times: Vec<TimestampNs> = Vec::with_capacity(args.trades);

    let mut price: PriceVal = 100_000;
    for i in 0..args.trades {
        price += PRICE_STEPS[i % PRICE_STEPS.len()] * 25;
        trade_prices.push(price);
        trade_times.push(i as u64 * args.trade_gap_secs * NS_PER_SEC);
    }

    let horizon = trade_times.last().copied().unwrap_or(0) + 10 * NS_PER_SEC;
    let eval_gap = args.eval_gap_secs * NS_PER_SEC;
    let eval_times: Vec<TimestampNs> = (1..)
        .map(|i| i * eval_gap)
        .take_while(|t| *t <= horizon)
        .collect();

    // Produce the expected columns by running the estimator over the same
    // merged order the replay driver uses (evals before coincident trades).
    let mut estimator = PriceEstimator::new(&EstimatorConfig::default())?;
    let mut eval_prices: Vec<PriceVal> = Vec::with_capacity(eval_times.len());
    let mut eval_intervals: Vec<PriceInterval> = Vec::with_capacity(eval_times.len());

    let mut ti = 0usize;
    for &now in &eval_times {
        while ti < trade_times.len() && trade_times[ti] < now {
            estimator.add_trade(Trade {
                price: trade_prices[ti],
                time: trade_times[ti],
            })?;
            ti += 1;
        }
        match estimator.eval_at_time(now)? {
            Some(est) => {
                eval_prices.push(est.price);
                eval_intervals.push(est.conf);
            }
            None => {
                eval_prices.push(0);
                eval_intervals.push(0.0);
            }
        }
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {:?}", args.out_dir))?;

    write_column(&args.out_dir.join("trade_prices.bin"), &trade_prices)?;
    write_column(&args.out_dir.join("trade_times.bin"), &trade_times)?;
    write_column(&args.out_dir.join("eval_times.bin"), &eval_times)?;
    write_column(&args.out_dir.join("eval_prices.bin"), &eval_prices)?;
    write_column(&args.out_dir.join("eval_intervals.bin"), &eval_intervals)?;

    info!(
        "Wrote {} trades and {} evaluations to {:?}",
        trade_prices.len(),
        eval_times.len(),
        args.out_dir
    );

    let dir = args.out_dir.display();
    println!("Fixture ready. Verify it with:");
    println!(
        "  replay --trade-prices {dir}/trade_prices.bin --trade-times {dir}/trade_times.bin \\"
    );
    println!(
        "    --eval-times {dir}/eval_times.bin --eval-prices {dir}/eval_prices.bin \\"
    );
    println!("    --eval-intervals {dir}/eval_intervals.bin");

    Ok(())
}
