//! Replay driver: feeds recorded trade and evaluation columns through a
//! price estimator in deterministic merged order and checks every emitted
//! estimate against the expected sequence.

use crate::error::{EstimatorError, Result};
use crate::estimator::PriceEstimator;
use crate::model_types::{PriceEstimate, PriceInterval, PriceVal, Trade};
use crate::time::{format_timestamp_ns, TimestampNs};
use crate::volatility::{CandleVolatility, VolatilityModel};

/// Default relative tolerance on confidence intervals.
pub const DEFAULT_CONF_TOLERANCE: f64 = 1e-5;

/// Borrowed input columns. Trades and evaluations must each be in
/// non-decreasing time order; expected `(0, 0)` rows encode "no estimate".
pub struct ReplayInputs<'a> {
    pub trade_prices: &'a [PriceVal],
    pub trade_times: &'a [TimestampNs],
    pub eval_times: &'a [TimestampNs],
    pub eval_prices: &'a [PriceVal],
    pub eval_intervals: &'a [PriceInterval],
}

/// Input parameters for a replay run
pub struct ReplayParams<'a, V = CandleVolatility> {
    pub inputs: ReplayInputs<'a>,
    /// Estimator under test; consumed by the run.
    pub estimator: PriceEstimator<V>,
    /// Relative tolerance applied to confidence comparisons.
    pub conf_tolerance: f64,
    /// Print a table row per evaluation.
    pub verbose: bool,
}

/// Counters from a completed replay run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub trades_fed: u64,
    pub evals_checked: u64,
    pub estimates_emitted: u64,
    pub absent_evals: u64,
}

fn require_monotone(times: &[TimestampNs], what: &str) -> Result<()> {
    for (i, pair) in times.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(EstimatorError::input(format!(
                "{} times go backwards at index {}: {} -> {}",
                what,
                i + 1,
                pair[0],
                pair[1]
            )));
        }
    }
    Ok(())
}

fn validate_inputs(inputs: &ReplayInputs<'_>, conf_tolerance: f64) -> Result<()> {
    if inputs.trade_prices.len() != inputs.trade_times.len() {
        return Err(EstimatorError::input(format!(
            "trade columns disagree: {} prices vs {} times",
            inputs.trade_prices.len(),
            inputs.trade_times.len()
        )));
    }
    if inputs.eval_prices.len() != inputs.eval_times.len()
        || inputs.eval_intervals.len() != inputs.eval_times.len()
    {
        return Err(EstimatorError::input(format!(
            "eval columns disagree: {} times vs {} prices vs {} intervals",
            inputs.eval_times.len(),
            inputs.eval_prices.len(),
            inputs.eval_intervals.len()
        )));
    }
    if !(conf_tolerance >= 0.0) {
        return Err(EstimatorError::input(format!(
            "conf tolerance {} must be non-negative",
            conf_tolerance
        )));
    }

    require_monotone(inputs.trade_times, "trade")?;
    require_monotone(inputs.eval_times, "eval")?;

    if let Some((i, bad)) = inputs
        .eval_intervals
        .iter()
        .enumerate()
        .find(|(_, c)| !(**c >= 0.0))
    {
        return Err(EstimatorError::input(format!(
            "expected confidence at index {} is {}, must be non-negative",
            i, bad
        )));
    }

    Ok(())
}

/// Compare one evaluation result against its expected row.
fn check_estimate(
    index: usize,
    time: TimestampNs,
    actual: Option<PriceEstimate>,
    expected_price: PriceVal,
    expected_conf: PriceInterval,
    rtol: f64,
) -> Result<()> {
    match actual {
        Some(got) => {
            if got.price != expected_price {
                return Err(EstimatorError::Mismatch {
                    index,
                    time,
                    detail: format!("price {} != expected {}", got.price, expected_price),
                });
            }
            let lo = expected_conf * (1.0 - rtol);
            let hi = expected_conf * (1.0 + rtol);
            if !(got.conf >= lo && got.conf <= hi) {
                return Err(EstimatorError::Mismatch {
                    index,
                    time,
                    detail: format!(
                        "conf {} outside [{}, {}] (expected {} +/- {})",
                        got.conf, lo, hi, expected_conf, rtol
                    ),
                });
            }
            Ok(())
        }
        // An absent estimate must be encoded as the (0, 0) sentinel.
        None => {
            if expected_price != 0 || expected_conf != 0.0 {
                return Err(EstimatorError::Mismatch {
                    index,
                    time,
                    detail: format!(
                        "estimator returned nothing, expected ({}, {})",
                        expected_price, expected_conf
                    ),
                });
            }
            Ok(())
        }
    }
}

/// Run the deterministic replay.
///
/// Trades and evaluations are interleaved by timestamp; when a trade and an
/// evaluation coincide, the evaluation runs first, so each estimate reflects
/// only strictly earlier trades.
pub fn run_replay<V: VolatilityModel>(params: ReplayParams<'_, V>) -> Result<ReplayReport> {
    let ReplayParams {
        inputs,
        mut estimator,
        conf_tolerance,
        verbose,
    } = params;

    validate_inputs(&inputs, conf_tolerance)?;

    if verbose {
        println!(
            "{:>6} | {:<27} | {:>12} | {:>14} | {:>12} | {:>14}",
            "Eval#", "DateTime", "Price", "Conf", "ExpPrice", "ExpConf"
        );
        println!("{:-<100}", "");
    }

    let mut report = ReplayReport::default();
    let mut ti = 0usize;
    let mut ei = 0usize;

    loop {
        let next_trade_first = ti < inputs.trade_times.len()
            && (ei >= inputs.eval_times.len() || inputs.eval_times[ei] > inputs.trade_times[ti]);

        if next_trade_first {
            estimator.add_trade(Trade {
                price: inputs.trade_prices[ti],
                time: inputs.trade_times[ti],
            })?;
            report.trades_fed += 1;
            ti += 1;
        } else if ei < inputs.eval_times.len() {
            let now = inputs.eval_times[ei];
            let actual = estimator.eval_at_time(now)?;

            match actual {
                Some(_) => report.estimates_emitted += 1,
                None => report.absent_evals += 1,
            }

            if verbose {
                let (price, conf) = match actual {
                    Some(est) => (est.price.to_string(), format!("{:.6}", est.conf)),
                    None => ("-".to_string(), "-".to_string()),
                };
                println!(
                    "{:>6} | {:<27} | {:>12} | {:>14} | {:>12} | {:>14.6}",
                    ei,
                    format_timestamp_ns(now),
                    price,
                    conf,
                    inputs.eval_prices[ei],
                    inputs.eval_intervals[ei]
                );
            }

            check_estimate(
                ei,
                now,
                actual,
                inputs.eval_prices[ei],
                inputs.eval_intervals[ei],
                conf_tolerance,
            )?;

            report.evals_checked += 1;
            ei += 1;
        } else {
            break;
        }
    }

    Ok(report)
}
