use crate::error::Result;
use crate::model_types::{EstimatorConfig, PriceEstimate, PriceRange, Trade};
use crate::require;
use crate::time::{diff_times, DurationNs, TimestampNs, NS_PER_YEAR};
use crate::volatility::{CandleVolatility, VolatilityModel};

/// Online price estimator over a monotone trade stream.
///
/// Tracks the most recent trade and the price range observed since the last
/// successful evaluation, and composes a confidence interval from the
/// volatility model, the elapsed time since the last trade, a configured
/// floor, and that range.
///
/// The volatility model is an injection point; production code uses
/// [`CandleVolatility`], tests can substitute anything implementing
/// [`VolatilityModel`].
pub struct PriceEstimator<V = CandleVolatility> {
    vol_model: V,
    last_trade: Option<Trade>,
    range_since_eval: Option<PriceRange>,
    min_conf_interval: f64,
    init_volatility: f64,
    timeout_ns: DurationNs,
    min_slot_ns: DurationNs,
}

impl PriceEstimator<CandleVolatility> {
    /// Build an estimator with a fresh candle volatility model.
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        let vol_model = CandleVolatility::new(config.candle.clone())?;
        Self::with_model(config, vol_model)
    }
}

impl Default for PriceEstimator<CandleVolatility> {
    fn default() -> Self {
        // Default configuration always satisfies the construction contract.
        Self::new(&EstimatorConfig::default()).expect("default config is valid")
    }
}

impl<V: VolatilityModel> PriceEstimator<V> {
    /// Build an estimator around a caller-supplied volatility model.
    pub fn with_model(config: &EstimatorConfig, vol_model: V) -> Result<Self> {
        require!(config.min_conf_interval >= 0.0);
        require!(config.init_volatility >= 0.0);
        require!(
            0 <= config.min_slot_ns && config.min_slot_ns < config.timeout_ns,
            "min_slot_ns {} must lie in [0, timeout_ns {})",
            config.min_slot_ns,
            config.timeout_ns
        );

        Ok(Self {
            vol_model,
            last_trade: None,
            range_since_eval: None,
            min_conf_interval: config.min_conf_interval,
            init_volatility: config.init_volatility,
            timeout_ns: config.timeout_ns,
            min_slot_ns: config.min_slot_ns,
        })
    }

    pub fn last_trade(&self) -> Option<Trade> {
        self.last_trade
    }

    /// Ingest one trade. Trades must arrive in non-decreasing time order.
    pub fn add_trade(&mut self, trade: Trade) -> Result<()> {
        self.vol_model.add_trade(trade)?;

        match self.range_since_eval.as_mut() {
            Some(range) => range.add_price(trade.price),
            None => self.range_since_eval = Some(PriceRange::new(trade.price)),
        }

        self.last_trade = Some(trade);
        Ok(())
    }

    /// Produce an estimate as of `now`, or `None` before the first trade or
    /// once the last trade is older than the staleness timeout.
    ///
    /// A stale evaluation leaves `range_since_eval` untouched; the range keeps
    /// accumulating until the next successful evaluation consumes it.
    pub fn eval_at_time(&mut self, now: TimestampNs) -> Result<Option<PriceEstimate>> {
        let Some(last) = self.last_trade else {
            return Ok(None);
        };

        let elapsed = diff_times(now, last.time);
        require!(
            elapsed >= 0,
            "evaluation at {} precedes the last trade at {}",
            now,
            last.time
        );

        if elapsed > self.timeout_ns {
            return Ok(None);
        }

        let yearly_vol = match self.vol_model.eval_at_time(now)? {
            Some(vol) => vol,
            None => self.init_volatility,
        };

        let slot = elapsed.max(self.min_slot_ns);
        let years = slot as f64 / NS_PER_YEAR as f64;

        // Domain assumption: prices are non-negative, so the product is too.
        let mut conf = yearly_vol * years.sqrt() * last.price as f64;
        conf = conf.max(self.min_conf_interval);

        if let Some(range) = self.range_since_eval.take() {
            conf = conf.max(range.interval());
        }

        Ok(Some(PriceEstimate {
            price: last.price,
            conf,
        }))
    }
}
