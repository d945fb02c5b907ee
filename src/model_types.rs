use crate::time::{DurationNs, TimestampNs, NS_PER_MS, NS_PER_SEC};
use serde::{Deserialize, Serialize};

/// Raw price in instrument-native units. No scaling is applied internally.
pub type PriceVal = i64;

/// Non-negative floating-point price quantity: confidence half-widths, price
/// differences, volatility scalars.
pub type PriceInterval = f64;

/// A single executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub price: PriceVal,
    pub time: TimestampNs,
}

/// A price estimate with its confidence half-width (`conf >= 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEstimate {
    pub price: PriceVal,
    pub conf: PriceInterval,
}

/// Running high/low window over observed trade prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    high: PriceVal,
    low: PriceVal,
}

impl PriceRange {
    /// Open a range at a single price: `high == low == open`.
    pub fn new(open: PriceVal) -> Self {
        Self {
            high: open,
            low: open,
        }
    }

    /// Widen the range to cover `price`. Monotone: never shrinks.
    pub fn add_price(&mut self, price: PriceVal) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
    }

    /// Half-width `(high - low) / 2`.
    pub fn interval(&self) -> PriceInterval {
        (self.high - self.low) as PriceInterval / 2.0
    }

    pub fn high(&self) -> PriceVal {
        self.high
    }

    pub fn low(&self) -> PriceVal {
        self.low
    }
}

/// Configuration for the candle volatility estimator
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CandleConfig {
    /// Historical candles considered, excluding the current one. The ring
    /// holds `lookback + 1` candles.
    pub lookback: usize,
    /// Width of one candle bucket in nanoseconds.
    pub candle_duration_ns: u64,
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            candle_duration_ns: 60 * NS_PER_SEC,
        }
    }
}

/// Configuration for the standard price estimator
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Floor applied to every emitted confidence interval.
    pub min_conf_interval: f64,
    /// Maximum tolerable age of the last trade at evaluation time.
    pub timeout_ns: DurationNs,
    /// Minimum projection slot; short elapsed times are widened to this.
    pub min_slot_ns: DurationNs,
    /// Fallback annualised volatility while the candle model warms up.
    pub init_volatility: f64,
    pub candle: CandleConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_conf_interval: 0.01,
            timeout_ns: (60 * NS_PER_SEC) as DurationNs,
            min_slot_ns: (500 * NS_PER_MS) as DurationNs,
            init_volatility: 1.0,
            candle: CandleConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_open_has_zero_interval() {
        let range = PriceRange::new(100);
        assert_eq!(range.interval(), 0.0);
        assert_eq!(range.high(), 100);
        assert_eq!(range.low(), 100);
    }

    #[test]
    fn test_range_interval_is_half_spread() {
        let mut range = PriceRange::new(100);
        range.add_price(110);
        assert_eq!(range.interval(), 5.0);
        range.add_price(90);
        assert_eq!(range.interval(), 10.0);
    }

    #[test]
    fn test_range_never_shrinks() {
        let mut range = PriceRange::new(100);
        range.add_price(120);
        range.add_price(105); // inside the range, no effect
        assert_eq!(range.high(), 120);
        assert_eq!(range.low(), 100);
    }

    #[test]
    fn test_default_configs() {
        let candle = CandleConfig::default();
        assert_eq!(candle.lookback, 20);
        assert_eq!(candle.candle_duration_ns, 60_000_000_000);

        let est = EstimatorConfig::default();
        assert_eq!(est.min_conf_interval, 0.01);
        assert_eq!(est.timeout_ns, 60_000_000_000);
        assert_eq!(est.min_slot_ns, 500_000_000);
        assert_eq!(est.init_volatility, 1.0);
    }

    #[test]
    fn test_config_deserializes_with_partial_fields() {
        let cfg: EstimatorConfig =
            serde_json::from_str(r#"{"min_conf_interval": 0.5, "candle": {"lookback": 3}}"#)
                .unwrap();
        assert_eq!(cfg.min_conf_interval, 0.5);
        assert_eq!(cfg.candle.lookback, 3);
        // Unspecified fields fall back to defaults
        assert_eq!(cfg.timeout_ns, 60_000_000_000);
        assert_eq!(cfg.candle.candle_duration_ns, 60_000_000_000);
    }
}
