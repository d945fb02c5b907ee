use crate::error::Result;
use crate::model_types::{CandleConfig, PriceInterval, Trade};
use crate::require;
use crate::time::{floor_time, TimestampNs, NS_PER_YEAR};

/// Parkinson high-low denominator scaling (4 ln 2).
const PARKINSON_SCALE: f64 = 4.0 * std::f64::consts::LN_2;

/// Anything the price estimator can query for an annualised volatility.
///
/// `eval_at_time` returns `None` while the model is still warming up; that is
/// soft absence, not an error.
pub trait VolatilityModel {
    fn add_trade(&mut self, trade: Trade) -> Result<()>;
    fn eval_at_time(&self, now: TimestampNs) -> Result<Option<PriceInterval>>;
}

/// Annualised volatility from a fixed ring of high-low candles.
///
/// Candles live in three parallel arrays indexed from `front`: slot
/// `(front + i) % capacity` is the i-th newest candle. A trade in a newer
/// bucket rotates the front one slot back, overwriting the oldest candle;
/// a trade in the current bucket widens the front in place. Candle starts
/// strictly decrease from front to back.
pub struct CandleVolatility {
    candle_ns: u64,
    starts: Vec<TimestampNs>,
    highs: Vec<PriceInterval>,
    lows: Vec<PriceInterval>,
    front: usize,
    count: usize,
}

impl CandleVolatility {
    pub fn new(config: CandleConfig) -> Result<Self> {
        require!(config.lookback >= 1, "lookback of {} leaves nothing to compare", config.lookback);
        require!(config.candle_duration_ns > 0);

        let capacity = config.lookback + 1;
        Ok(Self {
            candle_ns: config.candle_duration_ns,
            starts: vec![0; capacity],
            highs: vec![0.0; capacity],
            lows: vec![0.0; capacity],
            front: 0,
            count: 0,
        })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.starts.len()
    }

    /// Slot index of the `nth_newest` candle (0 = front).
    #[inline]
    fn slot(&self, nth_newest: usize) -> usize {
        (self.front + nth_newest) % self.capacity()
    }

    /// Number of distinct candle buckets seen so far, saturating at capacity.
    pub fn candle_count(&self) -> usize {
        self.count
    }

    /// Ingest one trade. Trades must arrive in non-decreasing time order.
    pub fn add_trade(&mut self, trade: Trade) -> Result<()> {
        let start = floor_time(trade.time, self.candle_ns);
        let price = trade.price as PriceInterval;

        if self.count == 0 || start > self.starts[self.front] {
            // Rotate: the new front overwrites the oldest slot.
            self.front = (self.front + self.capacity() - 1) % self.capacity();
            self.starts[self.front] = start;
            self.highs[self.front] = price;
            self.lows[self.front] = price;
            if self.count < self.capacity() {
                self.count += 1;
            }
        }

        // Monotone input: a trade may never land in a bucket behind the front.
        require!(
            start == self.starts[self.front],
            "trade at {} falls before the current candle starting at {}",
            trade.time,
            self.starts[self.front]
        );

        self.highs[self.front] = self.highs[self.front].max(price);
        self.lows[self.front] = self.lows[self.front].min(price);
        Ok(())
    }

    /// Parkinson-style annualised volatility over the full ring.
    ///
    /// Adjacent candles are merged pairwise (max high, min low) so sparse
    /// trading inside a single candle still produces a usable range. Returns
    /// `None` until the ring is full.
    pub fn eval_volatility(&self) -> Result<Option<PriceInterval>> {
        if self.count < self.capacity() {
            return Ok(None);
        }

        let mut numer = 0.0;
        let mut denom = 0.0;

        for i in 0..self.count - 1 {
            let cur = self.slot(i);
            let prev = self.slot(i + 1);

            let max_high = self.highs[cur].max(self.highs[prev]);
            let min_low = self.lows[cur].min(self.lows[prev]);
            require!(
                min_low > 0.0 && min_low <= max_high,
                "merged candle range [{}, {}] is not positive",
                min_low,
                max_high
            );

            let log_ratio = (max_high / min_low).ln();
            numer += log_ratio * log_ratio;

            let cur_end = self.starts[cur] + self.candle_ns;
            require!(
                cur_end > self.starts[prev],
                "candle at {} ends at or before its predecessor at {}",
                self.starts[cur],
                self.starts[prev]
            );
            denom += (cur_end - self.starts[prev]) as f64;
        }

        denom *= PARKINSON_SCALE;
        Ok(Some((numer / denom * NS_PER_YEAR as f64).sqrt()))
    }
}

impl VolatilityModel for CandleVolatility {
    fn add_trade(&mut self, trade: Trade) -> Result<()> {
        CandleVolatility::add_trade(self, trade)
    }

    /// The candle estimator is time-independent: the ring already reflects
    /// every trade up to now.
    fn eval_at_time(&self, _now: TimestampNs) -> Result<Option<PriceInterval>> {
        self.eval_volatility()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::NS_PER_SEC;

    fn model(lookback: usize) -> CandleVolatility {
        CandleVolatility::new(CandleConfig {
            lookback,
            ..CandleConfig::default()
        })
        .unwrap()
    }

    fn trade(price: i64, secs: u64) -> Trade {
        Trade {
            price,
            time: secs * NS_PER_SEC,
        }
    }

    #[test]
    fn test_rejects_degenerate_config() {
        assert!(CandleVolatility::new(CandleConfig {
            lookback: 0,
            ..CandleConfig::default()
        })
        .is_err());
        assert!(CandleVolatility::new(CandleConfig {
            lookback: 5,
            candle_duration_ns: 0,
        })
        .is_err());
    }

    #[test]
    fn test_front_tracks_latest_bucket() {
        let mut m = model(2);
        m.add_trade(trade(100, 10)).unwrap();
        assert_eq!(m.starts[m.front], 0);
        m.add_trade(trade(101, 65)).unwrap();
        assert_eq!(m.starts[m.front], 60 * NS_PER_SEC);
        assert_eq!(m.candle_count(), 2);
    }

    #[test]
    fn test_same_bucket_trades_collapse_to_one_candle() {
        let mut m = model(2);
        m.add_trade(trade(100, 1)).unwrap();
        m.add_trade(trade(130, 20)).unwrap();
        m.add_trade(trade(90, 45)).unwrap();
        m.add_trade(trade(110, 59)).unwrap();

        assert_eq!(m.candle_count(), 1);
        assert_eq!(m.highs[m.front], 130.0);
        assert_eq!(m.lows[m.front], 90.0);
    }

    #[test]
    fn test_candle_starts_strictly_decrease() {
        let mut m = model(3);
        for (i, secs) in [5u64, 70, 130, 200, 260].iter().enumerate() {
            m.add_trade(trade(100 + i as i64, *secs)).unwrap();
        }
        // Ring is saturated; walk newest to oldest.
        for i in 0..m.candle_count() - 1 {
            assert!(m.starts[m.slot(i)] > m.starts[m.slot(i + 1)]);
        }
    }

    #[test]
    fn test_warm_up_returns_none_until_ring_full() {
        let mut m = model(2); // capacity 3
        m.add_trade(trade(100, 0)).unwrap();
        assert!(m.eval_volatility().unwrap().is_none());
        m.add_trade(trade(101, 60)).unwrap();
        assert!(m.eval_volatility().unwrap().is_none());
        m.add_trade(trade(102, 120)).unwrap();
        assert!(m.eval_volatility().unwrap().is_some());
    }

    #[test]
    fn test_minimal_lookback_volatility_value() {
        let mut m = model(1); // capacity 2
        m.add_trade(trade(100, 0)).unwrap();
        m.add_trade(trade(110, 30)).unwrap();
        m.add_trade(trade(105, 60)).unwrap();

        let vol = m.eval_volatility().unwrap().unwrap();

        // One merged pair: highs 110/105, lows 100/105.
        let log_ratio = (110.0f64 / 100.0).ln();
        let span_ns = (120 * NS_PER_SEC) as f64; // cur end 120s, prev start 0s
        let expected =
            (log_ratio * log_ratio / (span_ns * PARKINSON_SCALE) * NS_PER_YEAR as f64).sqrt();

        assert!(
            (vol - expected).abs() < 1e-12 * expected,
            "vol {} differs from expected {}",
            vol,
            expected
        );
    }

    #[test]
    fn test_rotation_drops_oldest_candle() {
        let mut m = model(1); // capacity 2
        m.add_trade(trade(100, 0)).unwrap();
        m.add_trade(trade(200, 60)).unwrap();
        m.add_trade(trade(300, 120)).unwrap();

        assert_eq!(m.candle_count(), 2);
        assert_eq!(m.starts[m.slot(0)], 120 * NS_PER_SEC);
        assert_eq!(m.starts[m.slot(1)], 60 * NS_PER_SEC);
    }

    #[test]
    fn test_non_monotone_trade_is_a_precondition_failure() {
        let mut m = model(2);
        m.add_trade(trade(100, 120)).unwrap();
        let err = m.add_trade(trade(99, 30)).unwrap_err();
        assert!(err.to_string().contains("precondition"));
    }

    #[test]
    fn test_non_positive_price_fails_eval() {
        let mut m = model(1);
        m.add_trade(trade(0, 0)).unwrap();
        m.add_trade(trade(10, 60)).unwrap();
        assert!(m.eval_volatility().is_err());
    }

    #[test]
    fn test_eval_at_time_ignores_timestamp() {
        let mut m = model(1);
        m.add_trade(trade(100, 0)).unwrap();
        m.add_trade(trade(110, 60)).unwrap();

        let direct = m.eval_volatility().unwrap();
        let via_trait = m.eval_at_time(12_345).unwrap();
        assert_eq!(direct, via_trait);
    }
}
