use chrono::{DateTime, Utc};

/// Wall-clock instant as unsigned nanoseconds since the epoch.
pub type TimestampNs = u64;

/// Signed span of nanoseconds.
pub type DurationNs = i64;

pub const NS_PER_MS: u64 = 1_000_000;
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Annualisation base: 365 days of nanoseconds. Volatility scaling must use
/// exactly this constant to reproduce reference outputs.
pub const NS_PER_YEAR: u64 = 365 * 24 * 3600 * NS_PER_SEC;

/// Shift a timestamp by a signed duration.
#[inline]
pub fn add_time(ts: TimestampNs, dur: DurationNs) -> TimestampNs {
    (ts as i64 + dur) as TimestampNs
}

/// Signed difference `a - b`. No saturation.
#[inline]
pub fn diff_times(a: TimestampNs, b: TimestampNs) -> DurationNs {
    a as i64 - b as i64
}

/// Greatest multiple of `interval` that is <= `ts`. Requires `interval > 0`.
#[inline]
pub fn floor_time(ts: TimestampNs, interval: u64) -> TimestampNs {
    debug_assert!(interval > 0);
    ts - ts % interval
}

/// Format a nanosecond timestamp as a human-readable UTC datetime.
pub fn format_timestamp_ns(ts: TimestampNs) -> String {
    let seconds = (ts / NS_PER_SEC) as i64;
    let nanos = (ts % NS_PER_SEC) as u32;

    match DateTime::<Utc>::from_timestamp(seconds, nanos) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_time_truncates() {
        assert_eq!(floor_time(0, 60 * NS_PER_SEC), 0);
        assert_eq!(floor_time(59 * NS_PER_SEC, 60 * NS_PER_SEC), 0);
        assert_eq!(floor_time(60 * NS_PER_SEC, 60 * NS_PER_SEC), 60 * NS_PER_SEC);
        assert_eq!(
            floor_time(61 * NS_PER_SEC + 7, 60 * NS_PER_SEC),
            60 * NS_PER_SEC
        );
    }

    #[test]
    fn test_floor_time_exact_multiple_is_identity() {
        let interval = 500 * NS_PER_MS;
        let ts = 12 * interval;
        assert_eq!(floor_time(ts, interval), ts);
    }

    #[test]
    fn test_diff_times_signed() {
        assert_eq!(diff_times(10, 4), 6);
        assert_eq!(diff_times(4, 10), -6);
        assert_eq!(diff_times(7, 7), 0);
    }

    #[test]
    fn test_add_time_round_trips_diff() {
        let a: TimestampNs = 1_000_000;
        let b: TimestampNs = 250_000;
        assert_eq!(add_time(b, diff_times(a, b)), a);
        assert_eq!(add_time(a, diff_times(b, a)), b);
    }

    #[test]
    fn test_ns_per_year_constant() {
        assert_eq!(NS_PER_YEAR, 31_536_000_000_000_000);
    }

    #[test]
    fn test_format_timestamp_epoch() {
        assert!(format_timestamp_ns(0).starts_with("1970-01-01 00:00:00"));
    }
}
