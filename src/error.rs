use crate::time::TimestampNs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the estimation core and the replay driver.
///
/// Warm-up and staleness are not errors; they are absent optionals. Anything
/// here is fatal for the run that produced it.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// A contract the caller was required to uphold did not hold.
    #[error("precondition violated: `{expr}` at {file}:{line}{}", fmt_detail(.detail))]
    Precondition {
        expr: &'static str,
        file: &'static str,
        line: u32,
        detail: String,
    },

    /// Malformed input: bad column file, mismatched lengths, non-monotone times.
    #[error("input error: {0}")]
    Input(String),

    /// Replay comparison failure at a specific evaluation.
    #[error("estimate mismatch at eval #{index} (t={time}): {detail}")]
    Mismatch {
        index: usize,
        time: TimestampNs,
        detail: String,
    },

    /// Column file could not be opened or mapped.
    #[error("failed to read column {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn fmt_detail(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

impl EstimatorError {
    pub fn precondition(
        expr: &'static str,
        file: &'static str,
        line: u32,
        detail: String,
    ) -> Self {
        Self::Precondition {
            expr,
            file,
            line,
            detail,
        }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Bail out with a `Precondition` error when a required invariant is broken.
///
/// The diagnostic names the failed expression and its source location; an
/// optional format string adds the values involved.
#[macro_export]
macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err($crate::error::EstimatorError::precondition(
                stringify!($cond),
                file!(),
                line!(),
                String::new(),
            ));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::EstimatorError::precondition(
                stringify!($cond),
                file!(),
                line!(),
                format!($($arg)+),
            ));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(v: i64) -> Result<i64> {
        require!(v >= 0, "got {}", v);
        Ok(v)
    }

    #[test]
    fn test_require_passes_through() {
        assert_eq!(checked(5).unwrap(), 5);
    }

    #[test]
    fn test_require_reports_expression_and_location() {
        let err = checked(-3).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("v >= 0"), "missing expression in {}", msg);
        assert!(msg.contains("error.rs"), "missing file in {}", msg);
        assert!(msg.contains("got -3"), "missing detail in {}", msg);
    }

    #[test]
    fn test_mismatch_display_names_eval() {
        let err = EstimatorError::Mismatch {
            index: 7,
            time: 1_000,
            detail: "expected 100, got 101".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#7"));
        assert!(msg.contains("t=1000"));
    }
}
