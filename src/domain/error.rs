//! Domain error types.

use chrono::{NaiveDate, NaiveDateTime};

/// Top-level error type for intraday-momentum.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{table} table, row {row}: invalid {field}: {reason}")]
    InvalidRecord {
        table: String,
        row: usize,
        field: String,
        reason: String,
    },

    #[error("duplicate minute bar at {timestamp}")]
    DuplicateTimestamp { timestamp: NaiveDateTime },

    #[error("minute bars at {first} and {second} fall in the same session minute")]
    MinuteCollision {
        first: NaiveDateTime,
        second: NaiveDateTime,
    },

    #[error("unclassified exit on {date} at bar {bar}: raw signal {signal} meets neither band nor VWAP condition")]
    UnclassifiedExit {
        date: NaiveDate,
        bar: usize,
        signal: i8,
    },

    #[error("P&L reconciliation failed on {date}: realized {realized} vs marked-to-market {marked}")]
    Reconciliation {
        date: NaiveDate,
        realized: f64,
        marked: f64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub fn missing(section: &str, key: &str) -> Self {
        BacktestError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::DataLoad { .. }
            | BacktestError::MissingColumn { .. }
            | BacktestError::InvalidRecord { .. }
            | BacktestError::DuplicateTimestamp { .. }
            | BacktestError::MinuteCollision { .. } => 3,
            BacktestError::UnclassifiedExit { .. } | BacktestError::Reconciliation { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_table_and_field() {
        let err = BacktestError::MissingColumn {
            table: "minute bars".into(),
            column: "volume".into(),
        };
        assert_eq!(
            err.to_string(),
            "minute bars table is missing required column 'volume'"
        );
    }

    #[test]
    fn unclassified_exit_reports_day_and_bar() {
        let err = BacktestError::UnclassifiedExit {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            bar: 17,
            signal: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("2024-03-04"));
        assert!(msg.contains("bar 17"));
    }

    #[test]
    fn minute_collision_names_both_bars() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let err = BacktestError::MinuteCollision {
            first: day.and_hms_opt(9, 30, 0).unwrap(),
            second: day.and_hms_opt(9, 30, 30).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "minute bars at 2024-03-04 09:30:00 and 2024-03-04 09:30:30 fall in the same session minute"
        );
    }

    #[test]
    fn config_helpers_build_expected_variants() {
        assert!(matches!(
            BacktestError::missing("strategy", "max_leverage"),
            BacktestError::ConfigMissing { ref section, ref key }
                if section == "strategy" && key == "max_leverage"
        ));
        assert!(matches!(
            BacktestError::invalid("backtest", "initial_capital", "must be positive"),
            BacktestError::ConfigInvalid { ref reason, .. } if reason == "must be positive"
        ));
    }
}
