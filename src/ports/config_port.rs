//! Configuration access port.

use crate::domain::error::BacktestError;

/// Read access to `[section] key` string values.
///
/// Typed lookups are provided on top of `get_string`; none of them fall back
/// to a default, a missing key is always an error.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn require_string(&self, section: &str, key: &str) -> Result<String, BacktestError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(BacktestError::missing(section, key)),
        }
    }

    fn require_f64(&self, section: &str, key: &str) -> Result<f64, BacktestError> {
        let raw = self.require_string(section, key)?;
        let value: f64 = raw
            .parse()
            .map_err(|_| BacktestError::invalid(section, key, format!("'{}' is not a number", raw)))?;
        if !value.is_finite() {
            return Err(BacktestError::invalid(section, key, "value must be finite"));
        }
        Ok(value)
    }

    fn require_u32(&self, section: &str, key: &str) -> Result<u32, BacktestError> {
        let raw = self.require_string(section, key)?;
        raw.parse().map_err(|_| {
            BacktestError::invalid(section, key, format!("'{}' is not a non-negative integer", raw))
        })
    }

    /// Trimmed value, with blank entries treated as absent.
    fn optional_string(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
