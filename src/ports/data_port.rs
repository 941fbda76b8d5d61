//! Market data access port.

use crate::domain::bar::{DailyClose, Dividend, PriceBar};
use crate::domain::error::BacktestError;

/// Source of the three input tables.
///
/// Minute bars come back in any order; grouping and sorting happen in the
/// domain. A source without dividends returns an empty table.
pub trait MarketDataPort {
    fn minute_bars(&self) -> Result<Vec<PriceBar>, BacktestError>;

    fn daily_closes(&self) -> Result<Vec<DailyClose>, BacktestError>;

    fn dividends(&self) -> Result<Vec<Dividend>, BacktestError>;
}
