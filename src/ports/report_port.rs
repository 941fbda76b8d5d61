//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::portfolio::DayEquity;
use crate::domain::trade::TradeLedger;

/// Sink for the trade ledger and the daily equity series.
pub trait ReportPort {
    fn write_trades(&self, ledger: &TradeLedger) -> Result<(), BacktestError>;

    fn write_equity(&self, equity: &[DayEquity]) -> Result<(), BacktestError>;

    /// Default implementation: writes both tables of a finished run.
    fn write(&self, result: &BacktestResult) -> Result<(), BacktestError> {
        self.write_trades(&result.ledger)?;
        self.write_equity(&result.equity)
    }
}
