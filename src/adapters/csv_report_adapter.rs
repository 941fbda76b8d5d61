//! CSV writer for the trade ledger and daily equity series.

use crate::domain::error::BacktestError;
use crate::domain::portfolio::DayEquity;
use crate::domain::trade::{Trade, TradeLedger};
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::{Path, PathBuf};

const TIME_FORMAT: &str = "%H:%M:%S";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Serialize)]
struct TradeRow {
    date: String,
    open_time: String,
    open_price: f64,
    exit_time: String,
    exit_price: f64,
    signed_shares: i64,
    pnl_percent: f64,
    pnl_absolute: f64,
    account_balance_after: f64,
    side: String,
    exit_reason: &'static str,
}

impl From<&Trade> for TradeRow {
    fn from(t: &Trade) -> Self {
        TradeRow {
            date: t.date.to_string(),
            open_time: t.open_time.format(TIME_FORMAT).to_string(),
            open_price: round2(t.open_price),
            exit_time: t.exit_time.format(TIME_FORMAT).to_string(),
            exit_price: round2(t.exit_price),
            signed_shares: t.signed_shares,
            pnl_percent: round2(t.pnl_percent),
            pnl_absolute: round2(t.pnl_absolute),
            account_balance_after: round2(t.account_balance_after),
            side: t.side.to_string(),
            exit_reason: t.exit_reason.as_str(),
        }
    }
}

/// Returns stay at full precision; only money is rounded.
#[derive(Debug, Serialize)]
struct EquityRow {
    date: String,
    daily_return: f64,
    ending_aum: f64,
    benchmark_return: Option<f64>,
}

impl From<&DayEquity> for EquityRow {
    fn from(e: &DayEquity) -> Self {
        EquityRow {
            date: e.date.to_string(),
            daily_return: e.daily_return,
            ending_aum: round2(e.ending_aum),
            benchmark_return: e.benchmark_return,
        }
    }
}

pub struct CsvReportAdapter {
    trades_path: PathBuf,
    equity_path: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(trades_path: PathBuf, equity_path: PathBuf) -> Self {
        Self {
            trades_path,
            equity_path,
        }
    }

    pub fn trades_path(&self) -> &Path {
        &self.trades_path
    }

    pub fn equity_path(&self) -> &Path {
        &self.equity_path
    }
}

fn write_rows<R: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: impl Iterator<Item = R>,
) -> Result<(), BacktestError> {
    let to_io = |e: csv::Error| BacktestError::Io(std::io::Error::other(e));

    // Headers are written by hand so an empty table still gets them.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(to_io)?;
    wtr.write_record(headers).map_err(to_io)?;
    for row in rows {
        wtr.serialize(row).map_err(to_io)?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write_trades(&self, ledger: &TradeLedger) -> Result<(), BacktestError> {
        write_rows(
            &self.trades_path,
            &[
                "date",
                "open_time",
                "open_price",
                "exit_time",
                "exit_price",
                "signed_shares",
                "pnl_percent",
                "pnl_absolute",
                "account_balance_after",
                "side",
                "exit_reason",
            ],
            ledger.trades().iter().map(TradeRow::from),
        )?;
        tracing::info!(path = %self.trades_path.display(), rows = ledger.len(), "wrote trade ledger");
        Ok(())
    }

    fn write_equity(&self, equity: &[DayEquity]) -> Result<(), BacktestError> {
        write_rows(
            &self.equity_path,
            &["date", "daily_return", "ending_aum", "benchmark_return"],
            equity.iter().map(EquityRow::from),
        )?;
        tracing::info!(path = %self.equity_path.display(), rows = equity.len(), "wrote equity series");
        Ok(())
    }
}
