//! CSV file market data adapter.
//!
//! Columns are located by header name (case-insensitive) so the column order
//! of the source files does not matter. Every parse failure names the table,
//! the 1-based data row and the field.

use crate::domain::bar::{DailyClose, Dividend, PriceBar};
use crate::domain::error::BacktestError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const MINUTE_TABLE: &str = "minute bars";
const DAILY_TABLE: &str = "daily bars";
const DIVIDEND_TABLE: &str = "dividends";

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvMarketData {
    minute_bars: PathBuf,
    daily_bars: PathBuf,
    dividends: Option<PathBuf>,
}

impl CsvMarketData {
    pub fn new(minute_bars: PathBuf, daily_bars: PathBuf, dividends: Option<PathBuf>) -> Self {
        Self {
            minute_bars,
            daily_bars,
            dividends,
        }
    }

    /// Paths from the `[data]` section; `dividends` is optional.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BacktestError> {
        Ok(Self::new(
            PathBuf::from(config.require_string("data", "minute_bars")?),
            PathBuf::from(config.require_string("data", "daily_bars")?),
            config.optional_string("data", "dividends").map(PathBuf::from),
        ))
    }
}

/// A loaded CSV table with resolved header positions.
struct Table {
    name: &'static str,
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl Table {
    fn load(name: &'static str, path: &Path) -> Result<Self, BacktestError> {
        let content = fs::read_to_string(path).map_err(|e| BacktestError::DataLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let csv_error = |e: csv::Error| BacktestError::DataLoad {
            path: path.display().to_string(),
            reason: format!("CSV parse error: {}", e),
        };

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        let records = rdr
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_error)?;

        Ok(Table {
            name,
            headers,
            records,
        })
    }

    /// Index of the first header matching any alias; the first alias names
    /// the column in errors.
    fn column(&self, aliases: &[&str]) -> Result<usize, BacktestError> {
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
            .ok_or_else(|| BacktestError::MissingColumn {
                table: self.name.to_string(),
                column: aliases[0].to_string(),
            })
    }

    fn invalid(&self, row: usize, field: &str, reason: impl Into<String>) -> BacktestError {
        BacktestError::InvalidRecord {
            table: self.name.to_string(),
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Rows paired with their 1-based data row number.
    fn rows(&self) -> impl Iterator<Item = (usize, &csv::StringRecord)> {
        self.records.iter().enumerate().map(|(i, r)| (i + 1, r))
    }

    fn cell<'r>(
        &self,
        record: &'r csv::StringRecord,
        row: usize,
        idx: usize,
        field: &str,
    ) -> Result<&'r str, BacktestError> {
        match record.get(idx) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(self.invalid(row, field, "empty value")),
        }
    }

    fn number(
        &self,
        record: &csv::StringRecord,
        row: usize,
        idx: usize,
        field: &str,
    ) -> Result<f64, BacktestError> {
        let raw = self.cell(record, row, idx, field)?;
        let value: f64 = raw
            .parse()
            .map_err(|_| self.invalid(row, field, format!("'{}' is not a number", raw)))?;
        if !value.is_finite() {
            return Err(self.invalid(row, field, "value must be finite"));
        }
        Ok(value)
    }

    fn positive(
        &self,
        record: &csv::StringRecord,
        row: usize,
        idx: usize,
        field: &str,
    ) -> Result<f64, BacktestError> {
        let value = self.number(record, row, idx, field)?;
        if value <= 0.0 {
            return Err(self.invalid(row, field, "price must be positive"));
        }
        Ok(value)
    }

    fn non_negative(
        &self,
        record: &csv::StringRecord,
        row: usize,
        idx: usize,
        field: &str,
    ) -> Result<f64, BacktestError> {
        let value = self.number(record, row, idx, field)?;
        if value < 0.0 {
            return Err(self.invalid(row, field, "value must be non-negative"));
        }
        Ok(value)
    }

    fn timestamp(
        &self,
        record: &csv::StringRecord,
        row: usize,
        idx: usize,
        field: &str,
    ) -> Result<NaiveDateTime, BacktestError> {
        let raw = self.cell(record, row, idx, field)?;
        parse_timestamp(raw)
            .ok_or_else(|| self.invalid(row, field, format!("'{}' is not a timestamp", raw)))
    }

    fn date(
        &self,
        record: &csv::StringRecord,
        row: usize,
        idx: usize,
        field: &str,
    ) -> Result<NaiveDate, BacktestError> {
        let raw = self.cell(record, row, idx, field)?;
        parse_date(raw).ok_or_else(|| self.invalid(row, field, format!("'{}' is not a date", raw)))
    }
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Plain `YYYY-MM-DD`, or any accepted timestamp with the time discarded.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
}

impl MarketDataPort for CsvMarketData {
    fn minute_bars(&self) -> Result<Vec<PriceBar>, BacktestError> {
        let table = Table::load(MINUTE_TABLE, &self.minute_bars)?;
        let ts = table.column(&["timestamp", "caldt", "datetime"])?;
        let open = table.column(&["open"])?;
        let high = table.column(&["high"])?;
        let low = table.column(&["low"])?;
        let close = table.column(&["close"])?;
        let volume = table.column(&["volume"])?;

        let mut bars = Vec::with_capacity(table.records.len());
        for (row, record) in table.rows() {
            bars.push(PriceBar {
                timestamp: table.timestamp(record, row, ts, "timestamp")?,
                open: table.positive(record, row, open, "open")?,
                high: table.positive(record, row, high, "high")?,
                low: table.positive(record, row, low, "low")?,
                close: table.positive(record, row, close, "close")?,
                volume: table.non_negative(record, row, volume, "volume")?,
            });
        }

        tracing::info!(
            path = %self.minute_bars.display(),
            rows = bars.len(),
            "loaded minute bars"
        );
        Ok(bars)
    }

    fn daily_closes(&self) -> Result<Vec<DailyClose>, BacktestError> {
        let table = Table::load(DAILY_TABLE, &self.daily_bars)?;
        let date = table.column(&["date", "caldt"])?;
        let close = table.column(&["close"])?;

        let mut closes = Vec::with_capacity(table.records.len());
        for (row, record) in table.rows() {
            closes.push(DailyClose {
                date: table.date(record, row, date, "date")?,
                close: table.positive(record, row, close, "close")?,
            });
        }
        closes.sort_by_key(|c| c.date);

        tracing::info!(
            path = %self.daily_bars.display(),
            rows = closes.len(),
            "loaded daily bars"
        );
        Ok(closes)
    }

    fn dividends(&self) -> Result<Vec<Dividend>, BacktestError> {
        let Some(path) = &self.dividends else {
            tracing::info!("no dividends table configured");
            return Ok(Vec::new());
        };

        let table = Table::load(DIVIDEND_TABLE, path)?;
        let ex_date = table.column(&["ex_date", "exdate", "caldt", "date"])?;
        let amount = table.column(&["cash_amount", "cashamount", "dividend", "amount"])?;

        let mut dividends = Vec::with_capacity(table.records.len());
        for (row, record) in table.rows() {
            dividends.push(Dividend {
                ex_date: table.date(record, row, ex_date, "ex_date")?,
                cash_amount: table.non_negative(record, row, amount, "cash_amount")?,
            });
        }

        tracing::info!(path = %path.display(), rows = dividends.len(), "loaded dividends");
        Ok(dividends)
    }
}
