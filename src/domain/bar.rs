//! Raw input rows and the enriched per-minute bar.

use chrono::{NaiveDate, NaiveDateTime};

/// One raw minute bar as delivered by the data port.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Daily close of the benchmark instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Cash dividend keyed by ex-date.
#[derive(Debug, Clone, PartialEq)]
pub struct Dividend {
    pub ex_date: NaiveDate,
    pub cash_amount: f64,
}

/// Minute bar enriched with session indicators.
///
/// `sigma_open` and `daily_vol` are `None` during the warm-up period.
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteBar {
    pub day: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: f64,
    pub sigma_open: Option<f64>,
    pub daily_vol: Option<f64>,
    pub dividend: f64,
    pub minutes_from_open: u32,
}
