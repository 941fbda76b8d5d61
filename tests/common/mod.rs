#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use intraday_momentum::domain::backtest::{BacktestConfig, BacktestResult};
use intraday_momentum::domain::bar::{DailyClose, Dividend, PriceBar};
use intraday_momentum::domain::error::BacktestError;
use intraday_momentum::domain::portfolio::DayEquity;
use intraday_momentum::domain::sizing::SizingMode;
use intraday_momentum::domain::trade::TradeLedger;
use intraday_momentum::ports::data_port::MarketDataPort;
use intraday_momentum::ports::report_port::ReportPort;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

pub struct MockDataPort {
    pub minute: Vec<PriceBar>,
    pub daily: Vec<DailyClose>,
    pub dividends: Vec<Dividend>,
    pub minute_error: Option<String>,
}

impl MockDataPort {
    pub fn new(minute: Vec<PriceBar>) -> Self {
        let daily = daily_closes_from(&minute);
        Self {
            minute,
            daily,
            dividends: Vec::new(),
            minute_error: None,
        }
    }

    pub fn with_dividends(mut self, dividends: Vec<Dividend>) -> Self {
        self.dividends = dividends;
        self
    }

    pub fn with_daily(mut self, daily: Vec<DailyClose>) -> Self {
        self.daily = daily;
        self
    }

    pub fn with_minute_error(mut self, reason: &str) -> Self {
        self.minute_error = Some(reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn minute_bars(&self) -> Result<Vec<PriceBar>, BacktestError> {
        if let Some(reason) = &self.minute_error {
            return Err(BacktestError::DataLoad {
                path: "mock".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.minute.clone())
    }

    fn daily_closes(&self) -> Result<Vec<DailyClose>, BacktestError> {
        Ok(self.daily.clone())
    }

    fn dividends(&self) -> Result<Vec<Dividend>, BacktestError> {
        Ok(self.dividends.clone())
    }
}

/// Captures whatever the pipeline writes.
#[derive(Default)]
pub struct RecordingReport {
    pub trades: RefCell<Option<TradeLedger>>,
    pub equity: RefCell<Option<Vec<DayEquity>>>,
}

impl ReportPort for RecordingReport {
    fn write_trades(&self, ledger: &TradeLedger) -> Result<(), BacktestError> {
        *self.trades.borrow_mut() = Some(ledger.clone());
        Ok(())
    }

    fn write_equity(&self, equity: &[DayEquity]) -> Result<(), BacktestError> {
        *self.equity.borrow_mut() = Some(equity.to_vec());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 100_000.0,
        commission_per_share: 0.0035,
        min_commission_per_order: 0.35,
        band_multiplier: 1.0,
        rebalance_frequency_minutes: 1,
        sizing_mode: SizingMode::VolTarget,
        target_volatility: 0.02,
        max_leverage: 4.0,
    }
}

/// `count` consecutive weekdays starting at 2024-01-02.
pub fn trading_dates(count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut d = date(2024, 1, 2);
    while dates.len() < count {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(d);
        }
        d += Duration::days(1);
    }
    dates
}

/// Synthetic regular-session minute bars.
///
/// Each day opens near the previous close and drifts with a random per-day
/// trend plus minute noise, so some days break out of the noise band and
/// some do not.
pub fn synthetic_minute_bars(days: usize, bars_per_day: u32, seed: u64) -> Vec<PriceBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0_f64;
    let mut bars = Vec::with_capacity(days * bars_per_day as usize);

    for day in trading_dates(days) {
        let start = day.and_hms_opt(9, 30, 0).unwrap();
        let trend = rng.gen_range(-1.0_f64..1.0) * 0.0004;
        let open = price * (1.0 + rng.gen_range(-1.0_f64..1.0) * 0.003);
        let mut close = open;

        for i in 0..bars_per_day {
            let bar_open = close;
            close = (bar_open * (1.0 + trend + rng.gen_range(-1.0_f64..1.0) * 0.0008)).max(1.0);
            let high = bar_open.max(close) * 1.0002;
            let low = bar_open.min(close) * 0.9998;
            bars.push(PriceBar {
                timestamp: start + Duration::minutes(i as i64),
                open: if i == 0 { open } else { bar_open },
                high: high.max(open),
                low: low.min(open),
                close,
                volume: 1_000.0 + (rng.gen_range(-1.0_f64..1.0).abs() * 5_000.0).round(),
            });
        }
        price = close;
    }

    bars
}

/// Last close of each date, as a benchmark daily table.
pub fn daily_closes_from(bars: &[PriceBar]) -> Vec<DailyClose> {
    let mut daily: Vec<DailyClose> = Vec::new();
    for bar in bars {
        let d = bar.timestamp.date();
        match daily.last_mut() {
            Some(last) if last.date == d => last.close = bar.close,
            _ => daily.push(DailyClose {
                date: d,
                close: bar.close,
            }),
        }
    }
    daily
}

/// AUM rebuilt from the ledger and per-day commission, day by day.
pub fn replay_equity(result: &BacktestResult) -> Vec<f64> {
    let mut aum = result.initial_capital;
    result
        .equity
        .iter()
        .map(|day| {
            let gross: f64 = result.ledger.for_date(day.date).map(|t| t.pnl_absolute).sum();
            let commission = result.commission_by_day.get(&day.date).copied().unwrap_or(0.0);
            aum += gross - commission;
            aum
        })
        .collect()
}
