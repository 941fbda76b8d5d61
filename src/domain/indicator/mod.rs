//! Per-minute indicator engine.
//!
//! Turns grouped sessions plus the dividend table into [`TradingDay`]s whose
//! bars carry VWAP, lagged `sigma_open`, trailing daily volatility and the
//! same-day dividend. Everything here is a single forward pass with no
//! dependency on account equity, so it runs before the simulation loop.

pub mod daily_vol;
pub mod sigma_open;
pub mod vwap;

use crate::domain::bar::{Dividend, MinuteBar};
use crate::domain::session::Session;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Sessions in the trailing windows for both `sigma_open` and daily volatility.
pub const LOOKBACK_DAYS: usize = 14;

#[derive(Debug, Clone)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub bars: Vec<MinuteBar>,
}

impl TradingDay {
    pub fn open_price(&self) -> Option<f64> {
        self.bars.first().map(|b| b.open)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn dividend(&self) -> f64 {
        self.bars.last().map(|b| b.dividend).unwrap_or(0.0)
    }

    pub fn daily_vol(&self) -> Option<f64> {
        self.bars.first().and_then(|b| b.daily_vol)
    }

    pub fn has_sigma_open(&self) -> bool {
        self.bars.iter().any(|b| b.sigma_open.is_some())
    }
}

/// Sum of cash amounts per ex-date.
pub fn dividends_by_date(dividends: &[Dividend]) -> HashMap<NaiveDate, f64> {
    let mut map = HashMap::new();
    for d in dividends {
        *map.entry(d.ex_date).or_insert(0.0) += d.cash_amount;
    }
    map
}

pub fn compute_indicators(sessions: &[Session], dividends: &[Dividend]) -> Vec<TradingDay> {
    let sigma = sigma_open::calculate_sigma_open(sessions, LOOKBACK_DAYS);
    let returns = daily_vol::daily_returns(sessions);
    let dvol = daily_vol::calculate_daily_vol(&returns, LOOKBACK_DAYS);
    let dividend_map = dividends_by_date(dividends);

    sessions
        .iter()
        .zip(sigma)
        .zip(dvol)
        .map(|((session, sigma_day), daily_vol)| {
            let vwap = vwap::calculate_vwap(&session.bars);
            let dividend = dividend_map.get(&session.date).copied().unwrap_or(0.0);

            let bars = session
                .bars
                .iter()
                .zip(&session.minutes_from_open)
                .zip(vwap)
                .zip(sigma_day)
                .map(|(((bar, &minutes_from_open), vwap), sigma_open)| MinuteBar {
                    day: session.date,
                    timestamp: bar.timestamp,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                    vwap,
                    sigma_open,
                    daily_vol,
                    dividend,
                    minutes_from_open,
                })
                .collect();

            TradingDay {
                date: session.date,
                bars,
            }
        })
        .collect()
}
