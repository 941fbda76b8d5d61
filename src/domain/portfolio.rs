//! Account equity tracking and the daily equity series.

use crate::domain::bar::DailyClose;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct DayEquity {
    pub date: NaiveDate,
    pub daily_return: f64,
    pub ending_aum: f64,
    pub benchmark_return: Option<f64>,
}

/// Sole owner of the running AUM.
///
/// Days that are never recorded leave the AUM untouched, so the next
/// recorded day sizes and settles against the last recorded balance.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityAccumulator {
    initial_capital: f64,
    aum: f64,
    series: Vec<DayEquity>,
}

impl EquityAccumulator {
    pub fn new(initial_capital: f64) -> Self {
        EquityAccumulator {
            initial_capital,
            aum: initial_capital,
            series: Vec::new(),
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn aum(&self) -> f64 {
        self.aum
    }

    pub fn record(
        &mut self,
        date: NaiveDate,
        net_pnl: f64,
        benchmark_return: Option<f64>,
    ) -> &DayEquity {
        let prior = self.aum;
        let daily_return = if prior != 0.0 { net_pnl / prior } else { 0.0 };
        self.aum = prior + net_pnl;
        self.series.push(DayEquity {
            date,
            daily_return,
            ending_aum: self.aum,
            benchmark_return,
        });
        &self.series[self.series.len() - 1]
    }

    pub fn series(&self) -> &[DayEquity] {
        &self.series
    }

    pub fn into_series(self) -> Vec<DayEquity> {
        self.series
    }
}

/// Close-to-close benchmark returns keyed by date.
///
/// The first row, and any row whose predecessor closed at zero, has no return.
pub fn benchmark_returns(daily: &[DailyClose]) -> HashMap<NaiveDate, f64> {
    let mut sorted: Vec<&DailyClose> = daily.iter().collect();
    sorted.sort_by_key(|d| d.date);

    sorted
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].date, w[1].close / w[0].close - 1.0))
        .collect()
}
