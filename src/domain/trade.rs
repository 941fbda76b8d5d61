//! Closed trades, exit classification, and the trade ledger.

use crate::domain::signal::Signal;
use chrono::{NaiveDate, NaiveTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_signal(signal: Signal) -> Option<Side> {
        match signal {
            Signal::Long => Some(Side::Long),
            Signal::Short => Some(Side::Short),
            Signal::Flat => None,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn as_signal(self) -> Signal {
        match self {
            Side::Long => Signal::Long,
            Side::Short => Signal::Short,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    UbAndVwap,
    UbOnly,
    LbAndVwap,
    LbOnly,
    VwapOnly,
    NoNewSignal,
    EndOfDay,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::UbAndVwap => "ub_and_vwap",
            ExitReason::UbOnly => "ub_only",
            ExitReason::LbAndVwap => "lb_and_vwap",
            ExitReason::LbOnly => "lb_only",
            ExitReason::VwapOnly => "vwap_only",
            ExitReason::NoNewSignal => "no_new_signal",
            ExitReason::EndOfDay => "end_of_day",
        }
    }

    /// Decision table for a signal-driven exit on the closing bar.
    ///
    /// `None` means the raw signal is directional but neither the band nor
    /// the VWAP condition holds, which the band logic makes impossible.
    pub fn classify(
        signal: Signal,
        close: f64,
        upper: Option<f64>,
        lower: Option<f64>,
        vwap: f64,
    ) -> Option<ExitReason> {
        let beyond_upper = upper.is_some_and(|ub| close > ub);
        let beyond_lower = lower.is_some_and(|lb| close < lb);

        match (signal, beyond_upper, beyond_lower, close > vwap, close < vwap) {
            (Signal::Flat, ..) => Some(ExitReason::NoNewSignal),
            (Signal::Long, true, _, true, _) => Some(ExitReason::UbAndVwap),
            (Signal::Long, true, _, false, _) => Some(ExitReason::UbOnly),
            (Signal::Long, false, _, true, _) => Some(ExitReason::VwapOnly),
            (Signal::Short, _, true, _, true) => Some(ExitReason::LbAndVwap),
            (Signal::Short, _, true, _, false) => Some(ExitReason::LbOnly),
            (Signal::Short, _, false, _, true) => Some(ExitReason::VwapOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub open_time: NaiveTime,
    pub open_price: f64,
    pub exit_time: NaiveTime,
    pub exit_price: f64,
    pub signed_shares: i64,
    pub pnl_percent: f64,
    pub pnl_absolute: f64,
    pub account_balance_after: f64,
    pub side: Side,
    pub exit_reason: ExitReason,
}

/// Ordered record of closed trades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Append another ledger, typically the one returned for a single day.
    pub fn merge(&mut self, other: TradeLedger) {
        self.trades.extend(other.trades);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl_absolute).sum()
    }

    pub fn for_date(&self, date: NaiveDate) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(move |t| t.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(date: NaiveDate, pnl: f64) -> Trade {
        Trade {
            date,
            open_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            open_price: 100.0,
            exit_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            exit_price: 101.0,
            signed_shares: 100,
            pnl_percent: 1.0,
            pnl_absolute: pnl,
            account_balance_after: 100_000.0 + pnl,
            side: Side::Long,
            exit_reason: ExitReason::NoNewSignal,
        }
    }

    #[test]
    fn classify_flat_signal() {
        assert_eq!(
            ExitReason::classify(Signal::Flat, 100.0, Some(101.0), Some(99.0), 100.0),
            Some(ExitReason::NoNewSignal)
        );
    }

    #[test]
    fn classify_long_table() {
        let ub = Some(101.0);
        let lb = Some(99.0);
        assert_eq!(
            ExitReason::classify(Signal::Long, 102.0, ub, lb, 100.0),
            Some(ExitReason::UbAndVwap)
        );
        assert_eq!(
            ExitReason::classify(Signal::Long, 102.0, ub, lb, 103.0),
            Some(ExitReason::UbOnly)
        );
        assert_eq!(
            ExitReason::classify(Signal::Long, 100.5, ub, lb, 100.0),
            Some(ExitReason::VwapOnly)
        );
        assert_eq!(ExitReason::classify(Signal::Long, 100.5, ub, lb, 101.0), None);
    }

    #[test]
    fn classify_short_table() {
        let ub = Some(101.0);
        let lb = Some(99.0);
        assert_eq!(
            ExitReason::classify(Signal::Short, 98.0, ub, lb, 100.0),
            Some(ExitReason::LbAndVwap)
        );
        assert_eq!(
            ExitReason::classify(Signal::Short, 98.0, ub, lb, 97.0),
            Some(ExitReason::LbOnly)
        );
        assert_eq!(
            ExitReason::classify(Signal::Short, 99.5, ub, lb, 100.0),
            Some(ExitReason::VwapOnly)
        );
        assert_eq!(ExitReason::classify(Signal::Short, 99.5, ub, lb, 99.0), None);
    }

    #[test]
    fn classify_without_bands_relies_on_vwap() {
        assert_eq!(
            ExitReason::classify(Signal::Long, 100.5, None, None, 100.0),
            Some(ExitReason::VwapOnly)
        );
        assert_eq!(ExitReason::classify(Signal::Short, 100.5, None, None, 100.0), None);
    }

    #[test]
    fn exit_reason_names() {
        assert_eq!(ExitReason::UbAndVwap.to_string(), "ub_and_vwap");
        assert_eq!(ExitReason::EndOfDay.to_string(), "end_of_day");
        assert_eq!(ExitReason::NoNewSignal.as_str(), "no_new_signal");
    }

    #[test]
    fn side_helpers() {
        assert_eq!(Side::from_signal(Signal::Long), Some(Side::Long));
        assert_eq!(Side::from_signal(Signal::Flat), None);
        assert_eq!(Side::Short.sign(), -1.0);
        assert_eq!(Side::Short.as_signal(), Signal::Short);
        assert_eq!(Side::Long.to_string(), "long");
    }

    #[test]
    fn ledger_merge_preserves_order() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        let mut ledger = TradeLedger::new();
        ledger.record(sample_trade(d1, 50.0));

        let mut day = TradeLedger::new();
        day.record(sample_trade(d2, -20.0));
        day.record(sample_trade(d2, 5.0));
        ledger.merge(day);

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.trades()[0].date, d1);
        assert_eq!(ledger.for_date(d2).count(), 2);
        assert!((ledger.realized_pnl() - 35.0).abs() < 1e-12);
    }
}
