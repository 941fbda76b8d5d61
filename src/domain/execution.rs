//! Intraday fill simulation.
//!
//! Walks one day's bars against the scheduled exposure, opening and closing
//! trades at bar closes, classifying exits, forcing an end-of-day flatten,
//! and settling the day's P&L net of commission.

use crate::domain::bar::MinuteBar;
use crate::domain::error::BacktestError;
use crate::domain::exposure::count_trades;
use crate::domain::session::session_close_time;
use crate::domain::signal::{DaySignals, Signal};
use crate::domain::trade::{ExitReason, Side, Trade, TradeLedger};
use chrono::{NaiveDate, NaiveTime};

/// Relative tolerance for realized vs. marked-to-market day P&L.
pub const RECONCILIATION_TOLERANCE: f64 = 1e-6;

/// Per-order commission: max(min_per_order, per_share * shares).
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionSchedule {
    pub per_share: f64,
    pub min_per_order: f64,
}

impl CommissionSchedule {
    pub fn per_order(&self, shares: u64) -> f64 {
        (self.per_share * shares as f64).max(self.min_per_order)
    }

    pub fn for_day(&self, trades_count: u32, shares: u64) -> f64 {
        trades_count as f64 * self.per_order(shares)
    }
}

/// Everything the simulator needs for one day.
#[derive(Debug, Clone, Copy)]
pub struct DayInput<'a> {
    pub date: NaiveDate,
    pub bars: &'a [MinuteBar],
    pub signals: &'a DaySignals,
    pub exposure: &'a [Signal],
    pub shares: u64,
    pub prior_equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayOutcome {
    pub date: NaiveDate,
    pub shares: u64,
    pub ledger: TradeLedger,
    pub trades_count: u32,
    pub gross_pnl: f64,
    pub marked_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

#[derive(Debug, Clone, Copy)]
struct OpenPosition {
    side: Side,
    entry_price: f64,
    open_time: NaiveTime,
}

impl OpenPosition {
    fn close(
        self,
        input: &DayInput<'_>,
        exit_price: f64,
        exit_time: NaiveTime,
        exit_reason: ExitReason,
    ) -> Trade {
        let sign = self.side.sign();
        let pnl = (exit_price - self.entry_price) * input.shares as f64 * sign;
        let pnl_percent = (exit_price / self.entry_price - 1.0) * 100.0 * sign;
        Trade {
            date: input.date,
            open_time: self.open_time,
            open_price: self.entry_price,
            exit_time,
            exit_price,
            signed_shares: input.shares as i64 * sign as i64,
            pnl_percent,
            pnl_absolute: pnl,
            account_balance_after: input.prior_equity + pnl,
            side: self.side,
            exit_reason,
        }
    }
}

/// Sum of exposure[i-1] * (close[i] - close[i-1]) * shares.
///
/// Fills happen at the close of the bar on which exposure changes, so the
/// position held into bar i is the one set on bar i - 1.
pub fn marked_to_market(bars: &[MinuteBar], exposure: &[Signal], shares: u64) -> f64 {
    bars.windows(2)
        .zip(exposure)
        .map(|(pair, held)| held.value() as f64 * (pair[1].close - pair[0].close))
        .sum::<f64>()
        * shares as f64
}

fn reconciles(realized: f64, marked: f64) -> bool {
    let scale = 1.0_f64.max(realized.abs()).max(marked.abs());
    (realized - marked).abs() <= RECONCILIATION_TOLERANCE * scale
}

/// Simulate one trading day.
///
/// Fails on an exit that cannot be classified or on a P&L reconciliation
/// mismatch; both indicate a broken invariant rather than bad data.
pub fn simulate_day(
    input: &DayInput<'_>,
    commission: &CommissionSchedule,
) -> Result<DayOutcome, BacktestError> {
    let mut ledger = TradeLedger::new();
    let mut open: Option<OpenPosition> = None;

    let per_bar = input
        .bars
        .iter()
        .zip(input.exposure)
        .zip(&input.signals.raw_signal)
        .zip(input.signals.upper_band.iter().zip(&input.signals.lower_band))
        .enumerate();

    for (i, (((bar, &target), &raw), (&upper, &lower))) in per_bar {
        let time = bar.timestamp.time();

        if let Some(pos) = open {
            if pos.side.as_signal() != target {
                let reason = ExitReason::classify(raw, bar.close, upper, lower, bar.vwap)
                    .ok_or(BacktestError::UnclassifiedExit {
                        date: input.date,
                        bar: i,
                        signal: raw.value(),
                    })?;
                ledger.record(pos.close(input, bar.close, time, reason));
                open = None;
            }
        }

        if open.is_none() {
            open = Side::from_signal(target).map(|side| OpenPosition {
                side,
                entry_price: bar.close,
                open_time: time,
            });
        }
    }

    if let (Some(pos), Some(last)) = (open, input.bars.last()) {
        ledger.record(pos.close(
            input,
            last.close,
            session_close_time(),
            ExitReason::EndOfDay,
        ));
    }

    let gross_pnl = ledger.realized_pnl();
    let marked_pnl = marked_to_market(input.bars, input.exposure, input.shares);
    if !reconciles(gross_pnl, marked_pnl) {
        return Err(BacktestError::Reconciliation {
            date: input.date,
            realized: gross_pnl,
            marked: marked_pnl,
        });
    }

    let trades_count = count_trades(input.exposure);
    let commission_paid = commission.for_day(trades_count, input.shares);

    Ok(DayOutcome {
        date: input.date,
        shares: input.shares,
        ledger,
        trades_count,
        gross_pnl,
        marked_pnl,
        commission: commission_paid,
        net_pnl: gross_pnl - commission_paid,
    })
}
