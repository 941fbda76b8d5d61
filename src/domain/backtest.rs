//! Backtest configuration and the sequential day loop.
//!
//! Each day's share count and starting balance depend on the previous day's
//! ending equity, so days run strictly in date order.

use crate::domain::error::BacktestError;
use crate::domain::execution::{simulate_day, CommissionSchedule, DayInput, DayOutcome};
use crate::domain::exposure::schedule_exposure;
use crate::domain::indicator::TradingDay;
use crate::domain::portfolio::{DayEquity, EquityAccumulator};
use crate::domain::signal::generate_signals;
use crate::domain::sizing::{SizingMode, SizingPolicy};
use crate::domain::trade::TradeLedger;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_per_share: f64,
    pub min_commission_per_order: f64,
    pub band_multiplier: f64,
    pub rebalance_frequency_minutes: u32,
    pub sizing_mode: SizingMode,
    pub target_volatility: f64,
    pub max_leverage: f64,
}

impl BacktestConfig {
    pub fn sizing_policy(&self) -> SizingPolicy {
        SizingPolicy {
            mode: self.sizing_mode,
            target_volatility: self.target_volatility,
            max_leverage: self.max_leverage,
        }
    }

    pub fn commission_schedule(&self) -> CommissionSchedule {
        CommissionSchedule {
            per_share: self.commission_per_share,
            min_per_order: self.min_commission_per_order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No bar of the day has a sigma_open estimate yet.
    NoVolatilityEstimate,
    /// The day or the day before it has no bars.
    ///
    /// `group_sessions` never yields an empty session, so this only fires for
    /// callers that assemble `TradingDay`s themselves.
    EmptySession,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoVolatilityEstimate => write!(f, "no_volatility_estimate"),
            SkipReason::EmptySession => write!(f, "empty_session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub ledger: TradeLedger,
    pub equity: Vec<DayEquity>,
    pub skipped: Vec<SkippedDay>,
    pub commission_by_day: HashMap<NaiveDate, f64>,
}

impl BacktestResult {
    pub fn final_aum(&self) -> f64 {
        self.equity
            .last()
            .map(|e| e.ending_aum)
            .unwrap_or(self.initial_capital)
    }
}

enum DayStep {
    Traded(DayOutcome),
    Skipped(SkipReason),
}

fn run_day(
    prev: &TradingDay,
    day: &TradingDay,
    prior_equity: f64,
    config: &BacktestConfig,
) -> Result<DayStep, BacktestError> {
    let (Some(prev_close), Some(open_price)) = (prev.last_close(), day.open_price()) else {
        return Ok(DayStep::Skipped(SkipReason::EmptySession));
    };
    let prev_close_adj = prev_close - day.dividend();

    let Some(signals) = generate_signals(day, prev_close_adj, config.band_multiplier) else {
        return Ok(DayStep::Skipped(SkipReason::NoVolatilityEstimate));
    };

    let shares = config
        .sizing_policy()
        .shares(prior_equity, open_price, day.daily_vol());

    let minutes: Vec<u32> = day.bars.iter().map(|b| b.minutes_from_open).collect();
    let exposure = schedule_exposure(
        &signals.raw_signal,
        &minutes,
        config.rebalance_frequency_minutes,
    );

    let input = DayInput {
        date: day.date,
        bars: &day.bars,
        signals: &signals,
        exposure: &exposure,
        shares,
        prior_equity,
    };
    simulate_day(&input, &config.commission_schedule()).map(DayStep::Traded)
}

/// Run the strategy over indicator-enriched days.
///
/// `benchmark` maps dates to the benchmark's daily return; dates it lacks get
/// no benchmark value in the equity series.
pub fn run_backtest(
    days: &[TradingDay],
    benchmark: &HashMap<NaiveDate, f64>,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let mut accumulator = EquityAccumulator::new(config.initial_capital);
    let mut ledger = TradeLedger::new();
    let mut skipped = Vec::new();
    let mut commission_by_day = HashMap::new();

    for pair in days.windows(2) {
        let (prev, day) = (&pair[0], &pair[1]);

        match run_day(prev, day, accumulator.aum(), config)? {
            DayStep::Skipped(reason) => {
                tracing::debug!(date = %day.date, %reason, "skipping day");
                skipped.push(SkippedDay {
                    date: day.date,
                    reason,
                });
            }
            DayStep::Traded(outcome) => {
                tracing::debug!(
                    date = %outcome.date,
                    shares = outcome.shares,
                    trades = outcome.ledger.len(),
                    net_pnl = outcome.net_pnl,
                    "day settled"
                );
                accumulator.record(
                    outcome.date,
                    outcome.net_pnl,
                    benchmark.get(&outcome.date).copied(),
                );
                commission_by_day.insert(outcome.date, outcome.commission);
                ledger.merge(outcome.ledger);
            }
        }
    }

    tracing::info!(
        days = days.len(),
        traded = accumulator.series().len(),
        skipped = skipped.len(),
        trades = ledger.len(),
        final_aum = accumulator.aum(),
        "backtest complete"
    );

    Ok(BacktestResult {
        initial_capital: config.initial_capital,
        ledger,
        equity: accumulator.into_series(),
        skipped,
        commission_by_day,
    })
}
