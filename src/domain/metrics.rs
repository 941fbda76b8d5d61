//! Performance statistics over a finished run.

use super::backtest::BacktestResult;
use super::indicator::daily_vol::sample_stddev;
use super::portfolio::DayEquity;
use super::trade::{Side, Trade};
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Drawdown {
    pub max_drawdown: f64,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
}

/// OLS of strategy daily returns on benchmark daily returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    /// Intercept scaled to a 252-day year.
    pub alpha: f64,
    pub beta: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub long_trades: usize,
    pub short_trades: usize,
    pub long_pnl: f64,
    pub short_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub hit_ratio: f64,
    pub drawdown: Drawdown,
    pub regression: Option<Regression>,
    pub trades: TradeStats,
}

impl PerformanceSummary {
    pub fn compute(result: &BacktestResult) -> Self {
        let returns: Vec<f64> = result.equity.iter().map(|e| e.daily_return).collect();
        let n = returns.len() as f64;

        let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
        let total_return = growth - 1.0;
        let annualized_return = if returns.is_empty() {
            0.0
        } else if growth > 0.0 {
            growth.powf(TRADING_DAYS_PER_YEAR / n) - 1.0
        } else {
            -1.0
        };

        let stddev = sample_stddev(&returns).unwrap_or(0.0);
        let annualized_volatility = stddev * TRADING_DAYS_PER_YEAR.sqrt();
        let sharpe_ratio = if stddev > 0.0 {
            let mean = returns.iter().sum::<f64>() / n;
            mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        let nonzero = returns.iter().filter(|r| **r != 0.0).count();
        let hit_ratio = if nonzero > 0 {
            returns.iter().filter(|r| **r > 0.0).count() as f64 / nonzero as f64
        } else {
            0.0
        };

        PerformanceSummary {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            hit_ratio,
            drawdown: compute_drawdown(result.initial_capital, &result.equity),
            regression: regress_on_benchmark(&result.equity),
            trades: compute_trade_stats(result.ledger.trades()),
        }
    }
}

fn compute_drawdown(initial_capital: f64, equity: &[DayEquity]) -> Drawdown {
    let mut peak = initial_capital;
    let mut peak_date: Option<NaiveDate> = None;
    let mut worst = Drawdown {
        max_drawdown: 0.0,
        peak_date: None,
        trough_date: None,
    };

    for point in equity {
        if point.ending_aum > peak {
            peak = point.ending_aum;
            peak_date = Some(point.date);
        } else if peak > 0.0 {
            let dd = 1.0 - point.ending_aum / peak;
            if dd > worst.max_drawdown {
                worst = Drawdown {
                    max_drawdown: dd,
                    peak_date,
                    trough_date: Some(point.date),
                };
            }
        }
    }

    worst
}

fn regress_on_benchmark(equity: &[DayEquity]) -> Option<Regression> {
    let pairs: Vec<(f64, f64)> = equity
        .iter()
        .filter_map(|e| e.benchmark_return.map(|b| (b, e.daily_return)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let var_x: f64 = pairs.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if var_x == 0.0 {
        return None;
    }
    let cov: f64 = pairs
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();

    let beta = cov / var_x;
    let intercept = mean_y - beta * mean_x;

    Some(Regression {
        alpha: intercept * TRADING_DAYS_PER_YEAR,
        beta,
        observations: pairs.len(),
    })
}

fn compute_trade_stats(trades: &[Trade]) -> TradeStats {
    let mut wins = 0usize;
    let mut total_wins = 0.0_f64;
    let mut total_losses = 0.0_f64;
    let mut long_trades = 0usize;
    let mut short_trades = 0usize;
    let mut long_pnl = 0.0_f64;
    let mut short_pnl = 0.0_f64;

    for trade in trades {
        let pnl = trade.pnl_absolute;
        if pnl > 0.0 {
            wins += 1;
            total_wins += pnl;
        } else if pnl < 0.0 {
            total_losses += pnl.abs();
        }
        match trade.side {
            Side::Long => {
                long_trades += 1;
                long_pnl += pnl;
            }
            Side::Short => {
                short_trades += 1;
                short_pnl += pnl;
            }
        }
    }

    let total_trades = trades.len();
    let win_rate = if total_trades > 0 {
        wins as f64 / total_trades as f64
    } else {
        0.0
    };

    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else if total_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    TradeStats {
        total_trades,
        win_rate,
        profit_factor,
        long_trades,
        short_trades,
        long_pnl,
        short_pnl,
    }
}

/// Compounded return from periodic returns given in percent.
///
/// `compound_return(&[3.5, -1.0])` is `1.035 * 0.99 - 1`.
pub fn compound_return(period_returns_pct: &[f64]) -> f64 {
    period_returns_pct
        .iter()
        .map(|r| 1.0 + r / 100.0)
        .product::<f64>()
        - 1.0
}
