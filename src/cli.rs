//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvMarketData;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    validate_backtest_config, validate_data_config, validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::indicator::compute_indicators;
use crate::domain::metrics::{compound_return, PerformanceSummary};
use crate::domain::portfolio::benchmark_returns;
use crate::domain::session::group_sessions;
use crate::domain::sizing::SizingMode;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_TRADES_PATH: &str = "trades.csv";
const DEFAULT_EQUITY_PATH: &str = "equity.csv";

#[derive(Parser, Debug)]
#[command(
    name = "intraday-momentum",
    about = "Noise-band intraday momentum backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the trade ledger and equity series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [output] trades
        #[arg(long)]
        trades: Option<PathBuf>,
        /// Overrides [output] equity
        #[arg(long)]
        equity: Option<PathBuf>,
    },
    /// Validate a configuration file without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compound a sequence of monthly returns given in percent
    CompoundReturn {
        #[arg(required = true, allow_negative_numbers = true)]
        monthly: Vec<f64>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            trades,
            equity,
        } => run_backtest(&config, trades, equity),
        Command::Validate { config } => run_validate(&config),
        Command::CompoundReturn { monthly } => run_compound_return(&monthly),
    }
}

fn fail(err: &BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Every config check, in the order errors are reported.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_data_config(config)?;
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let sizing_mode: SizingMode = config
        .require_string("strategy", "sizing_mode")?
        .parse()
        .map_err(|reason| BacktestError::invalid("strategy", "sizing_mode", reason))?;

    Ok(BacktestConfig {
        initial_capital: config.require_f64("backtest", "initial_capital")?,
        commission_per_share: config.require_f64("backtest", "commission_per_share")?,
        min_commission_per_order: config.require_f64("backtest", "min_commission_per_order")?,
        band_multiplier: config.require_f64("strategy", "band_multiplier")?,
        rebalance_frequency_minutes: config.require_u32("strategy", "rebalance_frequency_minutes")?,
        sizing_mode,
        target_volatility: config.require_f64("strategy", "target_volatility")?,
        max_leverage: config.require_f64("strategy", "max_leverage")?,
    })
}

/// CLI flag, then `[output]` key, then the default file name.
pub fn resolve_output_path(
    flag: Option<PathBuf>,
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> PathBuf {
    flag.or_else(|| config.optional_string("output", key).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Load, enrich, simulate and write. Returns the finished run for reporting.
pub fn run_backtest_pipeline(
    data_port: &dyn MarketDataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let minute_bars = data_port.minute_bars()?;
    let daily = data_port.daily_closes()?;
    let dividends = data_port.dividends()?;

    let sessions = group_sessions(minute_bars)?;
    tracing::info!(sessions = sessions.len(), "grouped minute bars into sessions");

    let days = compute_indicators(&sessions, &dividends);
    let benchmark = benchmark_returns(&daily);

    let result = backtest_engine::run_backtest(&days, &benchmark, bt_config)?;
    report_port.write(&result)?;
    Ok(result)
}

fn run_backtest(
    config_path: &Path,
    trades_flag: Option<PathBuf>,
    equity_flag: Option<PathBuf>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        return fail(&e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let data_port = match CsvMarketData::from_config(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let report_port = CsvReportAdapter::new(
        resolve_output_path(trades_flag, &adapter, "trades", DEFAULT_TRADES_PATH),
        resolve_output_path(equity_flag, &adapter, "equity", DEFAULT_EQUITY_PATH),
    );

    let result = match run_backtest_pipeline(&data_port, &report_port, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_summary(&result);
    eprintln!(
        "\nTrades written to: {}\nEquity written to: {}",
        report_port.trades_path().display(),
        report_port.equity_path().display()
    );
    ExitCode::SUCCESS
}

fn print_summary(result: &BacktestResult) {
    let summary = PerformanceSummary::compute(result);

    eprintln!("\n=== Results ===");
    eprintln!("Trading Days:      {}", result.equity.len());
    eprintln!("Skipped Days:      {}", result.skipped.len());
    eprintln!("Final AUM:         {:.2}", result.final_aum());
    eprintln!("Total Return:      {:.2}%", summary.total_return * 100.0);
    eprintln!("Annualized Return: {:.2}%", summary.annualized_return * 100.0);
    eprintln!("Annualized Vol:    {:.2}%", summary.annualized_volatility * 100.0);
    eprintln!("Sharpe Ratio:      {:.2}", summary.sharpe_ratio);
    eprintln!("Hit Ratio:         {:.1}%", summary.hit_ratio * 100.0);
    eprintln!("Max Drawdown:      -{:.1}%", summary.drawdown.max_drawdown * 100.0);
    if let (Some(peak), Some(trough)) = (summary.drawdown.peak_date, summary.drawdown.trough_date) {
        eprintln!("  Peak / Trough:   {} / {}", peak, trough);
    }
    match &summary.regression {
        Some(reg) => {
            eprintln!("Alpha (annual):    {:.2}%", reg.alpha * 100.0);
            eprintln!("Beta:              {:.3}", reg.beta);
        }
        None => eprintln!("Alpha / Beta:      n/a (insufficient benchmark data)"),
    }
    eprintln!("Total Trades:      {}", summary.trades.total_trades);
    eprintln!("Win Rate:          {:.1}%", summary.trades.win_rate * 100.0);
    eprintln!("Profit Factor:     {:.2}", summary.trades.profit_factor);
    eprintln!(
        "Long / Short:      {} ({:.2}) / {} ({:.2})",
        summary.trades.long_trades,
        summary.trades.long_pnl,
        summary.trades.short_trades,
        summary.trades.short_pnl
    );
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        return fail(&e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    eprintln!("Config validated successfully");
    eprintln!("  initial_capital:   {:.2}", bt_config.initial_capital);
    eprintln!(
        "  commission:        {} per share, {} minimum per order",
        bt_config.commission_per_share, bt_config.min_commission_per_order
    );
    eprintln!("  band_multiplier:   {}", bt_config.band_multiplier);
    eprintln!(
        "  rebalance every:   {} min",
        bt_config.rebalance_frequency_minutes
    );
    eprintln!(
        "  sizing:            {} (target {}, max leverage {})",
        bt_config.sizing_mode, bt_config.target_volatility, bt_config.max_leverage
    );
    ExitCode::SUCCESS
}

fn run_compound_return(monthly: &[f64]) -> ExitCode {
    let total = compound_return(monthly);
    println!("{:.4}%", total * 100.0);
    ExitCode::SUCCESS
}
