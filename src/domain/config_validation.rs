//! Configuration validation.
//!
//! Runs before any data is loaded so a bad INI file fails without touching
//! the input tables.

use crate::domain::error::BacktestError;
use crate::domain::sizing::SizingMode;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_band_multiplier(config)?;
    validate_rebalance_frequency(config)?;
    validate_sizing(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    config.require_string("data", "minute_bars")?;
    config.require_string("data", "daily_bars")?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.require_f64("backtest", "initial_capital")?;
    if value <= 0.0 {
        return Err(BacktestError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    for key in ["commission_per_share", "min_commission_per_order"] {
        let value = config.require_f64("backtest", key)?;
        if value < 0.0 {
            return Err(BacktestError::invalid(
                "backtest",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    Ok(())
}

fn validate_band_multiplier(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.require_f64("strategy", "band_multiplier")?;
    if value <= 0.0 {
        return Err(BacktestError::invalid(
            "strategy",
            "band_multiplier",
            "band_multiplier must be positive",
        ));
    }
    Ok(())
}

fn validate_rebalance_frequency(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.require_u32("strategy", "rebalance_frequency_minutes")?;
    if value < 1 {
        return Err(BacktestError::invalid(
            "strategy",
            "rebalance_frequency_minutes",
            "rebalance_frequency_minutes must be at least 1",
        ));
    }
    Ok(())
}

fn validate_sizing(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let mode = config.require_string("strategy", "sizing_mode")?;
    mode.parse::<SizingMode>()
        .map_err(|reason| BacktestError::invalid("strategy", "sizing_mode", reason))?;

    let target = config.require_f64("strategy", "target_volatility")?;
    if target <= 0.0 {
        return Err(BacktestError::invalid(
            "strategy",
            "target_volatility",
            "target_volatility must be positive",
        ));
    }

    let leverage = config.require_f64("strategy", "max_leverage")?;
    if leverage < 1.0 {
        return Err(BacktestError::invalid(
            "strategy",
            "max_leverage",
            "max_leverage must be at least 1",
        ));
    }
    Ok(())
}
