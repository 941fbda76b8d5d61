//! Core domain types and logic.

pub mod bar;
pub mod session;
pub mod indicator;
pub mod signal;
pub mod sizing;
pub mod exposure;
pub mod trade;
pub mod execution;
pub mod portfolio;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
