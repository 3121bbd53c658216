//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod indicator_helpers;
pub mod strategy;
pub mod config;
pub mod config_validation;
pub mod preset;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod error;
