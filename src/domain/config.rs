//! Run configuration.

use std::fmt;
use std::str::FromStr;

use crate::domain::config_validation::validate_config;
use crate::domain::error::{Result, StratbenchError};
use crate::domain::strategy::Strategy;

/// What wins when a protective level is breached on the same bar the
/// strategy emits a Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExitPriority {
    /// The breach closes the position on that bar at the stop/target level.
    #[default]
    StopsFirst,
    /// The Sell wins; the position closes at the next open and the breach
    /// on that bar is ignored.
    SignalFirst,
}

impl fmt::Display for ExitPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitPriority::StopsFirst => write!(f, "stops_first"),
            ExitPriority::SignalFirst => write!(f, "signal_first"),
        }
    }
}

impl FromStr for ExitPriority {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stops_first" | "stops" => Ok(ExitPriority::StopsFirst),
            "signal_first" | "signal" => Ok(ExitPriority::SignalFirst),
            other => Err(StratbenchError::invalid(
                "exit_priority",
                format!("expected stops_first or signal_first, got '{other}'"),
            )),
        }
    }
}

/// Everything one run needs. Built once (usually from a preset) and never
/// mutated while the run is in progress.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Config {
    pub warmup_bars: usize,
    pub fee_bps: f64,
    pub slippage_bps: f64,
    pub initial_capital: f64,
    /// Share of current equity committed at each entry, in (0, 1].
    pub position_fraction: f64,
    /// Annual rate used for the Sharpe and Sortino ratios.
    pub risk_free_rate: f64,
    pub exit_priority: ExitPriority,
    pub strategy: Strategy,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_bps / 10_000.0
    }

    pub fn slippage_rate(&self) -> f64 {
        self.slippage_bps / 10_000.0
    }
}
