//! Per-bar trading signal emitted by a strategy.

use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Decision for one bar, computed from data up to and including that bar.
///
/// `stop_price` and `target_price` are only meaningful on a Buy; the engine
/// copies them onto the position it opens.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Signal {
    pub date: NaiveDate,
    pub action: Action,
    pub confidence: f64,
    pub reason: String,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
}

impl Signal {
    pub fn hold(date: NaiveDate, reason: impl Into<String>) -> Self {
        Signal {
            date,
            action: Action::Hold,
            confidence: 0.0,
            reason: reason.into(),
            stop_price: None,
            target_price: None,
        }
    }

    /// A Buy with protective levels. Levels that are not strictly below
    /// (stop) or above (target) `reference` are dropped.
    pub fn buy(
        date: NaiveDate,
        confidence: f64,
        reason: impl Into<String>,
        reference: f64,
        stop: Option<f64>,
        target: Option<f64>,
    ) -> Self {
        Signal {
            date,
            action: Action::Buy,
            confidence: clamp_unit(confidence),
            reason: reason.into(),
            stop_price: stop.filter(|s| s.is_finite() && *s > 0.0 && *s < reference),
            target_price: target.filter(|t| t.is_finite() && *t > reference),
        }
    }

    pub fn sell(date: NaiveDate, confidence: f64, reason: impl Into<String>) -> Self {
        Signal {
            date,
            action: Action::Sell,
            confidence: clamp_unit(confidence),
            reason: reason.into(),
            stop_price: None,
            target_price: None,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

/// Clamp to [0, 1]; NaN becomes 0.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}
