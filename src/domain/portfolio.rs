//! Engine state and equity tracking.

use chrono::NaiveDate;

use super::position::Position;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
    pub total_value: f64,
}

/// Order decided on one bar, executed at the next bar's open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingOrder {
    Enter {
        stop_price: Option<f64>,
        target_price: Option<f64>,
    },
    Exit,
}

/// Everything the engine carries from one bar to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub cash: f64,
    pub position: Position,
    pub pending: Option<PendingOrder>,
}

impl EngineState {
    pub fn new(initial_capital: f64) -> Self {
        EngineState {
            cash: initial_capital,
            position: Position::Flat,
            pending: None,
        }
    }

    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    pub fn mark(&self, date: NaiveDate, close: f64) -> EquityPoint {
        let position_value = self.position.market_value(close);
        EquityPoint {
            date,
            cash: self.cash,
            position_value,
            total_value: self.cash + position_value,
        }
    }
}
