//! Fill simulation.
//!
//! Fees and slippage are basis-point rates on notional, charged on both
//! legs. Slippage always moves the fill against the trader.

use chrono::NaiveDate;
use tracing::warn;

use super::config::Config;
use super::portfolio::EngineState;
use super::position::{ExitReason, OpenPosition, Position, Trade};

/// Per-run cost rates, already divided down from bps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub fee_rate: f64,
    pub slippage_rate: f64,
}

impl CostModel {
    pub fn from_config(config: &Config) -> Self {
        CostModel {
            fee_rate: config.fee_rate(),
            slippage_rate: config.slippage_rate(),
        }
    }

    pub fn fee(&self, notional: f64) -> f64 {
        notional * self.fee_rate
    }

    pub fn buy_fill(&self, market_price: f64) -> f64 {
        market_price * (1.0 + self.slippage_rate)
    }

    pub fn sell_fill(&self, market_price: f64) -> f64 {
        market_price * (1.0 - self.slippage_rate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        size: f64,
        fill_price: f64,
        fee: f64,
    },
    InsufficientCapital,
}

/// Open a long position at `market_price`.
///
/// Steps:
/// 1. Apply slippage to the market price
/// 2. Budget = `position_fraction` × current equity (all cash while flat)
/// 3. Size so that notional plus fee fits the budget; fractional shares allowed
/// 4. Deduct notional and fee from cash
#[allow(clippy::too_many_arguments)]
pub fn enter_long(
    state: &mut EngineState,
    index: usize,
    date: NaiveDate,
    market_price: f64,
    position_fraction: f64,
    stop_price: Option<f64>,
    target_price: Option<f64>,
    costs: &CostModel,
) -> EntryResult {
    if state.position.is_long() {
        return EntryResult::InsufficientCapital;
    }

    let fill_price = costs.buy_fill(market_price);
    let budget = state.cash * position_fraction;
    let size = budget / (fill_price * (1.0 + costs.fee_rate));
    if !size.is_finite() || size <= 0.0 {
        warn!(%date, cash = state.cash, fill_price, "entry skipped: insufficient capital");
        return EntryResult::InsufficientCapital;
    }

    let notional = size * fill_price;
    let fee = costs.fee(notional);
    // rounding can leave a few ulps below zero
    state.cash = (state.cash - notional - fee).max(0.0);
    state.position = Position::Long(OpenPosition {
        entry_date: date,
        entry_index: index,
        entry_price: fill_price,
        size,
        entry_fee: fee,
        stop_price,
        target_price,
    });

    EntryResult::Entered {
        size,
        fill_price,
        fee,
    }
}

/// Close the open position at `market_price` and return the finished trade.
/// `None` while flat.
pub fn exit_long(
    state: &mut EngineState,
    date: NaiveDate,
    market_price: f64,
    reason: ExitReason,
    costs: &CostModel,
) -> Option<Trade> {
    let Position::Long(open) = std::mem::take(&mut state.position) else {
        return None;
    };

    let fill_price = costs.sell_fill(market_price);
    let proceeds = open.size * fill_price;
    let fee = costs.fee(proceeds);
    state.cash += proceeds - fee;

    Some(Trade {
        entry_date: open.entry_date,
        entry_price: open.entry_price,
        exit_date: date,
        exit_price: fill_price,
        size: open.size,
        gross_pnl: open.size * (fill_price - open.entry_price),
        fees_paid: open.entry_fee + fee,
        exit_reason: reason,
    })
}
