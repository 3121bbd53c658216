//! Backtest engine and event loop.
//!
//! Orders are decided on a bar's close and filled at the next bar's open.
//! Per bar `i`, in order:
//! 1. fill the order pending from bar `i-1` at `open[i]`
//! 2. check the stop/target of a position opened before bar `i`
//! 3. turn signal `i` into the pending order for bar `i+1`
//! 4. mark to market at `close[i]`

use tracing::debug;

use super::config::{Config, ExitPriority};
use super::error::{Result, StratbenchError};
use super::execution::{enter_long, exit_long, CostModel, EntryResult};
use super::metrics::Metrics;
use super::ohlcv::{validate_series, PriceBar};
use super::portfolio::{EngineState, EquityPoint, PendingOrder};
use super::position::{ExitReason, OpenPosition, Position, Trade};
use super::signal::{Action, Signal};
use super::strategy::SignalGenerator;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Position still held after the last bar, marked at the last close.
    pub open_position: Option<OpenPosition>,
}

/// Signals, trades, equity and metrics of one complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub signals: Vec<Signal>,
    pub result: BacktestResult,
    pub metrics: Metrics,
}

pub fn run_backtest(bars: &[PriceBar], signals: &[Signal], config: &Config) -> Result<BacktestResult> {
    validate_series(bars)?;
    check_alignment(bars, signals)?;

    let costs = CostModel::from_config(config);
    let mut state = EngineState::new(config.initial_capital);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());

    for (i, (bar, signal)) in bars.iter().zip(signals).enumerate() {
        // 1. fill yesterday's order at today's open
        match state.pending.take() {
            Some(PendingOrder::Enter {
                stop_price,
                target_price,
            }) if state.position.is_flat() => {
                if let EntryResult::Entered { size, fill_price, .. } = enter_long(
                    &mut state,
                    i,
                    bar.date,
                    bar.open,
                    config.position_fraction,
                    stop_price,
                    target_price,
                    &costs,
                ) {
                    debug!(date = %bar.date, size, fill_price, "entered long");
                }
            }
            Some(PendingOrder::Exit) => {
                if let Some(trade) = exit_long(&mut state, bar.date, bar.open, ExitReason::Signal, &costs) {
                    debug!(date = %bar.date, pnl = trade.net_pnl(), "exited on signal");
                    trades.push(trade);
                }
            }
            _ => {}
        }

        // 2. protective levels, from the bar after entry
        let sell_now = signal.action == Action::Sell;
        let breach = match &state.position {
            Position::Long(open) if open.entry_index < i => open.triggered_exit(bar),
            _ => None,
        };
        if let Some((reason, level)) = breach {
            if !(sell_now && config.exit_priority == ExitPriority::SignalFirst) {
                if let Some(trade) = exit_long(&mut state, bar.date, level, reason, &costs) {
                    debug!(date = %bar.date, %reason, price = level, pnl = trade.net_pnl(), "protective exit");
                    trades.push(trade);
                }
            }
        }

        // 3. queue today's decision; nothing is left pending after the last bar
        if i + 1 < bars.len() {
            state.pending = match (signal.action, &state.position) {
                (Action::Buy, Position::Flat) => Some(PendingOrder::Enter {
                    stop_price: signal.stop_price,
                    target_price: signal.target_price,
                }),
                (Action::Sell, Position::Long(_)) => Some(PendingOrder::Exit),
                _ => None,
            };
        }

        // 4. mark to market
        equity_curve.push(state.mark(bar.date, bar.close));
    }

    Ok(BacktestResult {
        trades,
        equity_curve,
        open_position: state.position.as_open().cloned(),
    })
}

/// Generate signals, simulate, and measure in one call.
pub fn run_strategy(bars: &[PriceBar], config: &Config) -> Result<RunReport> {
    let generator = SignalGenerator::new(bars, config)?;
    let signals = generator.generate();
    let result = run_backtest(bars, &signals, config)?;
    let metrics = Metrics::compute(&result.equity_curve, &result.trades, config.risk_free_rate);

    debug!(
        strategy = %config.strategy.kind(),
        bars = bars.len(),
        trades = metrics.trade_count,
        final_equity = metrics.final_equity,
        "run complete"
    );

    Ok(RunReport {
        signals,
        result,
        metrics,
    })
}

fn check_alignment(bars: &[PriceBar], signals: &[Signal]) -> Result<()> {
    if bars.len() != signals.len() {
        return Err(StratbenchError::SignalMismatch {
            reason: format!("{} signals for {} bars", signals.len(), bars.len()),
        });
    }
    if let Some((bar, signal)) = bars.iter().zip(signals).find(|(b, s)| b.date != s.date) {
        return Err(StratbenchError::SignalMismatch {
            reason: format!("signal dated {} on bar {}", signal.date, bar.date),
        });
    }
    Ok(())
}
