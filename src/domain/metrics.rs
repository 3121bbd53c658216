//! Performance metrics.
//!
//! Everything is derived from the equity curve and the closed trades. Returns
//! are simple bar-to-bar returns of total value; annualisation assumes 252
//! trading days, CAGR uses calendar days.

use super::portfolio::EquityPoint;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.0;
const MIN_STDDEV: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Metrics {
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Worst peak-to-trough decline as a fraction, never positive.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous peak.
    pub max_drawdown_duration: usize,
    pub total_return: f64,
    pub final_equity: f64,
    /// `None` when no trade closed.
    pub win_rate: Option<f64>,
    pub trade_count: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    /// Gross wins over gross losses; `None` without a losing trade.
    pub profit_factor: Option<f64>,
    /// Mean calendar days between entry and exit.
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade], risk_free_rate: f64) -> Self {
        let initial = equity_curve.first().map(|p| p.total_value).unwrap_or(0.0);
        let final_equity = equity_curve.last().map(|p| p.total_value).unwrap_or(0.0);

        let total_return = if initial > 0.0 {
            final_equity / initial - 1.0
        } else {
            0.0
        };

        let returns = daily_returns(equity_curve);
        let stddev = population_stddev(&returns);
        let volatility = stddev * TRADING_DAYS_PER_YEAR.sqrt();
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = risk_adjusted(&returns, stddev, daily_rf);
        let (max_drawdown, max_drawdown_duration) = drawdown(equity_curve);

        let trade_count = trades.len();
        let trades_won = trades.iter().filter(|t| t.is_win()).count();
        let trades_lost = trades.iter().filter(|t| t.net_pnl() < 0.0).count();
        let win_rate = (trade_count > 0).then(|| trades_won as f64 / trade_count as f64);

        let gross_wins: f64 = trades.iter().map(|t| t.net_pnl().max(0.0)).sum();
        let gross_losses: f64 = trades.iter().map(|t| (-t.net_pnl()).max(0.0)).sum();
        let profit_factor = (gross_losses > 0.0).then(|| gross_wins / gross_losses);

        let avg_trade_duration = if trade_count > 0 {
            trades.iter().map(|t| t.holding_days() as f64).sum::<f64>() / trade_count as f64
        } else {
            0.0
        };

        Metrics {
            cagr: cagr(equity_curve),
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_return,
            final_equity,
            win_rate,
            trade_count,
            trades_won,
            trades_lost,
            profit_factor,
            avg_trade_duration,
        }
    }
}

fn cagr(equity_curve: &[EquityPoint]) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    let days = (last.date - first.date).num_days();
    if days <= 0 || first.total_value <= 0.0 {
        return 0.0;
    }
    let growth = (last.total_value / first.total_value).max(0.0);
    growth.powf(DAYS_PER_YEAR / days as f64) - 1.0
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].total_value;
            if prev > 0.0 {
                w[1].total_value / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn risk_adjusted(returns: &[f64], stddev: f64, daily_rf: f64) -> (f64, f64) {
    if returns.is_empty() || stddev < MIN_STDDEV {
        return (0.0, 0.0);
    }
    let n = returns.len() as f64;
    let excess = returns.iter().map(|r| r - daily_rf).sum::<f64>() / n;
    let sharpe = excess / stddev * TRADING_DAYS_PER_YEAR.sqrt();

    let downside = (returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    let sortino = if downside >= MIN_STDDEV {
        excess / downside * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

fn drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.total_value;
    let mut max_dd = 0.0_f64;
    let mut run = 0usize;
    let mut longest = 0usize;

    for point in equity_curve {
        if point.total_value >= peak {
            peak = point.total_value;
            run = 0;
            continue;
        }
        if peak > 0.0 {
            max_dd = max_dd.min(point.total_value / peak - 1.0);
        }
        run += 1;
        longest = longest.max(run);
    }

    (max_dd, longest)
}
