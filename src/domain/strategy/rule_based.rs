//! Rule-based strategy: RSI extreme + MACD crossover event + trend filter.
//!
//! Buy when all three hold on the same bar:
//! - RSI < `rsi_buy_threshold`
//! - the MACD line crosses above its signal line (prev line <= prev signal,
//!   line > signal)
//! - close > SMA(`trend_period`)
//!
//! Sell is the mirror image (RSI > `rsi_sell_threshold`, dead-cross, close
//! below the trend average).
//!
//! Stop = close - `stop_multiplier` × STDDEV(`volatility_period`);
//! target = close + `risk_reward_ratio` × (close - stop).

use crate::domain::error::Result;
use crate::domain::indicator::{IndicatorFrame, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;
use crate::domain::strategy::{
    require_finite_positive, require_positive, require_rsi_bounds, REASON_NO_SETUP,
};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RuleBasedParams {
    pub rsi_period: usize,
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub trend_period: usize,
    pub volatility_period: usize,
    pub stop_multiplier: f64,
    pub risk_reward_ratio: f64,
}

impl Default for RuleBasedParams {
    fn default() -> Self {
        RuleBasedParams {
            rsi_period: 14,
            rsi_buy_threshold: 30.0,
            rsi_sell_threshold: 70.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            trend_period: 50,
            volatility_period: 20,
            stop_multiplier: 2.0,
            risk_reward_ratio: 2.0,
        }
    }
}

impl RuleBasedParams {
    fn rsi(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_period)
    }

    fn macd(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    fn trend(&self) -> IndicatorType {
        IndicatorType::Sma(self.trend_period)
    }

    fn volatility(&self) -> IndicatorType {
        IndicatorType::Stddev(self.volatility_period)
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![self.rsi(), self.macd(), self.trend(), self.volatility()]
    }

    pub fn longest_window(&self) -> usize {
        // the crossover needs the previous MACD point as well
        let macd = self.macd().warmup() + 1;
        self.required_indicators()
            .iter()
            .map(IndicatorType::warmup)
            .max()
            .unwrap_or(0)
            .max(macd)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("rsi_period", self.rsi_period)?;
        require_positive("macd_fast", self.macd_fast)?;
        require_positive("macd_slow", self.macd_slow)?;
        require_positive("macd_signal", self.macd_signal)?;
        require_positive("trend_period", self.trend_period)?;
        require_positive("volatility_period", self.volatility_period)?;
        require_rsi_bounds(
            "rsi_buy_threshold",
            self.rsi_buy_threshold,
            "rsi_sell_threshold",
            self.rsi_sell_threshold,
        )?;
        if self.macd_fast >= self.macd_slow {
            return Err(crate::domain::error::StratbenchError::invalid(
                "macd_fast",
                "must be shorter than macd_slow",
            ));
        }
        require_finite_positive("stop_multiplier", self.stop_multiplier)?;
        require_finite_positive("risk_reward_ratio", self.risk_reward_ratio)?;
        Ok(())
    }

    pub(crate) fn evaluate(
        &self,
        bars: &[PriceBar],
        frame: &IndicatorFrame,
        i: usize,
    ) -> Option<Signal> {
        let bar = &bars[i];
        let rsi = frame.value(&self.rsi(), i)?;
        let macd = frame.macd(&self.macd(), i)?;
        let prev = frame.macd(&self.macd(), i.checked_sub(1)?)?;
        let trend = frame.value(&self.trend(), i)?;
        let stddev = frame.value(&self.volatility(), i)?;

        let cross_up = prev.line <= prev.signal && macd.line > macd.signal;
        let cross_down = prev.line >= prev.signal && macd.line < macd.signal;

        if rsi < self.rsi_buy_threshold && cross_up && bar.close > trend {
            let stop = bar.close - self.stop_multiplier * stddev;
            let target = bar.close + self.risk_reward_ratio * (bar.close - stop);
            let rsi_extremity = ((50.0 - rsi) / 25.0).clamp(0.0, 1.0);
            return Some(Signal::buy(
                bar.date,
                0.7 + 0.3 * rsi_extremity,
                format!(
                    "RSI {:.1} < {}, MACD cross up, close above SMA({})",
                    rsi, self.rsi_buy_threshold, self.trend_period
                ),
                bar.close,
                Some(stop),
                Some(target),
            ));
        }

        if rsi > self.rsi_sell_threshold && cross_down && bar.close < trend {
            let rsi_extremity = ((rsi - 50.0) / 25.0).clamp(0.0, 1.0);
            return Some(Signal::sell(
                bar.date,
                0.7 + 0.3 * rsi_extremity,
                format!(
                    "RSI {:.1} > {}, MACD cross down, close below SMA({})",
                    rsi, self.rsi_sell_threshold, self.trend_period
                ),
            ));
        }

        Some(Signal::hold(bar.date, REASON_NO_SETUP))
    }
}
