//! Momentum / breakout strategy.
//!
//! momentum = ROC(`momentum_period`), volume is "high" when today's volume
//! exceeds yesterday's VOLSMA(`volume_period`) by more than
//! `breakout_threshold` (0.5 means 1.5x the average).
//!
//! Buy:  (momentum > `momentum_threshold` OR close > yesterday's
//!        HIGHEST(`channel_period`)) AND high volume
//! Sell: (momentum < -`momentum_threshold` OR close < yesterday's
//!        LOWEST(`channel_period`)) AND high volume
//!
//! Protective levels are ATR based: stop = close - k·ATR, target =
//! close + `risk_reward_ratio`·k·ATR with k = `atr_multiplier`.

use crate::domain::error::Result;
use crate::domain::indicator::{IndicatorFrame, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;
use crate::domain::strategy::{
    require_finite_positive, require_non_negative, require_positive, volume_strength,
    REASON_NO_SETUP,
};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MomentumParams {
    pub momentum_period: usize,
    pub momentum_threshold: f64,
    pub volume_period: usize,
    pub breakout_threshold: f64,
    pub channel_period: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub risk_reward_ratio: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        MomentumParams {
            momentum_period: 20,
            momentum_threshold: 0.02,
            volume_period: 10,
            breakout_threshold: 0.5,
            channel_period: 20,
            atr_period: 14,
            atr_multiplier: 2.0,
            risk_reward_ratio: 1.5,
        }
    }
}

impl MomentumParams {
    fn momentum(&self) -> IndicatorType {
        IndicatorType::Roc(self.momentum_period)
    }

    fn avg_volume(&self) -> IndicatorType {
        IndicatorType::VolumeSma(self.volume_period)
    }

    fn channel_high(&self) -> IndicatorType {
        IndicatorType::Highest(self.channel_period)
    }

    fn channel_low(&self) -> IndicatorType {
        IndicatorType::Lowest(self.channel_period)
    }

    fn atr(&self) -> IndicatorType {
        IndicatorType::Atr(self.atr_period)
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![
            self.momentum(),
            self.avg_volume(),
            self.channel_high(),
            self.channel_low(),
            self.atr(),
        ]
    }

    pub fn longest_window(&self) -> usize {
        // volume average and channel are read one bar back
        [
            self.momentum().warmup(),
            self.avg_volume().warmup() + 1,
            self.channel_high().warmup() + 1,
            self.atr().warmup(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("momentum_period", self.momentum_period)?;
        require_positive("volume_period", self.volume_period)?;
        require_positive("channel_period", self.channel_period)?;
        require_positive("atr_period", self.atr_period)?;
        require_non_negative("momentum_threshold", self.momentum_threshold)?;
        require_non_negative("breakout_threshold", self.breakout_threshold)?;
        require_finite_positive("atr_multiplier", self.atr_multiplier)?;
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
        let momentum = frame.value(&self.momentum(), i)?;
        let avg_volume = frame.previous(&self.avg_volume(), i)?;
        let resistance = frame.previous(&self.channel_high(), i)?;
        let support = frame.previous(&self.channel_low(), i)?;
        let atr = frame.value(&self.atr(), i)?;

        let high_volume = bar.volume > avg_volume * (1.0 + self.breakout_threshold);
        if !high_volume {
            return Some(Signal::hold(bar.date, REASON_NO_SETUP));
        }

        let confidence = 0.5 * (momentum.abs() / 0.05).clamp(0.0, 1.0)
            + 0.3 * volume_strength(bar.volume, avg_volume)
            + 0.2;

        let strong = momentum > self.momentum_threshold;
        let breakout = bar.close > resistance;
        if strong || breakout {
            let risk = self.atr_multiplier * atr;
            let reason = if breakout {
                format!("close above {}-bar high on volume", self.channel_period)
            } else {
                format!("momentum {:+.2}% on volume", momentum * 100.0)
            };
            return Some(Signal::buy(
                bar.date,
                confidence,
                reason,
                bar.close,
                Some(bar.close - risk),
                Some(bar.close + self.risk_reward_ratio * risk),
            ));
        }

        let weak = momentum < -self.momentum_threshold;
        let breakdown = bar.close < support;
        if weak || breakdown {
            let reason = if breakdown {
                format!("close below {}-bar low on volume", self.channel_period)
            } else {
                format!("momentum {:+.2}% on volume", momentum * 100.0)
            };
            return Some(Signal::sell(bar.date, confidence, reason));
        }

        Some(Signal::hold(bar.date, REASON_NO_SETUP))
    }
}
