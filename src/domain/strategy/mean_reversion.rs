//! Mean-reversion strategy: fade RSI and Bollinger extremes in calm markets.
//!
//! %B = (close - lower) / (upper - lower), 0.5 for a zero-width band.
//!
//! Buy:  RSI < `rsi_oversold` AND %B < `band_tolerance` AND
//!       RETVOL(`volatility_period`) <= median of its last
//!       `volatility_median_period` values
//! Sell: RSI > `rsi_overbought` AND %B > 1 - `band_tolerance`
//!
//! Stop = lower band × (1 - `stop_buffer`), target = middle band.

use crate::domain::error::Result;
use crate::domain::indicator::{IndicatorFrame, IndicatorType};
use crate::domain::indicator_helpers::median;
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;
use crate::domain::strategy::{
    require_non_negative, require_positive, require_rsi_bounds, require_unit_interval,
    REASON_NO_SETUP,
};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeanReversionParams {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bb_period: usize,
    pub bb_stddev: f64,
    pub band_tolerance: f64,
    pub volatility_period: usize,
    pub volatility_median_period: usize,
    pub stop_buffer: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        MeanReversionParams {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bb_period: 20,
            bb_stddev: 2.0,
            band_tolerance: 0.2,
            volatility_period: 10,
            volatility_median_period: 20,
            stop_buffer: 0.02,
        }
    }
}

impl MeanReversionParams {
    fn rsi(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_period)
    }

    fn bands(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.bb_period,
            stddev_mult_x100: (self.bb_stddev * 100.0).round() as u32,
        }
    }

    fn volatility(&self) -> IndicatorType {
        IndicatorType::ReturnVolatility(self.volatility_period)
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![self.rsi(), self.bands(), self.volatility()]
    }

    pub fn longest_window(&self) -> usize {
        let median = self.volatility().warmup() + self.volatility_median_period.saturating_sub(1);
        self.rsi().warmup().max(self.bands().warmup()).max(median)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("rsi_period", self.rsi_period)?;
        require_positive("bb_period", self.bb_period)?;
        require_positive("volatility_period", self.volatility_period)?;
        require_positive("volatility_median_period", self.volatility_median_period)?;
        require_rsi_bounds(
            "rsi_oversold",
            self.rsi_oversold,
            "rsi_overbought",
            self.rsi_overbought,
        )?;
        require_non_negative("bb_stddev", self.bb_stddev)?;
        if self.bb_stddev > 10.0 {
            return Err(crate::domain::error::StratbenchError::invalid(
                "bb_stddev",
                format!("must be <= 10, got {}", self.bb_stddev),
            ));
        }
        require_unit_interval("band_tolerance", self.band_tolerance)?;
        require_unit_interval("stop_buffer", self.stop_buffer)?;
        Ok(())
    }

    /// Median of the volatility series over the trailing window ending at `i`.
    /// `None` until every value in the window is available.
    fn volatility_median(&self, frame: &IndicatorFrame, i: usize) -> Option<f64> {
        let start = (i + 1).checked_sub(self.volatility_median_period)?;
        let window: Option<Vec<f64>> = (start..=i)
            .map(|j| frame.value(&self.volatility(), j))
            .collect();
        median(&window?)
    }

    pub(crate) fn evaluate(
        &self,
        bars: &[PriceBar],
        frame: &IndicatorFrame,
        i: usize,
    ) -> Option<Signal> {
        let bar = &bars[i];
        let rsi = frame.value(&self.rsi(), i)?;
        let bands = frame.bands(&self.bands(), i)?;
        let volatility = frame.value(&self.volatility(), i)?;
        let typical_volatility = self.volatility_median(frame, i)?;

        let percent_b = bands.percent_b(bar.close);
        let rsi_extremity = ((rsi - 50.0).abs() / 25.0).clamp(0.0, 1.0);
        let band_extremity = ((percent_b - 0.5).abs() / 0.5).clamp(0.0, 1.0);

        let calm = volatility <= typical_volatility;
        if rsi < self.rsi_oversold && percent_b < self.band_tolerance && calm {
            let volatility_factor = if typical_volatility > 0.0 {
                (1.0 - volatility / (2.0 * typical_volatility)).clamp(0.0, 1.0)
            } else {
                0.5
            };
            return Some(Signal::buy(
                bar.date,
                0.4 * rsi_extremity + 0.4 * band_extremity + 0.2 * volatility_factor,
                format!("RSI {:.1} oversold, %B {:.2} near lower band", rsi, percent_b),
                bar.close,
                Some(bands.lower * (1.0 - self.stop_buffer)),
                Some(bands.middle),
            ));
        }

        if rsi > self.rsi_overbought && percent_b > 1.0 - self.band_tolerance {
            return Some(Signal::sell(
                bar.date,
                0.5 * rsi_extremity + 0.5 * band_extremity,
                format!("RSI {:.1} overbought, %B {:.2} near upper band", rsi, percent_b),
            ));
        }

        Some(Signal::hold(bar.date, REASON_NO_SETUP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Action;
    use chrono::{Duration, NaiveDate};

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                date: start + Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1000.0,
            })
            .collect()
    }

    fn run(params: &MeanReversionParams, bars: &[PriceBar]) -> Vec<Signal> {
        let frame = IndicatorFrame::compute(bars, &params.required_indicators());
        (0..bars.len())
            .map(|i| {
                params
                    .evaluate(bars, &frame, i)
                    .unwrap_or_else(|| Signal::hold(bars[i].date, "n/a"))
            })
            .collect()
    }

    fn params() -> MeanReversionParams {
        MeanReversionParams {
            rsi_period: 5,
            bb_period: 10,
            volatility_period: 5,
            volatility_median_period: 5,
            ..MeanReversionParams::default()
        }
    }

    /// Gentle zig-zag around 100 then a calm slide of small equal steps.
    fn calm_slide() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        closes.extend((1..=6).map(|k| 100.0 - 0.8 * k as f64));
        closes
    }

    #[test]
    fn buys_oversold_near_lower_band() {
        let bars = make_bars(&calm_slide());
        let signals = run(&params(), &bars);
        let buy = signals
            .iter()
            .position(|s| s.action == Action::Buy)
            .expect("buy during the slide");
        assert!(buy >= 20);

        let s = &signals[buy];
        let close = bars[buy].close;
        assert!(s.target_price.unwrap() > close);
        if let Some(stop) = s.stop_price {
            assert!(stop < close);
        }
    }

    #[test]
    fn sells_overbought_near_upper_band() {
        let mut closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        closes.extend((1..=6).map(|k| 101.0 + 0.8 * k as f64));
        let signals = run(&params(), &make_bars(&closes));
        assert!(signals[20..].iter().any(|s| s.action == Action::Sell));
        assert!(signals.iter().all(|s| s.action != Action::Buy));
    }

    #[test]
    fn flat_series_holds() {
        let signals = run(&params(), &make_bars(&[100.0; 40]));
        assert!(signals.iter().all(|s| s.action == Action::Hold));
    }

    #[test]
    fn median_window_delays_first_decision() {
        let p = params();
        let bars = make_bars(&calm_slide());
        let frame = IndicatorFrame::compute(&bars, &p.required_indicators());
        let first = p.longest_window();
        assert_eq!(first, 9);
        assert!(p.evaluate(&bars, &frame, first - 1).is_none());
        assert!(p.evaluate(&bars, &frame, first).is_some());
    }

    #[test]
    fn validate_rejects_inverted_rsi_bounds() {
        let p = MeanReversionParams {
            rsi_oversold: 75.0,
            rsi_overbought: 25.0,
            ..MeanReversionParams::default()
        };
        assert!(p.validate().is_err());
        let p = MeanReversionParams {
            band_tolerance: 1.5,
            ..MeanReversionParams::default()
        };
        assert!(p.validate().is_err());
    }
}
