//! Chart-pattern strategy: double bottom / double top with a confirmed
//! support or resistance break.
//!
//! A pivot low at j needs low[j] < low[j-1] and low[j] < low[j+1], so it is
//! only known once bar j+1 has closed. Pivot highs mirror this on highs.
//!
//! Double bottom at i: the last two pivot lows confirmed by bar i and lying
//! within the last `pattern_window` bars differ by less than
//! `similarity_tolerance` (relative to the lower one).
//!
//! Buy:  double bottom AND close > yesterday's HIGHEST(`support_resistance_window`)
//!       × (1 + `breakout_threshold`) AND volume > yesterday's
//!       VOLSMA(`volume_period`) × `volume_surge`
//! Sell: double top AND close < yesterday's LOWEST(...) × (1 - `breakout_threshold`)
//!       AND the same volume surge
//!
//! Stop = pattern low × (1 - `breakout_threshold`); target =
//! close + `risk_reward_ratio` × (close - stop).

use crate::domain::error::Result;
use crate::domain::indicator::{IndicatorFrame, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;
use crate::domain::strategy::{
    require_finite_positive, require_non_negative, require_positive, require_unit_interval,
    volume_strength, REASON_NO_SETUP,
};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PatternParams {
    pub pattern_window: usize,
    pub support_resistance_window: usize,
    pub breakout_threshold: f64,
    pub similarity_tolerance: f64,
    pub volume_period: usize,
    pub volume_surge: f64,
    pub risk_reward_ratio: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        PatternParams {
            pattern_window: 20,
            support_resistance_window: 20,
            breakout_threshold: 0.01,
            similarity_tolerance: 0.02,
            volume_period: 10,
            volume_surge: 1.5,
            risk_reward_ratio: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pivot {
    High,
    Low,
}

impl PatternParams {
    fn resistance(&self) -> IndicatorType {
        IndicatorType::Highest(self.support_resistance_window)
    }

    fn support(&self) -> IndicatorType {
        IndicatorType::Lowest(self.support_resistance_window)
    }

    fn avg_volume(&self) -> IndicatorType {
        IndicatorType::VolumeSma(self.volume_period)
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![self.resistance(), self.support(), self.avg_volume()]
    }

    pub fn longest_window(&self) -> usize {
        (self.resistance().warmup() + 1)
            .max(self.avg_volume().warmup() + 1)
            .max(2)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("pattern_window", self.pattern_window)?;
        require_positive("support_resistance_window", self.support_resistance_window)?;
        require_positive("volume_period", self.volume_period)?;
        require_unit_interval("breakout_threshold", self.breakout_threshold)?;
        require_unit_interval("similarity_tolerance", self.similarity_tolerance)?;
        require_non_negative("volume_surge", self.volume_surge)?;
        require_finite_positive("risk_reward_ratio", self.risk_reward_ratio)?;
        Ok(())
    }

    /// Level of the double bottom/top visible at bar `i`, if any.
    fn double(&self, bars: &[PriceBar], i: usize, kind: Pivot) -> Option<f64> {
        let first = i.saturating_sub(self.pattern_window).max(1);
        let mut last_two: [Option<f64>; 2] = [None, None];

        // pivots at j need bar j+1, so j stops at i-1
        for j in first..i {
            let level = match kind {
                Pivot::Low => {
                    let (prev, cur, next) = (bars[j - 1].low, bars[j].low, bars[j + 1].low);
                    (cur < prev && cur < next).then_some(cur)
                }
                Pivot::High => {
                    let (prev, cur, next) = (bars[j - 1].high, bars[j].high, bars[j + 1].high);
                    (cur > prev && cur > next).then_some(cur)
                }
            };
            if let Some(level) = level {
                last_two = [last_two[1], Some(level)];
            }
        }

        let (a, b) = (last_two[0]?, last_two[1]?);
        let base = a.min(b);
        if base <= 0.0 {
            return None;
        }
        ((a - b).abs() / base < self.similarity_tolerance).then_some(match kind {
            Pivot::Low => base,
            Pivot::High => a.max(b),
        })
    }

    pub(crate) fn evaluate(
        &self,
        bars: &[PriceBar],
        frame: &IndicatorFrame,
        i: usize,
    ) -> Option<Signal> {
        let bar = &bars[i];
        let resistance = frame.previous(&self.resistance(), i)?;
        let support = frame.previous(&self.support(), i)?;
        let avg_volume = frame.previous(&self.avg_volume(), i)?;

        let surge = bar.volume > avg_volume * self.volume_surge;
        if !surge {
            return Some(Signal::hold(bar.date, REASON_NO_SETUP));
        }
        let volume_score = volume_strength(bar.volume, avg_volume);

        let breakout_level = resistance * (1.0 + self.breakout_threshold);
        if bar.close > breakout_level {
            if let Some(bottom) = self.double(bars, i, Pivot::Low) {
                let stop = bottom * (1.0 - self.breakout_threshold);
                let breakout = (bar.close / resistance - 1.0) / 0.05;
                return Some(Signal::buy(
                    bar.date,
                    0.4 + 0.4 * breakout.clamp(0.0, 1.0) + 0.2 * volume_score,
                    format!(
                        "double bottom at {:.2}, close above resistance {:.2}",
                        bottom, resistance
                    ),
                    bar.close,
                    Some(stop),
                    Some(bar.close + self.risk_reward_ratio * (bar.close - stop)),
                ));
            }
        }

        let breakdown_level = support * (1.0 - self.breakout_threshold);
        if bar.close < breakdown_level {
            if let Some(top) = self.double(bars, i, Pivot::High) {
                let breakdown = (1.0 - bar.close / support) / 0.05;
                return Some(Signal::sell(
                    bar.date,
                    0.4 + 0.4 * breakdown.clamp(0.0, 1.0) + 0.2 * volume_score,
                    format!(
                        "double top at {:.2}, close below support {:.2}",
                        top, support
                    ),
                ));
            }
        }

        Some(Signal::hold(bar.date, REASON_NO_SETUP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Action;
    use chrono::{Duration, NaiveDate};

    fn bar(i: usize, close: f64, volume: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume,
        }
    }

    fn series(closes: &[f64], last_volume: f64) -> Vec<PriceBar> {
        let n = closes.len();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i, c, if i + 1 == n { last_volume } else { 1000.0 }))
            .collect()
    }

    fn params() -> PatternParams {
        PatternParams {
            pattern_window: 15,
            support_resistance_window: 10,
            volume_period: 5,
            ..PatternParams::default()
        }
    }

    fn run(params: &PatternParams, bars: &[PriceBar]) -> Vec<Signal> {
        let frame = IndicatorFrame::compute(bars, &params.required_indicators());
        (0..bars.len())
            .map(|i| {
                params
                    .evaluate(bars, &frame, i)
                    .unwrap_or_else(|| Signal::hold(bars[i].date, "n/a"))
            })
            .collect()
    }

    /// W shape: two lows near 100 separated by a bounce to 103, then a
    /// high-volume push through the neckline.
    fn w_shape() -> Vec<f64> {
        vec![
            104.0, 104.0, 104.0, 104.0, 104.0, 103.0, 102.0, 101.0, 100.0, 101.0, 102.0, 103.0,
            102.0, 101.0, 100.2, 101.0, 102.0, 103.0, 109.0,
        ]
    }

    #[test]
    fn buys_double_bottom_breakout() {
        let bars = series(&w_shape(), 3000.0);
        let signals = run(&params(), &bars);
        let last = signals.last().unwrap();
        assert_eq!(last.action, Action::Buy, "{}", last.reason);

        // pattern low is the first trough's low (99.5)
        let stop = last.stop_price.unwrap();
        assert!((stop - 99.5 * 0.99).abs() < 1e-9);
        let target = last.target_price.unwrap();
        assert!((target - (109.0 + 2.0 * (109.0 - stop))).abs() < 1e-9);
        assert!(signals[..signals.len() - 1]
            .iter()
            .all(|s| s.action == Action::Hold));
    }

    #[test]
    fn no_buy_without_volume_surge() {
        let bars = series(&w_shape(), 1200.0);
        let signals = run(&params(), &bars);
        assert!(signals.iter().all(|s| s.action == Action::Hold));
    }

    #[test]
    fn no_buy_when_lows_differ() {
        let mut closes = w_shape();
        closes[14] = 96.0;
        closes[13] = 98.0;
        let bars = series(&closes, 3000.0);
        let signals = run(&params(), &bars);
        assert_eq!(signals.last().unwrap().action, Action::Hold);
    }

    #[test]
    fn sells_double_top_breakdown() {
        let closes: Vec<f64> = w_shape().iter().map(|c| 208.0 - c).collect();
        let bars = series(&closes, 3000.0);
        let signals = run(&params(), &bars);
        assert_eq!(signals.last().unwrap().action, Action::Sell);
    }

    #[test]
    fn flat_series_has_no_pivots() {
        let bars = series(&[50.0; 30], 1000.0);
        let p = params();
        assert_eq!(p.double(&bars, 29, Pivot::Low), None);
        assert_eq!(p.double(&bars, 29, Pivot::High), None);
    }
}
