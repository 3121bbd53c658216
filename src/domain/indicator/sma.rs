//! Simple Moving Average of closes and of volume.
//!
//! SMA(n)[i] = sum(x[i-n+1..=i]) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: rolling_mean(bars, period, |b| b.close),
    }
}

/// Average volume, used for volume-confirmation rules.
pub fn calculate_volume_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values: rolling_mean(bars, period, |b| b.volume),
    }
}

fn rolling_mean(
    bars: &[PriceBar],
    period: usize,
    field: impl Fn(&PriceBar) -> f64,
) -> Vec<IndicatorPoint> {
    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;
        let mean = if valid {
            bars[i + 1 - period..=i].iter().map(&field).sum::<f64>() / period as f64
        } else {
            0.0
        };
        values.push(IndicatorPoint::simple(bar.date, valid, mean));
    }
    values
}
