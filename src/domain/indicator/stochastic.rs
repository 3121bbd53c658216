//! Stochastic oscillator.
//!
//! %K[i] = (C[i] - LL(k)) / (HH(k) - LL(k)) * 100, where HH/LL are the highest
//! high and lowest low of the last k bars. %K is 50 when HH == LL.
//! %D[i] = SMA(d) of %K.
//! Warmup: (k-1) + (d-1) bars.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_stochastic(bars: &[PriceBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Stochastic { k_period, d_period };
    let empty = IndicatorValue::Stochastic { k: 0.0, d: 0.0 };

    if k_period == 0 || d_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: bars
                .iter()
                .map(|b| IndicatorPoint::invalid(b.date, empty))
                .collect(),
        };
    }

    let mut k_values: Vec<f64> = Vec::with_capacity(bars.len());
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < k_period {
            values.push(IndicatorPoint::invalid(bar.date, empty));
            continue;
        }

        let window = &bars[i + 1 - k_period..=i];
        let hh = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let ll = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let k = if hh > ll {
            (bar.close - ll) / (hh - ll) * 100.0
        } else {
            50.0
        };
        k_values.push(k);

        if k_values.len() < d_period {
            values.push(IndicatorPoint::invalid(bar.date, empty));
        } else {
            let recent = &k_values[k_values.len() - d_period..];
            let d = recent.iter().sum::<f64>() / d_period as f64;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Stochastic { k, d },
            });
        }
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
