//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let raw = ema_of(&closes, period);

    let values = bars
        .iter()
        .zip(raw)
        .map(|(bar, v)| match v {
            Some(ema) => IndicatorPoint::simple(bar.date, true, ema),
            None => IndicatorPoint::simple(bar.date, false, 0.0),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over an arbitrary sequence; `None` until `period` inputs have been seen.
///
/// The update is written as `ema + k*(x - ema)` so a constant input keeps the
/// average exactly constant.
pub(crate) fn ema_of(inputs: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(inputs.len());
    if period == 0 {
        out.resize(inputs.len(), None);
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &x) in inputs.iter().enumerate() {
        if i + 1 < period {
            sum += x;
            out.push(None);
        } else if i + 1 == period {
            sum += x;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema += k * (x - ema);
            out.push(Some(ema));
        }
    }
    out
}
