//! ROC (Rate of Change) indicator, used as the momentum measure.
//!
//! ROC(n)[i] = (C[i] - C[i-n]) / C[i-n], as a fraction (0.05 is +5%).
//! If C[i-n] == 0: ROC = 0
//! Warmup: first n bars invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_roc(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i >= period;

        let value = if valid {
            let prev_close = bars[i - period].close;
            if prev_close == 0.0 {
                0.0
            } else {
                (bar.close - prev_close) / prev_close
            }
        } else {
            0.0
        };

        values.push(IndicatorPoint::simple(bar.date, valid, value));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Roc(period),
        values,
    }
}
