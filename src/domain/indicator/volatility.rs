//! Realized volatility of daily returns.
//!
//! r[i] = C[i] / C[i-1] - 1 (0 when C[i-1] == 0)
//! RETVOL(n)[i] = population stddev of r[i-n+1..=i], not annualized.
//! Warmup: first n bars invalid (n returns need n+1 closes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::population_stddev;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_return_volatility(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let returns: Vec<f64> = bars
        .windows(2)
        .map(|w| {
            if w[0].close == 0.0 {
                0.0
            } else {
                w[1].close / w[0].close - 1.0
            }
        })
        .collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            // returns[j] is the change into bar j+1
            let valid = period > 0 && i >= period;
            let value = if valid {
                population_stddev(&returns[i - period..i])
            } else {
                0.0
            };
            IndicatorPoint::simple(bar.date, valid, value)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::ReturnVolatility(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn simple(series: &IndicatorSeries, i: usize) -> f64 {
        match series.values[i].value {
            IndicatorValue::Simple(v) => v,
            _ => panic!("expected simple value"),
        }
    }

    #[test]
    fn constant_growth_has_zero_volatility() {
        let bars = make_bars(&[100.0, 110.0, 121.0, 133.1]);
        let series = calculate_return_volatility(&bars, 2);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(simple(&series, 3).abs() < 1e-9);
    }

    #[test]
    fn alternating_returns() {
        // returns: +10%, -10%
        let bars = make_bars(&[100.0, 110.0, 99.0]);
        let series = calculate_return_volatility(&bars, 2);
        assert!((simple(&series, 2) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn flat_series_is_zero() {
        let bars = make_bars(&[50.0; 12]);
        let series = calculate_return_volatility(&bars, 10);
        assert!(series.values[10].valid);
        assert_eq!(simple(&series, 11), 0.0);
    }
}
