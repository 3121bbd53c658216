//! Shared helper functions for indicator calculations.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N); 0 for an empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median of an unsorted slice; `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Average True Range with Wilder smoothing.
///
/// The first true range is high - low. The seed at index (n-1) is the mean of
/// the first n true ranges; afterwards ATR = (prev * (n-1) + TR) / n.
pub fn calc_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;
    let mut tr_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };

        if period == 0 || i + 1 < period {
            tr_sum += tr;
            results.push(IndicatorPoint::simple(bar.date, false, 0.0));
        } else if i + 1 == period {
            atr = (tr_sum + tr) / period as f64;
            results.push(IndicatorPoint::simple(bar.date, true, atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
            results.push(IndicatorPoint::simple(bar.date, true, atr));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    fn simple(series: &IndicatorSeries, i: usize) -> f64 {
        match series.values[i].value {
            IndicatorValue::Simple(v) => v,
            _ => panic!("expected simple value"),
        }
    }

    #[test]
    fn atr_basic() {
        let bars: Vec<PriceBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calc_atr(&bars, 3);
        assert_eq!(series.values.len(), 5);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
        assert!((simple(&series, 4) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn atr_seed_is_average() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
        ];
        let series = calc_atr(&bars, 3);
        assert!((simple(&series, 2) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 125.0, 115.0, 120.0),
        ];
        let series = calc_atr(&bars, 3);
        let expected = (10.0 * 2.0 + 10.0) / 3.0;
        assert!((simple(&series, 3) - expected).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<PriceBar> = (1..=2).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calc_atr(&bars, 5);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn atr_handles_gaps() {
        // gap up: TR on day 2 is |130 - 100| = 30
        let bars = vec![
            make_bar(1, 105.0, 95.0, 100.0),
            make_bar(2, 130.0, 125.0, 128.0),
        ];
        let series = calc_atr(&bars, 2);
        let expected = (10.0 + 30.0) / 2.0;
        assert!((simple(&series, 1) - expected).abs() < 1e-9);
    }

    #[test]
    fn mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((population_stddev(&values) - 2.0).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_stddev(&[]), 0.0);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
