//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_gain == 0 and avg_loss == 0: RSI = 50 (no movement)
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes to compute initial average).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if period == 0 || i == 0 {
            values.push(IndicatorPoint::simple(bar.date, false, 0.0));
            continue;
        }

        let change = bar.close - bars[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
            values.push(IndicatorPoint::simple(bar.date, false, 0.0));
        } else if i == period {
            avg_gain = (avg_gain + gain) / period as f64;
            avg_loss = (avg_loss + loss) / period as f64;
            values.push(IndicatorPoint::simple(bar.date, true, rsi_value(avg_gain, avg_loss)));
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
            values.push(IndicatorPoint::simple(bar.date, true, rsi_value(avg_gain, avg_loss)));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;
    use chrono::NaiveDate;

    fn make_bar(i: usize, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        }
    }

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| make_bar(i, p))
            .collect()
    }

    fn rsi_at(series: &IndicatorSeries, i: usize) -> f64 {
        match series.values[i].value {
            IndicatorValue::Simple(v) => v,
            _ => panic!("expected simple value"),
        }
    }

    #[test]
    fn warmup_is_period_bars() {
        let bars = make_bars(&[44.0, 44.5, 44.2, 44.8, 45.1, 45.0]);
        let series = calculate_rsi(&bars, 3);
        assert_eq!(series.values.len(), 6);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn all_gains_is_100() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let series = calculate_rsi(&bars, 3);
        assert!((rsi_at(&series, 3) - 100.0).abs() < f64::EPSILON);
        assert!((rsi_at(&series, 4) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_losses_is_0() {
        let bars = make_bars(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let series = calculate_rsi(&bars, 3);
        assert!(rsi_at(&series, 3).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_series_is_neutral() {
        let bars = make_bars(&[10.0; 8]);
        let series = calculate_rsi(&bars, 3);
        for i in 3..8 {
            assert!((rsi_at(&series, i) - 50.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn seed_and_wilder_smoothing() {
        // changes: +2, -1, +1, -2
        let bars = make_bars(&[10.0, 12.0, 11.0, 12.0, 10.0]);
        let series = calculate_rsi(&bars, 3);

        let g0 = (2.0 + 0.0 + 1.0) / 3.0;
        let l0 = (0.0 + 1.0 + 0.0) / 3.0;
        let expected3 = 100.0 - 100.0 / (1.0 + g0 / l0);
        assert!((rsi_at(&series, 3) - expected3).abs() < 1e-9);

        let g1 = (g0 * 2.0 + 0.0) / 3.0;
        let l1 = (l0 * 2.0 + 2.0) / 3.0;
        let expected4 = 100.0 - 100.0 / (1.0 + g1 / l1);
        assert!((rsi_at(&series, 4) - expected4).abs() < 1e-9);
    }

    #[test]
    fn values_stay_in_range() {
        let prices: Vec<f64> = (0..30).map(|i| 50.0 + ((i * 7) % 11) as f64).collect();
        let bars = make_bars(&prices);
        let series = calculate_rsi(&bars, 14);
        for p in series.values.iter().filter(|p| p.valid) {
            let IndicatorValue::Simple(v) = p.value else {
                panic!("expected simple value");
            };
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn period_zero_all_invalid() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let series = calculate_rsi(&bars, 0);
        assert_eq!(series.values.len(), 3);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
