//! Rolling support and resistance levels.
//!
//! HIGHEST(n)[i] = max(high[i-n+1..=i]), LOWEST(n)[i] = min(low[i-n+1..=i]).
//! Warmup: first (n-1) bars are invalid.
//!
//! Breakout rules compare today's close against yesterday's level so the
//! current bar never defines the level it is breaking.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_highest(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Highest(period),
        values: rolling_extreme(bars, period, |b| b.high, f64::max),
    }
}

pub fn calculate_lowest(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Lowest(period),
        values: rolling_extreme(bars, period, |b| b.low, f64::min),
    }
}

fn rolling_extreme(
    bars: &[PriceBar],
    period: usize,
    field: impl Fn(&PriceBar) -> f64,
    pick: fn(f64, f64) -> f64,
) -> Vec<IndicatorPoint> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let value = if valid {
                bars[i + 1 - period..=i]
                    .iter()
                    .map(&field)
                    .reduce(pick)
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            IndicatorPoint::simple(bar.date, valid, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: (high + low) / 2.0,
            high,
            low,
            close: (high + low) / 2.0,
            volume: 1000.0,
        }
    }

    fn simple(series: &IndicatorSeries, i: usize) -> f64 {
        match series.values[i].value {
            IndicatorValue::Simple(v) => v,
            _ => panic!("expected simple value"),
        }
    }

    fn sample() -> Vec<PriceBar> {
        vec![
            make_bar(1, 10.0, 8.0),
            make_bar(2, 14.0, 9.0),
            make_bar(3, 12.0, 7.0),
            make_bar(4, 11.0, 10.0),
        ]
    }

    #[test]
    fn highest_tracks_window_max() {
        let series = calculate_highest(&sample(), 2);
        assert!(!series.values[0].valid);
        assert_eq!(simple(&series, 1), 14.0);
        assert_eq!(simple(&series, 2), 14.0);
        assert_eq!(simple(&series, 3), 12.0);
    }

    #[test]
    fn lowest_tracks_window_min() {
        let series = calculate_lowest(&sample(), 3);
        assert!(!series.values[1].valid);
        assert_eq!(simple(&series, 2), 7.0);
        assert_eq!(simple(&series, 3), 7.0);
    }
}
