//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, aligned to the bars
//! - `IndicatorFrame`: Every series a strategy needs, with checked accessors
//!
//! Every series has exactly one point per bar. Points inside an indicator's
//! warm-up window carry `valid: false`, and the frame accessors turn those
//! into `None`. No indicator ever emits NaN.

pub mod bollinger;
pub mod ema;
pub mod extrema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod volatility;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use extrema::{calculate_highest, calculate_lowest};
pub use macd::calculate_macd;
pub use roc::calculate_roc;
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, calculate_volume_sma};
pub use stddev::calculate_stddev;
pub use stochastic::calculate_stochastic;
pub use volatility::calculate_return_volatility;

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub(crate) fn invalid(date: NaiveDate, value: IndicatorValue) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value,
        }
    }

    pub(crate) fn simple(date: NaiveDate, valid: bool, value: f64) -> Self {
        IndicatorPoint {
            date,
            valid,
            value: IndicatorValue::Simple(if valid { value } else { 0.0 }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Roc(usize),
    Atr(usize),
    Stddev(usize),
    ReturnVolatility(usize),
    VolumeSma(usize),
    Highest(usize),
    Lowest(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Index of the first bar at which this indicator can be valid.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::Atr(n)
            | IndicatorType::Stddev(n)
            | IndicatorType::VolumeSma(n)
            | IndicatorType::Highest(n)
            | IndicatorType::Lowest(n) => n.saturating_sub(1),
            IndicatorType::Rsi(n) | IndicatorType::Roc(n) | IndicatorType::ReturnVolatility(n) => n,
            IndicatorType::Macd { fast, slow, signal } => {
                fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                k_period.saturating_sub(1) + d_period.saturating_sub(1)
            }
            IndicatorType::Bollinger { period, .. } => period.saturating_sub(1),
        }
    }

    /// Computes this indicator over `bars`.
    pub fn compute(&self, bars: &[PriceBar]) -> IndicatorSeries {
        match *self {
            IndicatorType::Sma(n) => calculate_sma(bars, n),
            IndicatorType::Ema(n) => calculate_ema(bars, n),
            IndicatorType::Rsi(n) => calculate_rsi(bars, n),
            IndicatorType::Roc(n) => calculate_roc(bars, n),
            IndicatorType::Atr(n) => crate::domain::indicator_helpers::calc_atr(bars, n),
            IndicatorType::Stddev(n) => calculate_stddev(bars, n),
            IndicatorType::ReturnVolatility(n) => calculate_return_volatility(bars, n),
            IndicatorType::VolumeSma(n) => calculate_volume_sma(bars, n),
            IndicatorType::Highest(n) => calculate_highest(bars, n),
            IndicatorType::Lowest(n) => calculate_lowest(bars, n),
            IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
            IndicatorType::Stochastic { k_period, d_period } => {
                calculate_stochastic(bars, k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(bars, period, stddev_mult_x100),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    fn point(&self, index: usize) -> Option<&IndicatorPoint> {
        self.values.get(index).filter(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::ReturnVolatility(period) => write!(f, "RETVOL({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLSMA({})", period),
            IndicatorType::Highest(period) => write!(f, "HIGHEST({})", period),
            IndicatorType::Lowest(period) => write!(f, "LOWEST({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Bollinger band values at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// %B: position of `close` within the band, 0 at the lower band and 1 at
    /// the upper band. A zero-width band yields 0.5.
    pub fn percent_b(&self, close: f64) -> f64 {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            0.5
        } else {
            (close - self.lower) / width
        }
    }
}

/// MACD values at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Indicator series computed once per run, keyed by [`IndicatorType`].
///
/// Lookups for an indicator that was never computed, an out-of-range index,
/// or a point inside the warm-up window all return `None`.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    len: usize,
    series: HashMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorFrame {
    /// Computes every requested indicator over `bars`. Duplicates are computed once.
    pub fn compute(bars: &[PriceBar], types: &[IndicatorType]) -> Self {
        let mut series = HashMap::with_capacity(types.len());
        for t in types {
            series.entry(*t).or_insert_with(|| t.compute(bars));
        }
        IndicatorFrame {
            len: bars.len(),
            series,
        }
    }

    /// Number of bars every series is aligned to.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, indicator: &IndicatorType) -> bool {
        self.series.contains_key(indicator)
    }

    pub fn series(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator)
    }

    /// Scalar value of a single-output indicator.
    pub fn value(&self, indicator: &IndicatorType, index: usize) -> Option<f64> {
        match self.series.get(indicator)?.point(index)?.value {
            IndicatorValue::Simple(v) => Some(v),
            _ => None,
        }
    }

    /// Value at the bar before `index`; `None` at index 0.
    pub fn previous(&self, indicator: &IndicatorType, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.value(indicator, i))
    }

    pub fn macd(&self, indicator: &IndicatorType, index: usize) -> Option<MacdPoint> {
        match self.series.get(indicator)?.point(index)?.value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => Some(MacdPoint {
                line,
                signal,
                histogram,
            }),
            _ => None,
        }
    }

    pub fn bands(&self, indicator: &IndicatorType, index: usize) -> Option<Bands> {
        match self.series.get(indicator)?.point(index)?.value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => Some(Bands {
                upper,
                middle,
                lower,
            }),
            _ => None,
        }
    }

    /// (%K, %D) of a stochastic oscillator.
    pub fn stochastic(&self, indicator: &IndicatorType, index: usize) -> Option<(f64, f64)> {
        match self.series.get(indicator)?.point(index)?.value {
            IndicatorValue::Stochastic { k, d } => Some((k, d)),
            _ => None,
        }
    }
}
