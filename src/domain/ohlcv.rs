//! Daily price bar and series validation.

use chrono::NaiveDate;

use crate::domain::error::{Result, StratbenchError};

/// One trading day of a single instrument.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    fn has_positive_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|&v| v > 0.0)
    }
}

/// Checks that dates strictly increase, every field is a finite number,
/// prices are positive and `low <= high`.
///
/// Calendar gaps (weekends, holidays) are allowed.
pub fn validate_series(bars: &[PriceBar]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_finite() {
            return Err(StratbenchError::InvalidSeries {
                reason: format!("non-finite value on {}", bar.date),
            });
        }
        if !bar.has_positive_prices() {
            return Err(StratbenchError::InvalidSeries {
                reason: format!("non-positive price on {}", bar.date),
            });
        }
        if bar.low > bar.high {
            return Err(StratbenchError::InvalidSeries {
                reason: format!("low {} above high {} on {}", bar.low, bar.high, bar.date),
            });
        }
        if bar.volume < 0.0 {
            return Err(StratbenchError::InvalidSeries {
                reason: format!("negative volume on {}", bar.date),
            });
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(StratbenchError::InvalidSeries {
                reason: format!(
                    "dates not strictly increasing: {} follows {}",
                    bar.date,
                    bars[i - 1].date
                ),
            });
        }
    }
    Ok(())
}
