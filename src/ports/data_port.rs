//! Price data port trait.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Bars of `dataset` in ascending date order, limited to the inclusive
    /// range when bounds are given. The result is validated.
    fn fetch_bars(
        &self,
        dataset: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StratbenchError>;

    fn list_datasets(&self) -> Result<Vec<String>, StratbenchError>;
}
