#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;
use stratbench::domain::error::StratbenchError;
pub use stratbench::domain::ohlcv::PriceBar;
use stratbench::ports::data_port::PriceSource;

/// In-memory price source keyed by dataset name.
pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, dataset: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(dataset.to_string(), bars);
        self
    }

    pub fn with_error(mut self, dataset: &str, reason: &str) -> Self {
        self.errors.insert(dataset.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_bars(
        &self,
        dataset: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StratbenchError> {
        if let Some(reason) = self.errors.get(dataset) {
            return Err(StratbenchError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(dataset)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_datasets(&self) -> Result<Vec<String>, StratbenchError> {
        let mut names: Vec<String> = self.data.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// Daily bars from a close series. Each bar opens at the previous close and
/// its range extends 0.2% beyond the body.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: start + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

/// close = 100 + 0.05·i + 8·sin(2πi/28): peaks at 7 and 35, troughs at 21 and 49.
pub fn sine_series(count: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let x = i as f64;
            100.0 + 0.05 * x + 8.0 * (2.0 * PI * x / 28.0).sin()
        })
        .collect();
    bars_from_closes(date(2024, 1, 1), &closes)
}

pub fn flat_series(count: usize, price: f64) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    (0..count)
        .map(|i| PriceBar {
            date: start + Duration::days(i as i64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1000.0,
        })
        .collect()
}

pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| PriceBar {
            date: start + Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000.0,
        })
        .collect()
}

/// Write `bars` as `<dir>/<dataset>.csv`.
pub fn write_csv(dir: &Path, dataset: &str, bars: &[PriceBar]) -> std::path::PathBuf {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    let path = dir.join(format!("{dataset}.csv"));
    std::fs::write(&path, content).unwrap();
    path
}
