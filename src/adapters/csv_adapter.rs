//! CSV price data adapter.
//!
//! One file per dataset, `<base>/<dataset>.csv`, with a header row naming
//! `date,open,high,low,close,volume` (any order, case-insensitive, extra
//! columns ignored). Dates are ISO `YYYY-MM-DD`.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::{validate_series, PriceBar};
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvPriceSource {
    base_path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Source for a single file plus the dataset name that addresses it.
    pub fn for_file(path: &Path) -> Result<(Self, String), StratbenchError> {
        let dataset = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| StratbenchError::Data {
                reason: format!("not a file path: {}", path.display()),
            })?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok((Self::new(base), dataset))
    }

    fn csv_path(&self, dataset: &str) -> PathBuf {
        self.base_path.join(format!("{dataset}.csv"))
    }
}

/// Position of each required column in the header.
fn column_indices(headers: &StringRecord) -> Result<[usize; 6], StratbenchError> {
    let mut indices = [0usize; 6];
    for (slot, name) in indices.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| StratbenchError::Data {
                reason: format!("missing {name} column"),
            })?;
    }
    Ok(indices)
}

fn parse_field(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<f64, StratbenchError> {
    let raw = record.get(index).ok_or_else(|| StratbenchError::Data {
        reason: format!("line {line}: missing {name} value"),
    })?;
    raw.trim().parse().map_err(|e| StratbenchError::Data {
        reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
    })
}

fn parse_record(record: &StringRecord, cols: &[usize; 6]) -> Result<PriceBar, StratbenchError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let date_str = record.get(cols[0]).unwrap_or_default().trim();
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| StratbenchError::Data {
        reason: format!("line {line}: invalid date '{date_str}': {e}"),
    })?;

    Ok(PriceBar {
        date,
        open: parse_field(record, cols[1], "open", line)?,
        high: parse_field(record, cols[2], "high", line)?,
        low: parse_field(record, cols[3], "low", line)?,
        close: parse_field(record, cols[4], "close", line)?,
        volume: parse_field(record, cols[5], "volume", line)?,
    })
}

impl PriceSource for CsvPriceSource {
    fn fetch_bars(
        &self,
        dataset: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StratbenchError> {
        let path = self.csv_path(dataset);
        let content = fs::read_to_string(&path)?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| StratbenchError::Data {
            reason: format!("{}: {e}", path.display()),
        })?;
        let cols = column_indices(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StratbenchError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;
            let bar = parse_record(&record, &cols)?;
            if start_date.is_some_and(|s| bar.date < s) || end_date.is_some_and(|e| bar.date > e) {
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        validate_series(&bars)?;
        Ok(bars)
    }

    fn list_datasets(&self) -> Result<Vec<String>, StratbenchError> {
        let mut datasets = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    datasets.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        datasets.sort();
        Ok(datasets)
    }
}
