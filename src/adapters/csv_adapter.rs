//! CSV file price data adapter.
//!
//! Reads one `<TICKER>.csv` per asset from a base directory. The header must
//! name a `date` column and one of `adj_close`, `close` or `price`
//! (case-insensitive); other columns are ignored.

use crate::domain::error::AnalyticsError;
use crate::domain::request::Interval;
use crate::domain::series::{PriceSeries, SeriesPoint};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const PRICE_COLUMNS: [&str; 3] = ["adj_close", "close", "price"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn source_error(reason: String) -> AnalyticsError {
    AnalyticsError::DataSource { reason }
}

fn find_columns(headers: &csv::StringRecord) -> Option<(usize, usize)> {
    let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let date = names.iter().position(|h| h == "date")?;
    let price = PRICE_COLUMNS
        .iter()
        .find_map(|want| names.iter().position(|h| h == want))?;
    Some((date, price))
}

/// Keep the last observation of each interval bucket. `points` must be sorted.
fn resample(points: Vec<SeriesPoint>, interval: Interval) -> Vec<SeriesPoint> {
    let mut out: Vec<SeriesPoint> = Vec::with_capacity(points.len());
    for p in points {
        match out.last_mut() {
            Some(last) if interval.bucket(last.date) == interval.bucket(p.date) => *last = p,
            _ => out.push(p),
        }
    }
    out
}

impl PriceDataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSeries, AnalyticsError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            return Err(AnalyticsError::NoData {
                ticker: ticker.to_string(),
            });
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| source_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| source_error(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();
        let (date_col, price_col) = find_columns(&headers).ok_or_else(|| {
            source_error(format!(
                "{} needs a date column and one of {}",
                path.display(),
                PRICE_COLUMNS.join(", ")
            ))
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| source_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| source_error("missing date column".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| source_error(format!("invalid date '{}': {}", date_str, e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            let raw = record.get(price_col).unwrap_or("").trim();
            let price: f64 = match raw.parse() {
                Ok(p) => p,
                Err(_) if raw.is_empty() || raw.eq_ignore_ascii_case("null") => {
                    debug!(ticker, %date, "skipping row without price");
                    continue;
                }
                Err(e) => return Err(source_error(format!("invalid price '{}' on {}: {}", raw, date, e))),
            };

            points.push(SeriesPoint::new(date, price));
        }

        points.sort_by_key(|p| p.date);
        let points = resample(points, interval);
        debug!(ticker, points = points.len(), %interval, "loaded prices");

        PriceSeries::new(ticker, points)
            .map_err(|e| source_error(format!("{}: {}", path.display(), e)))
    }

    fn list_symbols(&self) -> Result<Vec<String>, AnalyticsError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            source_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| source_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
