#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use quantfolio::domain::error::AnalyticsError;
use quantfolio::domain::request::{AnalysisRequest, Interval};
pub use quantfolio::domain::series::{PriceSeries, SeriesPoint};
use quantfolio::ports::data_port::PriceDataPort;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<SeriesPoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, points: Vec<SeriesPoint>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _interval: Interval,
    ) -> Result<PriceSeries, AnalyticsError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(AnalyticsError::DataSource {
                reason: reason.clone(),
            });
        }
        let points = self.data.get(ticker).ok_or_else(|| AnalyticsError::NoData {
            ticker: ticker.to_string(),
        })?;
        let in_range = points
            .iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .copied()
            .collect();
        PriceSeries::new(ticker, in_range)
    }

    fn list_symbols(&self) -> Result<Vec<String>, AnalyticsError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One point per calendar day starting at `start`.
pub fn daily_points(start: NaiveDate, prices: &[f64]) -> Vec<SeriesPoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| SeriesPoint::new(start.checked_add_days(Days::new(i as u64)).unwrap(), p))
        .collect()
}

/// Request covering all of 2024 with daily defaults.
pub fn request_2024() -> AnalysisRequest {
    AnalysisRequest::new(date(2024, 1, 1), date(2024, 12, 31))
}

/// Daily-rebalanced two-asset market with opposite moves.
pub fn two_asset_port() -> MockPriceDataPort {
    let start = date(2024, 1, 2);
    MockPriceDataPort::new()
        .with_prices("AAA", daily_points(start, &[100.0, 102.0, 101.0, 104.0, 106.0]))
        .with_prices("BBB", daily_points(start, &[50.0, 49.0, 50.0, 49.5, 49.0]))
}

/// Write a CSV price file for `ticker` with one row per point.
pub fn write_price_csv(dir: &std::path::Path, ticker: &str, points: &[SeriesPoint]) {
    let mut content = String::from("Date,Close\n");
    for p in points {
        content.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.value));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}
