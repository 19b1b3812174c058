//! Dated numeric series: prices, returns and portfolio values.

use crate::domain::error::AnalyticsError;
use crate::domain::metrics;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

fn check_increasing(points: &[SeriesPoint]) -> Result<(), AnalyticsError> {
    for w in points.windows(2) {
        if w[1].date <= w[0].date {
            return Err(AnalyticsError::InvalidSeries {
                reason: format!("dates not strictly increasing at {}", w[1].date),
            });
        }
    }
    Ok(())
}

/// Price history for one asset. Dates strictly increase, prices are finite and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<SeriesPoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<SeriesPoint>) -> Result<Self, AnalyticsError> {
        let ticker = ticker.into();
        check_increasing(&points)?;
        if let Some(bad) = points.iter().find(|p| !p.value.is_finite() || p.value <= 0.0) {
            return Err(AnalyticsError::InvalidSeries {
                reason: format!("{ticker}: price {} on {} is not positive", bad.value, bad.date),
            });
        }
        Ok(Self { ticker, points })
    }

    /// An empty series, the "no data" answer of a price source.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            points: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Simple returns, one per price after the first.
    pub fn returns(&self) -> Result<ReturnSeries, AnalyticsError> {
        let values = metrics::daily_returns(&self.prices())?;
        let points = self.points[1..]
            .iter()
            .zip(values)
            .map(|(p, r)| SeriesPoint::new(p.date, r))
            .collect();
        Ok(ReturnSeries {
            base_date: self.points[0].date,
            points,
        })
    }
}

/// Simple returns. `base_date` is the observation the first return is measured from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    base_date: NaiveDate,
    points: Vec<SeriesPoint>,
}

impl ReturnSeries {
    pub fn new(base_date: NaiveDate, points: Vec<SeriesPoint>) -> Result<Self, AnalyticsError> {
        check_increasing(&points)?;
        if let Some(first) = points.first() {
            if first.date <= base_date {
                return Err(AnalyticsError::InvalidSeries {
                    reason: format!("first return {} not after base date {}", first.date, base_date),
                });
            }
        }
        if let Some(bad) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(AnalyticsError::InvalidSeries {
                reason: format!("return on {} is not finite", bad.date),
            });
        }
        Ok(Self { base_date, points })
    }

    pub(crate) fn from_parts(base_date: NaiveDate, points: Vec<SeriesPoint>) -> Self {
        Self { base_date, points }
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Portfolio value over time; the first point is the initial value at the base date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioValueSeries {
    points: Vec<SeriesPoint>,
}

impl PortfolioValueSeries {
    pub(crate) fn from_parts(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn initial_value(&self) -> f64 {
        self.points.first().map(|p| p.value).unwrap_or(0.0)
    }

    pub fn final_value(&self) -> f64 {
        self.points.last().map(|p| p.value).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
