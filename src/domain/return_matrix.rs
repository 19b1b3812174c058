//! Multi-asset return table on an explicitly aligned date axis.

use crate::domain::error::AnalyticsError;
use crate::domain::series::PriceSeries;
use crate::domain::universe::AssetUniverse;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How the calendars of several price series are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Keep only dates every asset trades on; every cell is present.
    #[default]
    Intersection,
    /// Keep every date any asset trades on; missing cells stay empty.
    Union,
}

impl Alignment {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "intersection" | "inner" => Some(Alignment::Intersection),
            "union" | "outer" => Some(Alignment::Union),
            _ => None,
        }
    }
}

/// Returns indexed by date with one column per asset of the universe.
///
/// Dates are strictly increasing and all after `base_date`; every row has a
/// value for at least one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    universe: AssetUniverse,
    base_date: NaiveDate,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Option<f64>>>,
}

impl ReturnMatrix {
    pub fn new(
        universe: AssetUniverse,
        base_date: NaiveDate,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, AnalyticsError> {
        if universe.is_empty() {
            return Err(AnalyticsError::EmptyUniverse);
        }
        if rows.len() != dates.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dates.len(),
                actual: rows.len(),
            });
        }

        let mut prev = base_date;
        for (date, row) in dates.iter().zip(&rows) {
            if *date <= prev {
                return Err(AnalyticsError::InvalidSeries {
                    reason: format!("date {date} not after {prev}"),
                });
            }
            prev = *date;

            if row.len() != universe.len() {
                return Err(AnalyticsError::DimensionMismatch {
                    expected: universe.len(),
                    actual: row.len(),
                });
            }
            if row.iter().all(Option::is_none) {
                return Err(AnalyticsError::InvalidSeries {
                    reason: format!("no asset has a return on {date}"),
                });
            }
            if row.iter().flatten().any(|r| !r.is_finite()) {
                return Err(AnalyticsError::InvalidSeries {
                    reason: format!("non-finite return on {date}"),
                });
            }
        }

        Ok(Self {
            universe,
            base_date,
            dates,
            rows,
        })
    }

    /// Build from fully populated columns, one per asset of `universe`.
    pub fn from_columns(
        universe: AssetUniverse,
        base_date: NaiveDate,
        dates: Vec<NaiveDate>,
        columns: &[Vec<f64>],
    ) -> Result<Self, AnalyticsError> {
        if columns.len() != universe.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: universe.len(),
                actual: columns.len(),
            });
        }
        if let Some(col) = columns.iter().find(|c| c.len() != dates.len()) {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dates.len(),
                actual: col.len(),
            });
        }
        let rows = (0..dates.len())
            .map(|t| columns.iter().map(|c| Some(c[t])).collect())
            .collect();
        Self::new(universe, base_date, dates, rows)
    }

    /// Difference a set of price series into a return matrix.
    pub fn from_prices(series: &[PriceSeries], alignment: Alignment) -> Result<Self, AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptyUniverse);
        }
        let universe = AssetUniverse::new(series.iter().map(|s| s.ticker().to_string()))?;
        if let Some(empty) = series.iter().find(|s| s.is_empty()) {
            return Err(AnalyticsError::NoData {
                ticker: empty.ticker().to_string(),
            });
        }

        match alignment {
            Alignment::Intersection => Self::intersect(universe, series),
            Alignment::Union => Self::union(universe, series),
        }
    }

    fn intersect(universe: AssetUniverse, series: &[PriceSeries]) -> Result<Self, AnalyticsError> {
        let lookups: Vec<HashMap<NaiveDate, f64>> = series
            .iter()
            .map(|s| s.points().iter().map(|p| (p.date, p.value)).collect())
            .collect();

        let common: Vec<NaiveDate> = series[0]
            .dates()
            .into_iter()
            .filter(|d| lookups.iter().all(|l| l.contains_key(d)))
            .collect();

        if common.len() < 2 {
            return Err(AnalyticsError::insufficient(common.len(), 2));
        }

        let rows = common
            .windows(2)
            .map(|w| {
                lookups
                    .iter()
                    .map(|l| Some(l[&w[1]] / l[&w[0]] - 1.0))
                    .collect()
            })
            .collect();

        Self::new(universe, common[0], common[1..].to_vec(), rows)
    }

    fn union(universe: AssetUniverse, series: &[PriceSeries]) -> Result<Self, AnalyticsError> {
        let mut base_date = NaiveDate::MAX;
        let mut by_asset: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(series.len());
        for s in series {
            let returns = s.returns()?;
            base_date = base_date.min(returns.base_date());
            by_asset.push(returns.points().iter().map(|p| (p.date, p.value)).collect());
        }

        let dates: Vec<NaiveDate> = by_asset
            .iter()
            .flat_map(|m| m.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = dates
            .iter()
            .map(|d| by_asset.iter().map(|m| m.get(d).copied()).collect())
            .collect();

        Self::new(universe, base_date, dates, rows)
    }

    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.universe.len()
    }

    pub fn get(&self, row: usize, asset: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(asset).copied().flatten())
    }

    /// Returns of one asset, skipping dates it has no value for.
    pub fn column(&self, asset: usize) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r[asset]).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(Option::is_some))
    }
}
