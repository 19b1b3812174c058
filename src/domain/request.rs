//! Analysis request: the explicit parameters every analysis run receives.

use crate::domain::error::AnalyticsError;
use crate::domain::metrics::DEFAULT_PERIODS_PER_YEAR;
use crate::domain::portfolio::RebalancingPolicy;
use crate::domain::return_matrix::Alignment;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_INITIAL_VALUE: f64 = 100.0;

/// Sampling interval of a price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1d" | "daily" | "day" => Some(Interval::Daily),
            "1wk" | "1w" | "weekly" | "week" => Some(Interval::Weekly),
            "1mo" | "monthly" | "month" => Some(Interval::Monthly),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }

    pub fn default_periods_per_year(&self) -> f64 {
        match self {
            Interval::Daily => DEFAULT_PERIODS_PER_YEAR,
            Interval::Weekly => 52.0,
            Interval::Monthly => 12.0,
        }
    }

    /// Bucket a date falls into; one observation is kept per bucket.
    pub fn bucket(&self, date: NaiveDate) -> (i32, u32, u32) {
        match self {
            Interval::Daily => (date.year(), date.month(), date.day()),
            Interval::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week(), 0)
            }
            Interval::Monthly => (date.year(), date.month(), 0),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Relative history window such as `3mo` or `1y`, resolved against an end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
    YearToDate,
}

impl Lookback {
    pub fn parse(input: &str) -> Result<Self, AnalyticsError> {
        let s = input.trim().to_lowercase();
        if s == "ytd" {
            return Ok(Lookback::YearToDate);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let n: u32 = digits
            .parse()
            .map_err(|_| AnalyticsError::invalid_parameter("period", format!("invalid period '{input}'")))?;
        if n == 0 {
            return Err(AnalyticsError::invalid_parameter("period", "period must be non-zero"));
        }

        match unit {
            "d" => Ok(Lookback::Days(n)),
            "wk" | "w" => Ok(Lookback::Weeks(n)),
            "mo" | "m" => Ok(Lookback::Months(n)),
            "y" => Ok(Lookback::Years(n)),
            _ => Err(AnalyticsError::invalid_parameter(
                "period",
                format!("unknown period unit in '{input}'"),
            )),
        }
    }

    pub fn start_from(&self, end: NaiveDate) -> Result<NaiveDate, AnalyticsError> {
        let start = match *self {
            Lookback::Days(n) => end.checked_sub_days(Days::new(u64::from(n))),
            Lookback::Weeks(n) => end.checked_sub_days(Days::new(7 * u64::from(n))),
            Lookback::Months(n) => end.checked_sub_months(Months::new(n)),
            Lookback::Years(n) => n
                .checked_mul(12)
                .and_then(|months| end.checked_sub_months(Months::new(months))),
            Lookback::YearToDate => NaiveDate::from_ymd_opt(end.year(), 1, 1),
        };
        start.ok_or_else(|| AnalyticsError::invalid_parameter("period", "period reaches before the calendar"))
    }
}

/// Fully specified parameters of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: Interval,
    pub initial_value: f64,
    pub periods_per_year: f64,
    pub risk_free_rate: f64,
    pub rebalancing: RebalancingPolicy,
    pub alignment: Alignment,
}

impl AnalysisRequest {
    /// Request over `[start_date, end_date]` with daily defaults.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            interval: Interval::Daily,
            initial_value: DEFAULT_INITIAL_VALUE,
            periods_per_year: Interval::Daily.default_periods_per_year(),
            risk_free_rate: 0.0,
            rebalancing: RebalancingPolicy::Daily,
            alignment: Alignment::Intersection,
        }
    }
}
