//! Price history access port.

use crate::domain::error::AnalyticsError;
use crate::domain::request::Interval;
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;

pub trait PriceDataPort {
    /// Prices of `ticker` in `[start_date, end_date]`, sampled at `interval`.
    ///
    /// An empty series means the source knows the ticker but has no prices in range.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSeries, AnalyticsError>;

    fn list_symbols(&self) -> Result<Vec<String>, AnalyticsError>;
}
