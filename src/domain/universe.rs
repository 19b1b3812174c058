//! Asset universe: the ordered, duplicate-free set of tickers an analysis runs over.
//!
//! Parses ticker lists from configuration and validates that each ticker has
//! enough price history before any cross-asset computation.

use crate::domain::error::AnalyticsError;
use crate::domain::request::AnalysisRequest;
use crate::domain::series::PriceSeries;
use crate::ports::data_port::PriceDataPort;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const MIN_PRICE_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssetUniverse {
    tickers: Vec<String>,
}

impl AssetUniverse {
    pub fn new<I, S>(tickers: I) -> Result<Self, AnalyticsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for ticker in tickers {
            let ticker = ticker.into();
            if !seen.insert(ticker.clone()) {
                return Err(AnalyticsError::DuplicateAsset(ticker));
            }
            out.push(ticker);
        }
        Ok(Self { tickers: out })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tickers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn position(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.position(ticker).is_some()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Parse a comma separated ticker list, upper-casing each entry.
pub fn parse_tickers(input: &str) -> Result<AssetUniverse, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(AssetUniverse { tickers })
}

pub struct UniverseValidationResult {
    pub universe: AssetUniverse,
    pub series: Vec<PriceSeries>,
    pub skipped: Vec<SkippedTicker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    InsufficientPoints { points: usize },
    FetchFailed { reason: String },
}

/// Fetch every ticker and keep those with at least [`MIN_PRICE_POINTS`] prices.
///
/// Fails only when no ticker survives.
pub fn validate_universe(
    data_port: &dyn PriceDataPort,
    universe: &AssetUniverse,
    request: &AnalysisRequest,
) -> Result<UniverseValidationResult, AnalyticsError> {
    if universe.is_empty() {
        return Err(AnalyticsError::EmptyUniverse);
    }

    let mut valid = Vec::new();
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for ticker in universe.iter() {
        let prices = match data_port.fetch_prices(
            ticker,
            request.start_date,
            request.end_date,
            request.interval,
        ) {
            Ok(prices) => prices,
            Err(e) => {
                warn!(ticker, error = %e, "skipping ticker");
                let reason = match e {
                    AnalyticsError::NoData { .. } => SkipReason::NoData,
                    other => SkipReason::FetchFailed {
                        reason: other.to_string(),
                    },
                };
                skipped.push(SkippedTicker {
                    ticker: ticker.to_string(),
                    reason,
                });
                continue;
            }
        };

        if prices.is_empty() {
            warn!(ticker, "skipping ticker: no data found");
            skipped.push(SkippedTicker {
                ticker: ticker.to_string(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if prices.len() < MIN_PRICE_POINTS {
            warn!(
                ticker,
                points = prices.len(),
                minimum = MIN_PRICE_POINTS,
                "skipping ticker: not enough prices"
            );
            skipped.push(SkippedTicker {
                ticker: ticker.to_string(),
                reason: SkipReason::InsufficientPoints {
                    points: prices.len(),
                },
            });
            continue;
        }

        debug!(ticker, points = prices.len(), "ticker ok");
        valid.push(ticker.to_string());
        series.push(prices);
    }

    if valid.is_empty() {
        return Err(AnalyticsError::NoData {
            ticker: universe.tickers().join(","),
        });
    }

    Ok(UniverseValidationResult {
        universe: AssetUniverse { tickers: valid },
        series,
        skipped,
    })
}
