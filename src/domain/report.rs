//! Daily market report: per-asset snapshots plus an equal-weight portfolio.
//!
//! Failures are captured per entry as an `error` status so one bad ticker
//! never aborts the whole report.

use crate::domain::backtest::BacktestSummary;
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::{annualized_volatility, max_drawdown, total_return};
use crate::domain::portfolio::{compute_cumulative_value, compute_portfolio_returns, RebalancingPolicy};
use crate::domain::request::AnalysisRequest;
use crate::domain::return_matrix::{Alignment, ReturnMatrix};
use crate::domain::universe::{validate_universe, AssetUniverse, SkippedTicker};
use crate::domain::weights::{equal_weights, WeightVector};
use crate::ports::data_port::PriceDataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

pub const REPORT_TYPE_DAILY: &str = "daily";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSnapshot {
    pub ticker: String,
    pub timestamp: NaiveDate,
    pub open_price: f64,
    pub close_price: f64,
    pub latest_price: f64,
    /// Return of the last sampled period.
    pub daily_return: f64,
    pub total_return: f64,
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetReport {
    Success(AssetSnapshot),
    Error { ticker: String, error: String },
}

impl AssetReport {
    pub fn ticker(&self) -> &str {
        match self {
            AssetReport::Success(s) => &s.ticker,
            AssetReport::Error { ticker, .. } => ticker,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AssetReport::Success(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub tickers: Vec<String>,
    pub skipped: Vec<SkippedTicker>,
    pub weights: WeightVector,
    pub rebalancing: RebalancingPolicy,
    pub total_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub initial_value: f64,
    pub final_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PortfolioReport {
    Success(PortfolioSnapshot),
    Error { error: String },
}

impl PortfolioReport {
    pub fn is_success(&self) -> bool {
        matches!(self, PortfolioReport::Success(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub report_date: NaiveDateTime,
    pub report_type: String,
    pub assets: Vec<AssetReport>,
    pub portfolio: PortfolioReport,
    pub request: AnalysisRequest,
}

fn asset_snapshot(
    data_port: &dyn PriceDataPort,
    ticker: &str,
    request: &AnalysisRequest,
) -> Result<AssetSnapshot, AnalyticsError> {
    let series = data_port.fetch_prices(
        ticker,
        request.start_date,
        request.end_date,
        request.interval,
    )?;
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(AnalyticsError::NoData {
                ticker: ticker.to_string(),
            })
        }
    };

    let prices = series.prices();
    let annualized_volatility = annualized_volatility(&prices, request.periods_per_year)?;
    let n = prices.len();

    Ok(AssetSnapshot {
        ticker: ticker.to_string(),
        timestamp: last.date,
        open_price: first.value,
        close_price: last.value,
        latest_price: last.value,
        daily_return: prices[n - 1] / prices[n - 2] - 1.0,
        total_return: total_return(&prices)?,
        annualized_volatility,
        max_drawdown: max_drawdown(&prices)?,
        data_points: prices.len(),
    })
}

pub fn generate_asset_report(
    data_port: &dyn PriceDataPort,
    ticker: &str,
    request: &AnalysisRequest,
) -> AssetReport {
    match asset_snapshot(data_port, ticker, request) {
        Ok(snapshot) => AssetReport::Success(snapshot),
        Err(e) => {
            warn!(ticker, error = %e, "asset report failed");
            AssetReport::Error {
                ticker: ticker.to_string(),
                error: e.to_string(),
            }
        }
    }
}

fn portfolio_snapshot(
    data_port: &dyn PriceDataPort,
    tickers: &AssetUniverse,
    request: &AnalysisRequest,
) -> Result<PortfolioSnapshot, AnalyticsError> {
    let validated = validate_universe(data_port, tickers, request)?;
    let matrix = ReturnMatrix::from_prices(&validated.series, Alignment::Intersection)?;
    let weights = equal_weights(&validated.universe)?;

    let returns = compute_portfolio_returns(&matrix, &weights, request.rebalancing);
    let values = compute_cumulative_value(&returns, request.initial_value)?;
    let summary = BacktestSummary::compute(
        &values.values(),
        request.risk_free_rate,
        request.periods_per_year,
    )?;

    Ok(PortfolioSnapshot {
        tickers: validated.universe.tickers().to_vec(),
        skipped: validated.skipped,
        weights,
        rebalancing: request.rebalancing,
        total_return: summary.total_return,
        annualized_volatility: summary.annual_vol,
        sharpe_ratio: summary.sharpe,
        max_drawdown: summary.max_drawdown,
        initial_value: values.initial_value(),
        final_value: summary.final_value,
    })
}

/// Equal-weight portfolio over the tickers that have data.
pub fn generate_portfolio_report(
    data_port: &dyn PriceDataPort,
    tickers: &AssetUniverse,
    request: &AnalysisRequest,
) -> PortfolioReport {
    match portfolio_snapshot(data_port, tickers, request) {
        Ok(snapshot) => PortfolioReport::Success(snapshot),
        Err(e) => {
            warn!(error = %e, "portfolio report failed");
            PortfolioReport::Error {
                error: e.to_string(),
            }
        }
    }
}

pub fn generate_daily_report(
    data_port: &dyn PriceDataPort,
    report_assets: &AssetUniverse,
    portfolio_assets: &AssetUniverse,
    request: &AnalysisRequest,
    now: NaiveDateTime,
) -> DailyReport {
    let assets = report_assets
        .iter()
        .map(|ticker| generate_asset_report(data_port, ticker, request))
        .collect();
    let portfolio = generate_portfolio_report(data_port, portfolio_assets, request);

    DailyReport {
        report_date: now,
        report_type: REPORT_TYPE_DAILY.to_string(),
        assets,
        portfolio,
        request: request.clone(),
    }
}
