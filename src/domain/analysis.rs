//! End-to-end analysis pipelines over a price source.
//!
//! These compose the pure domain functions: fetch and validate prices, align
//! returns, resolve weights, simulate, and summarize.

use crate::domain::backtest::BacktestSummary;
use crate::domain::correlation::{compute_correlation_matrix, CorrelationMatrix};
use crate::domain::error::AnalyticsError;
use crate::domain::portfolio::{compute_cumulative_value, compute_portfolio_returns};
use crate::domain::request::AnalysisRequest;
use crate::domain::return_matrix::ReturnMatrix;
use crate::domain::series::{PortfolioValueSeries, ReturnSeries};
use crate::domain::stats::{diversification_effect, portfolio_stats, DiversificationEffect, StatsSummary};
use crate::domain::strategy::Strategy;
use crate::domain::universe::{validate_universe, AssetUniverse, SkippedTicker};
use crate::domain::weights::{WeightSpec, WeightVector};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioAnalysis {
    pub universe: AssetUniverse,
    pub skipped: Vec<SkippedTicker>,
    pub weights: WeightVector,
    pub returns: ReturnSeries,
    pub values: PortfolioValueSeries,
    pub stats: StatsSummary,
    pub summary: BacktestSummary,
    pub diversification: DiversificationEffect,
    pub correlation: CorrelationMatrix,
}

pub fn analyze_portfolio(
    data_port: &dyn PriceDataPort,
    configured: &AssetUniverse,
    weights: &WeightSpec,
    request: &AnalysisRequest,
) -> Result<PortfolioAnalysis, AnalyticsError> {
    let validated = validate_universe(data_port, configured, request)?;
    let matrix = ReturnMatrix::from_prices(&validated.series, request.alignment)?;
    let weights = weights.resolve(configured, &validated.universe)?;

    info!(
        assets = matrix.asset_count(),
        periods = matrix.len(),
        rebalancing = %request.rebalancing,
        "simulating portfolio"
    );

    let returns = compute_portfolio_returns(&matrix, &weights, request.rebalancing);
    let values = compute_cumulative_value(&returns, request.initial_value)?;
    let stats = portfolio_stats(&returns.values(), request.periods_per_year)?;
    let summary = BacktestSummary::compute(
        &values.values(),
        request.risk_free_rate,
        request.periods_per_year,
    )?;
    let diversification =
        diversification_effect(&matrix, &weights, &returns, request.periods_per_year)?;
    let correlation = compute_correlation_matrix(&matrix);

    Ok(PortfolioAnalysis {
        universe: validated.universe,
        skipped: validated.skipped,
        weights,
        returns,
        values,
        stats,
        summary,
        diversification,
        correlation,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetAnalysis {
    pub ticker: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub data_points: usize,
    /// Metrics of the raw price series.
    pub price: BacktestSummary,
    pub strategy: Strategy,
    pub strategy_name: String,
    pub strategy_values: PortfolioValueSeries,
    pub strategy_summary: BacktestSummary,
}

pub fn analyze_asset(
    data_port: &dyn PriceDataPort,
    ticker: &str,
    strategy: Strategy,
    request: &AnalysisRequest,
) -> Result<AssetAnalysis, AnalyticsError> {
    let prices = data_port.fetch_prices(
        ticker,
        request.start_date,
        request.end_date,
        request.interval,
    )?;
    let (first, last) = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => {
            return Err(AnalyticsError::NoData {
                ticker: ticker.to_string(),
            })
        }
    };

    let price = BacktestSummary::compute(
        &prices.prices(),
        request.risk_free_rate,
        request.periods_per_year,
    )?;
    let strategy_values = strategy.run(&prices)?;
    let strategy_summary = BacktestSummary::compute(
        &strategy_values.values(),
        request.risk_free_rate,
        request.periods_per_year,
    )?;

    Ok(AssetAnalysis {
        ticker: ticker.to_string(),
        first_date: first,
        last_date: last,
        data_points: prices.len(),
        price,
        strategy,
        strategy_name: strategy.name(),
        strategy_values,
        strategy_summary,
    })
}
