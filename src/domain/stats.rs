//! Annualized summary statistics over a portfolio return series.

use crate::domain::error::AnalyticsError;
use crate::domain::metrics::{check_frequency, mean, sample_std};
use crate::domain::portfolio::aligned_weights;
use crate::domain::return_matrix::ReturnMatrix;
use crate::domain::series::ReturnSeries;
use crate::domain::weights::WeightVector;
use serde::Serialize;

pub const PORTFOLIO_LABEL: &str = "Portfolio";

/// Minimum number of returns for a sample standard deviation.
const MIN_RETURNS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub label: String,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// `None` when volatility is zero.
    pub sharpe_ratio: Option<f64>,
}

fn annualized_vol(returns: &[f64], periods_per_year: f64) -> Result<f64, AnalyticsError> {
    if returns.len() < MIN_RETURNS {
        return Err(AnalyticsError::insufficient(returns.len(), MIN_RETURNS));
    }
    Ok(sample_std(returns) * periods_per_year.sqrt())
}

pub fn portfolio_stats(returns: &[f64], periods_per_year: f64) -> Result<StatsSummary, AnalyticsError> {
    check_frequency(periods_per_year)?;
    let annualized_volatility = annualized_vol(returns, periods_per_year)?;
    let annualized_return = mean(returns) * periods_per_year;

    let sharpe_ratio = if annualized_volatility == 0.0 {
        None
    } else {
        Some(annualized_return / annualized_volatility)
    };

    Ok(StatsSummary {
        label: PORTFOLIO_LABEL.to_string(),
        annualized_return,
        annualized_volatility,
        sharpe_ratio,
    })
}

/// How much volatility the portfolio sheds relative to its weighted constituents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversificationEffect {
    pub weighted_avg_asset_vol: f64,
    pub portfolio_vol: f64,
    pub vol_reduction_pct: f64,
}

pub fn diversification_effect(
    matrix: &ReturnMatrix,
    weights: &WeightVector,
    portfolio_returns: &ReturnSeries,
    periods_per_year: f64,
) -> Result<DiversificationEffect, AnalyticsError> {
    check_frequency(periods_per_year)?;
    let w = aligned_weights(matrix, weights);

    let mut weighted_avg_asset_vol = 0.0;
    for (asset, wi) in w.iter().enumerate() {
        let vol = annualized_vol(&matrix.column(asset), periods_per_year)?;
        weighted_avg_asset_vol += wi * vol;
    }

    let portfolio_vol = annualized_vol(&portfolio_returns.values(), periods_per_year)?;
    let vol_reduction_pct = if weighted_avg_asset_vol > 0.0 {
        (weighted_avg_asset_vol - portfolio_vol) / weighted_avg_asset_vol * 100.0
    } else {
        0.0
    };

    Ok(DiversificationEffect {
        weighted_avg_asset_vol,
        portfolio_vol,
        vol_reduction_pct,
    })
}
