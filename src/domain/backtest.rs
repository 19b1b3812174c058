//! Performance summary of a single value series.

use crate::domain::error::AnalyticsError;
use crate::domain::metrics::{
    annualized_volatility, max_drawdown, sharpe_ratio, total_return, DEFAULT_PERIODS_PER_YEAR,
    MIN_DISPERSION_POINTS,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub total_return: f64,
    pub annual_vol: f64,
    pub sharpe: Option<f64>,
    pub max_drawdown: f64,
    pub final_value: f64,
}

impl BacktestSummary {
    pub fn compute(values: &[f64], risk_free: f64, freq: f64) -> Result<Self, AnalyticsError> {
        if values.len() < MIN_DISPERSION_POINTS {
            return Err(AnalyticsError::insufficient(values.len(), MIN_DISPERSION_POINTS));
        }
        Ok(Self {
            total_return: total_return(values)?,
            annual_vol: annualized_volatility(values, freq)?,
            sharpe: sharpe_ratio(values, risk_free, freq)?,
            max_drawdown: max_drawdown(values)?,
            final_value: values[values.len() - 1],
        })
    }
}

/// Summary with no risk-free rate at daily frequency.
pub fn backtest(values: &[f64]) -> Result<BacktestSummary, AnalyticsError> {
    BacktestSummary::compute(values, 0.0, DEFAULT_PERIODS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summary_fields() {
        let values = [1.0, 1.1, 0.99, 1.2];
        let s = backtest(&values).unwrap();

        assert_relative_eq!(s.total_return, 0.2, epsilon = 1e-12);
        assert_relative_eq!(s.max_drawdown, 0.99 / 1.1 - 1.0, epsilon = 1e-12);
        assert_eq!(s.final_value, 1.2);
        assert!(s.annual_vol > 0.0);
        assert!(s.sharpe.is_some());
    }

    #[test]
    fn flat_series_has_no_sharpe() {
        let s = backtest(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.total_return, 0.0);
        assert_eq!(s.annual_vol, 0.0);
        assert_eq!(s.sharpe, None);
        assert_eq!(s.max_drawdown, 0.0);
    }

    #[test]
    fn short_series_fails() {
        assert!(matches!(
            backtest(&[1.0, 1.1]),
            Err(AnalyticsError::InsufficientData { observations: 2, minimum: 3 })
        ));
    }

    #[test]
    fn risk_free_lowers_sharpe() {
        let values = [1.0, 1.02, 1.01, 1.04, 1.05];
        let base = BacktestSummary::compute(&values, 0.0, 252.0).unwrap();
        let rf = BacktestSummary::compute(&values, 0.03, 252.0).unwrap();
        assert!(rf.sharpe.unwrap() < base.sharpe.unwrap());
    }
}
