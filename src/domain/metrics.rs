//! Return and risk metrics over a single value series.
//!
//! Every function here is pure and fails fast on short input:
//! delta-based metrics need at least [`MIN_DELTA_POINTS`] values and
//! dispersion-based metrics need at least [`MIN_DISPERSION_POINTS`]
//! (two returns, so the sample standard deviation is defined).

use crate::domain::error::AnalyticsError;

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;
pub const MIN_DELTA_POINTS: usize = 2;
pub const MIN_DISPERSION_POINTS: usize = 3;

fn require(values: &[f64], minimum: usize) -> Result<(), AnalyticsError> {
    if values.len() < minimum {
        return Err(AnalyticsError::insufficient(values.len(), minimum));
    }
    Ok(())
}

pub(crate) fn check_frequency(freq: f64) -> Result<(), AnalyticsError> {
    if !freq.is_finite() || freq <= 0.0 {
        return Err(AnalyticsError::invalid_parameter(
            "periods_per_year",
            format!("must be positive, got {freq}"),
        ));
    }
    Ok(())
}

pub(crate) fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Callers guarantee `len >= 2`.
///
/// Exactly `0.0` for a constant slice, whatever rounding the mean picks up.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if is_constant(values) {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// `V[t] / V[t-1] - 1` for t = 1..n-1.
pub fn daily_returns(values: &[f64]) -> Result<Vec<f64>, AnalyticsError> {
    require(values, MIN_DELTA_POINTS)?;
    Ok(values.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

pub fn total_return(values: &[f64]) -> Result<f64, AnalyticsError> {
    require(values, MIN_DELTA_POINTS)?;
    Ok(values[values.len() - 1] / values[0] - 1.0)
}

/// Sample std of daily returns scaled by `sqrt(freq)`.
pub fn annualized_volatility(values: &[f64], freq: f64) -> Result<f64, AnalyticsError> {
    require(values, MIN_DISPERSION_POINTS)?;
    check_frequency(freq)?;
    let returns = daily_returns(values)?;
    Ok(sample_std(&returns) * freq.sqrt())
}

/// Arithmetic mean of daily returns scaled by `freq`.
pub fn annualized_return(values: &[f64], freq: f64) -> Result<f64, AnalyticsError> {
    require(values, MIN_DISPERSION_POINTS)?;
    check_frequency(freq)?;
    let returns = daily_returns(values)?;
    Ok(mean(&returns) * freq)
}

/// Annualized excess return over annualized volatility.
///
/// Returns `Ok(None)` when the return volatility is exactly zero, e.g. for a flat series.
pub fn sharpe_ratio(values: &[f64], risk_free: f64, freq: f64) -> Result<Option<f64>, AnalyticsError> {
    require(values, MIN_DISPERSION_POINTS)?;
    check_frequency(freq)?;
    let returns = daily_returns(values)?;
    let std = sample_std(&returns);
    if std == 0.0 {
        return Ok(None);
    }
    let annual_mean = mean(&returns) * freq;
    let annual_vol = std * freq.sqrt();
    Ok(Some((annual_mean - risk_free) / annual_vol))
}

/// Largest relative decline from a running peak, as a value <= 0.
pub fn max_drawdown(values: &[f64]) -> Result<f64, AnalyticsError> {
    require(values, MIN_DELTA_POINTS)?;

    let mut peak = values[0];
    let mut worst = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        let dd = (v - peak) / peak;
        if dd < worst {
            worst = dd;
        }
    }
    Ok(worst)
}
