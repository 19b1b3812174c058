//! Portfolio simulation: turns per-asset returns and target weights into a
//! portfolio return series under a rebalancing policy.
//!
//! `Daily` is the closed-form weighted sum, which implicitly restores target
//! weights every period. The other policies track per-asset capital so that
//! weights drift with performance between rebalance dates.

use crate::domain::error::AnalyticsError;
use crate::domain::return_matrix::ReturnMatrix;
use crate::domain::series::{PortfolioValueSeries, ReturnSeries, SeriesPoint};
use crate::domain::weights::{WeightVector, WEIGHT_SUM_TOLERANCE};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalancingPolicy {
    /// Constant weights, rebalanced every period.
    #[default]
    Daily,
    /// Buy and hold: weights drift and are never restored.
    None,
    /// Restore target weights at the first observation of each calendar month.
    Monthly,
    /// Restore target weights at the first observation of each calendar quarter.
    Quarterly,
}

impl RebalancingPolicy {
    /// Lenient parse: unrecognized labels resolve to [`RebalancingPolicy::None`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "daily" => RebalancingPolicy::Daily,
            "none" | "buy_and_hold" | "buy-and-hold" => RebalancingPolicy::None,
            "monthly" => RebalancingPolicy::Monthly,
            "quarterly" => RebalancingPolicy::Quarterly,
            other => {
                warn!(policy = other, "unknown rebalancing policy, not rebalancing");
                RebalancingPolicy::None
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RebalancingPolicy::Daily => "daily",
            RebalancingPolicy::None => "none",
            RebalancingPolicy::Monthly => "monthly",
            RebalancingPolicy::Quarterly => "quarterly",
        }
    }

    /// Calendar period a date belongs to; a change of key triggers a rebalance.
    fn period_key(&self, date: NaiveDate) -> Option<(i32, u32)> {
        match self {
            RebalancingPolicy::Monthly => Some((date.year(), date.month())),
            RebalancingPolicy::Quarterly => Some((date.year(), (date.month() - 1) / 3)),
            RebalancingPolicy::Daily | RebalancingPolicy::None => None,
        }
    }
}

impl fmt::Display for RebalancingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target weights laid out along the matrix columns.
///
/// Tickers absent from `weights` get zero. An all-zero result falls back to
/// equal weights; a partial overlap is rescaled to unit sum.
pub(crate) fn aligned_weights(matrix: &ReturnMatrix, weights: &WeightVector) -> Vec<f64> {
    let n = matrix.asset_count();
    let w: Vec<f64> = matrix.universe().iter().map(|t| weights.weight(t)).collect();
    let sum: f64 = w.iter().sum();

    if sum == 0.0 {
        warn!(assets = n, "no weight on any asset in the matrix, using equal weights");
        return vec![1.0 / n as f64; n];
    }
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        warn!(sum, "weights do not cover the matrix assets, rescaling");
        return w.into_iter().map(|x| x / sum).collect();
    }
    w
}

fn weighted_returns(matrix: &ReturnMatrix, w: &[f64]) -> Vec<f64> {
    matrix
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(w)
                .map(|(r, wi)| wi * r.unwrap_or(0.0))
                .sum()
        })
        .collect()
}

/// Total portfolio value after each row, starting from one unit of capital split by `w`.
fn simulate_drift(matrix: &ReturnMatrix, w: &[f64], policy: RebalancingPolicy) -> Vec<f64> {
    let mut alloc = w.to_vec();
    let mut prev_key = None;
    let mut totals = Vec::with_capacity(matrix.len());

    for (i, (date, row)) in matrix.dates().iter().zip(matrix.rows()).enumerate() {
        for (a, r) in alloc.iter_mut().zip(row) {
            *a *= 1.0 + r.unwrap_or(0.0);
        }
        let total: f64 = alloc.iter().sum();

        if let Some(key) = policy.period_key(*date) {
            if i > 0 && prev_key != Some(key) {
                debug!(%date, total, "rebalancing to target weights");
                for (a, wi) in alloc.iter_mut().zip(w) {
                    *a = total * wi;
                }
            }
            prev_key = Some(key);
        }

        totals.push(total);
    }

    totals
}

fn value_path(matrix: &ReturnMatrix, w: &[f64], policy: RebalancingPolicy) -> Vec<f64> {
    let seed: f64 = w.iter().sum();
    let mut path = Vec::with_capacity(matrix.len() + 1);
    path.push(seed);

    match policy {
        RebalancingPolicy::Daily => {
            let mut value = seed;
            for r in weighted_returns(matrix, w) {
                value *= 1.0 + r;
                path.push(value);
            }
        }
        _ => path.extend(simulate_drift(matrix, w, policy)),
    }
    path
}

/// One portfolio return per matrix row.
///
/// The seed allocation sits at the matrix base date, so the first row already
/// produces a return under every policy.
pub fn compute_portfolio_returns(
    matrix: &ReturnMatrix,
    weights: &WeightVector,
    policy: RebalancingPolicy,
) -> ReturnSeries {
    let w = aligned_weights(matrix, weights);

    let values = match policy {
        RebalancingPolicy::Daily => weighted_returns(matrix, &w),
        _ => value_path(matrix, &w, policy)
            .windows(2)
            .map(|v| v[1] / v[0] - 1.0)
            .collect(),
    };

    let points = matrix
        .dates()
        .iter()
        .zip(values)
        .map(|(&date, r)| SeriesPoint::new(date, r))
        .collect();
    ReturnSeries::from_parts(matrix.base_date(), points)
}

/// Value of one unit of capital over time, seed point included.
pub fn simulate_portfolio_values(
    matrix: &ReturnMatrix,
    weights: &WeightVector,
    policy: RebalancingPolicy,
) -> PortfolioValueSeries {
    let w = aligned_weights(matrix, weights);
    let dates = std::iter::once(matrix.base_date()).chain(matrix.dates().iter().copied());
    let points = dates
        .zip(value_path(matrix, &w, policy))
        .map(|(date, v)| SeriesPoint::new(date, v))
        .collect();
    PortfolioValueSeries::from_parts(points)
}

/// Compound `returns` from `initial_value` at the series base date.
pub fn compute_cumulative_value(
    returns: &ReturnSeries,
    initial_value: f64,
) -> Result<PortfolioValueSeries, AnalyticsError> {
    if !initial_value.is_finite() || initial_value <= 0.0 {
        return Err(AnalyticsError::invalid_parameter(
            "initial_value",
            format!("must be positive, got {initial_value}"),
        ));
    }

    let mut points = Vec::with_capacity(returns.len() + 1);
    points.push(SeriesPoint::new(returns.base_date(), initial_value));
    let mut value = initial_value;
    for p in returns.points() {
        value *= 1.0 + p.value;
        points.push(SeriesPoint::new(p.date, value));
    }
    Ok(PortfolioValueSeries::from_parts(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::universe::AssetUniverse;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn matrix(tickers: &[&str], dates: Vec<NaiveDate>, columns: &[Vec<f64>]) -> ReturnMatrix {
        let base = dates[0].pred_opt().unwrap();
        ReturnMatrix::from_columns(
            AssetUniverse::new(tickers.iter().copied()).unwrap(),
            base,
            dates,
            columns,
        )
        .unwrap()
    }

    fn halves() -> WeightVector {
        WeightVector::from_pairs([("A", 0.5), ("B", 0.5)]).unwrap()
    }

    const ALL_POLICIES: [RebalancingPolicy; 4] = [
        RebalancingPolicy::Daily,
        RebalancingPolicy::None,
        RebalancingPolicy::Monthly,
        RebalancingPolicy::Quarterly,
    ];

    #[test]
    fn daily_is_weighted_sum() {
        let m = matrix(
            &["A", "B"],
            vec![date(2024, 1, 2), date(2024, 1, 3)],
            &[vec![0.01, -0.02], vec![0.02, 0.00]],
        );
        let r = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::Daily);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r.points()[0].value, 0.015, epsilon = 1e-12);
        assert_relative_eq!(r.points()[1].value, -0.01, epsilon = 1e-12);
        assert_eq!(r.points()[1].date, date(2024, 1, 3));
    }

    #[test]
    fn single_asset_identity_under_every_policy() {
        let dates = vec![date(2024, 1, 31), date(2024, 2, 1), date(2024, 4, 1)];
        let m = matrix(&["A"], dates, &[vec![0.01, 0.02, -0.01]]);
        let w = WeightVector::from_pairs([("A", 1.0)]).unwrap();

        for policy in ALL_POLICIES {
            let r = compute_portfolio_returns(&m, &w, policy);
            let expected = [0.01, 0.02, -0.01];
            assert_eq!(r.len(), 3, "{policy}");
            for (got, want) in r.values().iter().zip(expected) {
                assert_relative_eq!(*got, want, epsilon = 1e-12);
            }

            let values = simulate_portfolio_values(&m, &w, policy).values();
            let want = [1.0, 1.01, 1.0302, 1.019898];
            assert_eq!(values.len(), 4);
            for (got, want) in values.iter().zip(want) {
                assert_relative_eq!(*got, want, epsilon = 1e-12);
            }
        }
    }

    fn drift_matrix(dates: Vec<NaiveDate>) -> ReturnMatrix {
        matrix(&["A", "B"], dates, &[vec![0.10, 0.0, 0.10], vec![0.0, 0.0, 0.0]])
    }

    #[test]
    fn monthly_rebalances_on_new_month() {
        let m = drift_matrix(vec![date(2024, 1, 30), date(2024, 2, 1), date(2024, 2, 2)]);
        let r = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::Monthly).values();
        // 0.55 + 0.5 = 1.05, reset to 0.525 each on Feb 1, then A +10%
        assert_relative_eq!(r[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(r[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(r[2], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn none_lets_weights_drift() {
        let m = drift_matrix(vec![date(2024, 1, 30), date(2024, 2, 1), date(2024, 2, 2)]);
        let r = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::None).values();
        assert_relative_eq!(r[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(r[2], 1.105 / 1.05 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn quarterly_ignores_month_change_within_quarter() {
        let m = drift_matrix(vec![date(2024, 1, 30), date(2024, 2, 1), date(2024, 2, 2)]);
        let quarterly = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::Quarterly);
        let none = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::None);
        assert_eq!(quarterly.values(), none.values());
    }

    #[test]
    fn quarterly_rebalances_on_new_quarter() {
        let m = drift_matrix(vec![date(2024, 3, 28), date(2024, 4, 1), date(2024, 4, 2)]);
        let r = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::Quarterly).values();
        assert_relative_eq!(r[2], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn first_row_never_rebalances() {
        let m = matrix(
            &["A", "B"],
            vec![date(2024, 1, 30), date(2024, 1, 31)],
            &[vec![0.10, 0.10], vec![0.0, 0.0]],
        );
        let monthly = simulate_portfolio_values(&m, &halves(), RebalancingPolicy::Monthly).values();
        let none = simulate_portfolio_values(&m, &halves(), RebalancingPolicy::None).values();
        // a reset after row one would give 0.525 * 1.1 + 0.525 = 1.1025
        assert_relative_eq!(monthly[2], 0.55 * 1.1 + 0.5, epsilon = 1e-12);
        assert_relative_eq!(monthly[2], none[2], epsilon = 1e-12);
    }

    #[test]
    fn missing_returns_count_as_zero() {
        let universe = AssetUniverse::new(["A", "B"]).unwrap();
        let m = ReturnMatrix::new(
            universe,
            date(2024, 1, 1),
            vec![date(2024, 1, 2), date(2024, 1, 3)],
            vec![vec![Some(0.10), None], vec![None, Some(0.10)]],
        )
        .unwrap();

        let daily = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::Daily).values();
        assert_relative_eq!(daily[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(daily[1], 0.05, epsilon = 1e-12);

        let none = compute_portfolio_returns(&m, &halves(), RebalancingPolicy::None).values();
        assert_relative_eq!(none[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(none[1], 0.05 / 1.05, epsilon = 1e-12);
    }

    fn gapped_matrix(dates: Vec<NaiveDate>) -> ReturnMatrix {
        let universe = AssetUniverse::new(["A", "B"]).unwrap();
        let base = dates[0].pred_opt().unwrap();
        ReturnMatrix::new(
            universe,
            base,
            dates,
            vec![
                vec![Some(0.10), None],
                vec![Some(0.10), None],
                vec![None, Some(0.10)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn periodic_rebalance_on_row_with_gap() {
        // A: 0.55 then 0.605, B holds 0.5; total 1.105 resets to 0.5525 each
        // on the boundary row, then B +10% gives 1.16025.
        let cases = [
            (RebalancingPolicy::Monthly, vec![date(2024, 1, 30), date(2024, 2, 1), date(2024, 2, 2)]),
            (RebalancingPolicy::Quarterly, vec![date(2024, 3, 28), date(2024, 4, 1), date(2024, 4, 2)]),
        ];
        for (policy, dates) in cases {
            let m = gapped_matrix(dates);
            let values = simulate_portfolio_values(&m, &halves(), policy).values();
            assert_relative_eq!(values[1], 1.05, epsilon = 1e-12);
            assert_relative_eq!(values[2], 1.105, epsilon = 1e-12);
            assert_relative_eq!(values[3], 1.16025, epsilon = 1e-12);

            let r = compute_portfolio_returns(&m, &halves(), policy).values();
            assert_relative_eq!(r[1], 1.105 / 1.05 - 1.0, epsilon = 1e-12);
            assert_relative_eq!(r[2], 0.05, epsilon = 1e-12);

            let none = simulate_portfolio_values(&m, &halves(), RebalancingPolicy::None).values();
            assert_relative_eq!(none[3], 0.605 + 0.55, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_overlap_falls_back_to_equal_weights() {
        let m = matrix(
            &["A", "B"],
            vec![date(2024, 1, 2)],
            &[vec![0.02], vec![0.04]],
        );
        let foreign = WeightVector::from_pairs([("X", 0.5), ("Y", 0.5)]).unwrap();
        let r = compute_portfolio_returns(&m, &foreign, RebalancingPolicy::Daily);
        assert_relative_eq!(r.points()[0].value, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn partial_overlap_is_rescaled() {
        let m = matrix(&["A"], vec![date(2024, 1, 2)], &[vec![0.02]]);
        let w = WeightVector::from_pairs([("A", 0.4), ("Z", 0.6)]).unwrap();
        let r = compute_portfolio_returns(&m, &w, RebalancingPolicy::Daily);
        assert_relative_eq!(r.points()[0].value, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn from_label_parses_known_policies() {
        assert_eq!(RebalancingPolicy::from_label("Daily"), RebalancingPolicy::Daily);
        assert_eq!(RebalancingPolicy::from_label("monthly"), RebalancingPolicy::Monthly);
        assert_eq!(RebalancingPolicy::from_label(" QUARTERLY "), RebalancingPolicy::Quarterly);
        assert_eq!(RebalancingPolicy::from_label("buy_and_hold"), RebalancingPolicy::None);
    }

    #[test]
    fn from_label_unknown_is_no_rebalancing() {
        assert_eq!(RebalancingPolicy::from_label("weekly"), RebalancingPolicy::None);
        assert_eq!(RebalancingPolicy::from_label(""), RebalancingPolicy::None);
    }

    #[test]
    fn cumulative_value_from_initial() {
        let returns = ReturnSeries::new(
            date(2024, 1, 1),
            vec![
                SeriesPoint::new(date(2024, 1, 2), 0.01),
                SeriesPoint::new(date(2024, 1, 3), 0.02),
                SeriesPoint::new(date(2024, 1, 4), -0.01),
            ],
        )
        .unwrap();

        let values = compute_cumulative_value(&returns, 1.0).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values.points()[0], SeriesPoint::new(date(2024, 1, 1), 1.0));
        let want = [1.0, 1.01, 1.0302, 1.019898];
        for (got, want) in values.values().iter().zip(want) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }

        let scaled = compute_cumulative_value(&returns, 10_000.0).unwrap();
        assert_relative_eq!(scaled.final_value(), 10_198.98, epsilon = 1e-8);
    }

    #[test]
    fn cumulative_value_rejects_bad_initial() {
        let returns = ReturnSeries::new(date(2024, 1, 1), vec![]).unwrap();
        assert!(compute_cumulative_value(&returns, 0.0).is_err());
        assert!(compute_cumulative_value(&returns, f64::NAN).is_err());
    }
}
