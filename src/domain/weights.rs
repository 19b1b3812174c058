//! Weight normalization over an asset universe.
//!
//! Constructors never substitute values: a zero weight sum is always an
//! error, and callers pick the fallback. [`normalize_or_equal`] is the one
//! helper that applies the equal-weight fallback on the caller's behalf.

use crate::domain::error::AnalyticsError;
use crate::domain::universe::AssetUniverse;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::warn;

pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Unit-sum weights, one per asset of the universe.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    universe: AssetUniverse,
    weights: Vec<f64>,
}

impl WeightVector {
    pub fn new(universe: AssetUniverse, weights: Vec<f64>) -> Result<Self, AnalyticsError> {
        if universe.is_empty() {
            return Err(AnalyticsError::EmptyUniverse);
        }
        if weights.len() != universe.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: universe.len(),
                actual: weights.len(),
            });
        }
        check_finite(&weights, &universe)?;
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalyticsError::invalid_parameter(
                "weights",
                format!("weights must sum to 1, got {sum}"),
            ));
        }
        Ok(Self { universe, weights })
    }

    /// Build from `(ticker, weight)` pairs.
    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, AnalyticsError> {
        let (tickers, weights): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(t, w)| (t.into(), w)).unzip();
        Self::new(AssetUniverse::new(tickers)?, weights)
    }

    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of `ticker`, or 0.0 when the ticker is outside the universe.
    pub fn weight(&self, ticker: &str) -> f64 {
        self.universe
            .position(ticker)
            .map(|i| self.weights[i])
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.universe.iter().zip(self.weights.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

impl Serialize for WeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.weights.len()))?;
        for (ticker, weight) in self.iter() {
            map.serialize_entry(ticker, &weight)?;
        }
        map.end()
    }
}

fn check_finite(raw: &[f64], universe: &AssetUniverse) -> Result<(), AnalyticsError> {
    if let Some((ticker, &value)) = universe.iter().zip(raw).find(|(_, w)| !w.is_finite()) {
        return Err(AnalyticsError::InvalidWeight {
            asset: ticker.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_shape(raw: &[f64], universe: &AssetUniverse) -> Result<(), AnalyticsError> {
    if universe.is_empty() {
        return Err(AnalyticsError::EmptyUniverse);
    }
    if raw.len() != universe.len() {
        return Err(AnalyticsError::DimensionMismatch {
            expected: universe.len(),
            actual: raw.len(),
        });
    }
    check_finite(raw, universe)
}

fn divide_by_sum(raw: Vec<f64>, universe: &AssetUniverse, clipped: bool) -> Result<WeightVector, AnalyticsError> {
    let total: f64 = raw.iter().sum();
    if total == 0.0 {
        return Err(AnalyticsError::ZeroWeightSum { clipped });
    }
    Ok(WeightVector {
        universe: universe.clone(),
        weights: raw.into_iter().map(|w| w / total).collect(),
    })
}

pub fn equal_weights(universe: &AssetUniverse) -> Result<WeightVector, AnalyticsError> {
    if universe.is_empty() {
        return Err(AnalyticsError::EmptyUniverse);
    }
    let w = 1.0 / universe.len() as f64;
    Ok(WeightVector {
        universe: universe.clone(),
        weights: vec![w; universe.len()],
    })
}

/// `raw / sum(raw)`, with `raw` aligned positionally with `universe`.
pub fn normalize_weights(raw: &[f64], universe: &AssetUniverse) -> Result<WeightVector, AnalyticsError> {
    check_shape(raw, universe)?;
    divide_by_sum(raw.to_vec(), universe, false)
}

/// Clip each raw value into `[min_w, max_w]`, then normalize.
pub fn clip_and_normalize(
    raw: &[f64],
    universe: &AssetUniverse,
    min_w: f64,
    max_w: f64,
) -> Result<WeightVector, AnalyticsError> {
    if min_w > max_w || min_w.is_nan() || max_w.is_nan() {
        return Err(AnalyticsError::InvalidWeightBounds { min: min_w, max: max_w });
    }
    check_shape(raw, universe)?;
    let clipped = raw.iter().map(|w| w.clamp(min_w, max_w)).collect();
    divide_by_sum(clipped, universe, true)
}

/// Normalize, falling back to equal weights when every raw value is zero.
pub fn normalize_or_equal(raw: &[f64], universe: &AssetUniverse) -> Result<WeightVector, AnalyticsError> {
    match normalize_weights(raw, universe) {
        Err(AnalyticsError::ZeroWeightSum { .. }) => {
            warn!(assets = universe.len(), "all weights are zero, using equal weights");
            equal_weights(universe)
        }
        other => other,
    }
}

/// Where the weights of a portfolio come from.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightSpec {
    Equal,
    Raw(Vec<f64>),
    Clipped { raw: Vec<f64>, min: f64, max: f64 },
}

impl WeightSpec {
    /// Resolve against `valid`, a subset of the `configured` universe the raw values are aligned with.
    pub fn resolve(
        &self,
        configured: &AssetUniverse,
        valid: &AssetUniverse,
    ) -> Result<WeightVector, AnalyticsError> {
        match self {
            WeightSpec::Equal => equal_weights(valid),
            WeightSpec::Raw(raw) => normalize_or_equal(&select(raw, configured, valid)?, valid),
            WeightSpec::Clipped { raw, min, max } => {
                clip_and_normalize(&select(raw, configured, valid)?, valid, *min, *max)
            }
        }
    }
}

fn select(raw: &[f64], configured: &AssetUniverse, valid: &AssetUniverse) -> Result<Vec<f64>, AnalyticsError> {
    if raw.len() != configured.len() {
        return Err(AnalyticsError::DimensionMismatch {
            expected: configured.len(),
            actual: raw.len(),
        });
    }
    valid
        .iter()
        .map(|ticker| {
            configured
                .position(ticker)
                .map(|i| raw[i])
                .ok_or_else(|| AnalyticsError::UnknownAsset(ticker.to_string()))
        })
        .collect()
}
