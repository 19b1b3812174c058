//! Pairwise Pearson correlation of the asset columns of a return matrix.

use crate::domain::metrics::is_constant;
use crate::domain::return_matrix::ReturnMatrix;
use serde::Serialize;

/// Symmetric correlation table; `None` marks an undefined coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn values(&self) -> &[Vec<Option<f64>>] {
        &self.values
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j).copied().flatten())
    }

    /// Coefficient between two tickers, if both are present and it is defined.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.get(i, j)
    }
}

/// Pearson correlation over the rows where both columns have a value.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    if is_constant(&xs) || is_constant(&ys) {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some((cov / (vx * vy).sqrt()).clamp(-1.0, 1.0))
}

fn has_variance(column: &[f64]) -> bool {
    column.len() >= 2 && !is_constant(column)
}

pub fn compute_correlation_matrix(matrix: &ReturnMatrix) -> CorrelationMatrix {
    let n = matrix.asset_count();
    let mut values = vec![vec![None; n]; n];
    let varies: Vec<bool> = (0..n).map(|a| has_variance(&matrix.column(a))).collect();

    for i in 0..n {
        if varies[i] {
            values[i][i] = Some(1.0);
        }
        for j in (i + 1)..n {
            if !varies[i] || !varies[j] {
                continue;
            }
            let pairs: Vec<(f64, f64)> = matrix
                .rows()
                .iter()
                .filter_map(|row| Some((row[i]?, row[j]?)))
                .collect();
            let r = pearson(&pairs);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        tickers: matrix.universe().tickers().to_vec(),
        values,
    }
}
