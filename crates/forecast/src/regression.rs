//! Ridge regression on standardised features, solved in closed form.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// Held-out accuracy of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub mae: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub validation_rows: usize,
}

/// Column-wise z-score scaling learned from the training rows.
#[derive(Debug, Clone, PartialEq)]
struct Standardizer {
    means: Vec<f64>,
    /// Population standard deviations; 0 marks a constant column.
    scales: Vec<f64>,
}

impl Standardizer {
    fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x / n;
            }
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, x), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut scales {
            *s = s.sqrt();
        }

        Self { means, scales }
    }

    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((x, m), s)| if *s > f64::EPSILON { (x - m) / s } else { 0.0 })
            .collect()
    }
}

/// Ridge regression settings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RidgeRegression {
    lambda: f64,
}

/// Fitted linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeModel {
    scaler: Standardizer,
    weights: Vec<f64>,
    intercept: f64,
}

impl RidgeRegression {
    pub fn new(lambda: f64) -> ForecastResult<Self> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "ridge lambda must be a finite non-negative number".to_string(),
            ));
        }
        Ok(Self { lambda })
    }

    /// Fit `y ≈ intercept + w·z(x)` minimising squared error plus `λ‖w‖²`.
    ///
    /// The intercept is the target mean (features are centred), so it is not
    /// penalised.
    pub fn fit(&self, rows: &[Vec<f64>], targets: &[f64]) -> ForecastResult<RidgeModel> {
        if rows.is_empty() {
            return Err(ForecastError::InsufficientData("no training rows".to_string()));
        }
        if rows.len() != targets.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "{} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }
        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(ForecastError::InvalidParameter("ragged feature rows".to_string()));
        }

        let scaler = Standardizer::fit(rows, width);
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();
        let intercept = targets.iter().sum::<f64>() / targets.len() as f64;

        // Normal equations: (ZᵀZ + λI) w = Zᵀ(y − ȳ)
        let mut gram = vec![vec![0.0; width]; width];
        let mut rhs = vec![0.0; width];
        for (z, y) in scaled.iter().zip(targets) {
            let centred = y - intercept;
            for i in 0..width {
                rhs[i] += z[i] * centred;
                for j in 0..width {
                    gram[i][j] += z[i] * z[j];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += self.lambda;
        }

        let weights = solve(gram, rhs)?;
        Ok(RidgeModel {
            scaler,
            weights,
            intercept,
        })
    }
}

impl RidgeModel {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let z = self.scaler.transform(row);
        self.intercept + z.iter().zip(&self.weights).map(|(a, b)| a * b).sum::<f64>()
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> ForecastResult<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(ForecastError::SingularSystem);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Mean absolute error.
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / predicted.len() as f64
}

/// Coefficient of determination. A constant `actual` scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = predicted.iter().zip(actual).map(|(p, a)| (a - p).powi(2)).sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
