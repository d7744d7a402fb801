//! Ordinary least-squares fitting on explicit design matrices
//!
//! The caller builds the design matrix (basis expansion included); this
//! module solves the normal equations and hands back a fitted artifact
//! that can be serialized and evaluated row by row.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Coefficients of a fitted linear model over some design matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    coefficients: Vec<f64>,
}

impl LinearFit {
    /// Fitted coefficients, one per design-matrix column.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Evaluate the model on one design-matrix row.
    ///
    /// The row must have one entry per coefficient; extra entries are
    /// ignored and missing ones contribute nothing.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(row.iter())
            .map(|(c, x)| c * x)
            .sum()
    }
}

/// Fit `rows * beta ~ targets` by ordinary least squares.
///
/// Solves the normal equations with Gaussian elimination; needs at least
/// as many rows as columns and a non-singular design.
pub fn least_squares(rows: &[Vec<f64>], targets: &[f64]) -> Result<LinearFit> {
    if rows.is_empty() {
        return Err(MathError::InsufficientData(
            "Least squares needs at least one observation".to_string(),
        ));
    }
    if rows.len() != targets.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but {} targets were given",
            rows.len(),
            targets.len()
        )));
    }

    let p = rows[0].len();
    if p == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if rows.iter().any(|r| r.len() != p) {
        return Err(MathError::InvalidInput(
            "Design matrix rows have inconsistent lengths".to_string(),
        ));
    }
    if rows.len() < p {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations to fit {} coefficients",
            p, p
        )));
    }

    // Normal equations: (X^T X) beta = X^T y
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &y) in rows.iter().zip(targets.iter()) {
        for i in 0..p {
            xty[i] += row[i] * y;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let coefficients = solve(xtx, xty)?;
    Ok(LinearFit { coefficients })
}

/// Solve a square linear system by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        // Pivot on the largest remaining entry in this column
        let mut pivot = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Design matrix is singular or nearly singular".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }

    Ok(x)
}
