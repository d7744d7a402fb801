//! Trend and residual regressors behind a common fit/predict contract

use crate::data::column_as_f64;
use crate::error::{ForecastError, Result};
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub mod gradient_boost;
pub mod spline_trend;

/// Row-major numeric feature matrix fed to regressors.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    n_features: usize,
}

impl FeatureMatrix {
    /// Build a matrix from rows, validating they are rectangular.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != n_features) {
            return Err(ForecastError::DataError(
                "Feature rows have inconsistent lengths".to_string(),
            ));
        }
        Ok(Self { rows, n_features })
    }

    /// A single-feature matrix, one row per value. The trend model takes
    /// its time index in this shape.
    pub fn from_column(values: &[f64]) -> Self {
        Self {
            rows: values.iter().map(|v| vec![*v]).collect(),
            n_features: 1,
        }
    }

    /// Build a matrix from every column of a numeric DataFrame, in the
    /// frame's column order.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let names = df.get_column_names();
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            columns.push(column_as_f64(df, name)?);
        }

        let n_rows = df.height();
        let rows: Vec<Vec<f64>> = (0..n_rows)
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect();

        Ok(Self {
            rows,
            n_features: names.len(),
        })
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// One row of features
    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// Iterate over feature rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// One feature column, copied out
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }
}

/// A supervised regressor mapping feature rows to a numeric sequence.
///
/// Both stages of the forecasting ensemble implement this, so the trend
/// and residual models can be swapped independently behind one contract.
pub trait Regressor: Debug {
    /// Fit the model to feature rows and their targets
    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<()>;

    /// Predict one value per feature row
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Persist a fitted model as JSON for later load-and-predict use.
pub fn save_model<M, P>(model: &M, path: P) -> Result<()>
where
    M: Serialize,
    P: AsRef<Path>,
{
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), model)?;
    Ok(())
}

/// Load a previously saved model from JSON.
pub fn load_model<M, P>(path: P) -> Result<M>
where
    M: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    let model = serde_json::from_reader(BufReader::new(file))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_feature_matrix_from_dataframe() {
        let df = DataFrame::new(vec![
            Series::new("a", vec![1.0, 2.0]),
            Series::new("b", vec![10i64, 20]),
        ])
        .unwrap();

        let matrix = FeatureMatrix::from_dataframe(&df).unwrap();
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.n_features(), 2);
        assert_eq!(matrix.row(0), &[1.0, 10.0]);
        assert_eq!(matrix.row(1), &[2.0, 20.0]);
        assert_eq!(matrix.column(1), vec![10.0, 20.0]);
    }

    #[test]
    fn test_feature_matrix_rejects_ragged_rows() {
        assert!(FeatureMatrix::new(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    }
}
