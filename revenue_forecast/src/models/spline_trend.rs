//! Spline trend model over the deterministic time index
//!
//! Captures the slow-moving revenue level independent of event noise.
//! The raw target is smoothed with a centered rolling mean, then a
//! degree-1 spline basis (a global line plus hinges at interior quantile
//! knots) is fitted to the smoothed values by least squares. Beyond the
//! fitted range the boundary segment continues linearly, so out-of-sample
//! predictions are a straight-line projection of the final trend slope,
//! never a clamp.

use crate::error::{ForecastError, Result};
use crate::models::{FeatureMatrix, Regressor};
use serde::{Deserialize, Serialize};
use series_math::regression::{least_squares, LinearFit};
use series_math::rolling::centered_rolling_mean;
use statrs::statistics::{Data, OrderStatistics};

/// Default centered smoothing window, in months.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 7;

/// Default number of quantile knots.
pub const DEFAULT_KNOTS: usize = 7;

/// Piecewise-linear spline trend fitted to a smoothed target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplineTrend {
    /// Name of the model
    name: String,
    /// Centered rolling-mean window applied to the target before fitting
    smoothing_window: usize,
    /// Number of knots placed at value quantiles of the time index
    n_knots: usize,
    /// Fitted knot positions
    knots: Vec<f64>,
    /// Fitted basis coefficients
    fit: Option<LinearFit>,
}

impl SplineTrend {
    /// Create a new spline trend model.
    pub fn new(smoothing_window: usize, n_knots: usize) -> Result<Self> {
        if smoothing_window < 2 {
            return Err(ForecastError::InvalidParameter(
                "Smoothing window must be at least 2".to_string(),
            ));
        }
        if n_knots < 2 {
            return Err(ForecastError::InvalidParameter(
                "Need at least 2 knots for a spline basis".to_string(),
            ));
        }

        Ok(Self {
            name: format!(
                "Spline trend (window={}, knots={})",
                smoothing_window, n_knots
            ),
            smoothing_window,
            n_knots,
            knots: Vec::new(),
            fit: None,
        })
    }

    /// The smoothing window in use
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Fitted knot positions, empty before fitting
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Basis row at time position `t`: intercept, the line, and one hinge
    /// per interior knot. Past the last knot every hinge is active, which
    /// is what makes extrapolation the linear continuation of the final
    /// segment.
    fn basis_row(&self, t: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_knots);
        row.push(1.0);
        row.push(t);
        for &knot in &self.knots[1..self.knots.len() - 1] {
            row.push((t - knot).max(0.0));
        }
        row
    }

    fn quantile_knots(&self, positions: &[f64]) -> Vec<f64> {
        let mut data = Data::new(positions.to_vec());
        (0..self.n_knots)
            .map(|j| data.quantile(j as f64 / (self.n_knots - 1) as f64))
            .collect()
    }
}

impl Default for SplineTrend {
    fn default() -> Self {
        Self {
            name: format!(
                "Spline trend (window={}, knots={})",
                DEFAULT_SMOOTHING_WINDOW, DEFAULT_KNOTS
            ),
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            n_knots: DEFAULT_KNOTS,
            knots: Vec::new(),
            fit: None,
        }
    }
}

impl Regressor for SplineTrend {
    /// Fit the trend. `features` must be the one-column in-sample time
    /// index; `target` is the raw (unsmoothed) training series.
    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<()> {
        if features.n_features() != 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "Trend model takes a single time-index feature, got {}",
                features.n_features()
            )));
        }
        if features.n_rows() != target.len() {
            return Err(ForecastError::ValidationError(format!(
                "Time index has {} rows but target has {}",
                features.n_rows(),
                target.len()
            )));
        }

        let positions = features.column(0);
        let smoothed = centered_rolling_mean(target, self.smoothing_window)?;

        // The rolling mean is NaN at the window boundaries; the time index
        // drops the same positions so the pairs align one-to-one.
        let mut aligned_positions = Vec::new();
        let mut aligned_values = Vec::new();
        for (t, m) in positions.iter().zip(smoothed.iter()) {
            if !m.is_nan() {
                aligned_positions.push(*t);
                aligned_values.push(*m);
            }
        }

        if aligned_positions.len() < self.n_knots {
            return Err(ForecastError::ForecastingError(format!(
                "Only {} smoothed observations for {} knots; need a longer history",
                aligned_positions.len(),
                self.n_knots
            )));
        }

        self.knots = self.quantile_knots(&aligned_positions);
        let rows: Vec<Vec<f64>> = aligned_positions
            .iter()
            .map(|t| self.basis_row(*t))
            .collect();
        self.fit = Some(least_squares(&rows, &aligned_values)?);
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if features.n_features() != 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "Trend model takes a single time-index feature, got {}",
                features.n_features()
            )));
        }
        let fit = self.fit.as_ref().ok_or_else(|| {
            ForecastError::ForecastingError("Trend model has not been fitted".to_string())
        })?;

        Ok(features
            .column(0)
            .iter()
            .map(|t| fit.predict_row(&self.basis_row(*t)))
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
