//! End-to-end two-stage forecasting run and the forecast artifact
//!
//! A run is a pure function from (feature table, hyperparameters) to
//! (trend artifact, residual artifact, forecast). Nothing here mutates
//! shared state; every stage consumes its input and returns a new value.

use crate::data::RevenueFrame;
use crate::error::{ForecastError, Result};
use crate::features::TimeIndex;
use crate::models::gradient_boost::{self, GradientBoost};
use crate::models::spline_trend::{self, SplineTrend};
use crate::models::{save_model, FeatureMatrix, Regressor};
use crate::residual::residual_features;
use crate::split::{train_test_split, FORECAST_HORIZON};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// File name of the persisted trend model artifact.
pub const TREND_MODEL_FILE: &str = "trend_model.json";

/// File name of the persisted residual model artifact.
pub const RESIDUAL_MODEL_FILE: &str = "residual_model.json";

/// File name of the persisted forecast document.
pub const FORECAST_FILE: &str = "six_month_forecast.json";

/// Hyperparameters of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Centered smoothing window of the trend stage
    pub trend_window: usize,
    /// Number of spline knots in the trend stage
    pub trend_knots: usize,
    /// Boosting rounds of the residual stage
    pub n_estimators: usize,
    /// Learning rate of the residual stage
    pub learning_rate: f64,
    /// Subsampling seed of the residual stage
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trend_window: spline_trend::DEFAULT_SMOOTHING_WINDOW,
            trend_knots: spline_trend::DEFAULT_KNOTS,
            n_estimators: gradient_boost::DEFAULT_ESTIMATORS,
            learning_rate: gradient_boost::DEFAULT_LEARNING_RATE,
            seed: gradient_boost::DEFAULT_SEED,
        }
    }
}

/// One month of the final forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Month being forecast
    pub date: NaiveDate,
    /// Predicted revenue for that month
    pub predicted: f64,
}

/// The final forecast: one entry per horizon month, created once per run
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Assemble a forecast from parallel dates and predictions.
    pub fn new(dates: Vec<NaiveDate>, predicted: Vec<f64>) -> Result<Self> {
        if dates.len() != predicted.len() {
            return Err(ForecastError::ValidationError(format!(
                "Got {} dates but {} predictions",
                dates.len(),
                predicted.len()
            )));
        }

        let entries = dates
            .into_iter()
            .zip(predicted)
            .map(|(date, predicted)| ForecastEntry { date, predicted })
            .collect();
        Ok(Self { entries })
    }

    /// The forecast entries, in date order
    pub fn entries(&self) -> &[ForecastEntry] {
        &self.entries
    }

    /// Predicted values only
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.predicted).collect()
    }

    /// Number of forecast months
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the forecast has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the forecast as a JSON document.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a previously persisted forecast.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let forecast = serde_json::from_reader(BufReader::new(file))?;
        Ok(forecast)
    }
}

/// Everything one pipeline run produces.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Fitted trend stage
    pub trend_model: SplineTrend,
    /// Fitted residual stage
    pub residual_model: GradientBoost,
    /// Combined horizon forecast
    pub forecast: Forecast,
}

/// Element-wise sum of the trend and residual predictions.
///
/// A length mismatch between the two stages is a hard precondition
/// violation.
pub fn combine_forecast(trend: &[f64], residual: &[f64]) -> Result<Vec<f64>> {
    if trend.len() != residual.len() {
        return Err(ForecastError::ValidationError(format!(
            "Trend prediction has {} steps but residual prediction has {}",
            trend.len(),
            residual.len()
        )));
    }

    Ok(trend
        .iter()
        .zip(residual.iter())
        .map(|(t, r)| t + r)
        .collect())
}

/// Fit both stages on the training window and forecast the held-out
/// horizon.
///
/// The trend fits the smoothed training target over the time index; the
/// residual model fits engineered features against what the trend missed;
/// the forecast is the sum of the trend's out-of-sample projection and
/// the residual model's prediction on the horizon features.
pub fn run_pipeline(frame: &RevenueFrame, config: &PipelineConfig) -> Result<PipelineOutcome> {
    let split = train_test_split(frame)?;
    let n_train = split.train_target.len();

    // Stage one: smooth trend over the training window.
    let time_index = TimeIndex::new(n_train);
    let in_sample = FeatureMatrix::from_column(&time_index.in_sample());

    let mut trend_model = SplineTrend::new(config.trend_window, config.trend_knots)?;
    trend_model.fit(&in_sample, &split.train_target)?;

    let trend_in_sample = trend_model.predict(&in_sample)?;
    let train_residuals: Vec<f64> = split
        .train_target
        .iter()
        .zip(trend_in_sample.iter())
        .map(|(y, t)| y - t)
        .collect();

    // Stage two: residual model on the engineered features. The lag and
    // rolling constructions drop the oldest rows, so the residual target
    // starts at the same offset.
    let engineered = residual_features(frame)?;
    if engineered.height() <= FORECAST_HORIZON {
        return Err(ForecastError::ValidationError(format!(
            "Only {} rows survive residual feature construction; need more than {}",
            engineered.height(),
            FORECAST_HORIZON
        )));
    }
    let dropped = frame.height() - engineered.height();
    let train_rows = engineered.height() - FORECAST_HORIZON;

    let features_only = engineered.drop(frame.target_column())?;
    let train_features = FeatureMatrix::from_dataframe(&features_only.slice(0, train_rows))?;
    let test_features = FeatureMatrix::from_dataframe(
        &features_only.slice(train_rows as i64, FORECAST_HORIZON),
    )?;

    let mut residual_model = GradientBoost::new(config.n_estimators, config.learning_rate)?
        .with_seed(config.seed);
    residual_model.fit(&train_features, &train_residuals[dropped..])?;

    // Combine: out-of-sample trend projection plus predicted residuals.
    let out_of_sample =
        FeatureMatrix::from_column(&time_index.out_of_sample(FORECAST_HORIZON));
    let trend_prediction = trend_model.predict(&out_of_sample)?;
    let residual_prediction = residual_model.predict(&test_features)?;
    let combined = combine_forecast(&trend_prediction, &residual_prediction)?;

    let dates = frame.dates()?;
    let horizon_dates = dates[dates.len() - FORECAST_HORIZON..].to_vec();
    let forecast = Forecast::new(horizon_dates, combined)?;

    Ok(PipelineOutcome {
        trend_model,
        residual_model,
        forecast,
    })
}

/// Persist every artifact of a run into `dir` for later load-and-predict
/// use and for the serving boundary to expose.
pub fn save_artifacts<P: AsRef<Path>>(outcome: &PipelineOutcome, dir: P) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    save_model(&outcome.trend_model, dir.join(TREND_MODEL_FILE))?;
    save_model(&outcome.residual_model, dir.join(RESIDUAL_MODEL_FILE))?;
    outcome.forecast.save_json(dir.join(FORECAST_FILE))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_forecast_sums_elementwise() {
        let combined = combine_forecast(&[1.0, 2.0, 3.0], &[0.5, -0.5, 0.25]).unwrap();
        assert_eq!(combined, vec![1.5, 1.5, 3.25]);
    }

    #[test]
    fn test_combine_forecast_rejects_length_mismatch() {
        assert!(combine_forecast(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_forecast_rejects_length_mismatch() {
        let dates = vec![NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()];
        assert!(Forecast::new(dates, vec![1.0, 2.0]).is_err());
    }
}
