//! Fixed-offset train/test partitioning on the forecast horizon

use crate::data::{column_as_f64, RevenueFrame};
use crate::error::{ForecastError, Result};
use polars::prelude::*;

/// Months ahead the pipeline forecasts, and therefore the size of the
/// held-out evaluation window.
pub const FORECAST_HORIZON: usize = 6;

/// Training and evaluation partitions of a feature table.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Feature rows of every month except the final horizon
    pub train_features: DataFrame,
    /// Target values matching `train_features`
    pub train_target: Vec<f64>,
    /// Feature rows of the final horizon months
    pub test_features: DataFrame,
    /// Target values matching `test_features`
    pub test_target: Vec<f64>,
}

/// Split a feature table into its training window and the held-out final
/// horizon. The date and target columns are excluded from the feature
/// frames. This mirrors the real forecast setting: the last 6 months play
/// the role of the unknown future.
pub fn train_test_split(frame: &RevenueFrame) -> Result<TrainTestSplit> {
    let n = frame.height();
    if n <= FORECAST_HORIZON {
        return Err(ForecastError::ValidationError(format!(
            "Need more than {} rows to hold out a {}-month window, got {}",
            FORECAST_HORIZON, FORECAST_HORIZON, n
        )));
    }

    let df = frame.dataframe();
    let train = df.slice(0, n - FORECAST_HORIZON);
    let test = df.slice((n - FORECAST_HORIZON) as i64, FORECAST_HORIZON);

    let features_only = |part: &DataFrame| -> Result<DataFrame> {
        let dropped = part.drop(frame.date_column())?;
        Ok(dropped.drop(frame.target_column())?)
    };

    Ok(TrainTestSplit {
        train_features: features_only(&train)?,
        train_target: column_as_f64(&train, frame.target_column())?,
        test_features: features_only(&test)?,
        test_target: column_as_f64(&test, frame.target_column())?,
    })
}
