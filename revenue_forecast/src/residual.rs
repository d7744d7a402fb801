//! Residual feature pipeline
//!
//! Builds the feature set the residual model trains on, decoupled from
//! the trend model's own basis so seasonal structure is not counted
//! twice. The drop list is expressed through [`FeatureId`] records, never
//! column-name literals.

use crate::data::{column_as_f64, RevenueFrame};
use crate::error::Result;
use crate::features::{EventCategory, FeatureId};
use polars::prelude::*;
use series_math::lags::lag;
use series_math::rolling::rolling_std;

/// Features removed before residual modelling: Fourier harmonics the
/// spline trend already captures, and low-variance event categories.
pub const RESIDUAL_DROP_LIST: [FeatureId; 9] = [
    FeatureId::EventCount(EventCategory::RerunEvent),
    FeatureId::EventCount(EventCategory::OperationEvent),
    FeatureId::EventCount(EventCategory::CollaborationEvent),
    FeatureId::EventCount(EventCategory::LimitedBanner),
    FeatureId::AnnualSin(1),
    FeatureId::AnnualCos(1),
    FeatureId::AnnualSin(3),
    FeatureId::AnnualCos(3),
    FeatureId::AnnualSin(4),
];

/// Autoregressive lags fed to the residual model. A single lag matching
/// the forecast horizon, so every test-window row sees a real
/// (pre-horizon) value rather than another prediction.
pub const RESIDUAL_LAGS: [usize; 1] = [6];

/// Window of the trailing rolling-std feature.
pub const RESIDUAL_ROLLING_WINDOW: usize = 4;

/// Drop the date column and the trend-redundant features.
///
/// The target column stays in place; lags still have to be built from it.
pub fn drop_residual_columns(frame: &RevenueFrame) -> Result<DataFrame> {
    let mut df = frame.dataframe().drop(frame.date_column())?;
    for id in RESIDUAL_DROP_LIST {
        df = df.drop(&id.column_name())?;
    }
    Ok(df)
}

/// Add one lag column of the target per requested period.
pub fn make_lags(df: &DataFrame, target_column: &str, lags: &[usize]) -> Result<DataFrame> {
    let target = column_as_f64(df, target_column)?;
    let mut out = df.clone();
    for &periods in lags {
        let name = FeatureId::Lag(periods).column_name();
        out.with_column(Series::new(&name, lag(&target, periods)))?;
    }
    Ok(out)
}

/// Add the trailing rolling-std column over `window` rows, computed on
/// the target shifted by one month first. The shift is mandatory: without
/// it the current month's value leaks into its own feature.
pub fn make_rolling_stats(df: &DataFrame, target_column: &str, window: usize) -> Result<DataFrame> {
    let target = column_as_f64(df, target_column)?;
    let shifted = lag(&target, 1);
    let stds = rolling_std(&shifted, window)?;

    let mut out = df.clone();
    let name = FeatureId::RollingStd(window).column_name();
    out.with_column(Series::new(&name, stds))?;
    Ok(out)
}

/// Drop every row containing a NaN in any float column. After the lag and
/// rolling constructions this removes exactly the first
/// `max(lag, window)` rows of history.
pub fn drop_nan_rows(df: &DataFrame) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for name in df.get_column_names() {
        let col = df.column(name)?;
        if matches!(col.dtype(), DataType::Float64 | DataType::Float32) {
            for (i, value) in column_as_f64(df, name)?.iter().enumerate() {
                if value.is_nan() {
                    keep[i] = false;
                }
            }
        }
    }

    let mask: BooleanChunked = keep.into_iter().map(Some).collect();
    Ok(df.filter(&mask)?)
}

/// Run the full residual feature pipeline: structural drops, the horizon
/// lag, the shifted rolling std, then NaN-row removal. The result is
/// fully numeric with the target column still present; the caller
/// separates it.
pub fn residual_features(frame: &RevenueFrame) -> Result<DataFrame> {
    let df = drop_residual_columns(frame)?;
    let df = make_lags(&df, frame.target_column(), &RESIDUAL_LAGS)?;
    let df = make_rolling_stats(&df, frame.target_column(), RESIDUAL_ROLLING_WINDOW)?;
    drop_nan_rows(&df)
}
