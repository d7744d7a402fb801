//! Monthly revenue tables and event calendar records

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// First day of the month `date` falls in.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

/// First day of the month after `date`'s month.
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// Consecutive month-start dates beginning at `start`'s month.
pub fn monthly_index(start: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    let mut index = Vec::with_capacity(periods);
    let mut current = month_start(start);
    for _ in 0..periods {
        index.push(current);
        current = next_month_start(current);
    }
    index
}

fn date_from_epoch_ms(ms: i64) -> Result<NaiveDate> {
    NaiveDateTime::from_timestamp_opt(ms.div_euclid(1000), 0)
        .map(|dt| dt.date())
        .ok_or_else(|| ForecastError::DataError(format!("Timestamp {} out of range", ms)))
}

/// Gacha banner categories reported by the banner feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GachaType {
    FesGacha,
    PickupGacha,
    LimitedGacha,
    /// Anything the feed reports that we do not model
    Other,
}

impl GachaType {
    /// Map a feed label onto a modelled category; unrecognized labels
    /// become [`GachaType::Other`] rather than an error.
    pub fn from_feed_label(label: &str) -> Self {
        match label {
            "FesGacha" => GachaType::FesGacha,
            "PickupGacha" => GachaType::PickupGacha,
            "LimitedGacha" => GachaType::LimitedGacha,
            _ => GachaType::Other,
        }
    }
}

/// A gacha banner with its active span, as delivered by the banner feed.
///
/// Immutable once loaded; the feature builder only reads it. A banner
/// whose end predates its start is a caller error and is not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerRecord {
    /// Feed identifier
    pub id: u64,
    /// Banner category
    pub gacha_type: GachaType,
    /// Start instant, epoch milliseconds
    pub started_at: i64,
    /// End instant, epoch milliseconds
    pub ended_at: i64,
    /// Featured characters
    pub rateups: Vec<String>,
}

/// An in-game event with its run dates and a free-text note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// English event name
    pub name_en: String,
    /// Japanese event name
    pub name_jp: String,
    /// First day of the event
    pub start: NaiveDate,
    /// Last day of the event
    pub end: NaiveDate,
    /// Classification note (Original, Rerun, Operation, ...)
    pub note: Option<String>,
}

/// Anything occupying a span of calendar time.
///
/// Monthly counting only needs the boundary months of a span, so this is
/// the entire surface the feature builder reads from a record.
pub trait CalendarSpan {
    /// Month the span starts in
    fn start_month(&self) -> NaiveDate;
    /// Month the span ends in
    fn end_month(&self) -> NaiveDate;
}

impl CalendarSpan for BannerRecord {
    fn start_month(&self) -> NaiveDate {
        month_start(date_from_epoch_ms(self.started_at).unwrap_or(NaiveDate::MIN))
    }

    fn end_month(&self) -> NaiveDate {
        month_start(date_from_epoch_ms(self.ended_at).unwrap_or(NaiveDate::MIN))
    }
}

impl CalendarSpan for EventRecord {
    fn start_month(&self) -> NaiveDate {
        month_start(self.start)
    }

    fn end_month(&self) -> NaiveDate {
        month_start(self.end)
    }
}

/// Monthly revenue table for one region.
///
/// Wraps a polars DataFrame holding one row per month-start date, strictly
/// monotonic with no gaps. The date column is stored as epoch milliseconds.
/// Only the feature builder mutates it, and only by adding columns.
#[derive(Debug, Clone)]
pub struct RevenueFrame {
    /// Data frame containing the monthly rows
    df: DataFrame,
    /// Name of the date column
    date_column: String,
    /// Name of the revenue target column
    target_column: String,
}

impl RevenueFrame {
    /// Wrap an existing DataFrame, validating the named columns exist.
    pub fn new(df: DataFrame, date_column: &str, target_column: &str) -> Result<Self> {
        for name in [date_column, target_column] {
            if df.column(name).is_err() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' not found in revenue data",
                    name
                )));
            }
        }

        Ok(Self {
            df,
            date_column: date_column.to_string(),
            target_column: target_column.to_string(),
        })
    }

    /// Build a frame from parallel date and revenue vectors.
    pub fn from_parts(dates: &[NaiveDate], values: &[f64], target_column: &str) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Got {} dates but {} revenue values",
                dates.len(),
                values.len()
            )));
        }

        let ms: Vec<i64> = dates
            .iter()
            .map(|d| {
                d.and_hms_opt(0, 0, 0)
                    .map(|dt| dt.timestamp_millis())
                    .unwrap_or_default()
            })
            .collect();
        let date_series = Series::new("date", ms);
        let value_series = Series::new(target_column, values.to_vec());
        let df = DataFrame::new(vec![date_series, value_series])?;

        Self::new(df, "date", target_column)
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the date column name
    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Get the target column name
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Number of monthly rows
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Month-start dates of every row, in order.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let col = self.df.column(&self.date_column)?;
        col.i64()?
            .into_iter()
            .flatten()
            .map(date_from_epoch_ms)
            .collect()
    }

    /// The revenue target as a vector.
    pub fn target(&self) -> Result<Vec<f64>> {
        self.column_as_f64(&self.target_column)
    }

    /// Names of every column except the date and target columns.
    pub fn feature_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .filter(|name| **name != self.date_column && **name != self.target_column)
            .map(|name| name.to_string())
            .collect()
    }

    /// Append a feature column. The series must match the row count.
    pub fn with_column(&mut self, series: Series) -> Result<()> {
        if !self.df.is_empty() && series.len() != self.df.height() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} rows, table has {}",
                series.name(),
                series.len(),
                self.df.height()
            )));
        }
        self.df.with_column(series)?;
        Ok(())
    }

    /// Get a column as f64 values
    pub fn column_as_f64(&self, column_name: &str) -> Result<Vec<f64>> {
        column_as_f64(&self.df, column_name)
    }
}

/// Read a numeric DataFrame column as f64, widening integer types.
pub fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
    let col = df.column(column_name).map_err(|e| {
        ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
    })?;

    match col.dtype() {
        DataType::Float64 => Ok(col.f64().unwrap().into_iter().flatten().collect()),
        DataType::Float32 => Ok(col
            .f32()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect()),
        DataType::Int64 => Ok(col
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect()),
        DataType::Int32 => Ok(col
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect()),
        DataType::UInt64 => Ok(col
            .u64()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect()),
        DataType::UInt32 => Ok(col
            .u32()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect()),
        _ => Err(ForecastError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            column_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(month_start(date(2021, 2, 25)), date(2021, 2, 1));
        assert_eq!(next_month_start(date(2021, 12, 5)), date(2022, 1, 1));

        let index = monthly_index(date(2021, 11, 1), 3);
        assert_eq!(index, vec![date(2021, 11, 1), date(2021, 12, 1), date(2022, 1, 1)]);
    }

    #[test]
    fn test_from_parts_round_trip() {
        let dates = monthly_index(date(2021, 1, 1), 4);
        let values = vec![1.0e6, 2.0e6, 3.0e6, 4.0e6];

        let frame = RevenueFrame::from_parts(&dates, &values, "jp").unwrap();
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.dates().unwrap(), dates);
        assert_eq!(frame.target().unwrap(), values);
        assert!(frame.feature_columns().is_empty());
    }

    #[test]
    fn test_with_column_rejects_wrong_length() {
        let dates = monthly_index(date(2021, 1, 1), 3);
        let mut frame = RevenueFrame::from_parts(&dates, &[1.0, 2.0, 3.0], "jp").unwrap();

        let bad = Series::new("extra", vec![1.0, 2.0]);
        assert!(frame.with_column(bad).is_err());
    }

    #[test]
    fn test_banner_span_months() {
        let banner = BannerRecord {
            id: 50011,
            gacha_type: GachaType::PickupGacha,
            started_at: 1614234600000, // 2021-02-25
            ended_at: 1615435200000,   // 2021-03-11
            rateups: vec!["Izuna".to_string(), "Shizuko".to_string()],
        };

        assert_eq!(banner.start_month(), date(2021, 2, 1));
        assert_eq!(banner.end_month(), date(2021, 3, 1));
    }
}
