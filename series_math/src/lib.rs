//! # Series Math
//!
//! Mathematical building blocks for monthly time-series modelling.
//! This crate provides rolling-window statistics, lag shifts and
//! least-squares fitting used by the forecasting pipeline.

use thiserror::Error;

pub mod lags;
pub mod regression;
pub mod rolling;

/// Errors that can occur in series calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
