//! # Revenue Forecast
//!
//! A Rust library for forecasting monthly regional revenue of a mobile
//! gacha game from its event calendars.
//!
//! ## Features
//!
//! - Monthly revenue tables joined with banner/event calendars
//! - Calendar features: annual Fourier terms and monthly event counts
//! - Two-stage model: a spline trend plus a gradient-boosted residual
//!   correction, combined into a 6-month forecast
//! - Fixed-horizon train/test protocol with accuracy metrics
//! - JSON persistence for both model artifacts and the forecast document
//!
//! ## Quick Start
//!
//! ```no_run
//! use revenue_forecast::cleaning::{clean_events, revenue_from_rows};
//! use revenue_forecast::features::build_feature_table;
//! use revenue_forecast::pipeline::{run_pipeline, save_artifacts, PipelineConfig};
//! use revenue_forecast::supply;
//!
//! fn main() -> revenue_forecast::error::Result<()> {
//!     // Load supplier tables
//!     let rows = supply::load_revenue_csv("data/monthly-revenue.csv")?;
//!     let revenue = revenue_from_rows(&rows, "jp")?;
//!     let banners = supply::read_snapshot("data/fixtures/banners_jp.json")?;
//!     let events = clean_events(supply::load_events_csv("data/event-jp.csv")?);
//!
//!     // Build features and fit the two-stage pipeline
//!     let table = build_feature_table(revenue, &banners, &events)?;
//!     let outcome = run_pipeline(&table, &PipelineConfig::default())?;
//!
//!     // Persist the model and forecast artifacts
//!     save_artifacts(&outcome, "data/results")?;
//!     Ok(())
//! }
//! ```

pub mod cleaning;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod residual;
pub mod split;
pub mod supply;

// Re-export commonly used types
pub use crate::data::{BannerRecord, EventRecord, GachaType, RevenueFrame};
pub use crate::error::ForecastError;
pub use crate::features::{EventCategory, FeatureId, TimeIndex};
pub use crate::models::{FeatureMatrix, Regressor};
pub use crate::pipeline::{Forecast, PipelineConfig, PipelineOutcome};
pub use crate::split::FORECAST_HORIZON;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
