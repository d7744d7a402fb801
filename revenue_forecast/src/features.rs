//! Feature construction: Fourier seasonal terms and monthly event counts
//!
//! Features are addressed through structured [`FeatureId`] records rather
//! than string literals; the identifier generates the column name, so a
//! drop list names a harmonic or event category, not a string.

use crate::data::{BannerRecord, CalendarSpan, EventRecord, GachaType, RevenueFrame};
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::HashMap;

/// Annual-cycle harmonics generated by the feature builder.
pub const ANNUAL_HARMONICS: u8 = 4;

/// Event/banner categories tallied into monthly count features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    FesBanner,
    PickupBanner,
    LimitedBanner,
    OriginalEvent,
    RerunEvent,
    CollaborationEvent,
    OperationEvent,
}

impl EventCategory {
    /// Column name of this category's monthly count feature.
    pub fn column_name(&self) -> &'static str {
        match self {
            EventCategory::FesBanner => "fes_banner_count",
            EventCategory::PickupBanner => "pickup_banner_count",
            EventCategory::LimitedBanner => "limited_banner_count",
            EventCategory::OriginalEvent => "original_event_count",
            EventCategory::RerunEvent => "rerun_event_count",
            EventCategory::CollaborationEvent => "collaboration_event_count",
            EventCategory::OperationEvent => "operation_event_count",
        }
    }

    /// Category of a gacha banner, if we model its type.
    pub fn from_gacha_type(gacha_type: GachaType) -> Option<Self> {
        match gacha_type {
            GachaType::FesGacha => Some(EventCategory::FesBanner),
            GachaType::PickupGacha => Some(EventCategory::PickupBanner),
            GachaType::LimitedGacha => Some(EventCategory::LimitedBanner),
            GachaType::Other => None,
        }
    }

    /// Category of an event note. Unrecognized notes have no category and
    /// the event is left out of every count.
    pub fn from_note(note: &str) -> Option<Self> {
        let lower = note.to_lowercase();
        match lower.as_str() {
            "original" => Some(EventCategory::OriginalEvent),
            "rerun" => Some(EventCategory::RerunEvent),
            "operation" => Some(EventCategory::OperationEvent),
            _ if lower.contains("collab") => Some(EventCategory::CollaborationEvent),
            _ => None,
        }
    }

    /// Banner categories, in feature-table column order.
    pub fn banner_categories() -> [EventCategory; 3] {
        [
            EventCategory::FesBanner,
            EventCategory::PickupBanner,
            EventCategory::LimitedBanner,
        ]
    }

    /// Event-note categories, in feature-table column order.
    pub fn event_categories() -> [EventCategory; 4] {
        [
            EventCategory::OriginalEvent,
            EventCategory::RerunEvent,
            EventCategory::CollaborationEvent,
            EventCategory::OperationEvent,
        ]
    }
}

/// Structured identifier for a generated feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureId {
    /// Sine term of the annual cycle at the given harmonic
    AnnualSin(u8),
    /// Cosine term of the annual cycle at the given harmonic
    AnnualCos(u8),
    /// Monthly count of one event/banner category
    EventCount(EventCategory),
    /// Target value from the given number of months earlier
    Lag(usize),
    /// Trailing standard deviation of the shifted target over a window
    RollingStd(usize),
}

impl FeatureId {
    /// Column name this feature is materialized under.
    pub fn column_name(&self) -> String {
        match self {
            FeatureId::AnnualSin(k) => format!("annual_sin{}", k),
            FeatureId::AnnualCos(k) => format!("annual_cos{}", k),
            FeatureId::EventCount(category) => category.column_name().to_string(),
            FeatureId::Lag(periods) => format!("lag{}", periods),
            FeatureId::RollingStd(window) => format!("rolling_std_{}", window),
        }
    }
}

/// Deterministic time-index process over the monthly index.
///
/// Generates the linear trend term anchored to the training range:
/// in-sample positions are 1..=n, and out-of-sample positions continue
/// the count, so a fitted trend extrapolates on the same axis.
#[derive(Debug, Clone, Copy)]
pub struct TimeIndex {
    len: usize,
}

impl TimeIndex {
    /// Time index over `len` in-sample periods.
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    /// Number of in-sample periods
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index covers no periods
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// In-sample positions 1..=n.
    pub fn in_sample(&self) -> Vec<f64> {
        (1..=self.len).map(|i| i as f64).collect()
    }

    /// The next `steps` positions after the in-sample range.
    pub fn out_of_sample(&self, steps: usize) -> Vec<f64> {
        (self.len + 1..=self.len + steps).map(|i| i as f64).collect()
    }
}

/// Fraction of the year elapsed at `date`: 0 on January 1st.
fn year_fraction(date: NaiveDate) -> f64 {
    let days_in_year = NaiveDate::from_ymd_opt(date.year(), 12, 31)
        .unwrap()
        .ordinal() as f64;
    (date.ordinal() - 1) as f64 / days_in_year
}

/// Sine/cosine pairs of the annual cycle for harmonics 1..=`harmonics`.
pub fn annual_fourier_terms(
    dates: &[NaiveDate],
    harmonics: u8,
) -> Vec<(FeatureId, Vec<f64>)> {
    let fractions: Vec<f64> = dates.iter().map(|d| year_fraction(*d)).collect();

    let mut terms = Vec::with_capacity(2 * harmonics as usize);
    for k in 1..=harmonics {
        let angle = |frac: f64| std::f64::consts::TAU * k as f64 * frac;
        terms.push((
            FeatureId::AnnualSin(k),
            fractions.iter().map(|f| angle(*f).sin()).collect(),
        ));
        terms.push((
            FeatureId::AnnualCos(k),
            fractions.iter().map(|f| angle(*f).cos()).collect(),
        ));
    }
    terms
}

/// Tally records into per-month counts aligned to `index`.
///
/// A record whose start and end fall in the same month increments that
/// month once; otherwise the start month and the end month each increment
/// once. Interior months of a longer span are untouched, and months not
/// present in the index are silently ignored.
pub fn monthly_counts<S: CalendarSpan>(records: &[S], index: &[NaiveDate]) -> Vec<u32> {
    let positions: HashMap<NaiveDate, usize> = index
        .iter()
        .enumerate()
        .map(|(pos, month)| (*month, pos))
        .collect();

    let mut counts = vec![0u32; index.len()];
    for record in records {
        let start = record.start_month();
        let end = record.end_month();

        if let Some(&pos) = positions.get(&start) {
            counts[pos] += 1;
        }
        if end != start {
            if let Some(&pos) = positions.get(&end) {
                counts[pos] += 1;
            }
        }
    }
    counts
}

/// Append one category's monthly count column to the revenue table.
pub fn add_count_feature<S: CalendarSpan>(
    frame: &mut RevenueFrame,
    category: EventCategory,
    records: &[S],
) -> Result<()> {
    let index = frame.dates()?;
    let counts = monthly_counts(records, &index);
    let name = FeatureId::EventCount(category).column_name();
    frame.with_column(Series::new(&name, counts))
}

/// Append sine/cosine annual terms for harmonics 1..=`harmonics`.
pub fn add_fourier_features(frame: &mut RevenueFrame, harmonics: u8) -> Result<()> {
    let dates = frame.dates()?;
    for (id, values) in annual_fourier_terms(&dates, harmonics) {
        frame.with_column(Series::new(&id.column_name(), values))?;
    }
    Ok(())
}

/// Assemble the full feature table from a revenue series and its calendars.
///
/// Banner counts come first (fes, pickup, limited), then event-note counts
/// (original, rerun, collaboration, operation), then the Fourier terms.
pub fn build_feature_table(
    mut frame: RevenueFrame,
    banners: &[BannerRecord],
    events: &[EventRecord],
) -> Result<RevenueFrame> {
    for category in EventCategory::banner_categories() {
        let selected: Vec<BannerRecord> = banners
            .iter()
            .filter(|b| EventCategory::from_gacha_type(b.gacha_type) == Some(category))
            .cloned()
            .collect();
        add_count_feature(&mut frame, category, &selected)?;
    }

    for category in EventCategory::event_categories() {
        let selected: Vec<EventRecord> = events
            .iter()
            .filter(|e| {
                e.note
                    .as_deref()
                    .and_then(EventCategory::from_note)
                    == Some(category)
            })
            .cloned()
            .collect();
        add_count_feature(&mut frame, category, &selected)?;
    }

    add_fourier_features(&mut frame, ANNUAL_HARMONICS)?;
    Ok(frame)
}
