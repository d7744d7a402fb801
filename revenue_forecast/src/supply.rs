//! Upstream table suppliers: exported spreadsheets and the banner feed
//!
//! The banner supplier is an explicit two-step function of the fetch
//! outcome: a usable payload refreshes the snapshot and is returned; any
//! fetch or parse failure falls back to the last-known-good snapshot.
//! Core stages never see a fetch failure.

use crate::data::{BannerRecord, EventRecord, GachaType};
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One raw row of the exported monthly revenue report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    /// Month-start date
    pub date: NaiveDate,
    /// JP-region revenue, absent for months without a report
    pub jp: Option<f64>,
    /// Global-region revenue, unused by the JP pipeline
    pub global: Option<f64>,
}

/// Load the exported revenue report from a CSV file.
pub fn load_revenue_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RevenueRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Load an event sheet from a CSV file.
pub fn load_events_csv<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut events = Vec::new();
    for record in reader.deserialize() {
        events.push(record?);
    }
    Ok(events)
}

/// One banner as the feed reports it. The category arrives as a free
/// string label and is mapped when the record is built.
#[derive(Debug, Deserialize)]
struct FeedBanner {
    id: u64,
    #[serde(rename = "gachaType")]
    gacha_type: String,
    #[serde(rename = "startedAt")]
    started_at: i64,
    #[serde(rename = "endedAt")]
    ended_at: i64,
    #[serde(default)]
    rateups: Vec<String>,
}

/// The banner feed payload: past, running and announced banners.
#[derive(Debug, Deserialize)]
struct BannerFeed {
    #[serde(default)]
    ended: Vec<FeedBanner>,
    #[serde(default)]
    current: Vec<FeedBanner>,
    #[serde(default)]
    upcoming: Vec<FeedBanner>,
}

/// Parse a banner feed JSON payload into records ordered by start instant.
pub fn banners_from_feed(payload: &str) -> Result<Vec<BannerRecord>> {
    let feed: BannerFeed = serde_json::from_str(payload)?;

    let mut banners: Vec<BannerRecord> = feed
        .ended
        .into_iter()
        .chain(feed.current)
        .chain(feed.upcoming)
        .map(|b| BannerRecord {
            id: b.id,
            gacha_type: GachaType::from_feed_label(&b.gacha_type),
            started_at: b.started_at,
            ended_at: b.ended_at,
            rateups: b.rateups,
        })
        .collect();

    banners.sort_by_key(|b| b.started_at);
    Ok(banners)
}

/// Read the last-known-good banner snapshot.
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<BannerRecord>> {
    let file = File::open(path)?;
    let banners = serde_json::from_reader(BufReader::new(file))?;
    Ok(banners)
}

/// Persist banners as the new last-known-good snapshot.
pub fn write_snapshot<P: AsRef<Path>>(path: P, banners: &[BannerRecord]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), banners)?;
    Ok(())
}

/// Supply banner records from a fetch attempt with snapshot fallback.
///
/// `fetch` produces the raw feed payload. A payload that fetches and
/// parses refreshes the snapshot and is returned; otherwise the snapshot
/// is read instead, so downstream stages always get a valid table.
pub fn load_banners<P, F>(fetch: F, snapshot: P) -> Result<Vec<BannerRecord>>
where
    P: AsRef<Path>,
    F: FnOnce() -> std::io::Result<String>,
{
    let fetched = fetch().ok().and_then(|payload| banners_from_feed(&payload).ok());

    match fetched {
        Some(banners) => {
            write_snapshot(snapshot, &banners)?;
            Ok(banners)
        }
        None => read_snapshot(snapshot),
    }
}
