use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use revenue_forecast::cleaning::revenue_from_rows;
use revenue_forecast::data::{BannerRecord, GachaType};
use revenue_forecast::supply::{
    banners_from_feed, load_banners, load_events_csv, load_revenue_csv, read_snapshot,
    write_snapshot,
};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const FEED: &str = r#"{
    "ended": [
        {"id": 50004, "gachaType": "PickupGacha", "startedAt": 1612425600000, "endedAt": 1613023199000, "rateups": ["Shiroko"]},
        {"id": 50900, "gachaType": "FesGacha", "startedAt": 1615091400000, "endedAt": 1619668800000}
    ],
    "current": [],
    "upcoming": []
}"#;

fn snapshot_banner() -> BannerRecord {
    BannerRecord {
        id: 1,
        gacha_type: GachaType::LimitedGacha,
        started_at: 1600000000000,
        ended_at: 1600600000000,
        rateups: Vec::new(),
    }
}

#[test]
fn test_load_revenue_csv_with_missing_months() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,jp,global").unwrap();
    writeln!(file, "2021-01-01,2500000,1200000").unwrap();
    writeln!(file, "2021-02-01,,800000").unwrap();
    writeln!(file, "2021-03-01,2700000,").unwrap();
    file.flush().unwrap();

    let rows = load_revenue_csv(file.path()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].jp, Some(2500000.0));
    assert_eq!(rows[1].jp, None);
    assert_eq!(rows[2].global, None);

    // The frame keeps only months with a JP figure
    let frame = revenue_from_rows(&rows, "jp").unwrap();
    assert_eq!(frame.height(), 2);
    assert_eq!(
        frame.dates().unwrap(),
        vec![
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
        ]
    );
}

#[test]
fn test_load_events_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "name_en,name_jp,start,end,note").unwrap();
    writeln!(
        file,
        "Catch in Neverland,ネバーランドでつかまえて,2021-08-26,2021-09-09,Original"
    )
    .unwrap();
    writeln!(
        file,
        "(Rerun) Summer Sky's Wishlist,夏空のウィッシュリスト,2022-06-30,2022-07-15,"
    )
    .unwrap();
    file.flush().unwrap();

    let events = load_events_csv(file.path()).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].note.as_deref(), Some("Original"));
    assert_eq!(events[0].end, NaiveDate::from_ymd_opt(2021, 9, 9).unwrap());
    assert_eq!(events[1].note, None);
}

#[test]
fn test_load_banners_uses_fresh_feed_and_refreshes_snapshot() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("banners.json");
    write_snapshot(&snapshot, &[snapshot_banner()]).unwrap();

    let banners = load_banners(|| Ok(FEED.to_string()), &snapshot).unwrap();
    assert_eq!(banners.len(), 2);
    assert_eq!(banners[0].id, 50004);

    // The snapshot now holds the fresh feed, not the stale banner
    let refreshed = read_snapshot(&snapshot).unwrap();
    assert_eq!(refreshed, banners);
}

#[test]
fn test_load_banners_falls_back_on_fetch_failure() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("banners.json");
    write_snapshot(&snapshot, &[snapshot_banner()]).unwrap();

    let banners = load_banners(
        || Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "feed down")),
        &snapshot,
    )
    .unwrap();

    assert_eq!(banners, vec![snapshot_banner()]);
}

#[test]
fn test_load_banners_falls_back_on_malformed_payload() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("banners.json");
    write_snapshot(&snapshot, &[snapshot_banner()]).unwrap();

    let banners = load_banners(|| Ok("not json at all".to_string()), &snapshot).unwrap();
    assert_eq!(banners, vec![snapshot_banner()]);
}

#[test]
fn test_load_banners_errors_without_feed_or_snapshot() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("missing.json");

    let result = load_banners(
        || Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "feed down")),
        &snapshot,
    );
    assert!(result.is_err());
}

#[test]
fn test_feed_buckets_are_concatenated() {
    let payload = r#"{
        "ended": [{"id": 2, "gachaType": "PickupGacha", "startedAt": 200, "endedAt": 300}],
        "current": [{"id": 1, "gachaType": "FesGacha", "startedAt": 100, "endedAt": 400}],
        "upcoming": [{"id": 3, "gachaType": "LimitedGacha", "startedAt": 500, "endedAt": 600}]
    }"#;

    let banners = banners_from_feed(payload).unwrap();
    let ids: Vec<u64> = banners.iter().map(|b| b.id).collect();
    // Ordered by start instant across all three buckets
    assert_eq!(ids, vec![1, 2, 3]);
}
