//! Integration tests for the history query surface.
//!
//! These tests verify that:
//! 1. Range cutoffs select the right rows at a fixed reference instant
//! 2. Results come back newest-first
//! 3. Row limits cap the result set, and `all` disables the cap
//! 4. The store survives reopening the same database file

use chrono::{DateTime, Utc};
use vayu_models::time::parse_rfc3339_utc;
use vayu_models::{HistoryRange, Reading, RowLimit};
use vayu_store::TelemetryStore;

const NOW: &str = "2026-08-04T15:30:00Z";

fn ts(raw: &str) -> DateTime<Utc> {
    parse_rfc3339_utc(raw).unwrap()
}

/// Seed one row per bucket: 10 minutes ago, 3 hours ago, 2 days ago,
/// 10 days ago, 40 days ago.
fn seeded_store() -> TelemetryStore {
    let store = TelemetryStore::open_in_memory().unwrap();
    let rows = [
        (25.0, "2026-08-04T15:20:00Z"),
        (24.0, "2026-08-04T12:30:00Z"),
        (23.0, "2026-08-02T15:30:00Z"),
        (22.0, "2026-07-25T15:30:00Z"),
        (21.0, "2026-06-25T15:30:00Z"),
    ];
    for (temperature, at) in rows {
        store
            .write(&Reading::new(temperature, 50.0, ts(at)))
            .unwrap();
    }
    store
}

#[test]
fn last_hour_selects_only_fresh_rows() {
    let store = seeded_store();
    let rows = store
        .query_at(HistoryRange::LastHour, RowLimit::All, ts(NOW))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].temperature, 25.0);
}

#[test]
fn today_selects_rows_since_utc_midnight() {
    let store = seeded_store();
    let rows = store
        .query_at(HistoryRange::Today, RowLimit::All, ts(NOW))
        .unwrap();
    let temps: Vec<f64> = rows.iter().map(|r| r.temperature).collect();
    assert_eq!(temps, vec![25.0, 24.0]);
}

#[test]
fn seven_days_is_newest_first_and_unbounded_with_all() {
    let store = seeded_store();
    let rows = store
        .query_at(HistoryRange::Last7Days, RowLimit::All, ts(NOW))
        .unwrap();
    let temps: Vec<f64> = rows.iter().map(|r| r.temperature).collect();
    assert_eq!(temps, vec![25.0, 24.0, 23.0]);
}

#[test]
fn thirty_days_excludes_older_rows() {
    let store = seeded_store();
    let rows = store
        .query_at(HistoryRange::Last30Days, RowLimit::All, ts(NOW))
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.temperature >= 22.0));
}

#[test]
fn row_limit_caps_the_result_set() {
    let store = seeded_store();
    let rows = store
        .query_at(HistoryRange::Last30Days, RowLimit::Rows(2), ts(NOW))
        .unwrap();
    let temps: Vec<f64> = rows.iter().map(|r| r.temperature).collect();
    assert_eq!(temps, vec![25.0, 24.0]);
}

#[test]
fn ties_on_timestamp_order_by_id_descending() {
    let store = TelemetryStore::open_in_memory().unwrap();
    let at = ts("2026-08-04T15:00:00Z");
    let first = store.write(&Reading::new(20.0, 50.0, at)).unwrap();
    let second = store.write(&Reading::new(21.0, 51.0, at)).unwrap();

    let rows = store
        .query_at(HistoryRange::LastHour, RowLimit::All, ts(NOW))
        .unwrap();
    assert_eq!(rows[0].id, second.id);
    assert_eq!(rows[1].id, first.id);
}

#[test]
fn reopening_preserves_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemetry.db");

    {
        let store = TelemetryStore::open(&path).unwrap();
        store
            .write(&Reading::new(20.0, 50.0, ts("2026-08-04T15:20:00Z")))
            .unwrap();
    }

    let reopened = TelemetryStore::open(&path).unwrap();
    let rows = reopened.recent(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].temperature, 20.0);
    assert_eq!(rows[0].recorded_at, ts("2026-08-04T15:20:00Z"));
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/data/telemetry.db");
    let store = TelemetryStore::open(&path).unwrap();
    assert!(store.recent(1).unwrap().is_empty());
}
