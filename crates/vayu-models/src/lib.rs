//! # Vayu Models
//!
//! Canonical domain types and wire contracts shared across the hub.
//!
//! ## Contents
//! - `Reading` / `StoredReading`: one sensor sample, in memory and at rest
//! - `SeriesFrame`: the parallel-array payload pushed to viewers
//! - `wire`: serde-tagged WebSocket event envelopes
//! - `query`: history range and row-limit token parsing
//! - `time`: RFC 3339 timestamp helpers used by storage and tests
//!
//! ## Isolation
//! This crate has no transport, storage, or runtime dependencies. Every
//! other crate in the workspace depends on it; it depends on none of them.

pub mod query;
pub mod time;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use query::{HistoryRange, RowLimit};
pub use wire::{ServerEvent, ViewerEvent};

/// One decoded temperature/humidity sample with its ingest-assigned
/// timestamp. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Assigned at ingest; monotonically non-decreasing across accepted
    /// readings (the pipeline clamps against the previous timestamp).
    pub received_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, received_at: DateTime<Utc>) -> Self {
        Self {
            temperature,
            humidity,
            received_at,
        }
    }
}

/// A persisted reading as returned by history queries. Rows are append-only;
/// `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Parallel temperature/humidity arrays, index-aligned to the same sample.
///
/// Used both for live window snapshots (oldest-first) and historical
/// backfill (newest-first, as queried). The two vectors always have equal
/// length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesFrame {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
}

impl SeriesFrame {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            temperature: Vec::with_capacity(capacity),
            humidity: Vec::with_capacity(capacity),
        }
    }

    /// Build a frame from stored rows, preserving their order.
    pub fn from_rows(rows: &[StoredReading]) -> Self {
        let mut frame = Self::with_capacity(rows.len());
        for row in rows {
            frame.temperature.push(row.temperature);
            frame.humidity.push(row.humidity);
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}
