//! WebSocket wire contract between the hub and its viewers.

use serde::{Deserialize, Serialize};

use crate::SeriesFrame;

/// Command token used when a light toggle arrives without a state.
pub const DEFAULT_LIGHT_STATE: &str = "off";

/// Events pushed from the hub to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Fresh live window, oldest-first. Sent on every ingest and once on
    /// attach.
    UpdateData {
        temperature: Vec<f64>,
        humidity: Vec<f64>,
    },

    /// Historical backfill, newest-first. Sent once on attach.
    HistoricalData {
        temperature: Vec<f64>,
        humidity: Vec<f64>,
    },

    /// Light command confirmation, broadcast to every viewer.
    LightState { state: String },
}

impl ServerEvent {
    pub fn update(frame: SeriesFrame) -> Self {
        ServerEvent::UpdateData {
            temperature: frame.temperature,
            humidity: frame.humidity,
        }
    }

    pub fn historical(frame: SeriesFrame) -> Self {
        ServerEvent::HistoricalData {
            temperature: frame.temperature,
            humidity: frame.humidity,
        }
    }
}

/// Events sent by a viewer to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ViewerEvent {
    /// Light toggle request; a missing state means `"off"`.
    LightToggle {
        #[serde(default)]
        state: Option<String>,
    },
}
