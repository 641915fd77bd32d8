//! Ingest pipeline: one sequential stamp → buffer → persist → broadcast
//! pass per inbound sample.
//!
//! The pipeline is the single writer to the live window, so samples are
//! processed strictly one at a time. A persistence failure is logged and
//! the broadcast still goes out; the live path never waits on storage
//! health.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use vayu_connectors_mqtt::{SensorSample, SensorStream};
use vayu_core::ReadingWindow;
use vayu_models::{Reading, ServerEvent, StoredReading};
use vayu_store::{StoreError, TelemetryStore};

/// Storage side of the ingest path.
pub trait HistorySink {
    fn persist(&self, reading: &Reading) -> Result<StoredReading, StoreError>;
}

impl HistorySink for TelemetryStore {
    fn persist(&self, reading: &Reading) -> Result<StoredReading, StoreError> {
        self.write(reading)
    }
}

impl<S: HistorySink + ?Sized> HistorySink for Arc<S> {
    fn persist(&self, reading: &Reading) -> Result<StoredReading, StoreError> {
        (**self).persist(reading)
    }
}

/// The ingest loop's state: the window it writes, the sink it appends
/// to, the viewer channel it broadcasts on, and the last stamp issued.
pub struct IngestPipeline<S> {
    window: Arc<ReadingWindow>,
    sink: S,
    events: broadcast::Sender<ServerEvent>,
    last_stamp: Option<DateTime<Utc>>,
}

impl<S: HistorySink> IngestPipeline<S> {
    pub fn new(
        window: Arc<ReadingWindow>,
        sink: S,
        events: broadcast::Sender<ServerEvent>,
    ) -> Self {
        Self {
            window,
            sink,
            events,
            last_stamp: None,
        }
    }

    /// Consume the sensor stream until the task is dropped.
    pub async fn run(mut self, mut source: SensorStream) {
        loop {
            let sample = source.next_sample().await;
            self.ingest(sample);
        }
    }

    /// Apply one decoded sample: stamp, buffer, persist, broadcast.
    fn ingest(&mut self, sample: SensorSample) {
        let reading = Reading::new(sample.temperature, sample.humidity, self.next_stamp());

        self.window.append(&reading);

        if let Err(err) = self.sink.persist(&reading) {
            warn!(error = %err, "persist failed, live path continues");
        }

        // A send with no attached viewers is not an error.
        let _ = self.events.send(ServerEvent::update(self.window.snapshot()));

        debug!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            "ingested sample"
        );
    }

    /// Ingest timestamps never run backwards, even if the wall clock
    /// does.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let mut stamp = Utc::now();
        if let Some(last) = self.last_stamp {
            stamp = stamp.max(last);
        }
        self.last_stamp = Some(stamp);
        stamp
    }
}
