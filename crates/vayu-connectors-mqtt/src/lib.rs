//! # Vayu MQTT Connector
//!
//! Transport layer between the hub and the MQTT broker: a resilient
//! inbound sensor stream on one topic and an outbound command publisher
//! on another.
//!
//! The stream owns the client event loop. Connection errors are retried
//! with exponential backoff and the subscription is re-established on
//! every ConnAck, so callers only ever see decoded samples.

pub mod decode;

pub use decode::{decode_payload, DecodeError, SensorSample};

use std::time::Duration;

use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Packet, QoS};
use thiserror::Error;
use tracing::{info, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(5);
const EVENT_CHANNEL_CAPACITY: usize = 10;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Broker connection settings, supplied by the caller's config layer.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub sensor_topic: String,
    pub command_topic: String,
}

/// An outbound command publish that the broker connection refused.
#[derive(Debug, Error)]
#[error("command publish on {topic:?} failed: {source}")]
pub struct PublishError {
    topic: String,
    #[source]
    source: ClientError,
}

/// Open the broker connection, returning the inbound stream and the
/// outbound publisher that shares its client.
pub fn connect(settings: &BrokerSettings) -> (SensorStream, CommandPublisher) {
    let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
    options.set_keep_alive(KEEP_ALIVE);

    let (client, eventloop) = AsyncClient::new(options, EVENT_CHANNEL_CAPACITY);
    let publisher = CommandPublisher {
        client: client.clone(),
        topic: settings.command_topic.clone(),
    };
    let stream = SensorStream {
        client,
        eventloop,
        topic: settings.sensor_topic.clone(),
        backoff: INITIAL_BACKOFF,
    };
    (stream, publisher)
}

/// Inbound sensor stream over a single MQTT topic.
pub struct SensorStream {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
    backoff: Duration,
}

impl SensorStream {
    /// The next decoded sample. Malformed payloads are logged and
    /// skipped; transport errors are retried and never surface here.
    pub async fn next_sample(&mut self) -> SensorSample {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(topic = %self.topic, "connected to broker, subscribing");
                    self.backoff = INITIAL_BACKOFF;
                    if let Err(err) = self.client.subscribe(&self.topic, QoS::AtLeastOnce).await {
                        warn!(error = %err, "subscribe request failed");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match decode::decode_payload(&publish.payload) {
                        Ok(sample) => return sample,
                        Err(err) => warn!(error = %err, "dropping undecodable payload"),
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        error = %err,
                        backoff_secs = self.backoff.as_secs(),
                        "broker connection error, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                    self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }
}

/// Outbound command publisher sharing the stream's client.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    client: AsyncClient,
    topic: String,
}

impl CommandPublisher {
    /// Publish a plain command token on the outbound topic.
    pub async fn publish_state(&self, state: &str) -> Result<(), PublishError> {
        self.client
            .publish(&self.topic, QoS::AtLeastOnce, false, state.to_string())
            .await
            .map_err(|source| PublishError {
                topic: self.topic.clone(),
                source,
            })
    }
}
