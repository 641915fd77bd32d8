//! Hub configuration loading.
//!
//! Every component receives its settings from this structure at
//! construction; nothing in the core reads the environment. The broker
//! host is the only required value, everything else has a documented
//! default.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use vayu_connectors_mqtt::BrokerSettings;

/// Root configuration schema for the hub.
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    pub broker: BrokerInfo,
    #[serde(default)]
    pub window: WindowInfo,
    #[serde(default)]
    pub history: HistoryInfo,
    #[serde(default)]
    pub storage: StorageInfo,
    #[serde(default)]
    pub server: ServerInfo,
}

/// MQTT broker endpoint and topics.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerInfo {
    /// Broker hostname or address. Required; loading fails without it.
    pub host: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Inbound sensor topic.
    #[serde(default = "default_sensor_topic")]
    pub sensor_topic: String,

    /// Outbound command topic.
    #[serde(default = "default_command_topic")]
    pub command_topic: String,
}

/// Live window sizing.
#[derive(Debug, Deserialize, Clone)]
pub struct WindowInfo {
    /// Readings retained in memory before the oldest are evicted.
    #[serde(default = "default_window_capacity")]
    pub capacity: usize,
}

/// Join-reconciliation history sizing.
#[derive(Debug, Deserialize, Clone)]
pub struct HistoryInfo {
    /// Stored rows sent to a newly attached viewer.
    #[serde(default = "default_history_limit")]
    pub default_limit: u32,
}

/// Durable storage location.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageInfo {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

/// Viewer-facing server endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerInfo {
    #[serde(default = "default_server_bind")]
    pub bind: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_broker_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "vayu-hub".to_string()
}

fn default_sensor_topic() -> String {
    "iot".to_string()
}

fn default_command_topic() -> String {
    "light_switch".to_string()
}

fn default_window_capacity() -> usize {
    50
}

fn default_history_limit() -> u32 {
    30
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/vayu.db")
}

fn default_server_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5001
}

impl Default for WindowInfo {
    fn default() -> Self {
        Self {
            capacity: default_window_capacity(),
        }
    }
}

impl Default for HistoryInfo {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
        }
    }
}

impl Default for StorageInfo {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            port: default_server_port(),
        }
    }
}

impl HubConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Settings handed to the MQTT connector.
    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            host: self.broker.host.clone(),
            port: self.broker.port,
            client_id: self.broker.client_id.clone(),
            sensor_topic: self.broker.sensor_topic.clone(),
            command_topic: self.broker.command_topic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_applies_defaults() {
        let config: HubConfig = toml::from_str(
            r#"
            [broker]
            host = "broker.local"
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.client_id, "vayu-hub");
        assert_eq!(config.broker.sensor_topic, "iot");
        assert_eq!(config.broker.command_topic, "light_switch");
        assert_eq!(config.window.capacity, 50);
        assert_eq!(config.history.default_limit, 30);
        assert_eq!(config.storage.path, PathBuf::from("data/vayu.db"));
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn full_config_overrides_defaults() {
        let config: HubConfig = toml::from_str(
            r#"
            [broker]
            host = "10.0.0.7"
            port = 8883
            client_id = "hub-2"
            sensor_topic = "sensors/attic"
            command_topic = "actuators/light"

            [window]
            capacity = 30

            [history]
            default_limit = 60

            [storage]
            path = "/var/lib/vayu/telemetry.db"

            [server]
            bind = "127.0.0.1"
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.port, 8883);
        assert_eq!(config.window.capacity, 30);
        assert_eq!(config.history.default_limit, 60);
        assert_eq!(config.server.port, 8080);

        let settings = config.broker_settings();
        assert_eq!(settings.sensor_topic, "sensors/attic");
        assert_eq!(settings.command_topic, "actuators/light");
    }

    #[test]
    fn missing_broker_host_is_rejected() {
        let result = toml::from_str::<HubConfig>(
            r#"
            [broker]
            port = 1883
            "#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("host"), "unexpected error: {err}");
    }

    #[test]
    fn load_reads_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.toml");
        std::fs::write(&path, "[broker]\nhost = \"broker.local\"\n").unwrap();

        let config = HubConfig::load(&path).unwrap();
        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.window.capacity, 50);
    }

    #[test]
    fn load_reports_missing_file_with_path() {
        let err = HubConfig::load(Path::new("/nonexistent/hub.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/hub.toml"));
    }
}
