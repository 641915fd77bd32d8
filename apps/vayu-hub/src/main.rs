//! # Vayu Hub
//!
//! MQTT sensor telemetry hub: ingests temperature/humidity readings,
//! keeps a bounded live window, persists history to SQLite, and streams
//! both to WebSocket viewers.

fn main() -> anyhow::Result<()> {
    vayu_runner::run()
}
