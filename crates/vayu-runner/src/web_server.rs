//! Viewer-facing web server: WebSocket fan-out, join reconciliation,
//! command relay, and the HTTP history/health surface.
//!
//! Each connected viewer gets its own broadcast receiver and forwarding
//! task, so a failed send ends that viewer's connection only. On attach,
//! the joining socket alone receives the live window and a historical
//! backfill; shared state is never mutated by a join.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use vayu_connectors_mqtt::CommandPublisher;
use vayu_core::ReadingWindow;
use vayu_models::{
    wire::DEFAULT_LIGHT_STATE, HistoryRange, RowLimit, SeriesFrame, ServerEvent, ViewerEvent,
};
use vayu_store::TelemetryStore;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Shared server state for viewer broadcasting.
pub struct HubState {
    /// Broadcast channel feeding every connected viewer.
    pub events: broadcast::Sender<ServerEvent>,

    /// Live window, written only by the ingest pipeline.
    pub window: Arc<ReadingWindow>,

    /// Durable history, shared with the ingest pipeline.
    pub store: Arc<TelemetryStore>,

    /// Outbound command topic.
    pub commands: CommandPublisher,

    /// Rows sent as historical backfill when a viewer attaches.
    pub history_limit: u32,
}

impl HubState {
    pub fn new(
        window: Arc<ReadingWindow>,
        store: Arc<TelemetryStore>,
        commands: CommandPublisher,
        history_limit: u32,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            events,
            window,
            store,
            commands,
            history_limit,
        }
    }

    /// Push an event to every attached viewer. A send with no viewers is
    /// not an error.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}

/// Start the viewer-facing web server.
pub async fn start_server(state: Arc<HubState>, bind: &str, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/history", get(history_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind, port)).await?;
    info!("Viewer server listening on {}", listener.local_addr()?);
    info!("  WebSocket: ws://localhost:{}/ws", port);
    info!("  Health:    http://localhost:{}/health", port);
    info!("  History:   http://localhost:{}/history", port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "vayu-hub",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    range: Option<String>,
    limit: Option<String>,
}

/// History query surface consumed by the reporting view. Unrecognized
/// tokens fall back to their defaults rather than erroring.
async fn history_handler(
    State(state): State<Arc<HubState>>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let range = HistoryRange::parse(params.range.as_deref().unwrap_or(""));
    let limit = RowLimit::parse(params.limit.as_deref().unwrap_or(""));

    match state.store.query(range, limit) {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => {
            warn!(error = %err, range = range.as_token(), "history query failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable").into_response()
        }
    }
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<HubState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual viewer connection.
async fn handle_socket(mut socket: WebSocket, state: Arc<HubState>) {
    info!("viewer connected");

    // Subscribe before reconciliation so no update broadcast between the
    // join frames and the forwarding loop is missed.
    let mut rx = state.events.subscribe();

    for event in join_frames(&state) {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(err) => {
                debug!(error = %err, "failed to encode join frame");
                continue;
            }
        };
        if socket.send(Message::Text(json)).await.is_err() {
            debug!("viewer dropped during join reconciliation");
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();

    // Forward broadcast events to this viewer's socket.
    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(_) => continue,
            };
            if sender.send(Message::Text(json)).await.is_err() {
                debug!("viewer send failed, disconnecting");
                break;
            }
        }
    });

    // Relay commands coming back from this viewer.
    let relay_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(Message::Text(text))) = receiver.next().await {
            match serde_json::from_str::<ViewerEvent>(&text) {
                Ok(ViewerEvent::LightToggle { state }) => {
                    relay_command(&relay_state, state).await;
                }
                Err(err) => {
                    debug!(error = %err, "ignoring unparseable viewer message");
                }
            }
        }
    });

    // Either task ending means the viewer is gone; dropping the receiver
    // prunes it from the fan-out.
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            info!("viewer disconnected (send task ended)");
        }
        _ = (&mut recv_task) => {
            send_task.abort();
            info!("viewer disconnected (recv task ended)");
        }
    }
}

/// Reconciliation frames for a newly attached viewer: the live window
/// plus a historical backfill, newest-first. If the history query fails,
/// the backfill is skipped and the live path stays up.
fn join_frames(state: &HubState) -> Vec<ServerEvent> {
    let mut frames = vec![ServerEvent::update(state.window.snapshot())];

    match state.store.recent(state.history_limit) {
        Ok(rows) => frames.push(ServerEvent::historical(SeriesFrame::from_rows(&rows))),
        Err(err) => warn!(error = %err, "skipping historical backfill"),
    }

    frames
}

/// Relay a viewer light command: publish the token outbound, then
/// confirm the new state to every viewer regardless of publish outcome.
async fn relay_command(state: &HubState, token: Option<String>) {
    let token = token.unwrap_or_else(|| DEFAULT_LIGHT_STATE.to_string());
    info!(state = %token, "relaying light command");

    if let Err(err) = state.commands.publish_state(&token).await {
        warn!(error = %err, "light command publish failed");
    }

    state.broadcast(ServerEvent::LightState { state: token });
}
