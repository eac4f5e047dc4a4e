use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use lumen_scheduler::TaskScheduler;

use crate::state::AppState;
use crate::ws::messages::ServerMessage;

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.scheduler))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Subscribes to the scheduler, receiving the current snapshot.
///   2. Spawns a sender task that writes the snapshot, then every event,
///      pinging the client while idle.
///   3. Drains inbound frames on the current task until the client leaves.
///   4. Unsubscribes on disconnect.
async fn handle_socket(socket: WebSocket, scheduler: TaskScheduler) {
    let subscription = scheduler.subscribe().await;
    let conn_id = subscription.id;
    tracing::info!(
        conn_id = %conn_id,
        snapshot_len = subscription.snapshot.len(),
        "WebSocket connected",
    );

    let (mut sink, mut stream) = socket.split();
    let mut events = subscription.events;
    let snapshot = ServerMessage::Snapshot {
        tasks: subscription.snapshot,
    };

    let send_task = tokio::spawn(async move {
        if send_json(&mut sink, &snapshot).await.is_err() {
            tracing::debug!(conn_id = %conn_id, "WebSocket sink closed before snapshot");
            return;
        }

        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // The first tick completes immediately.
        heartbeat.tick().await;

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        // Scheduler shut down.
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    };
                    if send_json(&mut sink, &ServerMessage::from(event)).await.is_err() {
                        tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if sink.send(Message::Ping(Default::default())).await.is_err() {
                        tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                        break;
                    }
                }
            }
        }
    });

    // Receiver loop: clients are not expected to send anything but control
    // frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    scheduler.unsubscribe(conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn send_json(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WebSocket message");
            return Ok(());
        }
    };
    sink.send(Message::Text(text.into())).await
}
