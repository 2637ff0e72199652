//! WebSocket connection handling.
//!
//! Each connection owns one event conduit and one [`CommandDispatcher`].
//! Two halves run concurrently until either ends:
//!
//! - reader: inbound text frames → [`Command`](pitlane_dispatch::Command) →
//!   dispatcher
//! - writer: event stream → JSON text frames
//!
//! When the connection goes away the stream is closed and every outstanding
//! run is cancelled and awaited, so no task outlives its connection.

use crate::routes::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use pitlane_core::event_channel;
use pitlane_dispatch::CommandDispatcher;
use std::fmt::Display;
use tracing::{debug, info, trace, warn};

/// Axum handler for the WebSocket upgrade at `/ws`.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (outgoing, incoming) = socket.split();
    run_connection(outgoing, incoming, state).await;
}

/// Serve one connection over any message sink/stream pair.
pub async fn run_connection<Tx, Rx, E>(mut outgoing: Tx, mut incoming: Rx, state: AppState)
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Display,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    info!("New WebSocket connection");

    let (sink, mut stream) = event_channel(state.sink_capacity);
    let mut dispatcher =
        CommandDispatcher::new(sink, state.env.clone()).with_shutdown(&state.shutdown);

    let writer = async {
        while let Some(record) = stream.next_event().await {
            let text = match serde_json::to_string(&record) {
                Ok(text) => text,
                Err(err) => {
                    warn!("Failed to serialize event: {err}");
                    continue;
                }
            };
            trace!(record = %text, "Sending event");
            if let Err(err) = outgoing.send(Message::Text(text.into())).await {
                debug!("WebSocket send failed: {err}");
                break;
            }
        }
    };

    let reader = async {
        while let Some(message) = incoming.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    debug!(command = %text.as_str(), "Received command");
                    if let Err(err) = dispatcher.dispatch_text(text.as_str()).await {
                        debug!("Dropping command: {err}");
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket closed by client");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("WebSocket error: {err}");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = writer => {},
        _ = reader => {},
        _ = state.shutdown.cancelled() => debug!("Server shutting down"),
    }

    stream.close();
    let outcomes = dispatcher.shutdown().await;
    let _ = outgoing.close().await;

    info!(runs = outcomes.len(), "WebSocket connection closed");
}
