//! WebSocket endpoint for real-time calendar updates.
//!
//! Each connected viewer gets its own broadcast receiver; every published
//! event is forwarded as one JSON text frame. There is no replay: clients
//! fetch the full state via `GET /availability` after connecting and
//! treat events as invalidation signals.

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{Receiver, error::RecvError};

use datefinder_core::{CalendarEvent, UserId};

use crate::routes::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

/// GET /ws - Upgrade to a calendar update stream
async fn upgrade(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ws: WebSocketUpgrade,
) -> Response {
    let rx = state.bus.subscribe();
    ws.on_upgrade(move |socket| viewer_loop(socket, rx, user))
}

async fn viewer_loop(socket: WebSocket, mut rx: Receiver<CalendarEvent>, user: UserId) {
    tracing::debug!(%user, "viewer connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::error!(error = %err, "failed to encode event");
                            continue;
                        }
                    };

                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        // Viewer went away mid-publish; drop it silently
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // The client recovers by refetching full state
                    tracing::warn!(%user, skipped, "viewer lagged behind broadcast");
                }
                Err(RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                // Clients don't send anything we act on
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }

    tracing::debug!(%user, "viewer disconnected");
}
