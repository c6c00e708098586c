//! WebSocket handler streaming progress updates.
//!
//! Each `subscribe_progress` frame runs the full progress sequence before the next client frame
//! is read. The sequence cannot be cancelled from the protocol; it ends early only when the
//! client goes away.

use std::pin::pin;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::StreamExt;
use tracing::{debug, info, instrument};

use crate::AppState;
use crate::api::models::progress::{ClientMessage, ServerMessage};
use crate::progress::ProgressSchedule;

pub async fn progress_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let schedule = state.progress;
    ws.on_upgrade(move |socket| handle_socket(socket, schedule))
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(text.into())).await
}

#[instrument(skip_all)]
async fn handle_socket(mut socket: WebSocket, schedule: ProgressSchedule) {
    debug!("WebSocket connected");

    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "WebSocket receive failed");
                break;
            }
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Binary, ping and pong frames carry nothing we act on
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(ClientMessage::SubscribeProgress { task_id }) => {
                info!(task_id = %task_id, "Progress subscription started");
                let mut updates = pin!(schedule.updates(task_id));
                while let Some(update) = updates.next().await {
                    if send(&mut socket, &update).await.is_err() {
                        info!("WebSocket disconnected");
                        return;
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "Rejected progress frame");
                let reply = ServerMessage::Error {
                    message: format!("Invalid message: {e}"),
                };
                if send(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("WebSocket disconnected");
}
