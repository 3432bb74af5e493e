//! Axum WebSocket handler
//!
//! Upgrade handler and the per-connection event loop. The loop is the only
//! writer of session state: inbound frames, idle timers and validation
//! outcomes are all serialized through it, so no locking is needed.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::{
    messages::{IncomingMessage, OutgoingMessage, VisualState},
    processor::handle_incoming_message,
    send,
    session::{InternalEvent, SessionState},
    transcript_handler::{handle_audio_activity, handle_internal_event},
};

/// Buffer size for the outgoing and internal channels.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// WebSocket session handler
/// Upgrades the HTTP connection to WebSocket for the voice session protocol
pub async fn ws_session_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("WebSocket session upgrade requested");
    ws.on_upgrade(move |socket| handle_session_socket(socket, state))
}

/// Handle one WebSocket session from upgrade to teardown
async fn handle_session_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    let mut session = SessionState::new();
    info!(stream_id = %session.stream_id, "WebSocket session established");

    let (message_tx, mut message_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_BUFFER_SIZE);
    let (internal_tx, mut internal_rx) = mpsc::channel::<InternalEvent>(CHANNEL_BUFFER_SIZE);

    // Spawn task to serialize and send outgoing messages in order
    let sender_task = tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize outgoing message: {e}");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                error!("Failed to send WebSocket message: {e}");
                break;
            }
        }
    });

    loop {
        select! {
            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(msg)) => {
                        let continue_processing = process_message(
                            msg,
                            &mut session,
                            &message_tx,
                            &internal_tx,
                            &app_state,
                        ).await;

                        if !continue_processing {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        // Terminal for this session attempt
                        warn!("WebSocket error: {e}");
                        send(&message_tx, OutgoingMessage::Status {
                            text: "error".to_string(),
                        }).await;
                        send(&message_tx, OutgoingMessage::VisualState {
                            state: VisualState::Inactive,
                        }).await;
                        send(&message_tx, OutgoingMessage::StopControl { visible: false }).await;
                        break;
                    }
                    None => {
                        info!("WebSocket connection closed by client");
                        break;
                    }
                }
            }
            Some(event) = internal_rx.recv() => {
                handle_internal_event(event, &mut session, &message_tx).await;
            }
        }
    }

    // Let queued outgoing messages drain before tearing the sender down
    drop(message_tx);
    if let Err(e) = sender_task.await {
        debug!("Sender task ended: {e}");
    }

    info!(stream_id = %session.stream_id, "WebSocket session terminated");
}

/// Process one incoming WebSocket frame
async fn process_message(
    msg: Message,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    internal_tx: &mpsc::Sender<InternalEvent>,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());

            let incoming: IncomingMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    error!("Failed to parse incoming message: {e}");
                    send(
                        message_tx,
                        OutgoingMessage::Error {
                            message: format!("Invalid message format: {e}"),
                        },
                    )
                    .await;
                    return true;
                }
            };

            handle_incoming_message(incoming, session, message_tx, internal_tx, app_state).await
        }
        Message::Binary(data) => {
            // Binary frames are agent audio; only their presence matters
            debug!("Received binary audio frame: {} bytes", data.len());
            handle_audio_activity(session, message_tx).await
        }
        Message::Ping(_) => {
            debug!("Received ping message");
            true
        }
        Message::Pong(_) => {
            debug!("Received pong message");
            true
        }
        Message::Close(_) => {
            info!("WebSocket connection closed by client");
            false
        }
    }
}
