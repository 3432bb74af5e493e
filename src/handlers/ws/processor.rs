//! WebSocket message processing orchestrator
//!
//! Main entry point for parsed incoming messages, delegating to the
//! specialized handlers by message type.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::state::AppState;

use super::{
    config_handler::{handle_config, handle_end},
    control_handler::{handle_confirm, handle_retry, handle_start_guided_fill},
    messages::{IncomingMessage, OutgoingMessage},
    session::{InternalEvent, SessionState},
    transcript_handler::{handle_audio_activity, handle_transcript},
};

/// Process an incoming WebSocket message based on its type
///
/// # Returns
/// * `bool` - true to continue processing, false to terminate the connection
pub async fn handle_incoming_message(
    msg: IncomingMessage,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    internal_tx: &mpsc::Sender<InternalEvent>,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        IncomingMessage::Config { form } => handle_config(form, session, message_tx).await,
        IncomingMessage::Transcript { source, text } => {
            handle_transcript(source, text, session, message_tx, internal_tx, app_state).await
        }
        IncomingMessage::AudioActivity => handle_audio_activity(session, message_tx).await,
        IncomingMessage::StartGuidedFill { fields, confirm } => {
            handle_start_guided_fill(fields, confirm, session, message_tx).await
        }
        IncomingMessage::Confirm => handle_confirm(session, message_tx).await,
        IncomingMessage::Retry => handle_retry(session, message_tx).await,
        IncomingMessage::End => handle_end(session, message_tx).await,
    }
}
