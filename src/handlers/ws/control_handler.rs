//! Guided-fill control commands
//!
//! Starts guided-fill runs and relays the clickable confirm/retry
//! affordance into the state machine. Confirm and retry mirror affirmative
//! and negative caller utterances and are no-ops unless a confirmation is
//! pending.

use tokio::sync::mpsc;
use tracing::info;

use crate::core::guided_fill::FieldId;

use super::messages::OutgoingMessage;
use super::session::SessionState;
use super::{flush_guided_events, send};

/// Handle the start_guided_fill command.
pub async fn handle_start_guided_fill(
    fields: Vec<FieldId>,
    confirm: bool,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    if !session.is_active() {
        send(
            message_tx,
            OutgoingMessage::Error {
                message: "Session not configured. Send a config message first.".to_string(),
            },
        )
        .await;
        return true;
    }

    info!(count = fields.len(), confirm, "Starting guided fill");
    session
        .guided
        .start(fields, confirm, &mut session.document);
    flush_guided_events(session, message_tx).await;
    true
}

/// Handle the confirm click.
pub async fn handle_confirm(
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    if session.is_active() {
        session.guided.confirm_clicked(&mut session.document);
        flush_guided_events(session, message_tx).await;
    }
    true
}

/// Handle the retry click.
pub async fn handle_retry(
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    if session.is_active() {
        session.guided.retry_clicked(&mut session.document);
        flush_guided_events(session, message_tx).await;
    }
    true
}
