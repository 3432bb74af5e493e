//! Session configuration and lifecycle handling
//!
//! The `config` message carries the form definition and activates the
//! session; `end` deactivates it. Both are idempotent at the lifecycle
//! level: configuring an active session and ending an inactive one are
//! no-ops.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::guided_fill::FormDocument;

use super::messages::{FormFieldSpec, OutgoingMessage, VisualState};
use super::send;
use super::session::{SessionPhase, SessionState};

/// Handle the config message: build the form document and activate.
///
/// An empty form definition is a failed session start: the visual state goes
/// inactive, transport controls are hidden, and the attempt is terminal
/// until the client sends a fresh config.
pub async fn handle_config(
    form: Vec<FormFieldSpec>,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    if session.is_active() {
        debug!("Config received while session already active; ignoring");
        return true;
    }

    session.phase = SessionPhase::Connecting;
    send(
        message_tx,
        OutgoingMessage::Status {
            text: "connecting...".to_string(),
        },
    )
    .await;
    send(message_tx, OutgoingMessage::StopControl { visible: true }).await;

    if form.is_empty() {
        warn!("Session start failed: empty form definition");
        send(
            message_tx,
            OutgoingMessage::Error {
                message: "Session start failed: form definition is empty".to_string(),
            },
        )
        .await;
        send(
            message_tx,
            OutgoingMessage::Status {
                text: "error".to_string(),
            },
        )
        .await;
        send(
            message_tx,
            OutgoingMessage::VisualState {
                state: VisualState::Inactive,
            },
        )
        .await;
        send(message_tx, OutgoingMessage::StopControl { visible: false }).await;
        session.reset_presence();
        return true;
    }

    let mut document = FormDocument::new();
    for field in form {
        document.add_field(field.id, field.label, field.value);
    }
    session.document = document;
    session.phase = SessionPhase::Active;

    info!(
        stream_id = %session.stream_id,
        fields = session.document.len(),
        "Voice session configured"
    );

    send(message_tx, OutgoingMessage::Ready).await;
    send(
        message_tx,
        OutgoingMessage::Status {
            text: "Listening...".to_string(),
        },
    )
    .await;
    send(
        message_tx,
        OutgoingMessage::VisualState {
            state: VisualState::Idle,
        },
    )
    .await;

    true
}

/// Handle the end message: deactivate presence state.
///
/// Guided-fill and in-flight validation state are deliberately left alone;
/// their effects are idempotent and harmless once orphaned.
pub async fn handle_end(
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    if session.phase == SessionPhase::Inactive {
        debug!("End received while session inactive; ignoring");
        return true;
    }

    info!(stream_id = %session.stream_id, "Voice session ended");
    session.reset_presence();

    send(
        message_tx,
        OutgoingMessage::Status {
            text: "INACTIVE".to_string(),
        },
    )
    .await;
    send(
        message_tx,
        OutgoingMessage::VisualState {
            state: VisualState::Inactive,
        },
    )
    .await;
    send(message_tx, OutgoingMessage::StopControl { visible: false }).await;

    true
}
