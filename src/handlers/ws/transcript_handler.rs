//! Transcript and audio-activity handling
//!
//! Dispatches inbound speech events by source. Caller speech feeds the
//! guided-fill machine; agent speech is scanned for an embedded form
//! command, displayed, and arms the deferred speaking-to-idle transition.
//! Background validation is fired here and its outcome re-enters through
//! [`InternalEvent::Validation`] as messages only.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::command::extract_form_command;
use crate::core::guided_fill::FieldStore;
use crate::core::speech_timing::estimate_speaking_delay;
use crate::state::AppState;

use super::messages::{OutgoingMessage, TranscriptSource, VisualState};
use super::session::{InternalEvent, SessionState};
use super::{flush_guided_events, send};

/// Handle a transcript event from the speech channel.
pub async fn handle_transcript(
    source: TranscriptSource,
    text: Option<String>,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    internal_tx: &mpsc::Sender<InternalEvent>,
    app_state: &Arc<AppState>,
) -> bool {
    if !session.is_active() {
        debug!("Transcript received while session inactive; dropping");
        return true;
    }

    match source {
        TranscriptSource::Caller => {
            handle_caller_transcript(text, session, message_tx, internal_tx, app_state).await
        }
        TranscriptSource::Agent => {
            handle_agent_transcript(text, session, message_tx, internal_tx).await
        }
    }

    true
}

async fn handle_caller_transcript(
    text: Option<String>,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    internal_tx: &mpsc::Sender<InternalEvent>,
    app_state: &Arc<AppState>,
) {
    let utterance = text.clone().unwrap_or_default();
    let request = session
        .guided
        .handle_caller_utterance(&utterance, &mut session.document);
    flush_guided_events(session, message_tx).await;

    if let Some(text) = text.filter(|t| !t.is_empty()) {
        send(
            message_tx,
            OutgoingMessage::Message {
                source: "caller".to_string(),
                text,
            },
        )
        .await;
    }

    // Fire validation out-of-band. The task owns no session state; its
    // outcome joins the event loop through the internal channel and can
    // only append messages.
    if let Some(request) = request {
        let validation = app_state.validation();
        let internal_tx = internal_tx.clone();
        tokio::spawn(async move {
            let outcome = validation
                .validate(&request.field, &request.provisional)
                .await;
            let _ = internal_tx
                .send(InternalEvent::Validation {
                    field: request.field,
                    committed: request.committed,
                    outcome,
                })
                .await;
        });
    }
}

async fn handle_agent_transcript(
    text: Option<String>,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    internal_tx: &mpsc::Sender<InternalEvent>,
) {
    // Agent messages arriving during a pending confirmation are buffered so
    // the agent cannot ask a follow-up before the caller answers yes/no.
    if session.guided.awaiting_confirmation() {
        session
            .guided
            .buffer_agent_message(text.unwrap_or_default());
        return;
    }

    let Some(raw) = text.filter(|t| !t.is_empty()) else {
        return;
    };

    // One-shot embedded command channel, independent of the guided cursor.
    // The command is stripped from the display text only when the write
    // lands on a known field.
    let display = match extract_form_command(&raw) {
        (Some(command), cleaned) if session.document.contains(&command.field) => {
            session.document.write(&command.field, &command.value);
            info!(field = %command.field, "Form field set from embedded agent command");
            send(
                message_tx,
                OutgoingMessage::FieldUpdate {
                    field: command.field,
                    value: command.value,
                },
            )
            .await;
            cleaned
        }
        _ => raw,
    };

    if !display.is_empty() {
        send(
            message_tx,
            OutgoingMessage::Message {
                source: "agent".to_string(),
                text: display.clone(),
            },
        )
        .await;
    }

    // Arm the deferred idle transition for this turn. The guard is
    // re-checked at fire time; a newer turn invalidates this timer.
    let delay = estimate_speaking_delay(Some(&display));
    let turn = session.turn;
    let internal_tx = internal_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = internal_tx.send(InternalEvent::IdleTimer { turn }).await;
    });
}

/// Handle an audio-activity signal for the agent's current turn.
pub async fn handle_audio_activity(
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    if !session.is_active() {
        return true;
    }

    if session.begin_speaking_turn() {
        send(
            message_tx,
            OutgoingMessage::Status {
                text: "speaking...".to_string(),
            },
        )
        .await;
        send(
            message_tx,
            OutgoingMessage::VisualState {
                state: VisualState::Speaking,
            },
        )
        .await;
    }

    true
}

/// Handle an event re-entering the loop from a background task.
pub async fn handle_internal_event(
    event: InternalEvent,
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) {
    match event {
        InternalEvent::IdleTimer { turn } => {
            if session.try_idle_transition(turn) {
                send(
                    message_tx,
                    OutgoingMessage::Status {
                        text: "idle".to_string(),
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
            }
        }
        InternalEvent::Validation {
            field,
            committed,
            outcome,
        } => {
            debug!(%field, ok = outcome.ok, "Background validation completed");

            if let Some(follow_up) = outcome.follow_up {
                send(
                    message_tx,
                    OutgoingMessage::Message {
                        source: "agent".to_string(),
                        text: follow_up,
                    },
                )
                .await;
            }

            // A normalized value different from what was committed is
            // surfaced as a non-blocking suggestion.
            if outcome.ok {
                if let Some(value) = outcome.value {
                    if value != committed {
                        send(
                            message_tx,
                            OutgoingMessage::Message {
                                source: "agent".to_string(),
                                text: format!("Suggestion: {value}"),
                            },
                        )
                        .await;
                    }
                }
            }
        }
    }
}
