//! Guided form-fill state machine
//!
//! Drives a form one field at a time from caller speech. A guided-fill run
//! walks an ordered field list: each field is prompted for, the next caller
//! utterance becomes its value, and the cursor advances. Values commit
//! optimistically (validation runs in the background and never rewinds the
//! cursor); a run may instead opt into an explicit yes/no confirmation before
//! each commit.
//!
//! The machine is synchronous and single-writer: every entry point runs to
//! completion on the session event loop, appends its user-visible output to
//! an internal event outbox, and at most hands back a [`ValidationRequest`]
//! for the session layer to execute out-of-band. Nothing in the background
//! path can re-enter the transition logic.

pub mod document;

pub use document::{FieldId, FieldStore, FormDocument};

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::mem;

use tracing::debug;

use crate::core::confirmation::{self, Confirmation};

/// Origin tag for a chat message emitted toward the display sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Agent,
    Caller,
    System,
}

/// Output of the state machine, drained by the session layer after every
/// entry-point call and forwarded to the display/visual sinks in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A chat message for the display sink.
    Message { source: MessageSource, text: String },
    /// The single highlighted field changed; `None` clears the highlight.
    Highlight { field: Option<FieldId> },
    /// Show or hide the clickable confirm/retry affordance.
    ConfirmControls { visible: bool, field: Option<FieldId> },
    /// A value was written into the form document.
    FieldWritten { field: FieldId, value: String },
}

/// A staged value awaiting the caller's explicit yes/no.
///
/// Present exactly while the machine is awaiting confirmation; cleared on
/// every exit from that state, commit and reject alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationState {
    pub field: FieldId,
    pub value: String,
}

/// A background validation call the session layer should fire after a commit.
///
/// Carries the committed value and a snapshot of the provisional document so
/// the validation result can be correlated without reading machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub field: FieldId,
    pub committed: String,
    pub provisional: BTreeMap<FieldId, String>,
}

/// The guided-fill state machine.
#[derive(Default)]
pub struct GuidedFill {
    fields: Vec<FieldId>,
    index: usize,
    active: bool,
    confirm_values: bool,
    attempts: HashMap<FieldId, u32>,
    provisional: BTreeMap<FieldId, String>,
    confirmation: Option<ConfirmationState>,
    pending_agent_messages: VecDeque<String>,
    outbox: Vec<SessionEvent>,
}

impl GuidedFill {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a staged value is awaiting the caller's yes/no.
    pub fn awaiting_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }

    /// Current cursor into the field list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Last value committed for a field during this session.
    pub fn provisional_value(&self, field: &str) -> Option<&str> {
        self.provisional.get(field).map(String::as_str)
    }

    /// Consecutive unresolved tries recorded for a field.
    pub fn attempts(&self, field: &str) -> u32 {
        self.attempts.get(field).copied().unwrap_or(0)
    }

    /// Takes the events accumulated since the last drain, in emission order.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        mem::take(&mut self.outbox)
    }

    /// Starts a guided-fill run over `fields`.
    ///
    /// An empty field list is rejected as a no-op. With `confirm_values`,
    /// each caller utterance is staged and confirmed before committing;
    /// without it, values commit on first utterance.
    pub fn start(&mut self, fields: Vec<FieldId>, confirm_values: bool, store: &mut dyn FieldStore) {
        if fields.is_empty() {
            return;
        }
        self.fields = fields;
        self.index = 0;
        self.active = true;
        self.confirm_values = confirm_values;
        self.confirmation = None;
        self.pending_agent_messages.clear();
        self.prompt_current(store);
    }

    /// Prompts for the field under the cursor, or finishes the run.
    ///
    /// Keeps at most one field highlighted. Past the last field it emits the
    /// completion message, clears the highlight and deactivates.
    pub fn prompt_current(&mut self, store: &mut dyn FieldStore) {
        if !self.active {
            return;
        }
        if self.index >= self.fields.len() {
            self.message(MessageSource::Agent, "All fields completed. Thank you!");
            self.active = false;
            self.outbox.push(SessionEvent::Highlight { field: None });
            return;
        }

        let field = self.fields[self.index].clone();
        let label = friendly_label(store, &field);
        debug!(field = %field, label = %label, index = self.index, "Prompting for field");

        self.outbox.push(SessionEvent::Highlight {
            field: Some(field),
        });
        self.message(MessageSource::Agent, format!("Please say the value for: {label}"));
    }

    /// Feeds one caller utterance into the run.
    ///
    /// While a confirmation is pending the utterance is interpreted as a
    /// yes/no reply. Otherwise it becomes the value for the current field:
    /// staged if the run requires confirmation, committed immediately if not.
    /// Returns the background validation call to fire, when a commit
    /// happened.
    pub fn handle_caller_utterance(
        &mut self,
        text: &str,
        store: &mut dyn FieldStore,
    ) -> Option<ValidationRequest> {
        if !self.active {
            return None;
        }

        if self.confirmation.is_some() {
            self.handle_confirmation_reply(text, store);
            return None;
        }

        let field = self.fields.get(self.index).cloned()?;

        if !store.contains(&field) {
            // Never deadlock the flow on a missing field
            self.message(
                MessageSource::System,
                format!("Field '{field}' not found. Skipping."),
            );
            self.index += 1;
            self.prompt_current(store);
            return None;
        }

        let cleaned = text.trim().to_string();

        if self.confirm_values {
            let label = friendly_label(store, &field);
            self.message(
                MessageSource::Agent,
                format!("I heard '{cleaned}' for {label}. Is that right?"),
            );
            self.confirmation = Some(ConfirmationState {
                field,
                value: cleaned,
            });
            return None;
        }

        self.commit(field, cleaned, store)
    }

    /// Equivalent of an affirmative utterance, driven by an explicit click.
    /// No-op unless a confirmation is pending.
    pub fn confirm_clicked(&mut self, store: &mut dyn FieldStore) {
        if self.confirmation.is_some() {
            debug!("Confirm control clicked");
            self.commit_confirmation(store);
        }
    }

    /// Equivalent of a negative utterance, driven by an explicit click.
    /// No-op unless a confirmation is pending.
    pub fn retry_clicked(&mut self, store: &mut dyn FieldStore) {
        if self.confirmation.is_some() {
            debug!("Retry control clicked");
            self.reject_confirmation(store);
        }
    }

    /// Buffers an agent message that arrived while a confirmation is pending.
    ///
    /// Buffered messages are never displayed: the queue is discarded when the
    /// confirmation resolves, so the agent cannot interleave follow-up
    /// questions with a pending yes/no.
    pub fn buffer_agent_message(&mut self, text: String) {
        debug!("Buffering agent message while awaiting confirmation");
        self.pending_agent_messages.push_back(text);
    }

    fn handle_confirmation_reply(&mut self, text: &str, store: &mut dyn FieldStore) {
        match confirmation::classify(text) {
            Confirmation::Affirmative => self.commit_confirmation(store),
            Confirmation::Negative => self.reject_confirmation(store),
            Confirmation::Ambiguous => {
                // Stay put; surface the clickable yes/no instead of a
                // textual re-ask.
                if let Some(state) = &self.confirmation {
                    let field = state.field.clone();
                    *self.attempts.entry(field.clone()).or_insert(0) += 1;
                    self.outbox.push(SessionEvent::ConfirmControls {
                        visible: true,
                        field: Some(field),
                    });
                }
            }
        }
    }

    fn commit_confirmation(&mut self, store: &mut dyn FieldStore) {
        let Some(state) = self.confirmation.take() else {
            return;
        };
        self.outbox.push(SessionEvent::ConfirmControls {
            visible: false,
            field: None,
        });

        if store.write(&state.field, &state.value) {
            self.provisional
                .insert(state.field.clone(), state.value.clone());
            self.outbox.push(SessionEvent::FieldWritten {
                field: state.field.clone(),
                value: state.value.clone(),
            });
            self.message(
                MessageSource::Agent,
                format!("Confirmed. Saved '{}' for {}.", state.value, state.field),
            );
        } else {
            self.message(
                MessageSource::System,
                format!("Field '{}' not found. Skipping.", state.field),
            );
        }

        self.attempts.insert(state.field, 0);
        self.index += 1;
        self.prompt_current(store);
        self.discard_pending_agent_messages();
    }

    fn reject_confirmation(&mut self, store: &mut dyn FieldStore) {
        let Some(state) = self.confirmation.take() else {
            return;
        };
        self.outbox.push(SessionEvent::ConfirmControls {
            visible: false,
            field: None,
        });
        *self.attempts.entry(state.field).or_insert(0) += 1;

        self.message(
            MessageSource::Agent,
            "Okay — please say the value for that field again.",
        );
        // Re-prompt the same field without advancing the cursor
        self.prompt_current(store);
        self.discard_pending_agent_messages();
    }

    fn commit(
        &mut self,
        field: FieldId,
        value: String,
        store: &mut dyn FieldStore,
    ) -> Option<ValidationRequest> {
        self.provisional.insert(field.clone(), value.clone());
        store.write(&field, &value);
        self.outbox.push(SessionEvent::FieldWritten {
            field: field.clone(),
            value: value.clone(),
        });
        self.message(
            MessageSource::Agent,
            format!("Saved '{value}' for {field}."),
        );

        self.attempts.insert(field.clone(), 0);
        self.index += 1;
        self.prompt_current(store);

        // Validation fires only after the cursor has advanced; its result
        // may append messages but never moves the cursor back.
        Some(ValidationRequest {
            field,
            committed: value,
            provisional: self.provisional.clone(),
        })
    }

    fn discard_pending_agent_messages(&mut self) {
        if self.pending_agent_messages.is_empty() {
            return;
        }
        debug!(
            count = self.pending_agent_messages.len(),
            "Discarding agent messages buffered during confirmation"
        );
        self.pending_agent_messages.clear();
    }

    fn message(&mut self, source: MessageSource, text: impl Into<String>) {
        self.outbox.push(SessionEvent::Message {
            source,
            text: text.into(),
        });
    }
}

/// Resolve the display label for a field, falling back to the raw id.
/// A trailing colon on the defined label is stripped.
fn friendly_label(store: &dyn FieldStore, field: &str) -> String {
    match store.label(field) {
        Some(label) => {
            let trimmed = label.trim_end();
            trimmed.strip_suffix(':').unwrap_or(trimmed).to_string()
        }
        None => field.to_string(),
    }
}
