//! WebSocket message types for the voice session channel
//!
//! This module defines all message types for WebSocket communication with
//! the caller-facing page: incoming transcript/command events and outgoing
//! display-sink and visual-sink messages, serde-tagged for the wire.

use serde::{Deserialize, Serialize};

use crate::core::guided_fill::{FieldId, MessageSource, SessionEvent};

/// Which side of the conversation produced a transcript event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Caller,
    Agent,
}

/// One field of the form definition sent at configuration time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormFieldSpec {
    pub id: FieldId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// WebSocket message types for incoming messages
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// Form definition for this session; activates the session.
    #[serde(rename = "config")]
    Config { form: Vec<FormFieldSpec> },
    /// A transcribed utterance from the speech channel.
    #[serde(rename = "transcript")]
    Transcript {
        source: TranscriptSource,
        #[serde(default)]
        text: Option<String>,
    },
    /// Agent audio is flowing for the current turn. Binary frames on the
    /// socket are treated as the same signal.
    #[serde(rename = "audio_activity")]
    AudioActivity,
    /// Begin a guided-fill run over the given fields.
    #[serde(rename = "start_guided_fill")]
    StartGuidedFill {
        fields: Vec<FieldId>,
        /// Require an explicit yes/no before each commit.
        #[serde(default)]
        confirm: bool,
    },
    /// Click equivalent of an affirmative confirmation.
    #[serde(rename = "confirm")]
    Confirm,
    /// Click equivalent of a negative confirmation.
    #[serde(rename = "retry")]
    Retry,
    /// End the session.
    #[serde(rename = "end")]
    End,
}

/// Visual indicator states. The session layer is the sole writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    Inactive,
    Idle,
    Speaking,
}

/// WebSocket message types for outgoing messages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "ready")]
    Ready,
    /// Display sink: a tagged chat message.
    #[serde(rename = "message")]
    Message { source: String, text: String },
    /// Visual state sink: indicator change.
    #[serde(rename = "visual_state")]
    VisualState { state: VisualState },
    /// Visual state sink: free-text status line.
    #[serde(rename = "status")]
    Status { text: String },
    /// A value was written into the form document.
    #[serde(rename = "field_update")]
    FieldUpdate { field: FieldId, value: String },
    /// The single highlighted field changed; null clears it.
    #[serde(rename = "highlight")]
    Highlight { field: Option<FieldId> },
    /// Show or hide the clickable confirm/retry affordance.
    #[serde(rename = "confirm_controls")]
    ConfirmControls { visible: bool, field: Option<FieldId> },
    /// Show or hide the end-session control.
    #[serde(rename = "stop_control")]
    StopControl { visible: bool },
    #[serde(rename = "error")]
    Error { message: String },
}

impl From<SessionEvent> for OutgoingMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Message { source, text } => OutgoingMessage::Message {
                source: source_tag(source).to_string(),
                text,
            },
            SessionEvent::Highlight { field } => OutgoingMessage::Highlight { field },
            SessionEvent::ConfirmControls { visible, field } => {
                OutgoingMessage::ConfirmControls { visible, field }
            }
            SessionEvent::FieldWritten { field, value } => {
                OutgoingMessage::FieldUpdate { field, value }
            }
        }
    }
}

/// Wire tag for a chat message source.
pub fn source_tag(source: MessageSource) -> &'static str {
    match source {
        MessageSource::Agent => "agent",
        MessageSource::Caller => "caller",
        MessageSource::System => "system",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_transcript_parses() {
        let msg: IncomingMessage = serde_json::from_str(
            r#"{"type": "transcript", "source": "caller", "text": "Paris"}"#,
        )
        .unwrap();
        match msg {
            IncomingMessage::Transcript { source, text } => {
                assert_eq!(source, TranscriptSource::Caller);
                assert_eq!(text.as_deref(), Some("Paris"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_incoming_transcript_text_may_be_absent() {
        let msg: IncomingMessage =
            serde_json::from_str(r#"{"type": "transcript", "source": "agent"}"#).unwrap();
        match msg {
            IncomingMessage::Transcript { text, .. } => assert_eq!(text, None),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_start_guided_fill_confirm_defaults_off() {
        let msg: IncomingMessage = serde_json::from_str(
            r#"{"type": "start_guided_fill", "fields": ["a", "b"]}"#,
        )
        .unwrap();
        match msg {
            IncomingMessage::StartGuidedFill { fields, confirm } => {
                assert_eq!(fields, vec!["a".to_string(), "b".to_string()]);
                assert!(!confirm);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_outgoing_messages_are_tagged() {
        let json = serde_json::to_value(OutgoingMessage::Status {
            text: "Listening...".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["text"], "Listening...");

        let json = serde_json::to_value(OutgoingMessage::VisualState {
            state: VisualState::Speaking,
        })
        .unwrap();
        assert_eq!(json["state"], "speaking");
    }

    #[test]
    fn test_session_event_conversion() {
        let msg: OutgoingMessage = SessionEvent::Message {
            source: MessageSource::Agent,
            text: "hi".to_string(),
        }
        .into();
        let json = serde_json::to_value(msg).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["source"], "agent");

        let msg: OutgoingMessage = SessionEvent::Highlight { field: None }.into();
        let json = serde_json::to_value(msg).unwrap();
        assert_eq!(json["type"], "highlight");
        assert!(json["field"].is_null());
    }
}
