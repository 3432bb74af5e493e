//! Per-connection session state
//!
//! Owns the presence lifecycle, the form document, the guided-fill machine
//! and the speaking indicator for one WebSocket connection. All mutation
//! happens on the connection's event loop; timers and background validation
//! join back through [`InternalEvent`]s, so there is exactly one logical
//! writer and no locking.

use uuid::Uuid;

use crate::core::guided_fill::{FieldId, FormDocument, GuidedFill};
use crate::core::validation::ValidationOutcome;

/// Presence lifecycle of a session.
///
/// Starting while already `Active` is a no-op, as is ending while
/// `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Inactive,
    Connecting,
    Active,
}

/// Events produced by background tasks, delivered back into the event loop.
#[derive(Debug)]
pub enum InternalEvent {
    /// A speaking turn's deferred idle transition fired.
    IdleTimer { turn: u64 },
    /// A background validation call completed.
    Validation {
        field: FieldId,
        committed: String,
        outcome: ValidationOutcome,
    },
}

/// Mutable state for one WebSocket session.
pub struct SessionState {
    pub phase: SessionPhase,
    pub document: FormDocument,
    pub guided: GuidedFill,
    /// Whether the speaking indicator is currently shown.
    pub speaking: bool,
    /// Whether audio activity has been seen for the current turn.
    pub turn_started: bool,
    /// Monotonic turn counter; idle timers carry the turn they were armed
    /// for and are discarded when a newer turn has started.
    pub turn: u64,
    /// Unique identifier for this WebSocket session.
    pub stream_id: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Inactive,
            document: FormDocument::new(),
            guided: GuidedFill::new(),
            speaking: false,
            turn_started: false,
            turn: 0,
            stream_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Marks the start of a speaking turn on first audio activity.
    /// Returns false when the current turn was already marked.
    pub fn begin_speaking_turn(&mut self) -> bool {
        if self.turn_started {
            return false;
        }
        self.turn_started = true;
        self.speaking = true;
        self.turn += 1;
        true
    }

    /// Applies an idle timer armed for `timer_turn`.
    ///
    /// The guard is re-checked here, at fire time: a timer from an older
    /// turn, or one firing after the speaking flag was already cleared, is
    /// discarded. Returns whether a transition happened.
    pub fn try_idle_transition(&mut self, timer_turn: u64) -> bool {
        if timer_turn != self.turn || !self.speaking {
            return false;
        }
        self.speaking = false;
        self.turn_started = false;
        true
    }

    /// Resets presence state when the session ends.
    ///
    /// Guided-fill and in-flight validation state are left as they are:
    /// their effects are idempotent, target-keyed writes, so orphaning them
    /// is safe.
    pub fn reset_presence(&mut self) {
        self.phase = SessionPhase::Inactive;
        self.speaking = false;
        self.turn_started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_inactive() {
        let session = SessionState::new();
        assert_eq!(session.phase, SessionPhase::Inactive);
        assert!(!session.speaking);
        assert_eq!(session.stream_id.len(), 36);
    }

    #[test]
    fn test_speaking_turn_is_marked_once() {
        let mut session = SessionState::new();
        assert!(session.begin_speaking_turn());
        assert!(!session.begin_speaking_turn());
        assert!(session.speaking);
        assert_eq!(session.turn, 1);
    }

    #[test]
    fn test_idle_transition_applies_for_current_turn() {
        let mut session = SessionState::new();
        session.begin_speaking_turn();

        assert!(session.try_idle_transition(1));
        assert!(!session.speaking);
        assert!(!session.turn_started);
    }

    #[test]
    fn test_stale_idle_timer_is_discarded() {
        let mut session = SessionState::new();
        session.begin_speaking_turn();

        // A newer turn started before the first turn's timer fired
        session.try_idle_transition(1);
        session.begin_speaking_turn();
        assert!(!session.try_idle_transition(1));
        assert!(session.speaking);

        assert!(session.try_idle_transition(2));
    }

    #[test]
    fn test_idle_timer_without_speaking_is_noop() {
        let mut session = SessionState::new();
        assert!(!session.try_idle_transition(0));
    }

    #[test]
    fn test_reset_presence_keeps_guided_state() {
        let mut session = SessionState::new();
        session.phase = SessionPhase::Active;
        session.document.add_field("a", None, None);
        session
            .guided
            .start(vec!["a".to_string()], false, &mut session.document);
        session.guided.take_events();

        session.reset_presence();

        assert_eq!(session.phase, SessionPhase::Inactive);
        assert!(session.guided.is_active());
    }
}
