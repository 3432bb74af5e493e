//! WebSocket session layer
//!
//! Terminates the conversation event channel for one caller: transcripts and
//! audio activity come in, display and visual-state messages go out. The
//! per-connection event loop is the single writer of session state; timers
//! and background validation rejoin it through an internal channel.

pub mod config_handler;
pub mod control_handler;
pub mod handler;
pub mod messages;
pub mod processor;
pub mod session;
pub mod transcript_handler;

pub use self::handler::ws_session_handler;

use tokio::sync::mpsc;

use self::messages::OutgoingMessage;
use self::session::SessionState;

/// Send one outgoing message, ignoring a closed channel (the connection is
/// being torn down and the loop will observe that on its own).
pub(crate) async fn send(message_tx: &mpsc::Sender<OutgoingMessage>, message: OutgoingMessage) {
    let _ = message_tx.send(message).await;
}

/// Forward events queued by the guided-fill machine, in emission order.
pub(crate) async fn flush_guided_events(
    session: &mut SessionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) {
    for event in session.guided.take_events() {
        send(message_tx, event.into()).await;
    }
}
