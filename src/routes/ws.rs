use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// The `/ws` endpoint is intentionally unauthenticated: the session protocol
/// carries no credentials of its own, and deployments are expected to front
/// it with a reverse proxy when access control is needed.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(ws::ws_session_handler))
        .layer(TraceLayer::new_for_http())
}
