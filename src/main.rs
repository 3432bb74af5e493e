use axum::Router;
use tokio::net::TcpListener;

use anyhow::anyhow;

use formant::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections toward the validation
    // service. This must be done before any TLS connections are attempted.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Load configuration
    let config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    let address = config.address();
    println!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config).await;

    // Create WebSocket routes
    let ws_routes = routes::ws::create_ws_router();

    // Create public health check route
    let public_routes =
        Router::new().route("/", axum::routing::get(formant::handlers::api::health_check));

    // Combine all routes: public + websocket
    let app = public_routes.merge(ws_routes).with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    println!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
