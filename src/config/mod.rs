//! Configuration module for the Formant server
//!
//! Configuration comes from environment variables (with `.env` support),
//! with sensible defaults for local development. The split follows the
//! loading/validation seam: `env` reads the process environment,
//! `validation` checks the result.

use std::path::PathBuf;

mod env;
mod validation;

pub use self::validation::validate_base_url;

/// Server configuration
///
/// Contains everything needed to run the Formant server:
/// - Listen address (host, port)
/// - Validation service endpoint and request timeout
/// - Optional path for durable cooldown persistence
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Base URL of the validation service.
    pub validation_base_url: String,
    /// Per-request timeout for validation calls, in seconds.
    pub validation_timeout_seconds: u64,

    /// Cooldown persistence (filesystem if set, in-memory otherwise)
    pub cooldown_path: Option<PathBuf>,
}

impl ServerConfig {
    /// The socket address the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
