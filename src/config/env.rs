use std::env;
use std::path::PathBuf;

use super::ServerConfig;
use super::validation::validate_base_url;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible
    /// defaults. Also loads from a .env file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - `PORT` or `VALIDATION_TIMEOUT_SECONDS` are malformed
    /// - `VALIDATION_BASE_URL` is not an http(s) URL
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // Server configuration
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;

        // Validation service configuration
        let validation_base_url = env::var("VALIDATION_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let validation_timeout_seconds = env::var("VALIDATION_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<u64>()
            .map_err(|e| format!("Invalid validation timeout: {e}"))?;

        // Cooldown persistence
        let cooldown_path = env::var("COOLDOWN_PATH").ok().map(PathBuf::from);

        validate_base_url(&validation_base_url)?;

        Ok(ServerConfig {
            host,
            port,
            validation_base_url,
            validation_timeout_seconds,
            cooldown_path,
        })
    }
}
