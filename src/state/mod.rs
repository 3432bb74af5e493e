use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::core::cooldown::{CooldownStore, FilesystemCooldownStore, MemoryCooldownStore};
use crate::core::validation::ValidationClient;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Client for the external validation service
    validation: Arc<ValidationClient>,
    /// Cooldown persistence shared with the validation client
    cooldown: Arc<dyn CooldownStore>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        // Pick the cooldown backend: filesystem when a path is configured,
        // falling back to memory if it cannot be initialized
        let cooldown: Arc<dyn CooldownStore> = match &config.cooldown_path {
            Some(path) => match FilesystemCooldownStore::new(path.clone()).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!(
                        "Failed to initialize filesystem cooldown store at {:?}: {e}; using memory",
                        path
                    );
                    Arc::new(MemoryCooldownStore::new())
                }
            },
            None => Arc::new(MemoryCooldownStore::new()),
        };

        let validation = Arc::new(ValidationClient::new(
            config.validation_base_url.clone(),
            Duration::from_secs(config.validation_timeout_seconds),
            cooldown.clone(),
        ));

        Arc::new(Self {
            config,
            validation,
            cooldown,
        })
    }

    /// Get the validation service client
    pub fn validation(&self) -> Arc<ValidationClient> {
        self.validation.clone()
    }

    /// Get a handle to the cooldown store
    pub fn cooldown(&self) -> Arc<dyn CooldownStore> {
        self.cooldown.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            validation_base_url: "http://127.0.0.1:5000".to_string(),
            validation_timeout_seconds: 1,
            cooldown_path: None,
        }
    }

    #[tokio::test]
    async fn test_memory_cooldown_backend_by_default() {
        let state = AppState::new(test_config()).await;
        assert_eq!(state.cooldown().backend_type(), "memory");
    }

    #[tokio::test]
    async fn test_filesystem_cooldown_backend_when_path_set() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig {
            cooldown_path: Some(temp_dir.path().join("cooldown.json")),
            ..test_config()
        };

        let state = AppState::new(config).await;
        assert_eq!(state.cooldown().backend_type(), "filesystem");
    }
}
