//! Client-side cooldown persistence for the validation service.
//!
//! When the validation service rate-limits us (HTTP 429), the client records
//! a deadline and short-circuits further calls until it passes. The deadline
//! survives in whichever backend is configured: in-process memory, or a small
//! JSON file for durability across restarts.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Storage key for the cooldown deadline, in epoch milliseconds.
pub const COOLDOWN_KEY: &str = "validation_cooldown_until";

/// Errors that can occur while reading or writing the cooldown deadline.
#[derive(Error, Debug)]
pub enum CooldownError {
    /// I/O error from the filesystem backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted file is not valid JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cooldown store operations.
pub type Result<T> = std::result::Result<T, CooldownError>;

/// Current time as epoch milliseconds.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Trait defining the interface for cooldown persistence backends.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Returns the stored deadline in epoch milliseconds, if one is set.
    async fn deadline(&self) -> Result<Option<u64>>;

    /// Stores a deadline in epoch milliseconds.
    async fn set_deadline(&self, epoch_ms: u64) -> Result<()>;

    /// Removes any stored deadline.
    async fn clear(&self) -> Result<()>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

/// Memory-based cooldown store.
#[derive(Default)]
pub struct MemoryCooldownStore {
    deadline: RwLock<Option<u64>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CooldownStore for MemoryCooldownStore {
    async fn deadline(&self) -> Result<Option<u64>> {
        Ok(*self.deadline.read())
    }

    async fn set_deadline(&self, epoch_ms: u64) -> Result<()> {
        *self.deadline.write() = Some(epoch_ms);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.deadline.write() = None;
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem-based cooldown store.
///
/// Persists a single JSON object `{"validation_cooldown_until": <epoch_ms>}`
/// at the configured path.
pub struct FilesystemCooldownStore {
    path: PathBuf,
}

impl FilesystemCooldownStore {
    /// Creates a filesystem store at `path`, creating parent directories.
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(Self { path })
    }
}

#[async_trait]
impl CooldownStore for FilesystemCooldownStore {
    async fn deadline(&self) -> Result<Option<u64>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_slice(&data)?;
        Ok(value.get(COOLDOWN_KEY).and_then(Value::as_u64))
    }

    async fn set_deadline(&self, epoch_ms: u64) -> Result<()> {
        debug!("Persisting cooldown deadline {} to {:?}", epoch_ms, self.path);

        // Atomic write using temp file
        let payload = serde_json::to_vec(&json!({ COOLDOWN_KEY: epoch_ms }))?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&payload).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
