//! Engine configuration.
//!
//! All settings have sensible defaults so the engine can start with zero
//! configuration against a local development server.

use std::path::PathBuf;
use std::time::Duration;

use causerie_shared::constants::{
    DEFAULT_CHANNEL, DEFAULT_SERVER_URL, HTTP_TIMEOUT_SECS, HYDRATION_OFFSET_MS,
    MEMORY_CACHE_BYTES, POLL_INTERVAL_MS,
};
use causerie_store::database::{default_data_dir, default_db_path, DB_FILE};
use causerie_store::StoreError;

/// Runtime configuration for [`ChatEngine`].
///
/// [`ChatEngine`]: crate::ChatEngine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the chat server.
    /// Env: `CAUSERIE_SERVER_URL`
    pub server_url: String,

    /// Username stamped on outbound messages.
    /// Env: `CAUSERIE_USERNAME`
    pub username: String,

    /// Destination channel for outbound messages.
    /// Env: `CAUSERIE_CHANNEL`
    pub channel: String,

    /// Poll interval shared by the sync and retry loops.
    pub poll_interval: Duration,

    /// Extra delay added to `poll_interval` for the hydration loop, so the
    /// two loops do not contend for the log permit on every tick.
    pub hydration_offset: Duration,

    /// Directory holding the SQLite database; `None` = platform data dir.
    pub data_dir: Option<PathBuf>,

    /// Directory holding cached image blobs and outbound temp files;
    /// `None` = `blobs/` next to the database.
    pub blob_dir: Option<PathBuf>,

    /// Byte budget for the in-memory decoded-image cache.
    pub memory_cache_bytes: usize,

    /// Timeout applied to every HTTP call.
    pub http_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            username: "guest".to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            hydration_offset: Duration::from_millis(HYDRATION_OFFSET_MS),
            data_dir: None,
            blob_dir: None,
            memory_cache_bytes: MEMORY_CACHE_BYTES,
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CAUSERIE_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(username) = std::env::var("CAUSERIE_USERNAME") {
            config.username = username;
        }
        if let Ok(channel) = std::env::var("CAUSERIE_CHANNEL") {
            config.channel = channel;
        }

        config
    }

    /// Path of the database file, creating the directory when needed.
    pub(crate) fn db_path(&self) -> Result<PathBuf, StoreError> {
        match &self.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok(dir.join(DB_FILE))
            }
            None => default_db_path(),
        }
    }

    /// Directory of the disk blob tier.
    pub(crate) fn resolve_blob_dir(&self) -> Result<PathBuf, StoreError> {
        match (&self.blob_dir, &self.data_dir) {
            (Some(dir), _) => Ok(dir.clone()),
            (None, Some(data)) => Ok(data.join("blobs")),
            (None, None) => Ok(default_data_dir()?.join("blobs")),
        }
    }
}
