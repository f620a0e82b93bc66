//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A batch of magnet links to enqueue under one save path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMagnetsRequest {
    /// Magnet URIs, in dispatch order.
    pub magnets: Vec<String>,
    /// Directory the client should save into.
    pub save_path: String,
}

impl AddMagnetsRequest {
    pub fn new(magnets: Vec<String>, save_path: impl Into<String>) -> Self {
        Self {
            magnets,
            save_path: save_path.into(),
        }
    }
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Enqueue every magnet in the request. Succeeds only if the whole batch
    /// was accepted.
    async fn add_magnets(&self, request: &AddMagnetsRequest) -> Result<(), TorrentClientError>;
}
