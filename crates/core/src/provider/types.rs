//! Types shared by provider implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A search against a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Series display name.
    pub series_name: String,
    /// When set, the query is scoped to this episode number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Only rows with one of these classifications are returned.
    pub row_classes: Vec<String>,
}

impl SearchQuery {
    /// Free-text part of the query.
    pub fn text(&self) -> String {
        match self.episode {
            Some(episode) => format!("{} {}", self.series_name, episode),
            None => self.series_name.clone(),
        }
    }
}

/// One row of a provider's result table, in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRow {
    /// Release title as displayed.
    pub title: String,
    /// Magnet URI.
    pub magnet_link: String,
    /// Row classification (e.g. "success" for trusted uploads).
    pub classification: String,
}

/// Errors raised while talking to a provider.
///
/// These stay inside the provider; `Provider::search` logs them and
/// returns no rows.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Trait for torrent index providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, matched against the configured whitelist.
    fn name(&self) -> &str;

    /// Search the index. Failures yield an empty list.
    async fn search(&self, query: &SearchQuery) -> Vec<ProviderRow>;
}
