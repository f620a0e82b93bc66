//! Types for the dispatch coordinator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a cycle.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Ledger could not be read or written.
    #[error("ledger error: {0}")]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Torrent client rejected or failed the batch.
    #[error("torrent client error: {0}")]
    TorrentClient(#[from] crate::torrent_client::TorrentClientError),

    /// Series download directory could not be created.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Series name would resolve outside the download root.
    #[error("invalid series name: {0:?}")]
    InvalidSeriesName(String),

    /// Blocking ledger task panicked or was cancelled.
    #[error("ledger task failed: {0}")]
    LedgerTask(#[from] tokio::task::JoinError),
}

/// What a cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The provider is not whitelisted; nothing was touched.
    ProviderNotWhitelisted,
    /// The series had no ledger entry; an empty one was created.
    Bootstrapped,
    /// No new episodes were found.
    NothingFound,
    /// Episodes were handed to the torrent client and recorded, newest first.
    Dispatched { episodes: Vec<u32> },
}

impl CycleOutcome {
    /// Episodes recorded by this cycle.
    pub fn episodes(&self) -> &[u32] {
        match self {
            CycleOutcome::Dispatched { episodes } => episodes,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_episodes() {
        let outcome = CycleOutcome::Dispatched {
            episodes: vec![5, 4],
        };
        assert_eq!(outcome.episodes(), &[5, 4]);
        assert!(CycleOutcome::NothingFound.episodes().is_empty());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&CycleOutcome::Bootstrapped).unwrap();
        assert_eq!(json, r#"{"type":"bootstrapped"}"#);
    }

    #[test]
    fn test_error_display() {
        let err = DispatchError::from(crate::torrent_client::TorrentClientError::Timeout);
        assert_eq!(err.to_string(), "torrent client error: Request timeout");

        let err = DispatchError::InvalidSeriesName("../x".to_string());
        assert_eq!(err.to_string(), "invalid series name: \"../x\"");
    }
}
