//! Ledger trait and types.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Full ledger contents: series name to downloaded episode numbers.
pub type LedgerSnapshot = BTreeMap<String, BTreeSet<u32>>;

/// Errors that can occur while reading or writing the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger file is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to serialize ledger: {0}")]
    Serialize(String),
}

/// Persisted record of downloaded episodes.
///
/// Series names are matched exactly (case and whitespace sensitive).
pub trait EpisodeLedger: Send + Sync {
    /// Read the whole ledger. A ledger that was never written is empty.
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError>;

    /// Replace the whole ledger.
    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError>;

    /// Episodes recorded for a series, or `None` if the series has no entry.
    fn episodes(&self, series: &str) -> Result<Option<BTreeSet<u32>>, LedgerError> {
        Ok(self.snapshot()?.remove(series))
    }

    /// Whether the series has an entry, even an empty one.
    fn contains_series(&self, series: &str) -> Result<bool, LedgerError> {
        Ok(self.snapshot()?.contains_key(series))
    }

    /// Whether the episode has already been downloaded.
    fn is_downloaded(&self, series: &str, episode: u32) -> Result<bool, LedgerError> {
        Ok(self
            .snapshot()?
            .get(series)
            .map(|episodes| episodes.contains(&episode))
            .unwrap_or(false))
    }

    /// Create an empty entry for a series. Returns `true` if it was created.
    fn ensure_series(&self, series: &str) -> Result<bool, LedgerError> {
        let mut snapshot = self.snapshot()?;
        if snapshot.contains_key(series) {
            return Ok(false);
        }
        snapshot.insert(series.to_string(), BTreeSet::new());
        self.persist(&snapshot)?;
        Ok(true)
    }

    /// Record one episode as downloaded (read-modify-write of the whole ledger).
    fn mark_downloaded(&self, series: &str, episode: u32) -> Result<(), LedgerError> {
        let mut snapshot = self.snapshot()?;
        snapshot
            .entry(series.to_string())
            .or_default()
            .insert(episode);
        self.persist(&snapshot)
    }
}
