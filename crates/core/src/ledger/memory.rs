//! In-memory ledger, used in tests and dry runs.

use std::sync::Mutex;

use super::{EpisodeLedger, LedgerError, LedgerSnapshot};

/// Ledger held in memory only.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerSnapshot>,
    writes: Mutex<usize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with episodes.
    pub fn with_episodes<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u32>)>,
        S: Into<String>,
    {
        let snapshot = entries
            .into_iter()
            .map(|(series, episodes)| (series.into(), episodes.into_iter().collect()))
            .collect();
        Self {
            inner: Mutex::new(snapshot),
            writes: Mutex::new(0),
        }
    }

    /// Number of times the ledger was persisted.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

impl EpisodeLedger for MemoryLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.inner
            .lock()
            .map(|s| s.clone())
            .map_err(|e| LedgerError::Corrupt(e.to_string()))
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| LedgerError::Corrupt(e.to_string()))?;
        *inner = snapshot.clone();
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
