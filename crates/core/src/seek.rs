//! Seek strategies.
//!
//! Besides the plain check (everything after the declared starting
//! episode), two strategies look at the ledger to decide what to search:
//! - `Newest`: the episode after the highest one downloaded.
//! - `Missing`: every hole between the starting episode and the highest one
//!   downloaded.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of cycle to run for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Everything after the declared starting episode.
    Check,
    /// The single next episode after the ledger's highest.
    Newest,
    /// Gaps below the ledger's highest episode.
    Missing,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Check => "check",
            Strategy::Newest => "newest",
            Strategy::Missing => "missing",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound on the gaps one missing-episode cycle searches for.
pub const MAX_MISSING_PER_CYCLE: usize = 100;

/// Episode the newest-episode strategy looks for.
///
/// Saturates at `u32::MAX`.
pub fn newest_target(downloaded: &BTreeSet<u32>, starting_episode: u32) -> u32 {
    let ledger_max = downloaded.last().copied().unwrap_or(0);
    ledger_max
        .saturating_add(1)
        .max(starting_episode.saturating_add(1))
}

/// The lowest episodes after `starting_episode` and below the ledger's
/// highest that are not in the ledger, at most `MAX_MISSING_PER_CYCLE`.
pub fn missing_episodes(downloaded: &BTreeSet<u32>, starting_episode: u32) -> BTreeSet<u32> {
    let ledger_max = downloaded.last().copied().unwrap_or(0);
    if ledger_max <= starting_episode {
        return BTreeSet::new();
    }

    (starting_episode.saturating_add(1)..=ledger_max)
        .filter(|episode| !downloaded.contains(episode))
        .take(MAX_MISSING_PER_CYCLE)
        .collect()
}
