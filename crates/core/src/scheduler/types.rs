//! Types for the scheduler.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::CycleOutcome;
use crate::seek::Strategy;

/// Identifies one scheduled job: a watch-list line and the strategy run for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    /// Watch-list line as written (`Name` or `Name:N`).
    pub entry: String,
    pub strategy: Strategy,
}

impl JobKey {
    pub fn new(entry: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            entry: entry.into(),
            strategy,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.entry, self.strategy)
    }
}

/// Jobs to start and stop to reach the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDiff {
    pub to_add: BTreeSet<JobKey>,
    pub to_remove: BTreeSet<JobKey>,
}

impl ScheduleDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Snapshot of one running job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub key: JobKey,
    /// When the last cycle finished.
    pub last_run: Option<DateTime<Utc>>,
    /// Outcome of the last successful cycle.
    pub last_outcome: Option<CycleOutcome>,
    /// Error message of the last failed cycle, cleared on success.
    pub last_error: Option<String>,
    /// Completed cycles, successful or not.
    pub runs: u64,
}

impl JobStatus {
    pub(crate) fn new(key: JobKey) -> Self {
        Self {
            key,
            last_run: None,
            last_outcome: None,
            last_error: None,
            runs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_ordering() {
        let mut keys = vec![
            JobKey::new("B", Strategy::Check),
            JobKey::new("A", Strategy::Missing),
            JobKey::new("A", Strategy::Check),
        ];
        keys.sort();
        assert_eq!(keys[0], JobKey::new("A", Strategy::Check));
        assert_eq!(keys[1], JobKey::new("A", Strategy::Missing));
        assert_eq!(keys[2].to_string(), "B [check]");
    }
}
