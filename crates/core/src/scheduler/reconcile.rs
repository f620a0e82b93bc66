//! Desired-state computation.

use std::collections::BTreeSet;

use crate::config::ScheduleConfig;
use crate::seek::Strategy;
use crate::watchlist::WatchList;

use super::types::{JobKey, ScheduleDiff};

/// Jobs that should be running for a watch-list.
///
/// The primary check always runs; the seek strategies only when enabled.
pub fn desired_jobs(watch_list: &WatchList, schedule: &ScheduleConfig) -> BTreeSet<JobKey> {
    let mut strategies = vec![Strategy::Check];
    if schedule.newest.enabled {
        strategies.push(Strategy::Newest);
    }
    if schedule.missing.enabled {
        strategies.push(Strategy::Missing);
    }

    watch_list
        .entries()
        .iter()
        .flat_map(|entry| strategies.iter().map(move |s| JobKey::new(entry.clone(), *s)))
        .collect()
}

/// Compute which jobs to start and stop. Jobs present in both sets are left
/// running untouched.
pub fn reconcile(desired: &BTreeSet<JobKey>, active: &BTreeSet<JobKey>) -> ScheduleDiff {
    ScheduleDiff {
        to_add: desired.difference(active).cloned().collect(),
        to_remove: active.difference(desired).cloned().collect(),
    }
}
