//! Job scheduling for the watch-list.
//!
//! Every watch-list entry gets one interval loop per enabled strategy. When
//! the watch-list changes, the desired job set is recomputed and reconciled
//! against the running jobs.

mod reconcile;
mod runner;
mod types;

pub use reconcile::{desired_jobs, reconcile};
pub use runner::Scheduler;
pub use types::{JobKey, JobStatus, ScheduleDiff};
