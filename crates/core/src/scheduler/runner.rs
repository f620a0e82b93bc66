//! Scheduler implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScheduleConfig;
use crate::dispatch::DispatchCoordinator;
use crate::seek::Strategy;
use crate::watchlist::WatchList;

use super::reconcile::{desired_jobs, reconcile};
use super::types::{JobKey, JobStatus, ScheduleDiff};

/// A running interval loop.
struct ScheduledJob {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    status: Arc<RwLock<JobStatus>>,
}

/// Owns the set of running jobs and keeps it in line with the watch-list.
pub struct Scheduler {
    coordinator: Arc<DispatchCoordinator>,
    schedule: ScheduleConfig,
    jobs: Mutex<BTreeMap<JobKey, ScheduledJob>>,
    /// Stopped jobs that may still be finishing a cycle.
    retiring: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(coordinator: Arc<DispatchCoordinator>, schedule: ScheduleConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            coordinator,
            schedule,
            jobs: Mutex::new(BTreeMap::new()),
            retiring: Mutex::new(Vec::new()),
            shutdown_tx,
        }
    }

    /// Reconcile running jobs with a watch-list.
    ///
    /// Jobs no longer wanted are told to stop after their current cycle; new
    /// jobs are spawned. Jobs in both sets keep running undisturbed.
    pub async fn apply(&self, watch_list: &WatchList) -> ScheduleDiff {
        let mut jobs = self.jobs.lock().await;

        // A loop that exited without being stopped is dropped so it gets respawned
        jobs.retain(|key, job| {
            if job.handle.is_finished() {
                warn!(job = %key, "Scheduled job exited unexpectedly");
                false
            } else {
                true
            }
        });
        self.retiring.lock().await.retain(|handle| !handle.is_finished());

        let active: BTreeSet<JobKey> = jobs.keys().cloned().collect();
        let desired = desired_jobs(watch_list, &self.schedule);
        let diff = reconcile(&desired, &active);

        for key in &diff.to_remove {
            if let Some(job) = jobs.remove(key) {
                info!(job = %key, "Unscheduling {}", key.entry);
                let _ = job.stop_tx.send(());
                self.retiring.lock().await.push(job.handle);
            }
        }

        for key in &diff.to_add {
            info!(job = %key, "Scheduling {}", key.entry);
            jobs.insert(key.clone(), self.spawn_job(key.clone()));
        }

        diff
    }

    /// Keys of the running jobs.
    pub async fn active_jobs(&self) -> BTreeSet<JobKey> {
        self.jobs.lock().await.keys().cloned().collect()
    }

    /// Status of every running job, ordered by key.
    pub async fn status(&self) -> Vec<JobStatus> {
        let jobs = self.jobs.lock().await;
        let mut statuses = Vec::with_capacity(jobs.len());
        for job in jobs.values() {
            statuses.push(job.status.read().await.clone());
        }
        statuses
    }

    /// Stop every job and wait for them to exit. A cycle in flight runs to
    /// completion first.
    pub async fn shutdown(&self) {
        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());

        let jobs = std::mem::take(&mut *self.jobs.lock().await);
        let mut handles: Vec<JoinHandle<()>> = jobs.into_values().map(|job| job.handle).collect();
        handles.append(&mut *self.retiring.lock().await);

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("Scheduled job ended abnormally: {}", e);
            }
        }

        info!("Scheduler stopped");
    }

    fn interval_for(&self, strategy: Strategy) -> Duration {
        let secs = match strategy {
            Strategy::Check => self.schedule.check_interval_secs,
            Strategy::Newest => self.schedule.newest.interval_secs,
            Strategy::Missing => self.schedule.missing.interval_secs,
        };
        Duration::from_secs(secs)
    }

    fn spawn_job(&self, key: JobKey) -> ScheduledJob {
        let (stop_tx, stop_rx) = oneshot::channel();
        let status = Arc::new(RwLock::new(JobStatus::new(key.clone())));
        let handle = tokio::spawn(job_loop(
            key.clone(),
            self.interval_for(key.strategy),
            Arc::clone(&self.coordinator),
            Arc::clone(&status),
            stop_rx,
            self.shutdown_tx.subscribe(),
        ));

        ScheduledJob {
            stop_tx,
            handle,
            status,
        }
    }
}

async fn job_loop(
    key: JobKey,
    interval: Duration,
    coordinator: Arc<DispatchCoordinator>,
    status: Arc<RwLock<JobStatus>>,
    mut stop_rx: oneshot::Receiver<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    debug!(job = %key, "Job loop started");
    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!(job = %key, "Job stopped");
                break;
            }
            _ = shutdown_rx.recv() => {
                debug!(job = %key, "Job received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let result = coordinator.run(key.strategy, &key.entry).await;

                let mut status = status.write().await;
                status.last_run = Some(Utc::now());
                status.runs += 1;
                match result {
                    Ok(outcome) => {
                        status.last_outcome = Some(outcome);
                        status.last_error = None;
                    }
                    Err(e) => {
                        warn!(job = %key, error = %e, "Cycle failed");
                        status.last_error = Some(e.to_string());
                    }
                }
            }
        }
    }
    debug!(job = %key, "Job loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SearchConfig};
    use crate::discovery::DiscoveryEngine;
    use crate::dispatch::{CycleOutcome, DispatchSettings};
    use crate::ledger::MemoryLedger;
    use crate::testing::{MockProvider, MockTorrentClient};

    fn scheduler(provider: Arc<MockProvider>, schedule: ScheduleConfig) -> Scheduler {
        let engine = DiscoveryEngine::new(provider, &SearchConfig::default());
        let coordinator = DispatchCoordinator::new(
            engine,
            Arc::new(MemoryLedger::new()),
            Arc::new(MockTorrentClient::new()),
            DispatchSettings::from(&Config::default()),
        );
        Scheduler::new(Arc::new(coordinator), schedule)
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_starts_and_stops_jobs() {
        let provider = Arc::new(MockProvider::new());
        let scheduler = scheduler(provider, ScheduleConfig::default());

        let diff = scheduler.apply(&WatchList::parse("A\nB\n")).await;
        assert_eq!(diff.to_add.len(), 2);
        assert!(diff.to_remove.is_empty());

        let diff = scheduler.apply(&WatchList::parse("B\nC\n")).await;
        assert_eq!(diff.to_add, BTreeSet::from([JobKey::new("C", Strategy::Check)]));
        assert_eq!(diff.to_remove, BTreeSet::from([JobKey::new("A", Strategy::Check)]));
        assert_eq!(
            scheduler.active_jobs().await,
            BTreeSet::from([
                JobKey::new("B", Strategy::Check),
                JobKey::new("C", Strategy::Check)
            ])
        );

        scheduler.shutdown().await;
        assert!(scheduler.active_jobs().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_on_interval() {
        let provider = Arc::new(MockProvider::new());
        let scheduler = scheduler(provider.clone(), ScheduleConfig::default());
        scheduler.apply(&WatchList::parse("A")).await;

        // Default check interval is 5s; first cycle fires after one interval
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(provider.search_count(), 2);

        let status = scheduler.status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].runs, 2);
        assert_eq!(status[0].last_outcome, Some(CycleOutcome::NothingFound));
        assert!(status[0].last_run.is_some());

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_cycle_in_flight() {
        let provider = Arc::new(MockProvider::new());
        provider.set_delay(Duration::from_secs(30)).await;
        let scheduler = scheduler(provider.clone(), ScheduleConfig::default());
        scheduler.apply(&WatchList::parse("A")).await;

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(provider.search_count(), 1);

        let key = JobKey::new("A", Strategy::Check);
        let status = Arc::clone(&scheduler.jobs.lock().await[&key].status);
        scheduler.shutdown().await;

        // The search finished and was recorded; no further cycle started
        assert_eq!(status.read().await.runs, 1);
        assert_eq!(provider.search_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_job_stops_running() {
        let provider = Arc::new(MockProvider::new());
        let scheduler = scheduler(provider.clone(), ScheduleConfig::default());
        scheduler.apply(&WatchList::parse("A")).await;
        scheduler.apply(&WatchList::default()).await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(provider.search_count(), 0);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_jobs_are_pruned() {
        let provider = Arc::new(MockProvider::new());
        let scheduler = scheduler(provider, ScheduleConfig::default());

        for _ in 0..3 {
            scheduler.apply(&WatchList::parse("A")).await;
            scheduler.apply(&WatchList::default()).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        scheduler.apply(&WatchList::default()).await;
        assert!(scheduler.retiring.lock().await.is_empty());

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_job_is_respawned() {
        let provider = Arc::new(MockProvider::new());
        let scheduler = scheduler(provider.clone(), ScheduleConfig::default());
        let list = WatchList::parse("A");
        let key = JobKey::new("A", Strategy::Check);

        scheduler.apply(&list).await;
        scheduler.jobs.lock().await[&key].handle.abort();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let diff = scheduler.apply(&list).await;
        assert_eq!(diff.to_add, BTreeSet::from([key.clone()]));
        assert!(diff.to_remove.is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(provider.search_count(), 1);

        scheduler.shutdown().await;
    }
}
