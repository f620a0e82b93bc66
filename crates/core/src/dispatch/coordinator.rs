//! Dispatch coordinator implementation.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::discovery::{DiscoveryEngine, EpisodeCandidate};
use crate::ledger::{EpisodeLedger, LedgerError};
use crate::seek::{missing_episodes, newest_target, Strategy};
use crate::series::SeriesId;
use crate::torrent_client::{AddMagnetsRequest, TorrentClient, TorrentClientError};

use super::types::{CycleOutcome, DispatchError};

/// Coordinator settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Download root; each series is saved in a subdirectory named after it.
    pub download_root: PathBuf,
    /// Providers allowed to run.
    pub providers_whitelist: Vec<String>,
    /// Upper bound for one torrent client hand-off.
    pub dispatch_timeout: Duration,
}

impl From<&Config> for DispatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            download_root: config.library.download_dir.clone(),
            providers_whitelist: config.search.providers_whitelist.clone(),
            dispatch_timeout: Duration::from_secs(config.torrent_client.dispatch_timeout_secs),
        }
    }
}

/// Serializes discovery cycles and commits their results.
pub struct DispatchCoordinator {
    engine: DiscoveryEngine,
    ledger: Arc<dyn EpisodeLedger>,
    torrent_client: Arc<dyn TorrentClient>,
    settings: DispatchSettings,
    /// Held for the whole of every cycle.
    cycle_lock: Mutex<()>,
}

impl DispatchCoordinator {
    pub fn new(
        engine: DiscoveryEngine,
        ledger: Arc<dyn EpisodeLedger>,
        torrent_client: Arc<dyn TorrentClient>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            engine,
            ledger,
            torrent_client,
            settings,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Run one cycle of `strategy` for a watch-list entry (`Name` or `Name:N`).
    pub async fn run(&self, strategy: Strategy, entry: &str) -> Result<CycleOutcome, DispatchError> {
        let _cycle = self.cycle_lock.lock().await;
        let series = SeriesId::parse(entry);

        let provider = self.engine.provider_name();
        if !self.settings.providers_whitelist.iter().any(|p| p == provider) {
            error!(
                provider = %provider,
                series = %series.base_name,
                "{} not in whitelist, skipping {}",
                provider,
                series.base_name
            );
            return Ok(CycleOutcome::ProviderNotWhitelisted);
        }

        if series.download_dir(&self.settings.download_root).is_none() {
            error!(entry = %entry, "Series name is not a valid directory name, skipping");
            return Err(DispatchError::InvalidSeriesName(series.base_name));
        }

        match strategy {
            Strategy::Check => self.check_locked(&series).await,
            Strategy::Newest => self.seek_newest_locked(&series).await,
            Strategy::Missing => self.seek_missing_locked(&series).await,
        }
    }

    /// Primary discovery: everything after the declared starting episode.
    pub async fn check(&self, entry: &str) -> Result<CycleOutcome, DispatchError> {
        self.run(Strategy::Check, entry).await
    }

    /// Look for the episode after the highest one downloaded.
    pub async fn seek_newest(&self, entry: &str) -> Result<CycleOutcome, DispatchError> {
        self.run(Strategy::Newest, entry).await
    }

    /// Look for holes between the starting episode and the highest one
    /// downloaded.
    pub async fn seek_missing(&self, entry: &str) -> Result<CycleOutcome, DispatchError> {
        self.run(Strategy::Missing, entry).await
    }

    async fn check_locked(&self, series: &SeriesId) -> Result<CycleOutcome, DispatchError> {
        info!(series = %series.base_name, "Checking for new episodes of {}", series.base_name);

        let candidates = self
            .engine
            .discover(
                self.ledger.as_ref(),
                &series.base_name,
                series.starting_episode,
                None,
            )
            .await?;

        self.dispatch(series, candidates).await
    }

    async fn seek_newest_locked(&self, series: &SeriesId) -> Result<CycleOutcome, DispatchError> {
        let Some(downloaded) = self.recorded_episodes(series).await? else {
            return self.bootstrap(series).await;
        };

        let target = newest_target(&downloaded, series.starting_episode);
        info!(
            series = %series.base_name,
            episode = target,
            "Seeking episode {} of {}",
            target,
            series.base_name
        );

        let candidates = self
            .engine
            .discover(
                self.ledger.as_ref(),
                &series.base_name,
                target.saturating_sub(1),
                Some(target),
            )
            .await?;

        if candidates.is_empty() {
            debug!(series = %series.base_name, episode = target, "Episode not found");
        }

        self.dispatch(series, candidates).await
    }

    async fn seek_missing_locked(&self, series: &SeriesId) -> Result<CycleOutcome, DispatchError> {
        let Some(downloaded) = self.recorded_episodes(series).await? else {
            return self.bootstrap(series).await;
        };

        let gaps = missing_episodes(&downloaded, series.starting_episode);
        if gaps.is_empty() {
            info!(series = %series.base_name, "No missing episodes found for {}", series.base_name);
            return Ok(CycleOutcome::NothingFound);
        }

        info!(
            series = %series.base_name,
            missing = ?gaps,
            "Missing episodes for {}",
            series.base_name
        );

        let mut recorded = Vec::new();
        for gap in gaps {
            debug!(series = %series.base_name, episode = gap, "Looking for missing episode");

            let mut candidates = self
                .engine
                .discover(
                    self.ledger.as_ref(),
                    &series.base_name,
                    gap.saturating_sub(1),
                    Some(gap),
                )
                .await?;
            candidates.retain(|c| c.episode == gap);

            if candidates.is_empty() {
                debug!(series = %series.base_name, episode = gap, "Missing episode not found");
                continue;
            }

            let outcome = self.dispatch(series, candidates).await?;
            recorded.extend_from_slice(outcome.episodes());
        }

        if recorded.is_empty() {
            Ok(CycleOutcome::NothingFound)
        } else {
            Ok(CycleOutcome::Dispatched { episodes: recorded })
        }
    }

    /// Run a ledger operation on the blocking pool.
    async fn with_ledger<T, F>(&self, op: F) -> Result<T, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn EpisodeLedger) -> Result<T, LedgerError> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        Ok(tokio::task::spawn_blocking(move || op(ledger.as_ref())).await??)
    }

    async fn recorded_episodes(
        &self,
        series: &SeriesId,
    ) -> Result<Option<BTreeSet<u32>>, DispatchError> {
        let name = series.base_name.clone();
        self.with_ledger(move |ledger| ledger.episodes(&name)).await
    }

    async fn bootstrap(&self, series: &SeriesId) -> Result<CycleOutcome, DispatchError> {
        let name = series.base_name.clone();
        self.with_ledger(move |ledger| ledger.ensure_series(&name)).await?;
        info!(
            series = %series.base_name,
            "Created ledger entry for {}",
            series.base_name
        );
        Ok(CycleOutcome::Bootstrapped)
    }

    /// Hand a batch to the torrent client, then record each episode.
    ///
    /// Nothing is recorded unless the whole batch was accepted.
    async fn dispatch(
        &self,
        series: &SeriesId,
        candidates: Vec<EpisodeCandidate>,
    ) -> Result<CycleOutcome, DispatchError> {
        if candidates.is_empty() {
            return Ok(CycleOutcome::NothingFound);
        }

        let series_name = series.base_name.as_str();
        let series_dir = series
            .download_dir(&self.settings.download_root)
            .ok_or_else(|| DispatchError::InvalidSeriesName(series.base_name.clone()))?;
        tokio::fs::create_dir_all(&series_dir).await?;

        let request = AddMagnetsRequest::new(
            candidates.iter().map(|c| c.magnet_link.clone()).collect(),
            series_dir.to_string_lossy(),
        );

        let sent = tokio::time::timeout(
            self.settings.dispatch_timeout,
            self.torrent_client.add_magnets(&request),
        )
        .await
        .unwrap_or(Err(TorrentClientError::Timeout));

        if let Err(e) = sent {
            error!(
                series = %series_name,
                client = %self.torrent_client.name(),
                error = %e,
                "Failed to hand torrents to the client, nothing recorded"
            );
            return Err(e.into());
        }

        let episodes: Vec<u32> = candidates.iter().map(|c| c.episode).collect();
        let to_record = episodes.clone();
        let name = series.base_name.clone();
        self.with_ledger(move |ledger| {
            for episode in to_record {
                ledger.mark_downloaded(&name, episode)?;
                info!(
                    series = %name,
                    episode,
                    "Marking episode {} of {} as downloaded",
                    episode,
                    name
                );
            }
            Ok(())
        })
        .await?;

        Ok(CycleOutcome::Dispatched { episodes })
    }
}
