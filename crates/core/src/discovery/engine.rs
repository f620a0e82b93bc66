//! Discovery engine.
//!
//! Queries a provider for a series, parses episode numbers out of the
//! result titles and keeps only episodes that are new:
//! - the title contains the quality tag,
//! - the episode is not in the ledger,
//! - the episode is strictly after the cursor.
//!
//! The first row seen for an episode wins (providers return rows sorted by
//! seeders), and the result is ordered newest first.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::ledger::{EpisodeLedger, LedgerError};
use crate::parser::parse_episode_number;
use crate::provider::{Provider, ProviderRow, SearchQuery};

/// A new episode found on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    pub episode: u32,
    pub title: String,
    pub magnet_link: String,
}

/// Combines a provider with the title parser and the ledger.
pub struct DiscoveryEngine {
    provider: Arc<dyn Provider>,
    quality: String,
    row_classes: Vec<String>,
}

impl DiscoveryEngine {
    pub fn new(provider: Arc<dyn Provider>, search: &SearchConfig) -> Self {
        Self {
            provider,
            quality: search.quality.clone(),
            row_classes: search.row_classes.clone(),
        }
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Find episodes of `series_name` after `episodes_after` that are not in
    /// the ledger, newest first.
    ///
    /// `episode_hint` scopes the provider query to one episode number.
    pub async fn discover(
        &self,
        ledger: &dyn EpisodeLedger,
        series_name: &str,
        episodes_after: u32,
        episode_hint: Option<u32>,
    ) -> Result<Vec<EpisodeCandidate>, LedgerError> {
        let query = SearchQuery {
            series_name: series_name.to_string(),
            episode: episode_hint,
            row_classes: self.row_classes.clone(),
        };

        let rows = self.provider.search(&query).await;
        let downloaded = ledger.episodes(series_name)?.unwrap_or_default();

        let candidates = select_candidates(&rows, &self.quality, &downloaded, episodes_after);
        for candidate in &candidates {
            info!(
                series = %series_name,
                episode = candidate.episode,
                "Found episode {} of {}",
                candidate.episode,
                series_name
            );
        }

        Ok(candidates)
    }
}

/// Filter, deduplicate and order provider rows.
pub fn select_candidates(
    rows: &[ProviderRow],
    quality: &str,
    downloaded: &BTreeSet<u32>,
    episodes_after: u32,
) -> Vec<EpisodeCandidate> {
    let mut by_episode: BTreeMap<u32, EpisodeCandidate> = BTreeMap::new();

    for row in rows {
        let Some(episode) = parse_episode_number(&row.title, quality) else {
            debug!(title = %row.title, "No episode number in title");
            continue;
        };

        if !row.title.contains(quality)
            || downloaded.contains(&episode)
            || episode <= episodes_after
        {
            continue;
        }

        by_episode.entry(episode).or_insert_with(|| EpisodeCandidate {
            episode,
            title: row.title.clone(),
            magnet_link: row.magnet_link.clone(),
        });
    }

    by_episode.into_values().rev().collect()
}
