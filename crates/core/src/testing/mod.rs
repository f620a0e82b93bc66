//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external seams (the
//! torrent index and the torrent client), so discovery cycles can be driven
//! end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use hound_core::testing::{fixtures, MockProvider, MockTorrentClient};
//!
//! let provider = MockProvider::new();
//! let torrent_client = MockTorrentClient::new();
//!
//! provider.set_rows(vec![fixtures::episode_row("Frieren", 8, "1080")]).await;
//! ```

mod mock_provider;
mod mock_torrent_client;

pub use mock_provider::MockProvider;
pub use mock_torrent_client::{MockTorrentClient, RecordedBatch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::provider::ProviderRow;

    /// A trusted row with the given title.
    pub fn row(title: &str, magnet_link: &str) -> ProviderRow {
        ProviderRow {
            title: title.to_string(),
            magnet_link: magnet_link.to_string(),
            classification: "success".to_string(),
        }
    }

    /// A trusted row for one episode, titled like a typical fansub release.
    pub fn episode_row(series: &str, episode: u32, quality: &str) -> ProviderRow {
        row(
            &format!("[SubsPlease] {} - {:02} ({}p) [ABCDEF01].mkv", series, episode, quality),
            &episode_magnet(series, episode),
        )
    }

    /// Deterministic magnet link for a series episode.
    pub fn episode_magnet(series: &str, episode: u32) -> String {
        format!(
            "magnet:?xt=urn:btih:{}{:04}",
            series.to_lowercase().replace(' ', ""),
            episode
        )
    }
}
