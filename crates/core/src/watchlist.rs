//! Watch-list file handling.
//!
//! The watch-list is a plain text file with one series per line, either
//! `Name` or `Name:N` where `N` is the last episode the user already has.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Written when the watch-list file does not exist yet.
const SAMPLE_ENTRY: &str = "Sousou no Frieren";

/// Errors that can occur while reading the watch-list.
#[derive(Debug, Error)]
pub enum WatchListError {
    #[error("Failed to read watch-list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create watch-list {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed watch-list entries, in file order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    entries: Vec<String>,
}

impl WatchList {
    /// Parse file contents. Lines are trimmed and blank lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut entries: Vec<String> = Vec::new();
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !entries.iter().any(|e| e == line) {
                entries.push(line.to_string());
            }
        }
        Self { entries }
    }

    /// Read the watch-list from disk.
    pub fn load(path: &Path) -> Result<Self, WatchListError> {
        let contents = std::fs::read_to_string(path).map_err(|source| WatchListError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    /// Read the watch-list, creating it with a sample entry if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, WatchListError> {
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| WatchListError::Create {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(path, format!("{}\n", SAMPLE_ENTRY)).map_err(|source| {
                WatchListError::Create {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            info!(path = %path.display(), "Created watch-list with a sample entry");
        }

        Self::load(path)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Polls the watch-list file and reports edits.
#[derive(Debug)]
pub struct WatchListPoller {
    path: PathBuf,
    interval: Duration,
    fingerprint: Option<(SystemTime, u64)>,
    current: WatchList,
}

impl WatchListPoller {
    /// Create a poller that considers `current` the list already applied.
    pub fn new(path: impl Into<PathBuf>, interval: Duration, current: WatchList) -> Self {
        let path = path.into();
        let fingerprint = fingerprint(&path);
        Self {
            path,
            interval,
            fingerprint,
            current,
        }
    }

    /// Check the file once. Returns the new list if its contents changed.
    pub fn poll(&mut self) -> Result<Option<WatchList>, WatchListError> {
        let fingerprint = fingerprint(&self.path);
        if fingerprint == self.fingerprint {
            return Ok(None);
        }
        self.fingerprint = fingerprint;

        let list = WatchList::load(&self.path)?;
        if list == self.current {
            debug!(path = %self.path.display(), "Watch-list touched but unchanged");
            return Ok(None);
        }

        self.current = list.clone();
        Ok(Some(list))
    }

    /// Poll until shutdown, sending every changed list to `tx`.
    pub async fn run(mut self, tx: mpsc::Sender<WatchList>, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(path = %self.path.display(), "Watching for changes to {}", self.path.display());
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Watch-list poller received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    match self.poll() {
                        Ok(Some(list)) => {
                            info!(entries = list.len(), "Watch-list changed");
                            if tx.send(list).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Failed to reload watch-list: {}", e),
                    }
                }
            }
        }
    }
}

fn fingerprint(path: &Path) -> Option<(SystemTime, u64)> {
    let metadata = std::fs::metadata(path).ok()?;
    Some((metadata.modified().ok()?, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_blank_lines() {
        let list = WatchList::parse("Frieren\n\n  Dungeon Meshi:4  \r\n\t\nFrieren\n");
        assert_eq!(list.entries(), &["Frieren", "Dungeon Meshi:4"]);
    }

    #[test]
    fn test_load_or_create_writes_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lists/series_list.txt");

        let list = WatchList::load_or_create(&path).unwrap();
        assert_eq!(list.entries(), &[SAMPLE_ENTRY]);
        assert!(path.exists());

        std::fs::write(&path, "Other\n").unwrap();
        let list = WatchList::load_or_create(&path).unwrap();
        assert_eq!(list.entries(), &["Other"]);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = WatchList::load(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(WatchListError::Read { .. })));
    }

    #[test]
    fn test_poll_reports_changes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("series_list.txt");
        std::fs::write(&path, "A\n").unwrap();

        let initial = WatchList::load(&path).unwrap();
        let mut poller = WatchListPoller::new(&path, Duration::from_millis(10), initial);
        assert_eq!(poller.poll().unwrap(), None);

        std::fs::write(&path, "A\nB:3\n").unwrap();
        let changed = poller.poll().unwrap().unwrap();
        assert_eq!(changed.entries(), &["A", "B:3"]);
        assert_eq!(poller.poll().unwrap(), None);
    }

    #[tokio::test]
    async fn test_run_sends_changes_and_stops() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("series_list.txt");
        std::fs::write(&path, "A\n").unwrap();

        let poller = WatchListPoller::new(
            &path,
            Duration::from_millis(10),
            WatchList::load(&path).unwrap(),
        );
        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(poller.run(tx, shutdown_rx));

        std::fs::write(&path, "A\nBB\n").unwrap();
        let list = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.entries(), &["A", "BB"]);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
