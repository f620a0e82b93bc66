//! Watch-list entries.
//!
//! A watch-list line is either `Name` or `Name:N`, where `N` declares the
//! episode the user already has. Only episodes after `N` are wanted.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A parsed watch-list line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId {
    /// Display name, also the ledger key and download subdirectory.
    pub base_name: String,
    /// Episodes up to and including this number are not wanted.
    pub starting_episode: u32,
}

impl SeriesId {
    /// Parse a watch-list line.
    ///
    /// The suffix after the last `:` is only treated as a starting episode
    /// when it is a non-negative integer, so names that contain a colon
    /// survive intact.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some((name, suffix)) = line.rsplit_once(':') {
            if let Ok(starting_episode) = suffix.trim().parse::<u32>() {
                return Self {
                    base_name: name.trim().to_string(),
                    starting_episode,
                };
            }
        }

        Self {
            base_name: line.to_string(),
            starting_episode: 0,
        }
    }
}

impl SeriesId {
    /// Download directory for this series under `root`.
    ///
    /// `None` when the name is empty or would resolve outside `root`
    /// (absolute paths, `..`, `.`).
    pub fn download_dir(&self, root: &Path) -> Option<PathBuf> {
        let name = Path::new(&self.base_name);
        let mut components = name.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(root.join(name))
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.starting_episode == 0 {
            write!(f, "{}", self.base_name)
        } else {
            write!(f, "{}:{}", self.base_name, self.starting_episode)
        }
    }
}
