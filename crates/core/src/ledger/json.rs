//! JSON file ledger.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use super::{EpisodeLedger, LedgerError, LedgerSnapshot};

/// Ledger stored as `{ "<series>": [episode, ...], ... }`.
///
/// Keys and episode lists are sorted, indented by four spaces. Every write
/// goes to a sibling temporary file that is then renamed over the ledger,
/// so readers never observe a partially written file.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Render a snapshot the way it is stored on disk.
fn render(snapshot: &LedgerSnapshot) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    snapshot
        .serialize(&mut serializer)
        .map_err(|e| LedgerError::Serialize(e.to_string()))?;
    buf.push(b'\n');
    Ok(buf)
}

impl EpisodeLedger for JsonLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LedgerSnapshot::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(LedgerSnapshot::new());
        }

        serde_json::from_str(&contents).map_err(|e| LedgerError::Corrupt(e.to_string()))
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = render(snapshot)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        debug!(path = ?self.path, series = snapshot.len(), "Ledger written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> JsonLedger {
        JsonLedger::new(dir.path().join("downloaded_episodes.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        assert!(ledger.snapshot().unwrap().is_empty());
        assert!(!ledger.is_downloaded("Foo", 1).unwrap());
        assert_eq!(ledger.episodes("Foo").unwrap(), None);
    }

    #[test]
    fn test_mark_and_reload() {
        let dir = TempDir::new().unwrap();
        ledger_in(&dir).mark_downloaded("Foo", 7).unwrap();

        let reloaded = ledger_in(&dir);
        assert!(reloaded.is_downloaded("Foo", 7).unwrap());
        assert!(!reloaded.is_downloaded("Foo", 8).unwrap());
        assert!(!reloaded.is_downloaded("foo", 7).unwrap());
    }

    #[test]
    fn test_on_disk_format() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger.mark_downloaded("Zeta", 2).unwrap();
        ledger.mark_downloaded("Alpha", 3).unwrap();
        ledger.mark_downloaded("Alpha", 1).unwrap();
        ledger.mark_downloaded("Alpha", 3).unwrap();

        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(
            contents,
            "{\n    \"Alpha\": [\n        1,\n        3\n    ],\n    \"Zeta\": [\n        2\n    ]\n}\n"
        );
        assert!(!ledger.temp_path().exists());
    }

    #[test]
    fn test_reads_legacy_duplicates() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::write(ledger.path(), r#"{"Foo": [3, 1, 3], "Bar": []}"#).unwrap();

        let snapshot = ledger.snapshot().unwrap();
        assert_eq!(snapshot["Foo"], BTreeSet::from([1, 3]));
        assert!(snapshot["Bar"].is_empty());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::write(ledger.path(), "{not json").unwrap();

        let err = ledger.snapshot().unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt(_)));
    }

    #[test]
    fn test_ensure_series_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::new(dir.path().join("library").join("ledger.json"));

        assert!(ledger.ensure_series("New Show").unwrap());
        assert_eq!(
            ledger.episodes("New Show").unwrap(),
            Some(BTreeSet::new())
        );
    }
}
