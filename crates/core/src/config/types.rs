use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub nyaa: NyaaConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub torrent_client: TorrentClientConfig,
}

/// Where downloads, the watch-list and the ledger live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Download root. Each series gets a subdirectory named after it.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Newline-delimited watch-list file.
    #[serde(default = "default_series_list_file")]
    pub series_list_file: PathBuf,
    /// Ledger file name, relative to `download_dir`.
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,
}

impl LibraryConfig {
    /// Full path of the episode ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.download_dir.join(&self.ledger_file)
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            series_list_file: default_series_list_file(),
            ledger_file: default_ledger_file(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_series_list_file() -> PathBuf {
    PathBuf::from("series_list.txt")
}

fn default_ledger_file() -> String {
    "downloaded_episodes.json".to_string()
}

/// Filters applied to provider results.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Token that must appear verbatim in a release title (e.g. "1080").
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Provider row classes that are considered at all.
    #[serde(default = "default_row_classes")]
    pub row_classes: Vec<String>,
    /// Providers allowed to run.
    #[serde(default = "default_providers_whitelist")]
    pub providers_whitelist: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            row_classes: default_row_classes(),
            providers_whitelist: default_providers_whitelist(),
        }
    }
}

fn default_quality() -> String {
    "1080".to_string()
}

fn default_row_classes() -> Vec<String> {
    vec![
        "success".to_string(),
        "danger".to_string(),
        "default".to_string(),
    ]
}

fn default_providers_whitelist() -> Vec<String> {
    vec!["nyaa.si".to_string()]
}

/// nyaa.si provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NyaaConfig {
    #[serde(default = "default_nyaa_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Category used for plain series searches.
    #[serde(default = "default_series_category")]
    pub series_category: String,
    /// Category used when a search is scoped to one episode.
    #[serde(default = "default_episode_category")]
    pub episode_category: String,
}

impl Default for NyaaConfig {
    fn default() -> Self {
        Self {
            base_url: default_nyaa_url(),
            timeout_secs: default_timeout(),
            series_category: default_series_category(),
            episode_category: default_episode_category(),
        }
    }
}

fn default_nyaa_url() -> String {
    "https://nyaa.si".to_string()
}

fn default_series_category() -> String {
    "1_2".to_string()
}

fn default_episode_category() -> String {
    "0_0".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Intervals for the periodic jobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Primary discovery interval per series.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// How often the watch-list file is polled for changes.
    #[serde(default = "default_watch_interval")]
    pub watch_interval_secs: u64,
    #[serde(default = "StrategySchedule::newest")]
    pub newest: StrategySchedule,
    #[serde(default = "StrategySchedule::missing")]
    pub missing: StrategySchedule,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            watch_interval_secs: default_watch_interval(),
            newest: StrategySchedule::newest(),
            missing: StrategySchedule::missing(),
        }
    }
}

fn default_check_interval() -> u64 {
    5
}

fn default_watch_interval() -> u64 {
    5
}

/// Enable flag and interval for one seek strategy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StrategySchedule {
    #[serde(default)]
    pub enabled: bool,
    pub interval_secs: u64,
}

impl StrategySchedule {
    fn newest() -> Self {
        Self {
            enabled: false,
            interval_secs: 3600,
        }
    }

    fn missing() -> Self {
        Self {
            enabled: false,
            interval_secs: 21600,
        }
    }
}

/// Torrent client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentClientConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: TorrentClientBackend,
    /// Upper bound for one batch hand-off, on top of the HTTP timeout.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,
    #[serde(default)]
    pub qbittorrent: QBittorrentConfig,
}

impl Default for TorrentClientConfig {
    fn default() -> Self {
        Self {
            backend: TorrentClientBackend::default(),
            dispatch_timeout_secs: default_dispatch_timeout(),
            qbittorrent: QBittorrentConfig::default(),
        }
    }
}

fn default_dispatch_timeout() -> u64 {
    60
}

/// Available torrent client backends
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentClientBackend {
    #[default]
    #[serde(rename = "qbittorrent")]
    QBittorrent,
}

/// qBittorrent configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    #[serde(default = "default_qbittorrent_url")]
    pub url: String,
    #[serde(default = "default_qbittorrent_username")]
    pub username: String,
    #[serde(default = "default_qbittorrent_password")]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for QBittorrentConfig {
    fn default() -> Self {
        Self {
            url: default_qbittorrent_url(),
            username: default_qbittorrent_username(),
            password: default_qbittorrent_password(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_qbittorrent_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_qbittorrent_username() -> String {
    "admin".to_string()
}

fn default_qbittorrent_password() -> String {
    "adminadmin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.search.quality, "1080");
        assert_eq!(
            config.search.row_classes,
            vec!["success", "danger", "default"]
        );
        assert_eq!(config.search.providers_whitelist, vec!["nyaa.si"]);
        assert_eq!(config.nyaa.timeout_secs, 30);
        assert_eq!(config.schedule.check_interval_secs, 5);
        assert!(!config.schedule.newest.enabled);
        assert_eq!(config.torrent_client.backend, TorrentClientBackend::QBittorrent);
    }

    #[test]
    fn test_ledger_path_joins_download_dir() {
        let library = LibraryConfig {
            download_dir: PathBuf::from("/data/anime"),
            ..Default::default()
        };
        assert_eq!(
            library.ledger_path(),
            PathBuf::from("/data/anime/downloaded_episodes.json")
        );
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[library]
download_dir = "/srv/media"
series_list_file = "/srv/watch.txt"

[search]
quality = "720"
row_classes = ["success"]
providers_whitelist = []

[nyaa]
base_url = "http://mirror.local"
timeout_secs = 10

[schedule]
check_interval_secs = 60

[schedule.newest]
enabled = true
interval_secs = 600

[torrent_client]
backend = "qbittorrent"

[torrent_client.qbittorrent]
url = "http://qbit:8080"
username = "user"
password = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.library.download_dir, PathBuf::from("/srv/media"));
        assert_eq!(config.search.quality, "720");
        assert!(config.search.providers_whitelist.is_empty());
        assert_eq!(config.nyaa.base_url, "http://mirror.local");
        assert_eq!(config.nyaa.series_category, "1_2");
        assert_eq!(config.schedule.check_interval_secs, 60);
        assert_eq!(
            config.schedule.newest,
            StrategySchedule {
                enabled: true,
                interval_secs: 600
            }
        );
        assert!(!config.schedule.missing.enabled);
        assert_eq!(config.torrent_client.qbittorrent.username, "user");
        assert_eq!(config.torrent_client.qbittorrent.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_backend_fails() {
        let toml = r#"
[torrent_client]
backend = "transmission"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
