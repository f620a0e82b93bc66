pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod ledger;
pub mod parser;
pub mod provider;
pub mod scheduler;
pub mod seek;
pub mod series;
pub mod testing;
pub mod torrent_client;
pub mod watchlist;

pub use config::{
    load_config, load_config_from_str, load_or_create_config, validate_config, Config,
    ConfigError, LibraryConfig, NyaaConfig, QBittorrentConfig, ScheduleConfig, SearchConfig,
    StrategySchedule, TorrentClientBackend, TorrentClientConfig,
};
pub use discovery::{select_candidates, DiscoveryEngine, EpisodeCandidate};
pub use dispatch::{CycleOutcome, DispatchCoordinator, DispatchError, DispatchSettings};
pub use ledger::{EpisodeLedger, JsonLedger, LedgerError, LedgerSnapshot, MemoryLedger};
pub use parser::parse_episode_number;
pub use provider::{NyaaProvider, Provider, ProviderError, ProviderRow, SearchQuery};
pub use scheduler::{desired_jobs, reconcile, JobKey, JobStatus, ScheduleDiff, Scheduler};
pub use seek::{missing_episodes, newest_target, Strategy};
pub use series::SeriesId;
pub use torrent_client::{
    AddMagnetsRequest, QBittorrentClient, TorrentClient, TorrentClientError,
};
pub use watchlist::{WatchList, WatchListError, WatchListPoller};
