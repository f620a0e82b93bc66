use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hound_core::{
    load_or_create_config, validate_config, Config, DiscoveryEngine, DispatchCoordinator,
    DispatchSettings, EpisodeLedger, JsonLedger, NyaaProvider, Provider, QBittorrentClient,
    Scheduler, TorrentClient, TorrentClientBackend, WatchList, WatchListPoller,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let config_path = std::env::var("HOUND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_or_create_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Starting episode-hound");
    info!("Download directory: {:?}", config.library.download_dir);
    info!("Ledger: {:?}", config.library.ledger_path());

    let coordinator = Arc::new(build_coordinator(&config)?);
    let scheduler = Scheduler::new(Arc::clone(&coordinator), config.schedule.clone());

    let list_path = config.library.series_list_file.clone();
    let watch_list = WatchList::load_or_create(&list_path)
        .with_context(|| format!("Failed to load watch-list from {:?}", list_path))?;
    info!("Watch-list has {} entries", watch_list.len());
    scheduler.apply(&watch_list).await;

    let (shutdown_tx, _) = broadcast::channel(1);
    let (list_tx, mut list_rx) = mpsc::channel(8);
    let poller = WatchListPoller::new(
        list_path,
        Duration::from_secs(config.schedule.watch_interval_secs),
        watch_list,
    );
    let poller_handle = tokio::spawn(poller.run(list_tx, shutdown_tx.subscribe()));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            Some(list) = list_rx.recv() => {
                let diff = scheduler.apply(&list).await;
                info!(
                    added = diff.to_add.len(),
                    removed = diff.to_remove.len(),
                    "Rescheduled watch-list"
                );
            }
        }
    }

    let _ = shutdown_tx.send(());
    scheduler.shutdown().await;
    let _ = poller_handle.await;

    info!("episode-hound stopped");
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if std::env::var_os("HOUND_LOG_JSON").is_some() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_coordinator(config: &Config) -> Result<DispatchCoordinator> {
    let provider: Arc<dyn Provider> = Arc::new(
        NyaaProvider::new(config.nyaa.clone()).context("Failed to create nyaa.si provider")?,
    );
    info!("Using provider {} at {}", provider.name(), config.nyaa.base_url);

    let torrent_client: Arc<dyn TorrentClient> = match config.torrent_client.backend {
        TorrentClientBackend::QBittorrent => {
            let qbit = &config.torrent_client.qbittorrent;
            info!("Initializing qBittorrent client at {}", qbit.url);
            Arc::new(
                QBittorrentClient::new(qbit.clone())
                    .context("Failed to create qBittorrent client")?,
            )
        }
    };

    let ledger: Arc<dyn EpisodeLedger> = Arc::new(JsonLedger::new(config.library.ledger_path()));
    let engine = DiscoveryEngine::new(provider, &config.search);

    Ok(DispatchCoordinator::new(
        engine,
        ledger,
        torrent_client,
        DispatchSettings::from(config),
    ))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
