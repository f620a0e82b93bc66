use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Quality tag and row classes are not empty
/// - All intervals and timeouts are non-zero
/// - qBittorrent URL is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.quality.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "search.quality cannot be empty".to_string(),
        ));
    }

    if config.search.row_classes.is_empty() {
        return Err(ConfigError::ValidationError(
            "search.row_classes cannot be empty".to_string(),
        ));
    }

    let schedule = &config.schedule;
    let intervals = [
        ("schedule.check_interval_secs", schedule.check_interval_secs),
        ("schedule.watch_interval_secs", schedule.watch_interval_secs),
        ("schedule.newest.interval_secs", schedule.newest.interval_secs),
        ("schedule.missing.interval_secs", schedule.missing.interval_secs),
        (
            "torrent_client.dispatch_timeout_secs",
            config.torrent_client.dispatch_timeout_secs,
        ),
        ("nyaa.timeout_secs", config.nyaa.timeout_secs as u64),
        (
            "torrent_client.qbittorrent.timeout_secs",
            config.torrent_client.qbittorrent.timeout_secs as u64,
        ),
    ];
    for (name, value) in intervals {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    if config.torrent_client.qbittorrent.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "torrent_client.qbittorrent.url cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_quality_fails() {
        let mut config = Config::default();
        config.search.quality = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = Config::default();
        config.schedule.missing.interval_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("schedule.missing.interval_secs"));
    }

    #[test]
    fn test_validate_empty_whitelist_is_allowed() {
        let mut config = Config::default();
        config.search.providers_whitelist.clear();
        assert!(validate_config(&config).is_ok());
    }
}
