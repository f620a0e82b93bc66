//! qBittorrent torrent client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::QBittorrentConfig;

use super::{AddMagnetsRequest, TorrentClient, TorrentClientError};

/// qBittorrent client implementation (Web API v2).
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once a login succeeded; cleared when the session expires.
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and store session cookie.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            // Session cookie is stored by the cookie jar
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// POST a multipart form built by `build_form`, re-authenticating once if
    /// the session expired.
    async fn post_multipart<F>(
        &self,
        endpoint: &str,
        build_form: F,
    ) -> Result<String, TorrentClientError>
    where
        F: Fn() -> multipart::Form,
    {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let mut response = self
            .client
            .post(&url)
            .multipart(build_form())
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            response = self
                .client
                .post(&url)
                .multipart(build_form())
                .send()
                .await
                .map_err(map_request_error)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response.text().await.map_err(map_request_error)
    }
}

fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// Build the `torrents/add` form for a batch.
///
/// qBittorrent accepts several URLs in one `urls` field, one per line.
fn add_form(request: &AddMagnetsRequest) -> multipart::Form {
    multipart::Form::new()
        .text("urls", request.magnets.join("\n"))
        .text("savepath", request.save_path.clone())
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_magnets(&self, request: &AddMagnetsRequest) -> Result<(), TorrentClientError> {
        if request.magnets.is_empty() {
            return Ok(());
        }

        let body = self
            .post_multipart("/api/v2/torrents/add", || add_form(request))
            .await?;

        if body.contains("Fails.") {
            return Err(TorrentClientError::ApiError(
                "qBittorrent rejected the torrents".to_string(),
            ));
        }

        info!(
            count = request.magnets.len(),
            save_path = %request.save_path,
            "Added torrents to qBittorrent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> QBittorrentClient {
        QBittorrentClient::new(QBittorrentConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        assert_eq!(client("http://localhost:8080/").base_url(), "http://localhost:8080");
        assert_eq!(client("http://localhost:8080").base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_add_form_boundary_is_set() {
        let request = AddMagnetsRequest::new(
            vec!["magnet:?xt=urn:btih:a".to_string(), "magnet:?xt=urn:btih:b".to_string()],
            "/downloads/Show",
        );
        let form = add_form(&request);
        assert!(!form.boundary().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        // Unreachable URL: an empty batch must not touch the network
        let qb = client("http://127.0.0.1:1");
        let request = AddMagnetsRequest::new(vec![], "/downloads/Show");
        tokio_test::assert_ok!(qb.add_magnets(&request).await);
    }

    #[tokio::test]
    async fn test_unreachable_client_fails() {
        let qb = client("http://127.0.0.1:1");
        let request = AddMagnetsRequest::new(
            vec!["magnet:?xt=urn:btih:a".to_string()],
            "/downloads/Show",
        );
        let err = tokio_test::assert_err!(qb.add_magnets(&request).await);
        assert!(matches!(
            err,
            TorrentClientError::ConnectionFailed(_) | TorrentClientError::ApiError(_)
        ));
    }
}
