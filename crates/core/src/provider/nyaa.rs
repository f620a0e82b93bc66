//! nyaa.si provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::NyaaConfig;

use super::{Provider, ProviderError, ProviderRow, SearchQuery};

const USER_AGENT: &str = concat!("episode-hound/", env!("CARGO_PKG_VERSION"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("valid cell selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid link selector"));

/// nyaa.si search provider.
///
/// Results are requested sorted by seeders, descending, so the first row for
/// a given episode is the best seeded one.
pub struct NyaaProvider {
    client: Client,
    config: NyaaConfig,
}

impl NyaaProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: NyaaConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Build the search URL for a query.
    fn build_search_url(&self, query: &SearchQuery) -> String {
        let category = match query.episode {
            Some(_) => &self.config.episode_category,
            None => &self.config.series_category,
        };

        format!(
            "{}/?f=0&c={}&q={}&s=seeders&o=desc",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(category),
            urlencoding::encode(&query.text())
        )
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ProviderError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else if e.is_connect() {
                ProviderError::ConnectionFailed(e.to_string())
            } else {
                ProviderError::ApiError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError(format!("HTTP {}", status)));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::ApiError(e.to_string())
            }
        })
    }
}

#[async_trait]
impl Provider for NyaaProvider {
    fn name(&self) -> &str {
        "nyaa.si"
    }

    async fn search(&self, query: &SearchQuery) -> Vec<ProviderRow> {
        let url = self.build_search_url(query);
        debug!(url = %url, "Searching nyaa.si");

        match self.fetch_page(&url).await {
            Ok(html) => {
                let rows = parse_results(&html, &query.row_classes);
                debug!(query = %query.text(), rows = rows.len(), "nyaa.si search complete");
                rows
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Error occurred while fetching search results");
                Vec::new()
            }
        }
    }
}

/// Parse a nyaa.si result page.
///
/// Only rows carrying one of `row_classes` are kept. The row's title is the
/// first link in the second cell that is not the comments link; its magnet
/// is the first `magnet:` link anywhere in the row. Rows missing either are
/// dropped. Document order is preserved.
pub fn parse_results(html: &str, row_classes: &[String]) -> Vec<ProviderRow> {
    let document = Html::parse_document(html);

    document
        .select(&ROW_SELECTOR)
        .filter_map(|row| {
            let classification = row
                .value()
                .classes()
                .find(|class| row_classes.iter().any(|wanted| wanted == class))?
                .to_string();
            let title = row_title(&row)?;
            let magnet_link = row
                .select(&LINK_SELECTOR)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| href.contains("magnet:"))?
                .to_string();

            Some(ProviderRow {
                title,
                magnet_link,
                classification,
            })
        })
        .collect()
}

fn row_title(row: &ElementRef<'_>) -> Option<String> {
    let cell = row.select(&CELL_SELECTOR).nth(1)?;
    let link = cell.select(&LINK_SELECTOR).find(|a| {
        a.value()
            .attr("href")
            .map(|href| !href.contains("#comments"))
            .unwrap_or(false)
    })?;

    let title = link.text().collect::<String>().trim().to_string();
    (!title.is_empty()).then_some(title)
}
