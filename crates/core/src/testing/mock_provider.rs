//! Mock provider for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::provider::{Provider, ProviderRow, SearchQuery};

/// A query handler that produces rows dynamically based on the query.
type QueryHandler = Box<dyn Fn(&SearchQuery) -> Vec<ProviderRow> + Send + Sync>;

/// Mock implementation of the Provider trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable rows, or rows computed from the query
/// - Track search queries for assertions
/// - Simulate slow responses
///
/// # Example
///
/// ```rust,ignore
/// use hound_core::testing::{fixtures, MockProvider};
///
/// let provider = MockProvider::new();
/// provider.set_rows(vec![fixtures::episode_row("Frieren", 8, "1080")]).await;
///
/// let rows = provider.search(&query).await;
/// assert_eq!(rows.len(), 1);
/// assert_eq!(provider.search_count(), 1);
/// ```
pub struct MockProvider {
    name: String,
    /// Configured rows to return.
    rows: Arc<RwLock<Vec<ProviderRow>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<SearchQuery>>>,
    /// Query handler for dynamic rows, takes precedence over `rows`.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
    /// Simulated response latency.
    delay: Arc<RwLock<Option<Duration>>>,
    search_count: AtomicUsize,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("rows", &"<rows>")
            .field("searches", &"<searches>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a mock provider named like the nyaa.si provider.
    pub fn new() -> Self {
        Self::named("nyaa.si")
    }

    /// Create a mock provider with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            query_handler: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            search_count: AtomicUsize::new(0),
        }
    }

    /// Set the rows to return for subsequent searches.
    pub async fn set_rows(&self, rows: Vec<ProviderRow>) {
        *self.rows.write().await = rows;
    }

    /// Set a handler that computes rows from the query.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&SearchQuery) -> Vec<ProviderRow> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded search queries.
    pub async fn recorded_searches(&self) -> Vec<SearchQuery> {
        self.searches.read().await.clone()
    }

    /// Number of searches performed.
    pub fn search_count(&self) -> usize {
        self.search_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &SearchQuery) -> Vec<ProviderRow> {
        self.search_count.fetch_add(1, Ordering::SeqCst);
        self.searches.write().await.push(query.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let rows = if let Some(handler) = self.query_handler.read().await.as_ref() {
            handler(query)
        } else {
            self.rows.read().await.clone()
        };

        rows.into_iter()
            .filter(|row| query.row_classes.contains(&row.classification))
            .collect()
    }
}
