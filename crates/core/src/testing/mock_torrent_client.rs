//! Mock torrent client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::torrent_client::{AddMagnetsRequest, TorrentClient, TorrentClientError};

/// A recorded batch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    /// The request that was made.
    pub request: AddMagnetsRequest,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Track accepted batches for assertions
/// - Simulate failures and slow hand-offs
/// - Report the highest number of overlapping calls observed
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Accepted batches.
    added: Arc<RwLock<Vec<RecordedBatch>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// If set, every call fails with a fresh API error.
    always_fail: Arc<RwLock<bool>>,
    /// Simulated hand-off latency.
    delay: Arc<RwLock<Option<Duration>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all accepted batches.
    pub async fn batches(&self) -> Vec<RecordedBatch> {
        self.added.read().await.clone()
    }

    /// All accepted magnets, flattened in dispatch order.
    pub async fn magnets(&self) -> Vec<String> {
        self.added
            .read()
            .await
            .iter()
            .flat_map(|b| b.request.magnets.clone())
            .collect()
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every call fail until cleared.
    pub async fn set_always_fail(&self, fail: bool) {
        *self.always_fail.write().await = fail;
    }

    /// Delay every call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Highest number of `add_magnets` calls that were running at once.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn add_inner(&self, request: &AddMagnetsRequest) -> Result<(), TorrentClientError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if *self.always_fail.read().await {
            return Err(TorrentClientError::ApiError("mock failure".to_string()));
        }

        self.added.write().await.push(RecordedBatch {
            request: request.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_magnets(&self, request: &AddMagnetsRequest) -> Result<(), TorrentClientError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.add_inner(request).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_batches() {
        let client = MockTorrentClient::new();
        let request = AddMagnetsRequest::new(vec!["m1".into(), "m2".into()], "/dl/Show");
        client.add_magnets(&request).await.unwrap();

        let batches = client.batches().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].request, request);
        assert_eq!(client.magnets().await, vec!["m1", "m2"]);
        assert_eq!(client.max_concurrent_calls(), 1);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let client = MockTorrentClient::new();
        client.set_next_error(TorrentClientError::Timeout).await;
        let request = AddMagnetsRequest::new(vec!["m1".into()], "/dl/Show");

        tokio_test::assert_err!(client.add_magnets(&request).await);
        tokio_test::assert_ok!(client.add_magnets(&request).await);
        assert_eq!(client.batches().await.len(), 1);
    }
}
