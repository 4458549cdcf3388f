//! Delayed re-fetch after a mutation.
//!
//! Reindexing returns before the backend has moved the document along, so the
//! client waits a fixed delay and reads it once more. There is no retry or
//! backoff: whatever the single re-fetch returns is the result.

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::Document;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Source of fresh document records
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch `id` from the source of truth, bypassing any cache
    async fn fetch_document(&self, id: &str) -> Result<Document>;
}

#[async_trait]
impl DocumentFetcher for ApiClient {
    async fn fetch_document(&self, id: &str) -> Result<Document> {
        self.refetch_document(id).await
    }
}

/// Spawn one forced re-fetch of `document_id` after `delay`
pub fn schedule_refresh(
    fetcher: Arc<dyn DocumentFetcher>,
    document_id: impl Into<String>,
    delay: Duration,
) -> JoinHandle<Result<Document>> {
    let document_id = document_id.into();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        debug!("Refreshing document {} after {:?}", document_id, delay);
        fetcher.fetch_document(&document_id).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::test_document;
    use crate::status::IngestionStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DocumentFetcher for CountingFetcher {
        async fn fetch_document(&self, id: &str) -> Result<Document> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Api {
                    status: 404,
                    message: "Document not found".to_string(),
                });
            }
            let mut doc = test_document(id);
            doc.ingestion_status = IngestionStatus::Parsing;
            Ok(doc)
        }
    }

    #[tokio::test]
    async fn test_single_refetch_after_delay() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let handle = schedule_refresh(fetcher.clone(), "doc-1", Duration::from_millis(20));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);

        let doc = handle.await.unwrap().unwrap();
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.ingestion_status, IngestionStatus::Parsing);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let result = schedule_refresh(fetcher.clone(), "gone", Duration::from_millis(1))
            .await
            .unwrap();
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
