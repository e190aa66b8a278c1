//! Queue drain use case

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::response::MutationKind;
use crate::domain::response::ResponseStatus;

use super::ports::{ResponseApi, ResponseStore};

/// Automatic drains give up on a record after this many failed
/// attempts; a manual retry still includes it.
pub const MAX_SYNC_ATTEMPTS: u32 = 3;

/// How a drain was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Triggered by a network/timer event; skips exhausted records
    Auto,
    /// Explicit user retry; includes exhausted records
    Manual,
}

/// Counts from one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
    pub mutations_applied: usize,
    pub mutations_failed: usize,
}

impl SyncReport {
    /// Whether the pass moved or attempted anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

struct EngineInner<S, A> {
    store: Arc<S>,
    api: A,
    draining: AtomicBool,
}

/// Drains the durable queue against the remote API.
///
/// A single atomic guard admits one drain pass at a time; a request
/// arriving mid-flight is dropped rather than queued, and the next
/// network, timer, or manual event retries. Per-record failures never
/// abort the pass.
pub struct SyncEngine<S, A> {
    inner: Arc<EngineInner<S, A>>,
}

impl<S, A> Clone for SyncEngine<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> SyncEngine<S, A>
where
    S: ResponseStore,
    A: ResponseApi,
{
    /// Create an engine over the local queue and remote API
    pub fn new(store: Arc<S>, api: A) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                api,
                draining: AtomicBool::new(false),
            }),
        }
    }

    /// Whether a drain pass is currently in flight
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst)
    }

    /// Run one drain pass. Returns None when another pass holds the
    /// guard; that request is dropped, not queued.
    pub async fn drain(&self, mode: DrainMode) -> Option<SyncReport> {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let report = self.drain_pass(mode).await;
        self.inner.draining.store(false, Ordering::SeqCst);
        Some(report)
    }

    async fn drain_pass(&self, mode: DrainMode) -> SyncReport {
        let mut report = SyncReport::default();

        let pending = match self.inner.store.list_pending().await {
            Ok(records) => records,
            Err(_) => return report,
        };

        for response in pending {
            if mode == DrainMode::Auto && response.is_exhausted(MAX_SYNC_ATTEMPTS) {
                report.skipped += 1;
                continue;
            }

            if self
                .inner
                .store
                .mark_status(response.id, ResponseStatus::Syncing, None)
                .await
                .is_err()
            {
                report.failed += 1;
                continue;
            }

            match self.inner.api.submit_response(&response).await {
                Ok(()) => {
                    // The server acknowledged; its response table is
                    // now the durable record, so the local copy goes.
                    let _ = self.inner.store.remove(response.id).await;
                    report.synced += 1;
                }
                Err(e) => {
                    let _ = self
                        .inner
                        .store
                        .mark_status(response.id, ResponseStatus::Failed, Some(e.to_string()))
                        .await;
                    report.failed += 1;
                }
            }
        }

        let mutations = match self.inner.store.list_mutations().await {
            Ok(mutations) => mutations,
            Err(_) => return report,
        };

        for mutation in mutations {
            if mode == DrainMode::Auto && mutation.is_exhausted(MAX_SYNC_ATTEMPTS) {
                report.skipped += 1;
                continue;
            }

            let result = match mutation.kind {
                MutationKind::TriggerEvaluation { session_id } => {
                    self.inner.api.trigger_evaluation(session_id).await
                }
            };

            match result {
                Ok(()) => {
                    let _ = self.inner.store.remove_mutation(mutation.id).await;
                    report.mutations_applied += 1;
                }
                Err(e) => {
                    let _ = self
                        .inner
                        .store
                        .mark_mutation_failed(mutation.id, &e.to_string())
                        .await;
                    report.mutations_failed += 1;
                }
            }
        }

        report
    }
}

impl<S, A> SyncEngine<S, A>
where
    S: ResponseStore + 'static,
    A: ResponseApi + 'static,
{
    /// Fire-and-forget automatic drain. Dropped silently when a pass
    /// is already in flight.
    pub fn request_drain(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            let _ = engine.drain(DrainMode::Auto).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ApiError, StoreError};
    use crate::domain::recording::{AudioClip, AudioFormat};
    use crate::domain::response::{PendingResponse, QueuedMutation, ResponseKey};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryStore {
        responses: Mutex<HashMap<ResponseKey, PendingResponse>>,
        mutations: Mutex<Vec<QueuedMutation>>,
    }

    impl MemoryStore {
        async fn insert(&self, response: PendingResponse) {
            self.responses.lock().await.insert(response.key(), response);
        }

        async fn response_count(&self) -> usize {
            self.responses.lock().await.len()
        }

        async fn get(&self, id: Uuid) -> Option<PendingResponse> {
            self.responses
                .lock()
                .await
                .values()
                .find(|r| r.id == id)
                .cloned()
        }
    }

    #[async_trait]
    impl ResponseStore for MemoryStore {
        async fn enqueue(&self, response: &PendingResponse) -> Result<(), StoreError> {
            self.responses
                .lock()
                .await
                .insert(response.key(), response.clone());
            Ok(())
        }

        async fn list_pending(&self) -> Result<Vec<PendingResponse>, StoreError> {
            let mut records: Vec<_> = self.responses.lock().await.values().cloned().collect();
            records.sort_by_key(|r| r.recorded_at);
            Ok(records)
        }

        async fn mark_status(
            &self,
            id: Uuid,
            status: ResponseStatus,
            error: Option<String>,
        ) -> Result<(), StoreError> {
            let mut responses = self.responses.lock().await;
            let record = responses
                .values_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;
            record.apply_status(status, error);
            Ok(())
        }

        async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
            self.responses.lock().await.retain(|_, r| r.id != id);
            Ok(())
        }

        async fn count(&self, status: ResponseStatus) -> Result<usize, StoreError> {
            Ok(self
                .responses
                .lock()
                .await
                .values()
                .filter(|r| r.status == status)
                .count())
        }

        async fn enqueue_mutation(&self, mutation: &QueuedMutation) -> Result<(), StoreError> {
            self.mutations.lock().await.push(mutation.clone());
            Ok(())
        }

        async fn list_mutations(&self) -> Result<Vec<QueuedMutation>, StoreError> {
            Ok(self.mutations.lock().await.clone())
        }

        async fn mark_mutation_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
            let mut mutations = self.mutations.lock().await;
            let mutation = mutations
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or(StoreError::NotFound(id))?;
            mutation.mark_failed(error);
            Ok(())
        }

        async fn remove_mutation(&self, id: Uuid) -> Result<(), StoreError> {
            self.mutations.lock().await.retain(|m| m.id != id);
            Ok(())
        }
    }

    /// Api mock that fails the first `failures` submissions
    struct FlakyApi {
        failures: AtomicUsize,
        submitted: Mutex<Vec<ResponseKey>>,
        evaluated: Mutex<Vec<Uuid>>,
    }

    impl FlakyApi {
        fn new(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                submitted: Mutex::new(Vec::new()),
                evaluated: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResponseApi for FlakyApi {
        async fn submit_response(&self, response: &PendingResponse) -> Result<(), ApiError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(ApiError::Unreachable("connection refused".to_string()));
            }
            self.submitted.lock().await.push(response.key());
            Ok(())
        }

        async fn trigger_evaluation(&self, session_id: Uuid) -> Result<(), ApiError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(ApiError::Unreachable("connection refused".to_string()));
            }
            self.evaluated.lock().await.push(session_id);
            Ok(())
        }
    }

    fn sample_response() -> PendingResponse {
        PendingResponse::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AudioClip::new(vec![0u8; 16], AudioFormat::Flac),
            "an answer",
            30,
        )
    }

    #[tokio::test]
    async fn drain_removes_synced_records() {
        let store = Arc::new(MemoryStore::default());
        store.insert(sample_response()).await;
        store.insert(sample_response()).await;

        let engine = SyncEngine::new(Arc::clone(&store), FlakyApi::new(0));
        let report = engine.drain(DrainMode::Auto).await.unwrap();

        assert_eq!(report.synced, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(store.response_count().await, 0);
    }

    #[tokio::test]
    async fn failed_submission_keeps_record_and_counts_retry() {
        let store = Arc::new(MemoryStore::default());
        let response = sample_response();
        let id = response.id;
        store.insert(response).await;

        let engine = SyncEngine::new(Arc::clone(&store), FlakyApi::new(1));
        let report = engine.drain(DrainMode::Auto).await.unwrap();

        assert_eq!(report.failed, 1);
        let record = store.get(id).await.unwrap();
        assert_eq!(record.status, ResponseStatus::Failed);
        assert_eq!(record.retry_count, 1);
        assert!(record.last_error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn one_failure_does_not_block_later_records() {
        let store = Arc::new(MemoryStore::default());
        store.insert(sample_response()).await;
        store.insert(sample_response()).await;

        // Only the first submission fails
        let engine = SyncEngine::new(Arc::clone(&store), FlakyApi::new(1));
        let report = engine.drain(DrainMode::Auto).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(store.response_count().await, 1);
    }

    #[tokio::test]
    async fn exhausted_records_are_skipped_by_auto_drains() {
        let store = Arc::new(MemoryStore::default());
        let response = sample_response();
        let id = response.id;
        store.insert(response).await;

        let engine = SyncEngine::new(Arc::clone(&store), FlakyApi::new(usize::MAX));
        for _ in 0..MAX_SYNC_ATTEMPTS {
            engine.drain(DrainMode::Auto).await.unwrap();
        }

        let record = store.get(id).await.unwrap();
        assert_eq!(record.retry_count, MAX_SYNC_ATTEMPTS);
        assert_eq!(record.status, ResponseStatus::Failed);

        // The fourth automatic drain no longer touches it
        let report = engine.drain(DrainMode::Auto).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        let record = store.get(id).await.unwrap();
        assert_eq!(record.retry_count, MAX_SYNC_ATTEMPTS);
    }

    #[tokio::test]
    async fn manual_drain_includes_exhausted_records() {
        let store = Arc::new(MemoryStore::default());
        let response = sample_response();
        store.insert(response).await;

        let engine = SyncEngine::new(
            Arc::clone(&store),
            FlakyApi::new(MAX_SYNC_ATTEMPTS as usize),
        );
        for _ in 0..MAX_SYNC_ATTEMPTS {
            engine.drain(DrainMode::Auto).await.unwrap();
        }
        assert_eq!(store.response_count().await, 1);

        // The api recovered; a manual retry syncs the exhausted record
        let report = engine.drain(DrainMode::Manual).await.unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(store.response_count().await, 0);
    }

    #[tokio::test]
    async fn second_drain_request_is_dropped_while_in_flight() {
        struct BlockingApi {
            entered: tokio::sync::mpsc::UnboundedSender<()>,
            release: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
        }

        #[async_trait]
        impl ResponseApi for BlockingApi {
            async fn submit_response(&self, _response: &PendingResponse) -> Result<(), ApiError> {
                let _ = self.entered.send(());
                if let Some(release) = self.release.lock().await.take() {
                    let _ = release.await;
                }
                Ok(())
            }

            async fn trigger_evaluation(&self, _session_id: Uuid) -> Result<(), ApiError> {
                Ok(())
            }
        }

        let store = Arc::new(MemoryStore::default());
        store.insert(sample_response()).await;

        let (entered_tx, mut entered_rx) = tokio::sync::mpsc::unbounded_channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        let engine = SyncEngine::new(
            Arc::clone(&store),
            BlockingApi {
                entered: entered_tx,
                release: Mutex::new(Some(release_rx)),
            },
        );

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.drain(DrainMode::Auto).await })
        };

        // Wait until the first pass is inside the api call
        entered_rx.recv().await.unwrap();
        assert!(engine.is_draining());

        // A drain requested now is dropped, not queued
        assert!(engine.drain(DrainMode::Auto).await.is_none());

        release_tx.send(()).unwrap();
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.synced, 1);
        assert!(!engine.is_draining());
    }

    #[tokio::test]
    async fn mutations_share_the_retry_discipline() {
        let store = Arc::new(MemoryStore::default());
        let session_id = Uuid::new_v4();
        store
            .enqueue_mutation(&QueuedMutation::new(MutationKind::TriggerEvaluation {
                session_id,
            }))
            .await
            .unwrap();

        let engine = SyncEngine::new(Arc::clone(&store), FlakyApi::new(1));

        let report = engine.drain(DrainMode::Auto).await.unwrap();
        assert_eq!(report.mutations_failed, 1);
        assert_eq!(store.list_mutations().await.unwrap()[0].attempts, 1);

        let report = engine.drain(DrainMode::Auto).await.unwrap();
        assert_eq!(report.mutations_applied, 1);
        assert!(store.list_mutations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_queue_drains_to_empty_report() {
        let store = Arc::new(MemoryStore::default());
        let engine = SyncEngine::new(Arc::clone(&store), FlakyApi::new(0));
        let report = engine.drain(DrainMode::Auto).await.unwrap();
        assert!(report.is_empty());
    }
}
