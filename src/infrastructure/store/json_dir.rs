//! JSON-file durable queue adapter
//!
//! One JSON file per queued record, named by the (session, question)
//! idempotency key so a re-recorded answer overwrites its predecessor
//! at the filesystem level. Writes go through a temp file and rename,
//! which keeps a crash from ever leaving a half-written record behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{ResponseStore, StoreError};
use crate::domain::response::{PendingResponse, QueuedMutation, ResponseKey, ResponseStatus};

/// Durable queue rooted in the platform data directory
pub struct JsonDirStore {
    responses_dir: PathBuf,
    mutations_dir: PathBuf,
}

impl JsonDirStore {
    /// Create a store under the default data directory
    pub fn new() -> Self {
        Self::with_root(Self::default_root(dirs::data_dir()))
    }

    /// Queue root under the platform data dir, or the system temp dir
    /// when the platform reports none. Always an absolute path.
    fn default_root(data_dir: Option<PathBuf>) -> PathBuf {
        data_dir
            .unwrap_or_else(std::env::temp_dir)
            .join("rehearse")
            .join("queue")
    }

    /// Create a store under a custom root directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            responses_dir: root.join("responses"),
            mutations_dir: root.join("mutations"),
        }
    }

    fn response_path(&self, key: ResponseKey) -> PathBuf {
        self.responses_dir
            .join(format!("{}_{}.json", key.session_id, key.question_id))
    }

    fn mutation_path(&self, id: Uuid) -> PathBuf {
        self.mutations_dir.join(format!("{}.json", id))
    }

    async fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(dir).await.map_err(map_write_error)
    }

    /// Write through a temp file and rename, so a crash mid-write
    /// never corrupts an existing record
    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &data).await.map_err(map_write_error)?;
        fs::rename(&tmp, path).await.map_err(map_write_error)?;
        Ok(())
    }

    /// Read every `.json` record in a directory. A record that fails
    /// to parse is quarantined with a `.corrupt` extension rather
    /// than blocking the rest of the queue.
    async fn read_records<T: DeserializeOwned>(
        dir: &Path,
    ) -> Result<Vec<(PathBuf, T)>, StoreError> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::ReadFailed(e.to_string())),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

            match serde_json::from_str::<T>(&content) {
                Ok(record) => records.push((path, record)),
                Err(_) => {
                    eprintln!("Skipping corrupted queue record: {}", path.display());
                    let _ = fs::rename(&path, path.with_extension("corrupt")).await;
                }
            }
        }

        Ok(records)
    }

    async fn find_response(
        &self,
        id: Uuid,
    ) -> Result<Option<(PathBuf, PendingResponse)>, StoreError> {
        let records = Self::read_records::<PendingResponse>(&self.responses_dir).await?;
        Ok(records.into_iter().find(|(_, r)| r.id == id))
    }
}

impl Default for JsonDirStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseStore for JsonDirStore {
    async fn enqueue(&self, response: &PendingResponse) -> Result<(), StoreError> {
        Self::ensure_dir(&self.responses_dir).await?;
        Self::write_json(&self.response_path(response.key()), response).await
    }

    async fn list_pending(&self) -> Result<Vec<PendingResponse>, StoreError> {
        let records = Self::read_records::<PendingResponse>(&self.responses_dir).await?;
        let mut responses: Vec<_> = records.into_iter().map(|(_, r)| r).collect();
        responses.sort_by_key(|r| r.recorded_at);
        Ok(responses)
    }

    async fn mark_status(
        &self,
        id: Uuid,
        status: ResponseStatus,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let (path, mut record) = self
            .find_response(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        record.apply_status(status, error);
        Self::write_json(&path, &record).await
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        // Removing an already-gone record is fine; the queue converges
        // to the same state either way
        if let Some((path, _)) = self.find_response(id).await? {
            fs::remove_file(&path)
                .await
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn count(&self, status: ResponseStatus) -> Result<usize, StoreError> {
        let responses = self.list_pending().await?;
        Ok(responses.iter().filter(|r| r.status == status).count())
    }

    async fn enqueue_mutation(&self, mutation: &QueuedMutation) -> Result<(), StoreError> {
        Self::ensure_dir(&self.mutations_dir).await?;
        Self::write_json(&self.mutation_path(mutation.id), mutation).await
    }

    async fn list_mutations(&self) -> Result<Vec<QueuedMutation>, StoreError> {
        let records = Self::read_records::<QueuedMutation>(&self.mutations_dir).await?;
        let mut mutations: Vec<_> = records.into_iter().map(|(_, m)| m).collect();
        mutations.sort_by_key(|m| m.created_at);
        Ok(mutations)
    }

    async fn mark_mutation_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        let path = self.mutation_path(id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(e) => return Err(StoreError::ReadFailed(e.to_string())),
        };
        let mut mutation: QueuedMutation =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupted(e.to_string()))?;
        mutation.mark_failed(error);
        Self::write_json(&path, &mutation).await
    }

    async fn remove_mutation(&self, id: Uuid) -> Result<(), StoreError> {
        match fs::remove_file(self.mutation_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteFailed(e.to_string())),
        }
    }
}

fn map_write_error(e: std::io::Error) -> StoreError {
    if e.kind() == std::io::ErrorKind::StorageFull {
        StoreError::QuotaExceeded
    } else {
        StoreError::WriteFailed(e.to_string())
    }
}
