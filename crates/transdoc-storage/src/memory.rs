use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    /// Number of `head`/`list` observations left before the object shows up.
    hidden_for: u32,
}

/// In-memory storage with simulated read-after-write lag.
///
/// With a visibility lag of `n`, a freshly written object stays invisible to
/// the first `n` `head` calls for its key (and to listings during that time).
/// `get` is not affected.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    visibility_lag: Arc<AtomicU32>,
    head_calls: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
    fail_listing: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose writes need `lag` existence checks before they become visible.
    pub fn with_visibility_lag(lag: u32) -> Self {
        let storage = Self::default();
        storage.visibility_lag.store(lag, Ordering::SeqCst);
        storage
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store an object that is visible immediately, regardless of the lag setting.
    pub fn insert_visible(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.objects().insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: None,
                hidden_for: 0,
            },
        );
    }

    /// Make every `list` call fail with `message` (or succeed again with `None`).
    pub fn set_list_failure(&self, message: Option<&str>) {
        *self
            .fail_listing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = message.map(String::from);
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects().get(key).and_then(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryStorage {
    async fn head(&self, key: &str) -> StorageResult<bool> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects();
        match objects.get_mut(key) {
            Some(object) if object.hidden_for > 0 => {
                object.hidden_for -= 1;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self
            .fail_listing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
        {
            return Err(StorageError::ListFailed(message));
        }

        let keys = self
            .objects()
            .iter()
            .filter(|(key, object)| key.starts_with(prefix) && object.hidden_for == 0)
            .map(|(key, _)| key.clone())
            .collect();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.objects()
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        if key.is_empty() || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let hidden_for = self.visibility_lag.load(Ordering::SeqCst);
        self.objects().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(String::from),
                hidden_for,
            },
        );
        tracing::debug!(key = %key, hidden_for, "Memory upload successful");
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        if !self.objects().contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("memory://{}?expires={}", key, expires_in.as_secs()))
    }

    fn location_uri(&self, key: &str) -> String {
        format!("memory://{}", key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
