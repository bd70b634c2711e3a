//! In-process secret store.

use std::collections::HashMap;
use std::future::ready;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{effective_ttl, SecretStore, StoreFuture};
use crate::error::StoreResult;
use crate::types::SecretId;

/// A stored blob with its deadline.
#[derive(Clone)]
struct Entry {
    blob: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// A [`SecretStore`] backed by a mutex-guarded `HashMap`.
///
/// Every operation runs under one lock, which makes [`take`](SecretStore::take)
/// atomic. Expired entries are evicted lazily when touched and in bulk by
/// [`purge_expired`](SecretStore::purge_expired).
///
/// Deadlines use `tokio::time::Instant`, so a paused runtime clock controls
/// expiry in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<SecretId, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put_now(&self, id: &SecretId, blob: Vec<u8>, ttl: Option<Duration>) {
        let expires_at = effective_ttl(ttl).and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .lock()
            .insert(id.clone(), Entry { blob, expires_at });
    }

    fn get_now(&self, id: &SecretId) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if entries.get(id)?.is_expired(now) {
            entries.remove(id);
            debug!(secret_id = %id, "evicted expired secret");
            return None;
        }

        entries.get(id).map(|entry| entry.blob.clone())
    }

    fn take_now(&self, id: &SecretId) -> Option<Vec<u8>> {
        let now = Instant::now();
        let entry = self.entries.lock().remove(id)?;

        if entry.is_expired(now) {
            debug!(secret_id = %id, "evicted expired secret");
            return None;
        }

        Some(entry.blob)
    }

    fn purge_now(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

impl SecretStore for MemoryStore {
    fn put<'a>(
        &'a self,
        id: &'a SecretId,
        blob: Vec<u8>,
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()> {
        self.put_now(id, blob, ttl);
        Box::pin(ready(Ok(())))
    }

    fn get<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(ready(Ok(self.get_now(id))))
    }

    fn take<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(ready(Ok(self.take_now(id))))
    }

    fn delete<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, ()> {
        self.entries.lock().remove(id);
        Box::pin(ready(Ok(())))
    }

    fn purge_expired(&self) -> StoreFuture<'_, usize> {
        let purged: StoreResult<usize> = Ok(self.purge_now());
        Box::pin(ready(purged))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}
