//! Persistence for sealed secrets.
//!
//! A [`SecretStore`] holds opaque ciphertext blobs keyed by [`SecretId`],
//! each with an optional expiry deadline. Stores never see plaintext or keys.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: in-process map, lost on restart
//! - [`RedbStore`]: durable single-file database

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::StoreResult;
use crate::types::SecretId;

mod memory;
mod redb_store;

pub use self::memory::MemoryStore;
pub use self::redb_store::RedbStore;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Key-value persistence for sealed secrets with per-entry expiry.
///
/// Entries are written once and then only read or removed. An entry past
/// its deadline must be invisible to [`get`](SecretStore::get) and
/// [`take`](SecretStore::take) whether or not it has been purged yet.
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// Store `blob` under `id`, replacing any existing entry.
    ///
    /// With `ttl` of `None` (or zero) the entry lives until deleted.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unavailable.
    fn put<'a>(
        &'a self,
        id: &'a SecretId,
        blob: Vec<u8>,
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()>;

    /// Fetch the blob stored under `id`.
    ///
    /// Returns `None` if the identifier is unknown or expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unavailable.
    fn get<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, Option<Vec<u8>>>;

    /// Atomically fetch and remove the blob stored under `id`.
    ///
    /// When several callers race on the same entry, at most one of them
    /// receives `Some`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unavailable.
    fn take<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, Option<Vec<u8>>>;

    /// Remove the entry under `id`. Removing an absent entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unavailable.
    fn delete<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, ()>;

    /// Drop every entry whose deadline has passed, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unavailable.
    fn purge_expired(&self) -> StoreFuture<'_, usize>;
}

/// Treat a zero TTL the same as no TTL.
pub(crate) fn effective_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|t| !t.is_zero())
}
