//! Durable secret store on a single redb file.
//!
//! Each value is `expires_at (u64 big-endian unix millis, 0 = never) || blob`.
//! redb serialises write transactions, so a read-then-remove inside one
//! write transaction is an atomic take.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

use super::{effective_ttl, SecretStore, StoreFuture};
use crate::error::{StoreError, StoreResult};
use crate::types::SecretId;

const SECRETS: TableDefinition<&str, &[u8]> = TableDefinition::new("secrets");

/// Width of the expiry header on every stored value.
const HEADER_LEN: usize = 8;

/// Sentinel deadline for entries that never expire.
const NO_EXPIRY: u64 = 0;

fn now_millis() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn deadline_millis(now: u64, ttl: Option<Duration>) -> u64 {
    match effective_ttl(ttl) {
        Some(ttl) => {
            let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
            now.saturating_add(ttl_ms).max(1)
        }
        None => NO_EXPIRY,
    }
}

fn is_expired(expires_at: u64, now: u64) -> bool {
    expires_at != NO_EXPIRY && now >= expires_at
}

fn encode_entry(expires_at: u64, blob: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + blob.len());
    out.extend_from_slice(&expires_at.to_be_bytes());
    out.extend_from_slice(blob);
    out
}

fn decode_entry(raw: &[u8]) -> StoreResult<(u64, &[u8])> {
    if raw.len() < HEADER_LEN {
        return Err(StoreError::Corrupt {
            reason: format!("entry is {} bytes, shorter than its header", raw.len()),
        });
    }
    let (header, blob) = raw.split_at(HEADER_LEN);
    let mut deadline = [0u8; HEADER_LEN];
    deadline.copy_from_slice(header);
    Ok((u64::from_be_bytes(deadline), blob))
}

/// A [`SecretStore`] persisted in a redb database file.
///
/// Blocking database work runs on tokio's blocking pool.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or initialised.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(StoreError::unavailable)?;

        // Make sure the table exists so read transactions never miss it.
        let txn = db.begin_write().map_err(StoreError::unavailable)?;
        txn.open_table(SECRETS).map_err(StoreError::unavailable)?;
        txn.commit().map_err(StoreError::unavailable)?;

        info!(path = %path.display(), "opened redb secret store");
        Ok(Self { db: Arc::new(db) })
    }

    fn blocking<T, F>(&self, op: F) -> StoreFuture<'static, T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || op(&db))
                .await
                .map_err(StoreError::unavailable)?
        })
    }
}

fn put_entry(db: &Database, key: &str, entry: &[u8]) -> StoreResult<()> {
    let txn = db.begin_write().map_err(StoreError::unavailable)?;
    {
        let mut table = txn.open_table(SECRETS).map_err(StoreError::unavailable)?;
        table.insert(key, entry).map_err(StoreError::unavailable)?;
    }
    txn.commit().map_err(StoreError::unavailable)
}

fn get_entry(db: &Database, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let txn = db.begin_read().map_err(StoreError::unavailable)?;
    let table = txn.open_table(SECRETS).map_err(StoreError::unavailable)?;

    let raw: Option<Vec<u8>> = table
        .get(key)
        .map_err(StoreError::unavailable)?
        .map(|guard| guard.value().to_vec());

    let Some(raw) = raw else {
        return Ok(None);
    };

    let (expires_at, blob) = decode_entry(&raw)?;
    if is_expired(expires_at, now_millis()) {
        return Ok(None);
    }
    Ok(Some(blob.to_vec()))
}

fn take_entry(db: &Database, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let txn = db.begin_write().map_err(StoreError::unavailable)?;
    let raw: Option<Vec<u8>> = {
        let mut table = txn.open_table(SECRETS).map_err(StoreError::unavailable)?;
        let removed = table
            .remove(key)
            .map_err(StoreError::unavailable)?
            .map(|guard| guard.value().to_vec());
        removed
    };
    txn.commit().map_err(StoreError::unavailable)?;

    let Some(raw) = raw else {
        return Ok(None);
    };

    let (expires_at, blob) = decode_entry(&raw)?;
    if is_expired(expires_at, now_millis()) {
        debug!(secret_id = %key, "dropped expired secret on take");
        return Ok(None);
    }
    Ok(Some(blob.to_vec()))
}

fn delete_entry(db: &Database, key: &str) -> StoreResult<()> {
    let txn = db.begin_write().map_err(StoreError::unavailable)?;
    {
        let mut table = txn.open_table(SECRETS).map_err(StoreError::unavailable)?;
        table.remove(key).map_err(StoreError::unavailable)?;
    }
    txn.commit().map_err(StoreError::unavailable)
}

fn purge_entries(db: &Database) -> StoreResult<usize> {
    let now = now_millis();
    let txn = db.begin_write().map_err(StoreError::unavailable)?;
    let purged = {
        let mut table = txn.open_table(SECRETS).map_err(StoreError::unavailable)?;

        let mut expired = Vec::new();
        for item in table.iter().map_err(StoreError::unavailable)? {
            let (key, value) = item.map_err(StoreError::unavailable)?;
            // Entries with a broken header cannot be read back either.
            let dead = decode_entry(value.value())
                .map_or(true, |(expires_at, _)| is_expired(expires_at, now));
            if dead {
                expired.push(key.value().to_owned());
            }
        }

        for key in &expired {
            table.remove(key.as_str()).map_err(StoreError::unavailable)?;
        }
        expired.len()
    };
    txn.commit().map_err(StoreError::unavailable)?;

    Ok(purged)
}

impl SecretStore for RedbStore {
    fn put<'a>(
        &'a self,
        id: &'a SecretId,
        blob: Vec<u8>,
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()> {
        let key = id.as_str().to_owned();
        let entry = encode_entry(deadline_millis(now_millis(), ttl), &blob);
        self.blocking(move |db| put_entry(db, &key, &entry))
    }

    fn get<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, Option<Vec<u8>>> {
        let key = id.as_str().to_owned();
        self.blocking(move |db| get_entry(db, &key))
    }

    fn take<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, Option<Vec<u8>>> {
        let key = id.as_str().to_owned();
        self.blocking(move |db| take_entry(db, &key))
    }

    fn delete<'a>(&'a self, id: &'a SecretId) -> StoreFuture<'a, ()> {
        let key = id.as_str().to_owned();
        self.blocking(move |db| delete_entry(db, &key))
    }

    fn purge_expired(&self) -> StoreFuture<'_, usize> {
        self.blocking(purge_entries)
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}
