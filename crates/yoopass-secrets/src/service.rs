//! Creation and retrieval of secrets.
//!
//! [`SecretService`] ties the codec and a [`SecretStore`] together:
//!
//! - **create**: build record → serialize → seal under a fresh key →
//!   persist under a fresh identifier → hand back identifier + key
//! - **retrieve**: fetch → open → deserialize → consume if one-time →
//!   hand back the message
//!
//! The service keeps no mutable state of its own. The store is injected and
//! every store call runs under the configured deadline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use zeroize::Zeroize;

use crate::encryption::{decrypt, encrypt, SecretKey};
use crate::error::{Error, Result, StoreError, StoreResult};
use crate::store::{effective_ttl, SecretStore, StoreFuture};
use crate::types::{SecretHandle, SecretId, SecretRecord};

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for [`SecretService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Deadline applied to every store call.
    pub store_timeout: Duration,
}

impl ServiceConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Set the store call deadline.
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates the secret lifecycle over an injected store.
#[derive(Debug, Clone)]
pub struct SecretService {
    store: Arc<dyn SecretStore>,
    config: ServiceConfig,
}

impl SecretService {
    /// Creates a service with default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    /// Creates a service with explicit configuration.
    #[must_use]
    pub fn with_config(store: Arc<dyn SecretStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn SecretStore> {
        Arc::clone(&self.store)
    }

    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        call: StoreFuture<'_, T>,
    ) -> StoreResult<T> {
        tokio::time::timeout(self.config.store_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout { operation })?
    }

    /// Seal `message` and store it.
    ///
    /// `ttl` of `None` or zero keeps the secret until it is read (one-time)
    /// or forever (persistent).
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`Error::InvalidInput`] if `message` is empty
    /// - [`Error::PersistenceFailed`] if the store rejects the write
    pub async fn create(
        &self,
        message: &str,
        ttl: Option<Duration>,
        one_time: bool,
    ) -> Result<SecretHandle> {
        if message.is_empty() {
            return Err(Error::InvalidInput {
                reason: "message must not be empty".to_string(),
            });
        }

        let id = SecretId::generate();
        let key = SecretKey::generate();

        let mut plaintext = SecretRecord::new(message, one_time).to_bytes()?;
        let sealed = encrypt(&key, &plaintext);
        plaintext.zeroize();
        let sealed = sealed.map_err(|e| {
            error!(error = %e, "failed to seal secret");
            Error::Encryption(e)
        })?;

        let ttl = effective_ttl(ttl);
        self.with_deadline("put", self.store.put(&id, sealed, ttl))
            .await
            .map_err(|e| {
                error!(secret_id = %id, error = %e, "failed to persist secret");
                Error::PersistenceFailed(e)
            })?;

        info!(secret_id = %id, one_time, ttl = ?ttl, "secret created");
        Ok(SecretHandle { id, key })
    }

    /// Open the secret stored under `id` with `key`.
    ///
    /// One-time secrets are removed before the message is returned; when
    /// several readers race, only the one that removes the entry is served.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`Error::NotFound`] if the secret is unknown, expired, already
    ///   consumed, or `key` does not open it
    /// - [`Error::StoreUnavailable`] if the store cannot be read
    /// - [`Error::CorruptSecret`] if the opened payload is not a record
    /// - [`Error::DeletionFailed`] if a one-time secret cannot be removed
    pub async fn retrieve(&self, id: &SecretId, key: &SecretKey) -> Result<String> {
        let sealed = self
            .with_deadline("get", self.store.get(id))
            .await
            .map_err(|e| {
                error!(secret_id = %id, error = %e, "failed to read secret");
                Error::StoreUnavailable(e)
            })?
            .ok_or_else(|| {
                debug!(secret_id = %id, "secret not found");
                Error::NotFound
            })?;

        let mut record = open_record(id, key, &sealed)?;

        if record.one_time {
            self.consume(id).await?;
        }

        debug!(secret_id = %id, one_time = record.one_time, "secret retrieved");
        Ok(record.take_message())
    }

    /// Like [`retrieve`](Self::retrieve), but takes the transport tokens.
    ///
    /// A malformed identifier or key is reported as [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Same as [`retrieve`](Self::retrieve).
    pub async fn retrieve_encoded(&self, identifier: &str, key: &str) -> Result<String> {
        let id = SecretId::parse(identifier).map_err(|e| {
            debug!(error = %e, "rejected malformed identifier");
            Error::NotFound
        })?;
        let key = SecretKey::from_hex(key).map_err(|e| {
            debug!(secret_id = %id, error = %e, "rejected malformed key");
            Error::NotFound
        })?;

        self.retrieve(&id, &key).await
    }

    /// Drop expired entries from the store.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or times out.
    pub async fn purge_expired(&self) -> StoreResult<usize> {
        self.with_deadline("purge_expired", self.store.purge_expired())
            .await
    }

    /// Remove a one-time secret before its plaintext is handed out.
    ///
    /// A failed `take` withholds the message, but the removal itself may
    /// still have committed: a redb write that outlives the deadline, or a
    /// reply lost after the commit. In that case the secret is destroyed
    /// and later reads see `NotFound`. The message is never served twice.
    async fn consume(&self, id: &SecretId) -> Result<()> {
        match self.with_deadline("take", self.store.take(id)).await {
            Ok(Some(_)) => {
                info!(secret_id = %id, "one-time secret consumed");
                Ok(())
            }
            Ok(None) => {
                debug!(secret_id = %id, "one-time secret consumed by a concurrent reader");
                Err(Error::NotFound)
            }
            Err(e) => {
                error!(secret_id = %id, error = %e, "failed to delete one-time secret");
                Err(Error::DeletionFailed(e))
            }
        }
    }
}

fn open_record(id: &SecretId, key: &SecretKey, sealed: &[u8]) -> Result<SecretRecord> {
    let mut plaintext = decrypt(key, sealed).map_err(|e| {
        warn!(secret_id = %id, reason = %e, "failed to open secret");
        Error::NotFound
    })?;

    let record = SecretRecord::from_bytes(&plaintext);
    plaintext.zeroize();

    record.map_err(|e| {
        error!(secret_id = %id, error = %e, "opened secret is not a valid record");
        e
    })
}
