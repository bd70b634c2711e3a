//! # Yoopass Secrets
//!
//! The secret lifecycle engine behind yoopass: share a message through a
//! server that only ever holds ciphertext.
//!
//! - **Client-held keys**: every secret is sealed with AES-128-GCM under a
//!   fresh key that is returned to the creator and never stored
//! - **Expiring storage**: entries carry an optional TTL enforced by the store
//! - **One-time reads**: one-time secrets are removed atomically on first read
//! - **Opaque failures**: unknown, expired, consumed and wrong-key reads all
//!   look the same to the caller
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use yoopass_secrets::{MemoryStore, SecretService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> yoopass_secrets::Result<()> {
//! let service = SecretService::new(Arc::new(MemoryStore::new()));
//!
//! let handle = service
//!     .create("the vault code is 1234", Some(Duration::from_secs(3600)), true)
//!     .await?;
//!
//! let message = service.retrieve(&handle.id, &handle.key).await?;
//! assert_eq!(message, "the vault code is 1234");
//!
//! // One-time secrets are gone after the first read.
//! assert!(service.retrieve(&handle.id, &handle.key).await.is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Considerations
//!
//! - Keys and decrypted payloads are zeroized after use
//! - Debug output for keys and records is redacted
//! - Keys and messages are never logged

pub mod encryption;
pub mod error;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{CipherError, Error, Result, StoreError, StoreResult};
pub use types::{SecretHandle, SecretId, SecretRecord};

pub use encryption::SecretKey;

pub use store::{MemoryStore, RedbStore, SecretStore, StoreFuture};

pub use service::{SecretService, ServiceConfig};
