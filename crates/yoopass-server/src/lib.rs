//! # yoopass-server
//!
//! HTTP API for yoopass: create a secret, get back a link-shaped
//! identifier and key, and let the recipient open it once or until it
//! expires.
//!
//! The server never stores keys. Each secret is sealed by
//! [`yoopass_secrets::SecretService`] and only ciphertext reaches the store.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yoopass_secrets::MemoryStore;
//! use yoopass_server::{ServerConfig, YoopassServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = YoopassServer::new(ServerConfig::default(), Arc::new(MemoryStore::new()));
//!     // server.serve().await.unwrap();
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/add` | POST | Seal a message and return its identifier and key |
//! | `/{identifier}/{key}` | GET | Open a secret (one-time secrets are burned) |
//! | `/health` | GET | Liveness check |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;
pub mod validation;

// Re-export main types
pub use config::{ServerConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use server::YoopassServer;
