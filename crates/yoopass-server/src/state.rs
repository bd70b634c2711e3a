//! Shared state for the yoopass server.

use std::sync::Arc;
use std::time::Instant;

use yoopass_secrets::{SecretService, SecretStore, ServiceConfig};

use crate::config::ServerConfig;
use crate::validation::CreateLimits;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Secret lifecycle engine.
    service: SecretService,
    /// Limits applied to create requests.
    limits: CreateLimits,
    /// Server start time.
    start_time: Instant,
}

impl AppState {
    /// Create state around `store`, configured from `config`.
    pub fn new(config: ServerConfig, store: Arc<dyn SecretStore>) -> Self {
        let service_config = ServiceConfig::new().with_store_timeout(config.store_timeout);
        let limits = CreateLimits::from_config(&config);

        Self {
            config: Arc::new(config),
            service: SecretService::with_config(store, service_config),
            limits,
            start_time: Instant::now(),
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the secret service.
    #[must_use]
    pub const fn service(&self) -> &SecretService {
        &self.service
    }

    /// Get the create request limits.
    #[must_use]
    pub const fn limits(&self) -> &CreateLimits {
        &self.limits
    }

    /// Get the server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
