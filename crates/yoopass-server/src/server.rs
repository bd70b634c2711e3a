//! Yoopass server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use yoopass_secrets::{SecretService, SecretStore};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::AppState;

/// HTTP server for creating and reading secrets.
#[derive(Debug, Clone)]
pub struct YoopassServer {
    state: Arc<AppState>,
}

impl YoopassServer {
    /// Create a new server over `store` with the given configuration.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn SecretStore>) -> Self {
        let state = Arc::new(AppState::new(config, store));
        Self { state }
    }

    /// Open the configured store and create a server over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn from_config(config: ServerConfig) -> ApiResult<Self> {
        let store = config.store.open()?;
        Ok(Self::new(config, store))
    }

    /// Get the server state for external access.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Start the server on the configured address.
    ///
    /// This method runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self) -> ApiResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server and its expiry sweep stop when `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config().bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while running.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        let config = self.state.config();
        info!(
            addr = ?addr,
            store = %config.store,
            sweep_interval_secs = config.sweep_interval.as_secs(),
            "Yoopass server listening"
        );

        let sweeper = config
            .sweep_enabled()
            .then(|| spawn_sweeper(self.state.service().clone(), config.sweep_interval));

        let router = create_router(self.state.clone());
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()));

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        result?;
        info!("Yoopass server shut down");
        Ok(())
    }

    /// Create the router without starting the server.
    ///
    /// Useful for testing or embedding in another server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}

/// Periodically drop expired secrets from the store.
///
/// The first tick fires one `interval` after spawning.
pub fn spawn_sweeper(service: SecretService, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match service.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "purged expired secrets"),
                Err(e) => warn!(error = %e, "expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use yoopass_secrets::MemoryStore;

    fn loopback_config() -> ServerConfig {
        ServerConfig::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired_entries() {
        let store = Arc::new(MemoryStore::new());
        let service = SecretService::new(store.clone());

        service
            .create("short lived", Some(Duration::from_secs(30)), false)
            .await
            .unwrap();
        service.create("kept", None, false).await.unwrap();
        assert_eq!(store.len(), 2);

        let sweeper = spawn_sweeper(service, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.len(), 1);

        sweeper.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_skips_first_tick() {
        let store = Arc::new(MemoryStore::new());
        let service = SecretService::new(store.clone());
        service
            .create("x", Some(Duration::from_secs(1)), false)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let sweeper = spawn_sweeper(service, Duration::from_secs(60));
        tokio::task::yield_now().await;

        // Expired but not yet purged: the sweep has not run.
        assert_eq!(store.len(), 1);
        sweeper.abort();
    }

    #[test]
    fn test_from_config_opens_memory_store() {
        let server = YoopassServer::from_config(ServerConfig::default()).unwrap();
        assert_eq!(server.state().config().bind_addr.port(), 8082);
    }

    #[test]
    fn test_from_config_reports_bad_store() {
        let dir = tempfile::tempdir().unwrap();
        let unreachable = dir.path().join("missing").join("secrets.redb");

        let config = ServerConfig::default()
            .with_store(crate::config::StoreBackend::Redb(unreachable));

        assert!(matches!(
            YoopassServer::from_config(config),
            Err(ApiError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let server = YoopassServer::new(loopback_config(), Arc::new(MemoryStore::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn({
            let server = server.clone();
            async move {
                server
                    .serve_listener(listener, async move {
                        let _ = rx.await;
                    })
                    .await
            }
        });

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let server = YoopassServer::new(ServerConfig::new(addr), Arc::new(MemoryStore::new()));
        let result = server.serve_with_shutdown(async {}).await;

        assert!(matches!(result, Err(ApiError::BindFailed(a, _)) if a == addr));
    }
}
