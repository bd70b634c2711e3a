//! Server configuration.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use yoopass_secrets::{MemoryStore, RedbStore, SecretStore, StoreResult};

use crate::error::ApiError;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8082);

/// Default per-operation store timeout.
///
/// Stays below [`DEFAULT_REQUEST_TIMEOUT`], so a stalled store is reported
/// as a store failure rather than a request timeout.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default bound on handling a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Default upper bound on a message, in bytes.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Default upper bound on `expiration_hours` (one year).
pub const DEFAULT_MAX_EXPIRATION_HOURS: u64 = 24 * 365;

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const REDB_SCHEME: &str = "redb://";
const MEMORY_SCHEME: &str = "memory://";

/// Which storage backend holds sealed secrets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// In-process map, lost on restart.
    #[default]
    Memory,
    /// Durable redb database at the given path.
    Redb(PathBuf),
}

impl StoreBackend {
    /// Parse a backend selector.
    ///
    /// Accepts `memory`, `memory://`, `redb://<path>` or a bare path ending
    /// in `.redb`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] for anything else.
    pub fn parse(selector: &str) -> Result<Self, ApiError> {
        let selector = selector.trim();

        if selector.eq_ignore_ascii_case("memory") || selector == MEMORY_SCHEME {
            return Ok(Self::Memory);
        }

        if let Some(path) = selector.strip_prefix(REDB_SCHEME) {
            if path.is_empty() {
                return Err(ApiError::InvalidConfig(
                    "redb store requires a path".to_string(),
                ));
            }
            return Ok(Self::Redb(PathBuf::from(path)));
        }

        if selector.ends_with(".redb") {
            return Ok(Self::Redb(PathBuf::from(selector)));
        }

        Err(ApiError::InvalidConfig(format!(
            "unknown store '{selector}' (expected 'memory', 'redb://<path>' or a .redb file)"
        )))
    }

    /// Open the selected backend.
    ///
    /// # Errors
    ///
    /// Returns error if the redb database cannot be opened or created.
    pub fn open(&self) -> StoreResult<Arc<dyn SecretStore>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
            Self::Redb(path) => Ok(Arc::new(RedbStore::open(path)?)),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redb(path) => write!(f, "{REDB_SCHEME}{}", path.display()),
        }
    }
}

/// Configuration for the yoopass server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Storage backend.
    pub store: StoreBackend,
    /// Deadline for each individual store operation.
    pub store_timeout: Duration,
    /// Deadline for handling a whole HTTP request.
    pub request_timeout: Duration,
    /// Largest accepted message, in bytes.
    pub max_message_bytes: usize,
    /// Largest accepted `expiration_hours`.
    pub max_expiration_hours: u64,
    /// Interval between expiry sweeps (zero disables the sweep).
    pub sweep_interval: Duration,
    /// CORS allowed origins (empty means all).
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            store: StoreBackend::Memory,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            max_expiration_hours: DEFAULT_MAX_EXPIRATION_HOURS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the storage backend.
    #[must_use]
    pub fn with_store(mut self, store: StoreBackend) -> Self {
        self.store = store;
        self
    }

    /// Set the per-operation store timeout.
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the largest accepted message size.
    #[must_use]
    pub const fn with_max_message_bytes(mut self, max: usize) -> Self {
        self.max_message_bytes = max;
        self
    }

    /// Set the largest accepted expiration, in hours.
    #[must_use]
    pub const fn with_max_expiration_hours(mut self, max: u64) -> Self {
        self.max_expiration_hours = max;
        self
    }

    /// Set the expiry sweep interval. Zero disables the sweep.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Add a CORS allowed origin.
    #[must_use]
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origins.push(origin.into());
        self
    }

    /// Whether the background expiry sweep should run.
    #[must_use]
    pub const fn sweep_enabled(&self) -> bool {
        !self.sweep_interval.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8082);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.store_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.max_message_bytes, 65_536);
        assert_eq!(config.max_expiration_hours, 8760);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.cors_origins.is_empty());
        assert!(config.sweep_enabled());
    }

    #[test]
    fn test_config_builder() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000);
        let config = ServerConfig::new(addr)
            .with_store(StoreBackend::Redb(PathBuf::from("/tmp/y.redb")))
            .with_store_timeout(Duration::from_millis(250))
            .with_request_timeout(Duration::from_secs(2))
            .with_max_message_bytes(1024)
            .with_max_expiration_hours(48)
            .with_sweep_interval(Duration::ZERO)
            .with_cors_origin("https://yoopass.example.com");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.store, StoreBackend::Redb(PathBuf::from("/tmp/y.redb")));
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.max_message_bytes, 1024);
        assert_eq!(config.max_expiration_hours, 48);
        assert!(!config.sweep_enabled());
        assert_eq!(config.cors_origins, vec!["https://yoopass.example.com"]);
    }

    #[test_case("memory", StoreBackend::Memory ; "memory keyword")]
    #[test_case("MEMORY", StoreBackend::Memory ; "memory uppercase")]
    #[test_case("memory://", StoreBackend::Memory ; "memory scheme")]
    #[test_case("redb:///var/lib/yoopass.db", StoreBackend::Redb(PathBuf::from("/var/lib/yoopass.db")) ; "redb scheme")]
    #[test_case("data/secrets.redb", StoreBackend::Redb(PathBuf::from("data/secrets.redb")) ; "bare redb path")]
    fn test_parse_backend(input: &str, expected: StoreBackend) {
        assert_eq!(StoreBackend::parse(input).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("redis://localhost:6379" ; "redis url")]
    #[test_case("redb://" ; "redb without path")]
    #[test_case("secrets.db" ; "unknown extension")]
    fn test_parse_backend_rejects(input: &str) {
        assert!(matches!(
            StoreBackend::parse(input),
            Err(ApiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_backend_display_roundtrips() {
        let backend = StoreBackend::Redb(PathBuf::from("/srv/yoopass.redb"));
        assert_eq!(backend.to_string(), "redb:///srv/yoopass.redb");
        assert_eq!(backend.to_string().parse::<StoreBackend>().unwrap(), backend);
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn test_open_memory_backend() {
        assert!(StoreBackend::Memory.open().is_ok());
    }

    #[test]
    fn test_open_redb_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StoreBackend::Redb(dir.path().join("open.redb"));

        assert!(backend.open().is_ok());
        assert!(dir.path().join("open.redb").exists());
    }
}
