//! Client entry point.
//!
//! A [`Client`] owns one transport and hands out [`ContainerHandle`]s.
//! Opening a handle is cheap and local; nothing touches the wire until
//! the handle's first operation triggers its resolve.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use strata_common::types::{ContainerKind, ContainerName};

use crate::error::ClientResult;
use crate::handle::ContainerHandle;
use crate::schema::Schema;
use crate::transport::Transport;

/// Client configuration.
///
/// # Example
///
/// ```rust
/// use strata_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("db.internal", 7700)
///     .request_timeout(Duration::from_secs(5))
///     .application_name("ingest-worker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Store host to connect to.
    pub host: String,
    /// Store port.
    pub port: u16,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for a single request.
    pub request_timeout: Duration,
    /// Name reported to the store for diagnostics.
    pub application_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7700,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            application_name: "strata-client".to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a config for the given store address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the application name reported to the store.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }
}

/// Counters for client activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Number of handles opened over the client's lifetime.
    pub containers_opened: u64,
    /// Number of completed container resolves across all handles.
    pub resolves: u64,
    /// Number of operations rejected by the capability gate.
    pub rejections: u64,
}

/// Shared counter storage; handles hold a reference and bump the
/// counters lock-free.
#[derive(Debug, Default)]
pub(crate) struct StatsInner {
    containers_opened: AtomicU64,
    resolves: AtomicU64,
    rejections: AtomicU64,
}

impl StatsInner {
    pub(crate) fn record_open(&self) {
        self.containers_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolve(&self) {
        self.resolves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ClientStats {
        ClientStats {
            containers_opened: self.containers_opened.load(Ordering::Relaxed),
            resolves: self.resolves.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
        }
    }
}

/// A store client.
///
/// Cheap to share behind an [`Arc`]; handles borrow the client's
/// transport and nothing else.
///
/// # Example
///
/// ```rust,ignore
/// let client = Client::with_transport(ClientConfig::default(), transport);
/// let events = client.open("events", ContainerKind::TimeSeries, schema)?;
/// events.put(row).await?;
/// ```
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    stats: Arc<StatsInner>,
}

impl Client {
    /// Creates a client over an explicit transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        debug!(
            host = %config.host,
            port = config.port,
            application = %config.application_name,
            "client created"
        );
        Self {
            config,
            transport,
            stats: Arc::new(StatsInner::default()),
        }
    }

    /// Opens a handle to a named container of the expected kind.
    ///
    /// Validates the name locally and returns an unresolved handle; the
    /// declared schema is bound and checked against the store on the
    /// handle's first operation.
    pub fn open(
        &self,
        name: &str,
        kind: ContainerKind,
        schema: Schema,
    ) -> ClientResult<ContainerHandle> {
        let name = ContainerName::new(name)?;
        debug!(container = %name, %kind, "opening container handle");
        self.stats.record_open();
        Ok(ContainerHandle::new(
            name,
            kind,
            schema,
            Arc::clone(&self.transport),
            Arc::clone(&self.stats),
        ))
    }

    /// Returns the client configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a snapshot of the client's counters.
    #[must_use]
    pub fn stats(&self) -> ClientStats {
        self.stats.snapshot()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("application_name", &self.config.application_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::schema::ColumnDef;
    use crate::transport::MemoryTransport;
    use strata_common::types::ColumnType;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("db.internal", 9000)
            .request_timeout(Duration::from_secs(3))
            .application_name("worker");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.application_name, "worker");
    }

    #[test]
    fn test_open_validates_name() {
        let client = Client::with_transport(
            ClientConfig::default(),
            Arc::new(MemoryTransport::new()),
        );
        let schema = Schema::new().column(ColumnDef::new("ts", ColumnType::Timestamp));
        let err = client
            .open("bad name!", ContainerKind::TimeSeries, schema)
            .unwrap_err();
        assert!(matches!(err, ClientError::Name(_)));
    }

    #[test]
    fn test_open_counts_handles() {
        let client = Client::with_transport(
            ClientConfig::default(),
            Arc::new(MemoryTransport::new()),
        );
        let schema = Schema::new().column(ColumnDef::new("ts", ColumnType::Timestamp));
        client
            .open("a", ContainerKind::TimeSeries, schema.clone())
            .unwrap();
        client.open("b", ContainerKind::TimeSeries, schema).unwrap();
        assert_eq!(client.stats().containers_opened, 2);
    }
}
