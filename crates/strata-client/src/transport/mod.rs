//! Transport abstraction between the client core and the store.
//!
//! The core never opens sockets itself: it hands fully encoded,
//! capability-checked requests to a [`Transport`] implementation and
//! decodes what comes back. Connection pooling, retries, timeouts, and
//! partition routing all live behind this trait.
//!
//! [`MemoryTransport`] is the in-process implementation used by tests;
//! it honors the same store-side contract a real server would.

mod memory;

pub use memory::MemoryTransport;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use strata_common::types::{ContainerKind, ContainerName, FieldValue, RetentionPolicy};

use crate::error::TransportError;
use crate::query::Query;
use crate::schema::Schema;

/// A container's identity as the store reports it.
///
/// The client caches descriptors in memory only; they are
/// non-authoritative and must be re-fetched after any schema-mismatch
/// error from the store. Partitioning metadata is opaque pass-through
/// bytes owned by the namespace/routing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    /// The container name, unique within its namespace.
    pub name: ContainerName,
    /// The container kind, fixed for the container's lifetime.
    pub kind: ContainerKind,
    /// The authoritative schema.
    pub schema: Schema,
    /// Opaque partitioning metadata.
    pub partition: Bytes,
}

/// A single operation as handed to the transport.
///
/// Row payloads are already encoded by the row codec; everything else
/// is structural and serializes with the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireRequest {
    /// Store a single encoded row.
    Put {
        /// The encoded row.
        row: Bytes,
        /// Whether overwrite-by-key semantics were requested.
        upsert: bool,
    },
    /// Point lookup by key value.
    Get {
        /// The key to look up.
        key: FieldValue,
    },
    /// Range query over the key.
    Query {
        /// The range predicate.
        query: Query,
    },
    /// Attach a retention policy.
    SetRetention {
        /// The policy.
        policy: RetentionPolicy,
    },
    /// Create a secondary index on the named column.
    CreateIndex {
        /// Target column.
        column: String,
    },
}

/// The store's answer to a [`WireRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireResponse {
    /// The operation succeeded with nothing to return.
    Ack,
    /// A point lookup result: the encoded row, or `None` if absent.
    Row(Option<Bytes>),
    /// A query result: encoded rows in key order.
    Rows(Vec<Bytes>),
}

/// Future type returned by transport methods.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Trait for transport implementations.
///
/// Methods take owned arguments so implementations can move them into
/// their futures. Cancellation and timeouts follow each
/// implementation's own contract; the core propagates cancellation and
/// never retries on its own.
pub trait Transport: Send + Sync {
    /// Fetches the authoritative descriptor for a container.
    fn fetch_descriptor(&self, name: ContainerName) -> TransportFuture<'_, ContainerDescriptor>;

    /// Sends one operation to a container.
    fn send(&self, name: ContainerName, request: WireRequest) -> TransportFuture<'_, WireResponse>;
}
