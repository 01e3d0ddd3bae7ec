//! # strata-client
//!
//! Client library for StrataDB's typed containers.
//!
//! A store holds named containers of two kinds with different data
//! models and operation sets:
//!
//! - **Collections**: unordered records with an optional row key
//! - **Time series**: rows keyed by a mandatory timestamp, ordered by
//!   time, supporting range queries and retention policies
//!
//! The client decides per-operation validity from the container kind
//! alone, before anything touches the wire: a rejected operation fails
//! locally with a capability error naming the kind and operation.
//! Schemas are declared by the caller, bound against the kind's
//! structural rules, and verified against the store's descriptor the
//! first time a handle is used.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata_client::{Client, ClientConfig, ColumnDef, Query, Row, Schema};
//! use strata_common::types::{ColumnType, ContainerKind, Timestamp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::with_transport(ClientConfig::default(), transport);
//!
//!     let schema = Schema::new()
//!         .column(ColumnDef::new("ts", ColumnType::Timestamp))
//!         .column(ColumnDef::new("value", ColumnType::Float));
//!     let sensor = client.open("sensor1", ContainerKind::TimeSeries, schema)?;
//!
//!     sensor
//!         .put(Row::new().with("ts", Timestamp::now()).with("value", 21.5))
//!         .await?;
//!
//!     let last_hour = sensor
//!         .query(Query::all().from(Timestamp::now().sub(Duration::from_secs(3600))))
//!         .await?;
//!     for row in &last_hour {
//!         println!("{}", row?);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// Kind/operation capability table and gate.
pub mod capability;

/// Declared schemas and kind-validated bindings.
pub mod schema;

/// Logical rows.
pub mod row;

/// Row wire codec.
pub mod codec;

/// Range queries and results.
pub mod query;

/// Transport trait and in-memory implementation.
pub mod transport;

/// Container handles.
pub mod handle;

/// Client entry point.
pub mod client;

// Re-exports
pub use capability::{Capability, CapabilityGate, CapabilityTable, Operation, OperationKind};
pub use client::{Client, ClientConfig, ClientStats};
pub use codec::RowCodec;
pub use error::{
    CapabilityError, ClientError, ClientResult, DecodeError, EncodeError, SchemaError, StateError,
    TransportError,
};
pub use handle::{ContainerHandle, HandleStatus, PutOptions};
pub use query::{Query, RowSet, RowSetIter};
pub use row::Row;
pub use schema::{BoundSchema, ColumnDef, Schema};
pub use transport::{
    ContainerDescriptor, MemoryTransport, Transport, TransportFuture, WireRequest, WireResponse,
};
