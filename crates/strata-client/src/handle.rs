//! Container handles.
//!
//! A [`ContainerHandle`] is the object a caller holds for one named
//! container. It composes the schema binding, the capability gate, and
//! the row codec, and forwards accepted operations to the transport.
//!
//! # Lifecycle
//!
//! `Unresolved -> Bound -> Ready`, terminal `Closed`. A handle starts
//! `Unresolved` (name and expected kind only). The first accepted
//! operation triggers an implicit resolve: the declared schema is bound
//! locally (`Bound`), then the store's descriptor is fetched and
//! verified against it (`Ready`). The capability gate runs before the
//! resolve, so a rejected operation never touches the transport.
//! Resolve failures surface as a single composed error on the
//! triggering operation; they are not retried internally.
//! After [`ContainerHandle::close`] every operation fails with
//! [`StateError::Closed`].
//!
//! # Concurrency
//!
//! Handles are meant to be shared across tasks. Capability lookups and
//! the bound schema are immutable after resolve; the only mutable state
//! is the cached descriptor. Concurrent resolve attempts collapse into
//! a single in-flight fetch: callers serialize on an async mutex and
//! re-check the cached state before fetching, so the transport sees at
//! most one `fetch_descriptor` per handle regardless of concurrency
//! degree. Cancellation propagates to the transport future; cancelled
//! operations are never retried here.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace, warn};

use strata_common::types::{ContainerKind, ContainerName, FieldValue, RetentionPolicy};

use crate::capability::{CapabilityGate, Operation};
use crate::client::StatsInner;
use crate::codec::RowCodec;
use crate::error::{
    CapabilityError, ClientResult, EncodeError, SchemaError, StateError, TransportError,
};
use crate::query::{Query, RowSet};
use crate::row::Row;
use crate::schema::{BoundSchema, Schema};
use crate::transport::{ContainerDescriptor, Transport, WireRequest, WireResponse};

/// Observable handle lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// Constructed; nothing fetched or validated yet.
    Unresolved,
    /// Declared schema bound locally; descriptor not yet confirmed.
    Bound,
    /// Descriptor fetched and verified; operations dispatch directly.
    Ready,
    /// Released by the caller; every operation fails.
    Closed,
}

impl fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Bound => write!(f, "bound"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Internal handle state.
enum HandleState {
    Unresolved,
    Bound {
        codec: RowCodec,
    },
    Ready {
        codec: RowCodec,
        descriptor: ContainerDescriptor,
    },
    Closed,
}

impl HandleState {
    const fn status(&self) -> HandleStatus {
        match self {
            Self::Unresolved => HandleStatus::Unresolved,
            Self::Bound { .. } => HandleStatus::Bound,
            Self::Ready { .. } => HandleStatus::Ready,
            Self::Closed => HandleStatus::Closed,
        }
    }
}

/// Options for a put operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Request insert-or-overwrite-by-key semantics.
    pub upsert: bool,
}

impl PutOptions {
    /// Plain put options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests upsert semantics.
    #[must_use]
    pub const fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }
}

/// A caller's handle to one named container.
pub struct ContainerHandle {
    name: ContainerName,
    kind: ContainerKind,
    declared: Schema,
    transport: Arc<dyn Transport>,
    stats: Arc<StatsInner>,
    state: RwLock<HandleState>,
    resolve_lock: AsyncMutex<()>,
}

impl ContainerHandle {
    /// Creates an unresolved handle. Callers obtain handles through
    /// [`crate::Client::open`].
    pub(crate) fn new(
        name: ContainerName,
        kind: ContainerKind,
        declared: Schema,
        transport: Arc<dyn Transport>,
        stats: Arc<StatsInner>,
    ) -> Self {
        Self {
            name,
            kind,
            declared,
            transport,
            stats,
            state: RwLock::new(HandleState::Unresolved),
            resolve_lock: AsyncMutex::new(()),
        }
    }

    /// Returns the container name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    /// Returns the expected container kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn status(&self) -> HandleStatus {
        self.state.read().status()
    }

    /// Returns the cached descriptor, if the handle is resolved.
    #[must_use]
    pub fn descriptor(&self) -> Option<ContainerDescriptor> {
        match &*self.state.read() {
            HandleState::Ready { descriptor, .. } => Some(descriptor.clone()),
            _ => None,
        }
    }

    /// Closes the handle. Idempotent; every subsequent operation fails
    /// with [`StateError::Closed`].
    pub fn close(&self) {
        let mut state = self.state.write();
        if !matches!(*state, HandleState::Closed) {
            debug!(container = %self.name, "closing container handle");
            *state = HandleState::Closed;
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Stores a single row.
    ///
    /// On a collection with a declared row key this overwrites any
    /// existing row with the same key. On a time series a duplicate
    /// row-time key is a conflict, not an overwrite.
    pub async fn put(&self, row: Row) -> ClientResult<()> {
        self.put_with(row, PutOptions::new()).await
    }

    /// Stores a single row with explicit options.
    pub async fn put_with(&self, row: Row, options: PutOptions) -> ClientResult<()> {
        let codec = self
            .prepare(&Operation::Put {
                upsert: options.upsert,
            })
            .await?;
        let payload = codec.encode(&row)?;
        trace!(container = %self.name, upsert = options.upsert, "put row");
        match self
            .dispatch(WireRequest::Put {
                row: payload,
                upsert: options.upsert,
            })
            .await?
        {
            WireResponse::Ack => Ok(()),
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    /// Looks up a row by its key (row key or row-time key).
    pub async fn get(&self, key: impl Into<FieldValue>) -> ClientResult<Option<Row>> {
        let codec = self.prepare(&Operation::Get).await?;
        let key = key.into();
        check_key_type(codec.schema(), &key)?;
        trace!(container = %self.name, "get row");
        match self.dispatch(WireRequest::Get { key }).await? {
            WireResponse::Row(Some(bytes)) => Ok(Some(codec.decode(&bytes)?)),
            WireResponse::Row(None) => Ok(None),
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    /// Runs a range query over the key.
    ///
    /// The result is finite and restartable: each call to
    /// [`RowSet::iter`] walks the same rows from the start.
    pub async fn query(&self, query: Query) -> ClientResult<RowSet> {
        let codec = self.prepare(&Operation::RangeQuery).await?;
        for bound in [query.start(), query.end()].into_iter().flatten() {
            check_key_type(codec.schema(), bound)?;
        }
        trace!(container = %self.name, "range query");
        match self.dispatch(WireRequest::Query { query }).await? {
            WireResponse::Rows(rows) => Ok(RowSet::new(codec, rows)),
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    /// Attaches a row expiration policy. Time series only.
    pub async fn set_retention(&self, policy: RetentionPolicy) -> ClientResult<()> {
        self.prepare(&Operation::SetRetention).await?;
        debug!(container = %self.name, %policy, "set retention");
        match self.dispatch(WireRequest::SetRetention { policy }).await? {
            WireResponse::Ack => Ok(()),
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    /// Creates a secondary index on a non-key column.
    pub async fn create_index(&self, column: impl Into<String>) -> ClientResult<()> {
        let column = column.into();
        self.prepare(&Operation::CreateIndex {
            column: column.clone(),
        })
        .await?;
        debug!(container = %self.name, column = %column, "create index");
        match self.dispatch(WireRequest::CreateIndex { column }).await? {
            WireResponse::Ack => Ok(()),
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    /// Gates an operation, then resolves the container.
    ///
    /// The gate runs against the local binding, so a rejected operation
    /// fails identically whether or not the store is reachable, and
    /// never triggers a descriptor fetch.
    async fn prepare(&self, op: &Operation) -> ClientResult<RowCodec> {
        let local = self.local_codec()?;
        self.authorize(local.schema(), op)?;
        self.ensure_ready().await
    }

    /// Runs the capability gate, counting rejections.
    fn authorize(&self, schema: &BoundSchema, op: &Operation) -> Result<(), CapabilityError> {
        match CapabilityGate::authorize(schema, op) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.stats.record_rejection();
                Err(err)
            }
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Returns a codec over the locally bound schema without touching
    /// the transport.
    fn local_codec(&self) -> ClientResult<RowCodec> {
        {
            let state = self.state.read();
            match &*state {
                HandleState::Bound { codec } | HandleState::Ready { codec, .. } => {
                    return Ok(codec.clone());
                }
                HandleState::Closed => return Err(StateError::Closed.into()),
                HandleState::Unresolved => {}
            }
        }
        Ok(RowCodec::new(BoundSchema::bind(self.kind, &self.declared)?))
    }

    /// Returns the codec for the resolved container, resolving first if
    /// needed. Concurrent callers collapse into one in-flight resolve.
    async fn ensure_ready(&self) -> ClientResult<RowCodec> {
        if let Some(codec) = self.cached_codec()? {
            return Ok(codec);
        }

        let _guard = self.resolve_lock.lock().await;
        // Another caller may have finished resolving while we waited
        if let Some(codec) = self.cached_codec()? {
            return Ok(codec);
        }

        // Bind locally first so declaration errors never reach the wire
        let bound = BoundSchema::bind(self.kind, &self.declared)?;
        let codec = RowCodec::new(bound);
        self.transition(HandleState::Bound {
            codec: codec.clone(),
        })?;

        debug!(container = %self.name, kind = %self.kind, "resolving container");
        let descriptor = self.transport.fetch_descriptor(self.name.clone()).await?;

        if descriptor.kind != self.kind {
            return Err(SchemaError::KindMismatch {
                container: self.name.as_str().to_string(),
                expected: self.kind,
                actual: descriptor.kind,
            }
            .into());
        }
        if !codec.schema().matches(&descriptor.schema) {
            return Err(SchemaError::Drift {
                container: self.name.as_str().to_string(),
            }
            .into());
        }

        self.transition(HandleState::Ready {
            codec: codec.clone(),
            descriptor,
        })?;
        self.stats.record_resolve();
        Ok(codec)
    }

    /// Fast-path state check: `Ready` yields the codec, `Closed` fails,
    /// anything else means a resolve is needed.
    fn cached_codec(&self) -> ClientResult<Option<RowCodec>> {
        match &*self.state.read() {
            HandleState::Ready { codec, .. } => Ok(Some(codec.clone())),
            HandleState::Closed => Err(StateError::Closed.into()),
            HandleState::Unresolved | HandleState::Bound { .. } => Ok(None),
        }
    }

    /// Applies a lifecycle transition unless the handle was closed
    /// concurrently, in which case closure wins.
    fn transition(&self, next: HandleState) -> ClientResult<()> {
        let mut state = self.state.write();
        if matches!(*state, HandleState::Closed) {
            return Err(StateError::Closed.into());
        }
        *state = next;
        Ok(())
    }

    /// Sends an accepted, encoded request and applies the descriptor
    /// invalidation rule on schema-mismatch answers.
    async fn dispatch(&self, request: WireRequest) -> ClientResult<WireResponse> {
        match self.transport.send(self.name.clone(), request).await {
            Err(err @ TransportError::SchemaMismatch { .. }) => {
                warn!(
                    container = %self.name,
                    "store reported schema mismatch; invalidating cached descriptor"
                );
                // The cached descriptor is stale; next use re-fetches
                let mut state = self.state.write();
                if !matches!(*state, HandleState::Closed) {
                    *state = HandleState::Unresolved;
                }
                Err(err.into())
            }
            other => other.map_err(Into::into),
        }
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("name", &self.name.as_str())
            .field("kind", &self.kind)
            .field("status", &self.status())
            .finish()
    }
}

/// Validates that a key value is usable against the schema's key column.
fn check_key_type(schema: &BoundSchema, key: &FieldValue) -> ClientResult<()> {
    // authorize() has already required a key column where one is needed
    let Some(def) = schema.row_key_column() else {
        return Ok(());
    };
    if key.is_null() {
        return Err(EncodeError::NullNotAllowed {
            column: def.name().to_string(),
        }
        .into());
    }
    if let Some(actual) = key.column_type() {
        if actual != def.column_type() {
            return Err(EncodeError::TypeMismatch {
                column: def.name().to_string(),
                expected: def.column_type(),
                actual,
            }
            .into());
        }
    }
    Ok(())
}
