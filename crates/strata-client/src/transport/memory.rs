//! In-memory transport for testing.
//!
//! Implements the store-side contract in process: create-or-open
//! provisioning, duplicate row-time conflicts, row-key overwrites,
//! ordered range scans, and retention bookkeeping. Tests talk to it
//! through the same [`Transport`] trait a networked implementation
//! would use.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;

use strata_common::types::{ContainerKind, ContainerName, FieldValue, RetentionPolicy};

use crate::codec::RowCodec;
use crate::error::{ClientResult, TransportError};
use crate::schema::{BoundSchema, Schema};

use super::{
    ContainerDescriptor, Transport, TransportFuture, WireRequest, WireResponse,
};

/// Ordered storage key derived from a row's key value.
///
/// A container's keys are homogeneous, so cross-variant ordering never
/// matters in practice; the derive only makes the map total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum StoredKey {
    Bool(bool),
    Int(i64),
    Time(i64),
    Str(String),
    /// Synthetic append order for keyless collections.
    Seq(u64),
}

impl StoredKey {
    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(b) => Some(Self::Bool(*b)),
            FieldValue::Integer(i) => Some(Self::Int(*i)),
            FieldValue::Timestamp(ts) => Some(Self::Time(ts.as_micros())),
            FieldValue::String(s) => Some(Self::Str(s.clone())),
            FieldValue::Null | FieldValue::Float(_) | FieldValue::Blob(_) => None,
        }
    }
}

/// One provisioned container.
struct StoredContainer {
    descriptor: ContainerDescriptor,
    codec: RowCodec,
    rows: RwLock<BTreeMap<StoredKey, Bytes>>,
    seq: AtomicU64,
    retention: RwLock<Option<RetentionPolicy>>,
    indexes: RwLock<Vec<String>>,
    mismatch_once: AtomicBool,
}

/// An in-process store behind the [`Transport`] trait.
///
/// # Example
///
/// ```rust,ignore
/// let transport = Arc::new(MemoryTransport::new());
/// transport.provision("sensor1", ContainerKind::TimeSeries, &schema)?;
/// let client = Client::with_transport(ClientConfig::default(), transport);
/// ```
#[derive(Default)]
pub struct MemoryTransport {
    containers: DashMap<String, Arc<StoredContainer>>,
}

impl MemoryTransport {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a container, as a server-side create-or-open would.
    ///
    /// Re-provisioning an existing container is a no-op; the original
    /// kind and schema win, matching the store's immutable-kind rule.
    pub fn provision(
        &self,
        name: &str,
        kind: ContainerKind,
        schema: &Schema,
    ) -> ClientResult<()> {
        let name = ContainerName::new(name)?;
        let bound = BoundSchema::bind(kind, schema)?;
        self.containers
            .entry(name.as_str().to_string())
            .or_insert_with(|| {
                // Fake partition metadata: opaque to the client either way
                let partition = Bytes::copy_from_slice(&partition_of(name.as_str()));
                Arc::new(StoredContainer {
                    descriptor: ContainerDescriptor {
                        name,
                        kind,
                        schema: schema.clone(),
                        partition,
                    },
                    codec: RowCodec::new(bound),
                    rows: RwLock::new(BTreeMap::new()),
                    seq: AtomicU64::new(0),
                    retention: RwLock::new(None),
                    indexes: RwLock::new(Vec::new()),
                    mismatch_once: AtomicBool::new(false),
                })
            });
        Ok(())
    }

    /// Drops a container and its rows.
    pub fn drop_container(&self, name: &str) {
        self.containers.remove(name);
    }

    /// Arms a one-shot schema-mismatch failure for the next operation
    /// on the container, simulating drift detected server-side.
    pub fn inject_schema_mismatch(&self, name: &str) {
        if let Some(container) = self.containers.get(name) {
            container.mismatch_once.store(true, Ordering::SeqCst);
        }
    }

    /// Returns the container's retention policy, if one was set.
    #[must_use]
    pub fn retention(&self, name: &str) -> Option<RetentionPolicy> {
        self.containers.get(name).and_then(|c| *c.retention.read())
    }

    /// Returns the columns indexed so far, in creation order.
    #[must_use]
    pub fn indexes(&self, name: &str) -> Vec<String> {
        self.containers
            .get(name)
            .map(|c| c.indexes.read().clone())
            .unwrap_or_default()
    }

    /// Returns the number of stored rows.
    #[must_use]
    pub fn row_count(&self, name: &str) -> usize {
        self.containers
            .get(name)
            .map(|c| c.rows.read().len())
            .unwrap_or(0)
    }

    fn container(&self, name: &str) -> Result<Arc<StoredContainer>, TransportError> {
        self.containers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| TransportError::NotFound {
                container: name.to_string(),
            })
    }
}

fn partition_of(name: &str) -> [u8; 8] {
    // FNV-1a; any stable opaque value works here
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash.to_le_bytes()
}

impl StoredContainer {
    fn key_of(&self, row_bytes: &Bytes) -> Result<StoredKey, TransportError> {
        let row = self
            .codec
            .decode(row_bytes)
            .map_err(|e| TransportError::Rejected {
                reason: format!("undecodable row: {e}"),
            })?;
        match self.codec.schema().row_key_column() {
            Some(def) => {
                let value = row.get(def.name()).ok_or_else(|| TransportError::Rejected {
                    reason: format!("row is missing key column '{}'", def.name()),
                })?;
                StoredKey::from_value(value).ok_or_else(|| TransportError::Rejected {
                    reason: format!("key column '{}' holds a non-key value", def.name()),
                })
            }
            None => Ok(StoredKey::Seq(self.seq.fetch_add(1, Ordering::Relaxed))),
        }
    }

    fn put(&self, row: Bytes, upsert: bool) -> Result<WireResponse, TransportError> {
        let key = self.key_of(&row)?;
        let mut rows = self.rows.write();
        match self.descriptor.kind {
            ContainerKind::TimeSeries => {
                // Duplicate row-time is a conflict unless upsert was
                // requested explicitly; never a silent overwrite
                if rows.contains_key(&key) && !upsert {
                    return Err(TransportError::Conflict {
                        container: self.descriptor.name.as_str().to_string(),
                    });
                }
                rows.insert(key, row);
            }
            ContainerKind::Collection => {
                rows.insert(key, row);
            }
        }
        Ok(WireResponse::Ack)
    }

    fn get(&self, key: &FieldValue) -> Result<WireResponse, TransportError> {
        let key = StoredKey::from_value(key).ok_or_else(|| TransportError::Rejected {
            reason: "value is not usable as a key".to_string(),
        })?;
        Ok(WireResponse::Row(self.rows.read().get(&key).cloned()))
    }

    fn query(&self, query: &crate::query::Query) -> Result<WireResponse, TransportError> {
        let start = match query.start() {
            Some(v) => Bound::Included(StoredKey::from_value(v).ok_or_else(|| {
                TransportError::Rejected {
                    reason: "start bound is not usable as a key".to_string(),
                }
            })?),
            None => Bound::Unbounded,
        };
        let end = match query.end() {
            Some(v) => Bound::Excluded(StoredKey::from_value(v).ok_or_else(|| {
                TransportError::Rejected {
                    reason: "end bound is not usable as a key".to_string(),
                }
            })?),
            None => Bound::Unbounded,
        };
        let limit = query.row_limit().unwrap_or(u64::MAX) as usize;
        let rows = self.rows.read();
        let selected = rows
            .range((start, end))
            .take(limit)
            .map(|(_, bytes)| bytes.clone())
            .collect();
        Ok(WireResponse::Rows(selected))
    }

    fn set_retention(&self, policy: RetentionPolicy) -> Result<WireResponse, TransportError> {
        if self.descriptor.kind != ContainerKind::TimeSeries {
            return Err(TransportError::Rejected {
                reason: "retention applies to time series containers only".to_string(),
            });
        }
        *self.retention.write() = Some(policy);
        Ok(WireResponse::Ack)
    }

    fn create_index(&self, column: String) -> Result<WireResponse, TransportError> {
        if self.codec.schema().column(&column).is_none() {
            return Err(TransportError::Rejected {
                reason: format!("no such column '{column}'"),
            });
        }
        let mut indexes = self.indexes.write();
        if !indexes.contains(&column) {
            indexes.push(column);
        }
        Ok(WireResponse::Ack)
    }
}

impl Transport for MemoryTransport {
    fn fetch_descriptor(&self, name: ContainerName) -> TransportFuture<'_, ContainerDescriptor> {
        let result = self
            .container(name.as_str())
            .map(|c| c.descriptor.clone());
        Box::pin(async move { result })
    }

    fn send(&self, name: ContainerName, request: WireRequest) -> TransportFuture<'_, WireResponse> {
        let result = self.container(name.as_str()).and_then(|container| {
            if container.mismatch_once.swap(false, Ordering::SeqCst) {
                return Err(TransportError::SchemaMismatch {
                    container: name.as_str().to_string(),
                });
            }
            match request {
                WireRequest::Put { row, upsert } => container.put(row, upsert),
                WireRequest::Get { key } => container.get(&key),
                WireRequest::Query { query } => container.query(&query),
                WireRequest::SetRetention { policy } => container.set_retention(policy),
                WireRequest::CreateIndex { column } => container.create_index(column),
            }
        });
        Box::pin(async move { result })
    }
}
