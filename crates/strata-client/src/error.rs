//! Error types for the client library.
//!
//! Errors are split by origin so callers can tell a local contract
//! violation from a remote failure:
//!
//! - [`SchemaError`], [`CapabilityError`], [`EncodeError`], [`DecodeError`],
//!   and [`StateError`] are local and never retried. They indicate a
//!   declaration mistake, a kind/operation mismatch, or protocol drift.
//! - [`TransportError`] is delegated to the transport collaborator, which
//!   may retry per its own policy. This core never retries.

use thiserror::Error;

use strata_common::types::{ColumnType, ContainerKind, InvalidContainerName};

use crate::capability::OperationKind;

/// Declaration-time schema validation failure. Local, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema violates a structural constraint of the container kind.
    #[error("schema incompatible with {kind} container: column '{column}': {reason}")]
    IncompatibleKind {
        /// The container kind the schema was bound against.
        kind: ContainerKind,
        /// The offending column.
        column: String,
        /// Why the column is not acceptable.
        reason: String,
    },

    /// The schema has no columns.
    #[error("schema has no columns")]
    Empty,

    /// Two columns share a name.
    #[error("duplicate column name '{name}'")]
    DuplicateColumn {
        /// The duplicated name.
        name: String,
    },

    /// The schema exceeds the column count limit.
    #[error("schema has {count} columns, maximum is {max}")]
    TooManyColumns {
        /// Declared column count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A column name exceeds the length limit.
    #[error("column name '{name}' is {len} bytes, maximum is {max}")]
    ColumnNameTooLong {
        /// The offending column (possibly truncated for display).
        name: String,
        /// Actual length in bytes.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The remote container is not of the expected kind.
    #[error("container '{container}' is a {actual}, expected {expected}")]
    KindMismatch {
        /// The container name.
        container: String,
        /// The kind the caller asked for.
        expected: ContainerKind,
        /// The kind the store reports.
        actual: ContainerKind,
    },

    /// The locally declared schema does not match the store's
    /// authoritative schema for the container.
    #[error("declared schema for '{container}' does not match the remote schema")]
    Drift {
        /// The container name.
        container: String,
    },
}

/// Operation rejected by the capability gate before dispatch.
/// Local, never retried, independent of network state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The operation is not defined for this container kind.
    #[error("operation {operation} is not supported on {kind} containers")]
    Unsupported {
        /// The container kind.
        kind: ContainerKind,
        /// The rejected operation.
        operation: OperationKind,
    },

    /// The operation needs a declared row key and the schema has none.
    #[error("operation {operation} on {kind} container requires a declared row key")]
    RequiresRowKey {
        /// The container kind.
        kind: ContainerKind,
        /// The rejected operation.
        operation: OperationKind,
    },

    /// An index was requested on the row key or row-time key column.
    #[error("column '{column}' is the row key and cannot carry a secondary index")]
    KeyColumn {
        /// The offending column.
        column: String,
    },

    /// An index was requested on a timestamp column of a time series.
    #[error("column '{column}' is a timestamp column of a time series and cannot be indexed")]
    TimestampColumn {
        /// The offending column.
        column: String,
    },

    /// An index was requested on a column type that is not indexable.
    #[error("column '{column}' of type {column_type} is not indexable")]
    NotIndexable {
        /// The offending column.
        column: String,
        /// Its declared type.
        column_type: ColumnType,
    },

    /// An index was requested on a column the schema does not declare.
    #[error("column '{column}' does not exist in the schema")]
    UnknownColumn {
        /// The missing column.
        column: String,
    },
}

/// Row encoding failure. Local, never retried; indicates the row does
/// not conform to the bound schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The row is missing a column the schema declares.
    #[error("row is missing column '{column}'")]
    MissingColumn {
        /// The absent column.
        column: String,
    },

    /// The row carries a column the schema does not declare.
    #[error("row has unknown column '{column}'")]
    UnknownColumn {
        /// The extra column.
        column: String,
    },

    /// A value's type does not match its column's declared type.
    #[error("column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        /// The column name.
        column: String,
        /// Declared column type.
        expected: ColumnType,
        /// Type of the supplied value.
        actual: ColumnType,
    },

    /// A null value was supplied for a non-nullable column.
    #[error("column '{column}' is not nullable")]
    NullNotAllowed {
        /// The column name.
        column: String,
    },

    /// The encoded row exceeds the row size limit.
    #[error("encoded row is {size} bytes, maximum is {max}")]
    RowTooLarge {
        /// Encoded size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A blob field exceeds the blob size limit.
    #[error("blob in column '{column}' is {size} bytes, maximum is {max}")]
    BlobTooLarge {
        /// The column name.
        column: String,
        /// Blob size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },
}

/// Row decoding failure. Local, never retried; indicates protocol or
/// schema drift between client and store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes do not match the bound schema (wrong magic, kind,
    /// column count, type tag, or key marker). Values are never coerced.
    #[error("encoded row does not match the bound schema: {reason}")]
    SchemaMismatch {
        /// What disagreed.
        reason: String,
    },

    /// The buffer ended before the declared fields were read.
    #[error("encoded row is truncated")]
    Truncated,

    /// Bytes remained after the declared fields were read.
    #[error("encoded row has {remaining} trailing bytes")]
    TrailingBytes {
        /// Number of unread bytes.
        remaining: usize,
    },

    /// A string field held invalid UTF-8.
    #[error("column '{column}' holds invalid UTF-8")]
    InvalidUtf8 {
        /// The column name.
        column: String,
    },
}

/// Handle misuse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    /// The handle was closed; every subsequent operation fails.
    #[error("container handle is closed")]
    Closed,
}

/// Failure reported by the transport collaborator or by the store.
///
/// Retry policy for these belongs to the transport, not to this core.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// The reason for failure.
        reason: String,
    },

    /// The container does not exist.
    #[error("container '{container}' not found")]
    NotFound {
        /// The missing container.
        container: String,
    },

    /// The store rejected the operation.
    #[error("store rejected the operation: {reason}")]
    Rejected {
        /// The store's reason.
        reason: String,
    },

    /// A row with the same key already exists and the operation did not
    /// request upsert semantics.
    #[error("row key conflict in container '{container}'")]
    Conflict {
        /// The container name.
        container: String,
    },

    /// The store's authoritative schema disagrees with the request.
    /// The cached descriptor must be invalidated and re-fetched.
    #[error("schema mismatch reported by store for container '{container}'")]
    SchemaMismatch {
        /// The container name.
        container: String,
    },

    /// The store answered with a response shape the operation does not
    /// produce. Indicates protocol drift.
    #[error("unexpected response from store")]
    UnexpectedResponse,

    /// The operation timed out.
    #[error("operation timed out after {duration_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        duration_ms: u64,
    },

    /// The operation was cancelled. Cancelled operations are never
    /// retried by this core.
    #[error("operation was cancelled")]
    Cancelled,

    /// The transport is closed.
    #[error("transport closed")]
    Closed,

    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying error.
        #[from]
        source: std::io::Error,
    },
}

impl TransportError {
    /// Returns true if a transport-owned retry could make sense.
    ///
    /// Conflicts, rejections, and schema mismatches are final answers
    /// from the store and are never retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Io { .. }
        )
    }
}

/// The unified client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Declaration-time schema failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Operation rejected before dispatch.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Row encoding failure.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Row decoding failure.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Handle misuse.
    #[error(transparent)]
    State(#[from] StateError),

    /// Transport or store failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid container name.
    #[error(transparent)]
    Name(#[from] InvalidContainerName),
}

impl ClientError {
    /// Returns true if retrying could make sense.
    ///
    /// Only transport-level failures qualify; every local error is a
    /// logic bug or protocol drift and retrying would repeat it.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(t) => t.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors_never_retryable() {
        let err: ClientError = StateError::Closed.into();
        assert!(!err.is_retryable());

        let err: ClientError = DecodeError::Truncated.into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_retryability() {
        assert!(TransportError::Timeout { duration_ms: 100 }.is_retryable());
        assert!(!TransportError::Conflict {
            container: "t".into()
        }
        .is_retryable());
        assert!(!TransportError::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SchemaError::IncompatibleKind {
            kind: ContainerKind::TimeSeries,
            column: "value".into(),
            reason: "first column must be a timestamp".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema incompatible with time_series container: column 'value': \
             first column must be a timestamp"
        );
    }
}
