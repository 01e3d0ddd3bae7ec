//! Container-kind capability table and gate.
//!
//! Every operation a handle dispatches passes through two layers:
//!
//! 1. [`CapabilityTable`]: a static, process-wide, immutable table
//!    mapping `(ContainerKind, OperationKind)` to a [`Capability`]. The
//!    lookup is a total function over the closed kind/operation domain
//!    and has no failure mode.
//! 2. [`CapabilityGate`]: evaluates the table entry against the bound
//!    schema (does a row key exist, is the index target a key column)
//!    and produces the [`CapabilityError`] for rejected operations.
//!
//! Centralizing legality here keeps kind-specific branching out of the
//! operation paths: adding an operation forces [`rule`] to declare its
//! legality for both kinds or fail to compile.

use std::fmt;

use strata_common::types::{ColumnType, ContainerKind};

use crate::error::CapabilityError;
use crate::schema::BoundSchema;

/// The closed universe of container operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Append or insert a single row.
    Put,
    /// Insert-or-overwrite a single row by its key.
    Upsert,
    /// Point lookup by row key (or row-time key).
    Get,
    /// Range query over the row key (or row-time key).
    RangeQuery,
    /// Attach a row expiration policy.
    SetRetention,
    /// Create a secondary index on a column.
    CreateIndex,
}

impl OperationKind {
    /// All operations, in table order.
    pub const ALL: [Self; 6] = [
        Self::Put,
        Self::Upsert,
        Self::Get,
        Self::RangeQuery,
        Self::SetRetention,
        Self::CreateIndex,
    ];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Upsert => "upsert",
            Self::Get => "get",
            Self::RangeQuery => "range_query",
            Self::SetRetention => "set_retention",
            Self::CreateIndex => "create_index",
        }
    }

    /// Returns this operation's row index in the capability table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Put => 0,
            Self::Upsert => 1,
            Self::Get => 2,
            Self::RangeQuery => 3,
            Self::SetRetention => 4,
            Self::CreateIndex => 5,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legality of an operation for a container kind.
///
/// The conditional variants name the structural constraint that must
/// hold; evaluating the constraint against a concrete schema is the
/// gate's job, so the table itself stays a pure value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Always legal.
    Allowed,
    /// Never legal for this kind.
    Rejected,
    /// Legal only when the schema declares a row key.
    RequiresRowKey,
    /// Legal only on a non-key column (secondary index).
    NonKeyColumn,
    /// Legal only on a non-timestamp, non-key column (secondary index
    /// on a time series).
    NonTimestampColumn,
}

/// Declares the legality of one `(kind, operation)` pair.
///
/// This match is the single source of truth for the capability model.
/// It is exhaustive over both closed sets on purpose.
const fn rule(kind: ContainerKind, op: OperationKind) -> Capability {
    use Capability::{Allowed, NonKeyColumn, NonTimestampColumn, Rejected, RequiresRowKey};
    use ContainerKind::{Collection, TimeSeries};
    use OperationKind::{CreateIndex, Get, Put, RangeQuery, SetRetention, Upsert};

    match (kind, op) {
        (Collection, Put) => Allowed,
        (Collection, Upsert) => RequiresRowKey,
        (Collection, Get) => RequiresRowKey,
        (Collection, RangeQuery) => RequiresRowKey,
        (Collection, SetRetention) => Rejected,
        (Collection, CreateIndex) => NonKeyColumn,

        (TimeSeries, Put) => Allowed,
        // Time series are append-only by default
        (TimeSeries, Upsert) => Rejected,
        (TimeSeries, Get) => Allowed,
        (TimeSeries, RangeQuery) => Allowed,
        (TimeSeries, SetRetention) => Allowed,
        (TimeSeries, CreateIndex) => NonTimestampColumn,
    }
}

/// The static capability table.
///
/// Constructed once at process start and shared by reference via
/// [`CapabilityTable::global`]; never mutated afterwards.
#[derive(Debug)]
pub struct CapabilityTable {
    entries: [[Capability; OperationKind::ALL.len()]; 2],
}

impl CapabilityTable {
    /// Builds the table from [`rule`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [
                Self::row(ContainerKind::Collection),
                Self::row(ContainerKind::TimeSeries),
            ],
        }
    }

    const fn row(kind: ContainerKind) -> [Capability; OperationKind::ALL.len()] {
        [
            rule(kind, OperationKind::Put),
            rule(kind, OperationKind::Upsert),
            rule(kind, OperationKind::Get),
            rule(kind, OperationKind::RangeQuery),
            rule(kind, OperationKind::SetRetention),
            rule(kind, OperationKind::CreateIndex),
        ]
    }

    /// Returns the process-wide table.
    #[must_use]
    pub fn global() -> &'static Self {
        static TABLE: CapabilityTable = CapabilityTable::new();
        &TABLE
    }

    /// Looks up the capability for a `(kind, operation)` pair.
    ///
    /// A total, pure function: identical inputs always yield identical
    /// results, and no input can fail.
    #[inline]
    #[must_use]
    pub const fn capability(&self, kind: ContainerKind, op: OperationKind) -> Capability {
        self.entries[kind.tag() as usize][op.index()]
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A concrete operation request, carrying the context the gate needs
/// to evaluate conditional capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Append or insert a row; `upsert` requests overwrite-by-key.
    Put {
        /// Whether overwrite-by-key semantics were requested.
        upsert: bool,
    },
    /// Point lookup by key.
    Get,
    /// Range query over the key.
    RangeQuery,
    /// Attach a retention policy.
    SetRetention,
    /// Create a secondary index on the named column.
    CreateIndex {
        /// Target column.
        column: String,
    },
}

impl Operation {
    /// Returns the table row this request maps to.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Put { upsert: false } => OperationKind::Put,
            Self::Put { upsert: true } => OperationKind::Upsert,
            Self::Get => OperationKind::Get,
            Self::RangeQuery => OperationKind::RangeQuery,
            Self::SetRetention => OperationKind::SetRetention,
            Self::CreateIndex { .. } => OperationKind::CreateIndex,
        }
    }
}

/// Accepts or rejects operations against the capability table before
/// any bytes are encoded or sent.
///
/// Rejection is fail-fast and independent of network state: the same
/// request against the same bound schema always yields the same error.
#[derive(Debug)]
pub struct CapabilityGate;

impl CapabilityGate {
    /// Authorizes `op` against the bound schema's kind and structure.
    pub fn authorize(schema: &BoundSchema, op: &Operation) -> Result<(), CapabilityError> {
        let kind = schema.kind();
        let op_kind = op.kind();

        match CapabilityTable::global().capability(kind, op_kind) {
            Capability::Allowed => Ok(()),
            Capability::Rejected => Err(CapabilityError::Unsupported {
                kind,
                operation: op_kind,
            }),
            Capability::RequiresRowKey => {
                if schema.row_key_index().is_some() {
                    Ok(())
                } else {
                    Err(CapabilityError::RequiresRowKey {
                        kind,
                        operation: op_kind,
                    })
                }
            }
            Capability::NonKeyColumn => Self::check_index_target(schema, op, false),
            Capability::NonTimestampColumn => Self::check_index_target(schema, op, true),
        }
    }

    fn check_index_target(
        schema: &BoundSchema,
        op: &Operation,
        reject_timestamps: bool,
    ) -> Result<(), CapabilityError> {
        let Operation::CreateIndex { column } = op else {
            // Only index creation maps to the column-constrained rows
            return Err(CapabilityError::Unsupported {
                kind: schema.kind(),
                operation: op.kind(),
            });
        };

        let Some((index, def)) = schema.column(column) else {
            return Err(CapabilityError::UnknownColumn {
                column: column.clone(),
            });
        };
        if Some(index) == schema.row_key_index() {
            return Err(CapabilityError::KeyColumn {
                column: column.clone(),
            });
        }
        if reject_timestamps && def.column_type() == ColumnType::Timestamp {
            return Err(CapabilityError::TimestampColumn {
                column: column.clone(),
            });
        }
        if !def.column_type().is_indexable() {
            return Err(CapabilityError::NotIndexable {
                column: column.clone(),
                column_type: def.column_type(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, Schema};

    fn ts_schema() -> BoundSchema {
        let schema = Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp))
            .column(ColumnDef::new("value", ColumnType::Float).nullable(true))
            .column(ColumnDef::new("label", ColumnType::String).nullable(true));
        BoundSchema::bind(ContainerKind::TimeSeries, &schema).unwrap()
    }

    fn keyed_collection() -> BoundSchema {
        let schema = Schema::new()
            .column(ColumnDef::new("id", ColumnType::String).row_key())
            .column(ColumnDef::new("name", ColumnType::String));
        BoundSchema::bind(ContainerKind::Collection, &schema).unwrap()
    }

    fn keyless_collection() -> BoundSchema {
        let schema = Schema::new().column(ColumnDef::new("note", ColumnType::String));
        BoundSchema::bind(ContainerKind::Collection, &schema).unwrap()
    }

    #[test]
    fn test_table_is_deterministic() {
        let table = CapabilityTable::global();
        for kind in ContainerKind::ALL {
            for op in OperationKind::ALL {
                assert_eq!(table.capability(kind, op), table.capability(kind, op));
            }
        }
    }

    #[test]
    fn test_put_allowed_everywhere() {
        let op = Operation::Put { upsert: false };
        assert!(CapabilityGate::authorize(&ts_schema(), &op).is_ok());
        assert!(CapabilityGate::authorize(&keyed_collection(), &op).is_ok());
        assert!(CapabilityGate::authorize(&keyless_collection(), &op).is_ok());
    }

    #[test]
    fn test_upsert_rules() {
        let op = Operation::Put { upsert: true };
        assert_eq!(
            CapabilityGate::authorize(&ts_schema(), &op),
            Err(CapabilityError::Unsupported {
                kind: ContainerKind::TimeSeries,
                operation: OperationKind::Upsert,
            })
        );
        assert!(CapabilityGate::authorize(&keyed_collection(), &op).is_ok());
        assert_eq!(
            CapabilityGate::authorize(&keyless_collection(), &op),
            Err(CapabilityError::RequiresRowKey {
                kind: ContainerKind::Collection,
                operation: OperationKind::Upsert,
            })
        );
    }

    #[test]
    fn test_retention_rules() {
        let op = Operation::SetRetention;
        assert!(CapabilityGate::authorize(&ts_schema(), &op).is_ok());
        assert_eq!(
            CapabilityGate::authorize(&keyed_collection(), &op),
            Err(CapabilityError::Unsupported {
                kind: ContainerKind::Collection,
                operation: OperationKind::SetRetention,
            })
        );
    }

    #[test]
    fn test_range_query_rules() {
        let op = Operation::RangeQuery;
        assert!(CapabilityGate::authorize(&ts_schema(), &op).is_ok());
        assert!(CapabilityGate::authorize(&keyed_collection(), &op).is_ok());
        assert!(matches!(
            CapabilityGate::authorize(&keyless_collection(), &op),
            Err(CapabilityError::RequiresRowKey { .. })
        ));
    }

    #[test]
    fn test_index_rules() {
        // Collection: non-key column is fine, key column is not
        let ok = Operation::CreateIndex {
            column: "name".into(),
        };
        assert!(CapabilityGate::authorize(&keyed_collection(), &ok).is_ok());

        let key = Operation::CreateIndex { column: "id".into() };
        assert!(matches!(
            CapabilityGate::authorize(&keyed_collection(), &key),
            Err(CapabilityError::KeyColumn { .. })
        ));

        // Time series: non-timestamp column only, and floats not indexable
        let label = Operation::CreateIndex {
            column: "label".into(),
        };
        assert!(CapabilityGate::authorize(&ts_schema(), &label).is_ok());

        let ts = Operation::CreateIndex { column: "ts".into() };
        assert!(matches!(
            CapabilityGate::authorize(&ts_schema(), &ts),
            Err(CapabilityError::KeyColumn { .. })
        ));

        let value = Operation::CreateIndex {
            column: "value".into(),
        };
        assert!(matches!(
            CapabilityGate::authorize(&ts_schema(), &value),
            Err(CapabilityError::NotIndexable { .. })
        ));

        let missing = Operation::CreateIndex {
            column: "nope".into(),
        };
        assert!(matches!(
            CapabilityGate::authorize(&ts_schema(), &missing),
            Err(CapabilityError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_operation_kind_mapping() {
        assert_eq!(Operation::Put { upsert: false }.kind(), OperationKind::Put);
        assert_eq!(Operation::Put { upsert: true }.kind(), OperationKind::Upsert);
        assert_eq!(
            Operation::CreateIndex { column: "c".into() }.kind(),
            OperationKind::CreateIndex
        );
    }
}
