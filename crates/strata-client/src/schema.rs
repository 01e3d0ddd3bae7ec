//! Schema declaration and kind-aware binding.
//!
//! A [`Schema`] is what the caller declares: an ordered column list.
//! A [`BoundSchema`] is a schema that has been validated against the
//! structural constraints of a [`ContainerKind`]:
//!
//! - `TimeSeries`: the first column must be a non-nullable timestamp,
//!   the row-time key; no other column may be flagged as a row key.
//! - `Collection`: at most one row key column, of an indexable type
//!   (no floats, no blobs), non-nullable.
//!
//! Binding is pure validation with no side effects. It is the gate
//! keeping malformed declarations off the wire.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use strata_common::constants::{MAX_COLUMNS, MAX_COLUMN_NAME_LEN};
use strata_common::types::{ColumnType, ContainerKind, FieldValue};

use crate::error::{EncodeError, SchemaError};
use crate::row::Row;

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    row_key: bool,
}

impl ColumnDef {
    /// Declares a non-nullable, non-key column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            row_key: false,
        }
    }

    /// Sets the nullability flag.
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Flags this column as the row key.
    #[must_use]
    pub fn row_key(mut self) -> Self {
        self.row_key = true;
        self
    }

    /// Returns the column name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column data type.
    #[inline]
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns true if the column accepts null values.
    #[inline]
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns true if the column is flagged as the row key.
    #[inline]
    #[must_use]
    pub const fn is_row_key(&self) -> bool {
        self.row_key
    }
}

/// An ordered, caller-declared column list.
///
/// # Example
///
/// ```rust
/// use strata_client::{ColumnDef, Schema};
/// use strata_common::types::ColumnType;
///
/// let schema = Schema::new()
///     .column(ColumnDef::new("ts", ColumnType::Timestamp))
///     .column(ColumnDef::new("value", ColumnType::Float));
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column declaration.
    #[must_use]
    pub fn column(mut self, def: ColumnDef) -> Self {
        self.columns.push(def);
        self
    }

    /// Returns the declared columns in order.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the number of declared columns.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if no columns are declared.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A schema validated against a container kind's structural rules.
///
/// Immutable after construction; cloning shares the column list, so a
/// bound schema is cheap to hand to codecs and row sets.
#[derive(Debug, Clone)]
pub struct BoundSchema {
    kind: ContainerKind,
    columns: Arc<[ColumnDef]>,
    row_key: Option<usize>,
}

impl BoundSchema {
    /// Validates `schema` against the structural constraints of `kind`.
    ///
    /// Pure validation: no side effects, deterministic, and the error
    /// names the offending column.
    pub fn bind(kind: ContainerKind, schema: &Schema) -> Result<Self, SchemaError> {
        let columns = schema.columns();
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        if columns.len() > MAX_COLUMNS {
            return Err(SchemaError::TooManyColumns {
                count: columns.len(),
                max: MAX_COLUMNS,
            });
        }
        for (i, def) in columns.iter().enumerate() {
            if def.name().is_empty() || def.name().len() > MAX_COLUMN_NAME_LEN {
                return Err(SchemaError::ColumnNameTooLong {
                    name: def.name().chars().take(32).collect(),
                    len: def.name().len(),
                    max: MAX_COLUMN_NAME_LEN,
                });
            }
            if columns[..i].iter().any(|prev| prev.name() == def.name()) {
                return Err(SchemaError::DuplicateColumn {
                    name: def.name().to_string(),
                });
            }
        }

        let row_key = match kind {
            ContainerKind::TimeSeries => Self::bind_time_series(columns)?,
            ContainerKind::Collection => Self::bind_collection(columns)?,
        };

        Ok(Self {
            kind,
            columns: columns.into(),
            row_key,
        })
    }

    fn bind_time_series(columns: &[ColumnDef]) -> Result<Option<usize>, SchemaError> {
        let first = &columns[0];
        if first.column_type() != ColumnType::Timestamp {
            return Err(SchemaError::IncompatibleKind {
                kind: ContainerKind::TimeSeries,
                column: first.name().to_string(),
                reason: format!(
                    "first column must be a timestamp (the row-time key), got {}",
                    first.column_type()
                ),
            });
        }
        if first.is_nullable() {
            return Err(SchemaError::IncompatibleKind {
                kind: ContainerKind::TimeSeries,
                column: first.name().to_string(),
                reason: "row-time key cannot be nullable".to_string(),
            });
        }
        // The row-time key is implicit; an explicit flag on it is
        // redundant but harmless. Flags anywhere else are an error.
        if let Some(extra) = columns[1..].iter().find(|def| def.is_row_key()) {
            return Err(SchemaError::IncompatibleKind {
                kind: ContainerKind::TimeSeries,
                column: extra.name().to_string(),
                reason: "a time series allows no row key besides the row-time key".to_string(),
            });
        }
        Ok(Some(0))
    }

    fn bind_collection(columns: &[ColumnDef]) -> Result<Option<usize>, SchemaError> {
        let mut row_key = None;
        for (i, def) in columns.iter().enumerate() {
            if !def.is_row_key() {
                continue;
            }
            if row_key.is_some() {
                return Err(SchemaError::IncompatibleKind {
                    kind: ContainerKind::Collection,
                    column: def.name().to_string(),
                    reason: "a collection allows at most one row key column".to_string(),
                });
            }
            if !def.column_type().is_indexable() {
                return Err(SchemaError::IncompatibleKind {
                    kind: ContainerKind::Collection,
                    column: def.name().to_string(),
                    reason: format!("{} is not an indexable row key type", def.column_type()),
                });
            }
            if def.is_nullable() {
                return Err(SchemaError::IncompatibleKind {
                    kind: ContainerKind::Collection,
                    column: def.name().to_string(),
                    reason: "row key cannot be nullable".to_string(),
                });
            }
            row_key = Some(i);
        }
        Ok(row_key)
    }

    /// Returns the container kind the schema is bound to.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Returns the columns in declaration order.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the index of the row key column, if any.
    ///
    /// For a time series this is always column 0, the row-time key.
    #[inline]
    #[must_use]
    pub const fn row_key_index(&self) -> Option<usize> {
        self.row_key
    }

    /// Returns the row key column definition, if any.
    #[must_use]
    pub fn row_key_column(&self) -> Option<&ColumnDef> {
        self.row_key.map(|i| &self.columns[i])
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, def)| def.name() == name)
    }

    /// Compares against a remote, authoritative schema.
    ///
    /// Used to detect drift between the local declaration and what the
    /// store holds: column order, names, types, and nullability must
    /// match exactly; extra or missing columns are mismatches. Row-key
    /// flags are compared structurally (a redundant flag on a row-time
    /// key is equivalent to none).
    #[must_use]
    pub fn matches(&self, remote: &Schema) -> bool {
        let remote = remote.columns();
        if self.columns.len() != remote.len() {
            return false;
        }
        self.columns.iter().zip(remote).enumerate().all(|(i, (a, b))| {
            let key_equivalent = if self.kind == ContainerKind::TimeSeries && i == 0 {
                true
            } else {
                a.is_row_key() == b.is_row_key()
            };
            a.name() == b.name()
                && a.column_type() == b.column_type()
                && a.is_nullable() == b.is_nullable()
                && key_equivalent
        })
    }

    /// Checks that a row conforms to this schema.
    ///
    /// Every declared column must be present with a matching type (or
    /// null where nullability allows it), and the row may not carry
    /// columns the schema does not declare.
    pub fn check_row(&self, row: &Row) -> Result<(), EncodeError> {
        for def in self.columns.iter() {
            match row.get(def.name()) {
                None => {
                    return Err(EncodeError::MissingColumn {
                        column: def.name().to_string(),
                    });
                }
                Some(FieldValue::Null) => {
                    if !def.is_nullable() {
                        return Err(EncodeError::NullNotAllowed {
                            column: def.name().to_string(),
                        });
                    }
                }
                Some(value) => {
                    if let Some(actual) = value.column_type() {
                        if actual != def.column_type() {
                            return Err(EncodeError::TypeMismatch {
                                column: def.name().to_string(),
                                expected: def.column_type(),
                                actual,
                            });
                        }
                    }
                }
            }
        }
        if let Some((name, _)) = row
            .iter()
            .find(|(name, _)| self.column(name).is_none())
        {
            return Err(EncodeError::UnknownColumn {
                column: name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts_schema() -> Schema {
        Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp))
            .column(ColumnDef::new("value", ColumnType::Float))
    }

    #[test]
    fn test_bind_time_series() {
        let bound = BoundSchema::bind(ContainerKind::TimeSeries, &ts_schema()).unwrap();
        assert_eq!(bound.row_key_index(), Some(0));
        assert_eq!(bound.row_key_column().unwrap().name(), "ts");
    }

    #[test]
    fn test_bind_time_series_rejects_every_non_timestamp_first_column() {
        let types = [
            ColumnType::Bool,
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::String,
            ColumnType::Blob,
        ];
        for ty in types {
            let schema = Schema::new()
                .column(ColumnDef::new("first", ty))
                .column(ColumnDef::new("value", ColumnType::Float));
            let err = BoundSchema::bind(ContainerKind::TimeSeries, &schema).unwrap_err();
            assert!(
                matches!(err, SchemaError::IncompatibleKind { ref column, .. } if column == "first"),
                "type {ty} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_bind_time_series_rejects_extra_row_key() {
        let schema = Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp))
            .column(ColumnDef::new("tag", ColumnType::String).row_key());
        let err = BoundSchema::bind(ContainerKind::TimeSeries, &schema).unwrap_err();
        assert!(matches!(err, SchemaError::IncompatibleKind { ref column, .. } if column == "tag"));
    }

    #[test]
    fn test_bind_time_series_rejects_nullable_row_time() {
        let schema = Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp).nullable(true))
            .column(ColumnDef::new("value", ColumnType::Float));
        assert!(BoundSchema::bind(ContainerKind::TimeSeries, &schema).is_err());
    }

    #[test]
    fn test_bind_collection_with_key() {
        let schema = Schema::new()
            .column(ColumnDef::new("id", ColumnType::String).row_key())
            .column(ColumnDef::new("name", ColumnType::String));
        let bound = BoundSchema::bind(ContainerKind::Collection, &schema).unwrap();
        assert_eq!(bound.row_key_index(), Some(0));
    }

    #[test]
    fn test_bind_collection_without_key() {
        let schema = Schema::new().column(ColumnDef::new("note", ColumnType::String));
        let bound = BoundSchema::bind(ContainerKind::Collection, &schema).unwrap();
        assert_eq!(bound.row_key_index(), None);
    }

    #[test]
    fn test_bind_collection_rejects_two_row_keys() {
        let schema = Schema::new()
            .column(ColumnDef::new("a", ColumnType::String).row_key())
            .column(ColumnDef::new("b", ColumnType::Integer).row_key());
        let err = BoundSchema::bind(ContainerKind::Collection, &schema).unwrap_err();
        assert!(matches!(err, SchemaError::IncompatibleKind { ref column, .. } if column == "b"));
    }

    #[test]
    fn test_bind_collection_rejects_unindexable_key() {
        for ty in [ColumnType::Float, ColumnType::Blob] {
            let schema = Schema::new().column(ColumnDef::new("k", ty).row_key());
            assert!(BoundSchema::bind(ContainerKind::Collection, &schema).is_err());
        }
    }

    #[test]
    fn test_bind_rejects_duplicates_and_empty() {
        let err = BoundSchema::bind(ContainerKind::Collection, &Schema::new()).unwrap_err();
        assert_eq!(err, SchemaError::Empty);

        let schema = Schema::new()
            .column(ColumnDef::new("x", ColumnType::Integer))
            .column(ColumnDef::new("x", ColumnType::String));
        let err = BoundSchema::bind(ContainerKind::Collection, &schema).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateColumn { name: "x".into() });
    }

    #[test]
    fn test_matches_exact_only() {
        let bound = BoundSchema::bind(ContainerKind::TimeSeries, &ts_schema()).unwrap();
        assert!(bound.matches(&ts_schema()));

        // Different nullability
        let drifted = Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp))
            .column(ColumnDef::new("value", ColumnType::Float).nullable(true));
        assert!(!bound.matches(&drifted));

        // Extra column
        let extra = ts_schema().column(ColumnDef::new("tag", ColumnType::String));
        assert!(!bound.matches(&extra));

        // Reordered
        let reordered = Schema::new()
            .column(ColumnDef::new("value", ColumnType::Float))
            .column(ColumnDef::new("ts", ColumnType::Timestamp));
        assert!(!bound.matches(&reordered));

        // Redundant row-key flag on the row-time key is equivalent
        let flagged = Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp).row_key())
            .column(ColumnDef::new("value", ColumnType::Float));
        assert!(bound.matches(&flagged));
    }

    #[test]
    fn test_check_row() {
        let bound = BoundSchema::bind(ContainerKind::TimeSeries, &ts_schema()).unwrap();

        let ok = Row::new()
            .with("ts", strata_common::types::Timestamp::from_micros(1))
            .with("value", 1.0);
        assert!(bound.check_row(&ok).is_ok());

        let missing = Row::new().with("ts", strata_common::types::Timestamp::from_micros(1));
        assert!(matches!(
            bound.check_row(&missing),
            Err(EncodeError::MissingColumn { .. })
        ));

        let wrong_type = Row::new()
            .with("ts", strata_common::types::Timestamp::from_micros(1))
            .with("value", "not a float");
        assert!(matches!(
            bound.check_row(&wrong_type),
            Err(EncodeError::TypeMismatch { .. })
        ));

        let null_key = Row::new()
            .with("ts", strata_common::types::FieldValue::Null)
            .with("value", 1.0);
        assert!(matches!(
            bound.check_row(&null_key),
            Err(EncodeError::NullNotAllowed { .. })
        ));

        let unknown = Row::new()
            .with("ts", strata_common::types::Timestamp::from_micros(1))
            .with("value", 1.0)
            .with("extra", 2i64);
        assert!(matches!(
            bound.check_row(&unknown),
            Err(EncodeError::UnknownColumn { .. })
        ));
    }
}
