//! Column types and field values.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Timestamp;

/// Data type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Integer,
    /// IEEE 754 double-precision float.
    Float,
    /// UTF-8 string.
    String,
    /// Microsecond-precision timestamp.
    Timestamp,
    /// Opaque binary data.
    Blob,
}

impl ColumnType {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Blob => "blob",
        }
    }

    /// Returns true if a column of this type may serve as a row key or
    /// carry a secondary index. Floats and blobs may not.
    #[inline]
    #[must_use]
    pub const fn is_indexable(self) -> bool {
        !matches!(self, Self::Float | Self::Blob)
    }

    /// Returns the single-byte wire tag for this type.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Bool => 1,
            Self::Integer => 2,
            Self::Float => 3,
            Self::String => 4,
            Self::Timestamp => 5,
            Self::Blob => 6,
        }
    }

    /// Parses a wire tag back into a column type.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Bool),
            2 => Some(Self::Integer),
            3 => Some(Self::Float),
            4 => Some(Self::String),
            5 => Some(Self::Timestamp),
            6 => Some(Self::Blob),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed value in a row.
///
/// `Null` is typeless; whether it is acceptable for a given column is
/// decided by the column's nullability flag, not by the value itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Microsecond-precision timestamp.
    Timestamp(Timestamp),
    /// Opaque binary data.
    Blob(Bytes),
}

impl FieldValue {
    /// Returns the column type of this value, or `None` for null.
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ColumnType::Bool),
            Self::Integer(_) => Some(ColumnType::Integer),
            Self::Float(_) => Some(ColumnType::Float),
            Self::String(_) => Some(ColumnType::String),
            Self::Timestamp(_) => Some(ColumnType::Timestamp),
            Self::Blob(_) => Some(ColumnType::Blob),
        }
    }

    /// Returns true if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this value can be stored in a column of `ty`.
    ///
    /// Null matches every type; the nullability check is separate.
    #[must_use]
    pub fn matches_type(&self, ty: ColumnType) -> bool {
        match self.column_type() {
            None => true,
            Some(actual) => actual == ty,
        }
    }

    /// Tries to get as boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Tries to get as integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Tries to get as float.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Tries to get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Tries to get as timestamp.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Tries to get as binary data.
    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for FieldValue {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    #[inline]
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FieldValue {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Timestamp> for FieldValue {
    #[inline]
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<Bytes> for FieldValue {
    #[inline]
    fn from(b: Bytes) -> Self {
        Self::Blob(b)
    }
}
