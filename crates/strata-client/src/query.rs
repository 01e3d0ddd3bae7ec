//! Range queries and their results.

use strata_common::types::FieldValue;

use crate::codec::RowCodec;
use crate::error::DecodeError;
use crate::row::Row;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A key-range predicate over the row key (or row-time key).
///
/// The start bound is inclusive, the end bound exclusive. An absent
/// bound is unbounded on that side.
///
/// # Example
///
/// ```rust
/// use strata_client::Query;
/// use strata_common::types::Timestamp;
///
/// let query = Query::all()
///     .from(Timestamp::from_micros(0))
///     .to(Timestamp::from_micros(1_000))
///     .limit(100);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    start: Option<FieldValue>,
    end: Option<FieldValue>,
    limit: Option<u64>,
}

impl Query {
    /// A query matching every row.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Sets the inclusive start bound.
    #[must_use]
    pub fn from(mut self, key: impl Into<FieldValue>) -> Self {
        self.start = Some(key.into());
        self
    }

    /// Sets the exclusive end bound.
    #[must_use]
    pub fn to(mut self, key: impl Into<FieldValue>) -> Self {
        self.end = Some(key.into());
        self
    }

    /// Caps the number of rows returned.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the inclusive start bound.
    #[inline]
    #[must_use]
    pub fn start(&self) -> Option<&FieldValue> {
        self.start.as_ref()
    }

    /// Returns the exclusive end bound.
    #[inline]
    #[must_use]
    pub fn end(&self) -> Option<&FieldValue> {
        self.end.as_ref()
    }

    /// Returns the row cap, if any.
    #[inline]
    #[must_use]
    pub const fn row_limit(&self) -> Option<u64> {
        self.limit
    }
}

/// A finite, restartable query result.
///
/// Rows arrive encoded and are decoded lazily, one per iteration step.
/// Each call to [`RowSet::iter`] restarts from the first row, so the
/// result can be walked any number of times.
#[derive(Debug, Clone)]
pub struct RowSet {
    codec: RowCodec,
    encoded: Vec<Bytes>,
}

impl RowSet {
    /// Wraps encoded rows with the codec that decodes them.
    #[must_use]
    pub fn new(codec: RowCodec, encoded: Vec<Bytes>) -> Self {
        Self { codec, encoded }
    }

    /// Returns the number of rows in the result.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    /// Returns true if the result is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    /// Iterates over the rows, decoding lazily. Restarts every call.
    #[must_use]
    pub fn iter(&self) -> RowSetIter<'_> {
        RowSetIter { set: self, pos: 0 }
    }

    /// Decodes every row eagerly.
    pub fn rows(&self) -> Result<Vec<Row>, DecodeError> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = Result<Row, DecodeError>;
    type IntoIter = RowSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`RowSet`].
#[derive(Debug)]
pub struct RowSetIter<'a> {
    set: &'a RowSet,
    pos: usize,
}

impl Iterator for RowSetIter<'_> {
    type Item = Result<Row, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.set.encoded.get(self.pos)?;
        self.pos += 1;
        Some(self.set.codec.decode(bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.set.encoded.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RowSetIter<'_> {}
