//! Logical rows.
//!
//! A [`Row`] maps column names to typed values in insertion order.
//! Conformance to a schema is checked at bind/encode time, not here:
//! a `Row` on its own is just an ordered bag of named values.

use std::fmt;

use strata_common::types::FieldValue;

/// An ordered mapping from column name to typed value.
///
/// Insertion order is preserved; setting an existing column replaces
/// its value in place. Column counts are small, so lookup is linear.
///
/// # Example
///
/// ```rust
/// use strata_client::Row;
/// use strata_common::types::{FieldValue, Timestamp};
///
/// let row = Row::new()
///     .with("ts", Timestamp::from_micros(100))
///     .with("value", 1.5);
/// assert_eq!(row.len(), 2);
/// assert_eq!(row.get("value"), Some(&FieldValue::Float(1.5)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl PartialEq for Row {
    /// Rows are equal when they hold the same columns with equal
    /// values; insertion order does not participate in equality.
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty row with capacity for `n` columns.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Sets a column value, replacing any existing value in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Builder-style [`Row::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the number of columns in the row.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the row has no columns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, FieldValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut row = Row::new();
        row.set("a", 1i64);
        row.set("b", "x");
        assert_eq!(row.get("a"), Some(&FieldValue::Integer(1)));
        assert_eq!(row.get("b"), Some(&FieldValue::String("x".into())));
        assert_eq!(row.get("c"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let row = Row::new().with("a", 1i64).with("b", 2i64).with("a", 3i64);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("a"), Some(&FieldValue::Integer(3)));
        // Replacement keeps the original position
        let names: Vec<_> = row.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_display() {
        let row = Row::new().with("id", "a").with("n", 1i64);
        assert_eq!(row.to_string(), "{id: a, n: 1}");
    }
}
