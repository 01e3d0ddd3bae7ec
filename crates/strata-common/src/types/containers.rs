//! Container kinds, names, and retention policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::constants::MAX_CONTAINER_NAME_LEN;

/// The kind of a container.
///
/// A container is created as exactly one kind and keeps it for its
/// lifetime. The kind decides which operations the client will dispatch
/// for the container and how rows are keyed:
///
/// - [`ContainerKind::Collection`]: rows identified by an optional row
///   key column, put-by-key overwrites.
/// - [`ContainerKind::TimeSeries`]: rows identified by a mandatory
///   row-time key (the first, timestamp-typed column), append-oriented,
///   retention policies apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Keyed rows with overwrite-on-put semantics.
    Collection,
    /// Timestamp-keyed, append-oriented rows.
    TimeSeries,
}

impl ContainerKind {
    /// All container kinds, in wire-tag order.
    pub const ALL: [Self; 2] = [Self::Collection, Self::TimeSeries];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::TimeSeries => "time_series",
        }
    }

    /// Returns the single-byte wire tag for this kind.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Collection => 0,
            Self::TimeSeries => 1,
        }
    }

    /// Parses a wire tag back into a kind.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Collection),
            1 => Some(Self::TimeSeries),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a container name fails validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidContainerName {
    /// The name is empty.
    #[error("container name is empty")]
    Empty,

    /// The name exceeds [`MAX_CONTAINER_NAME_LEN`] bytes.
    #[error("container name is {len} bytes, maximum is {max}")]
    TooLong {
        /// Actual length in bytes.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The name contains a character outside `[A-Za-z0-9_.-]`.
    #[error("container name contains invalid character {ch:?}")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
    },
}

/// A validated container name.
///
/// Names are unique within a namespace on the server side; the client
/// only enforces the lexical rules (non-empty, bounded length, ASCII
/// word characters plus `.` and `-`).
///
/// # Example
///
/// ```rust
/// use strata_common::types::ContainerName;
///
/// let name = ContainerName::new("sensor1").unwrap();
/// assert_eq!(name.as_str(), "sensor1");
/// assert!(ContainerName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerName(String);

impl ContainerName {
    /// Validates and wraps a container name.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidContainerName> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidContainerName::Empty);
        }
        if name.len() > MAX_CONTAINER_NAME_LEN {
            return Err(InvalidContainerName::TooLong {
                len: name.len(),
                max: MAX_CONTAINER_NAME_LEN,
            });
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-'))
        {
            return Err(InvalidContainerName::InvalidCharacter { ch });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner string.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContainerName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ContainerName {
    type Error = InvalidContainerName;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

/// Row expiration policy for a time series container.
///
/// Rows whose row-time key is older than `now - period` become eligible
/// for removal on the server. Only time series containers accept a
/// retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    period: Duration,
}

impl RetentionPolicy {
    /// Creates a retention policy with the given expiration period.
    #[inline]
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Creates a retention policy measured in whole days.
    #[must_use]
    pub const fn days(days: u64) -> Self {
        Self::new(Duration::from_secs(days * 24 * 60 * 60))
    }

    /// Creates a retention policy measured in whole hours.
    #[must_use]
    pub const fn hours(hours: u64) -> Self {
        Self::new(Duration::from_secs(hours * 60 * 60))
    }

    /// Returns the expiration period.
    #[inline]
    #[must_use]
    pub const fn period(self) -> Duration {
        self.period
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expire after {}s", self.period.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in ContainerKind::ALL {
            assert_eq!(ContainerKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ContainerKind::from_tag(0xFF), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ContainerKind::Collection.to_string(), "collection");
        assert_eq!(ContainerKind::TimeSeries.to_string(), "time_series");
    }

    #[test]
    fn test_container_name_valid() {
        let name = ContainerName::new("sensor-1.raw_data").unwrap();
        assert_eq!(name.as_str(), "sensor-1.raw_data");
    }

    #[test]
    fn test_container_name_invalid() {
        assert_eq!(ContainerName::new(""), Err(InvalidContainerName::Empty));
        assert!(matches!(
            ContainerName::new("has space"),
            Err(InvalidContainerName::InvalidCharacter { ch: ' ' })
        ));
        let long = "x".repeat(MAX_CONTAINER_NAME_LEN + 1);
        assert!(matches!(
            ContainerName::new(long),
            Err(InvalidContainerName::TooLong { .. })
        ));
    }

    #[test]
    fn test_retention_policy() {
        let policy = RetentionPolicy::days(30);
        assert_eq!(policy.period(), Duration::from_secs(30 * 24 * 60 * 60));
        assert_eq!(RetentionPolicy::hours(24), RetentionPolicy::days(1));
    }
}
