//! Timestamp type for StrataDB.
//!
//! Row-time keys and timestamp columns use a single representation:
//! signed 64-bit microseconds since the Unix epoch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A timestamp in signed microseconds since the Unix epoch.
///
/// This is the wire representation for every timestamp value the client
/// sends or receives. Values before the epoch are negative.
///
/// # Precision
///
/// Microseconds is the finest granularity the store keeps. Conversions
/// from nanosecond inputs go through [`Timestamp::from_nanos`], which
/// truncates toward zero and is therefore lossy.
///
/// # Example
///
/// ```rust
/// use strata_common::types::Timestamp;
///
/// let ts = Timestamp::from_millis(1_000);
/// assert_eq!(ts.as_micros(), 1_000_000);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Minimum representable timestamp.
    pub const MIN: Self = Self(i64::MIN);

    /// Maximum representable timestamp.
    pub const MAX: Self = Self(i64::MAX);

    /// Creates a timestamp from microseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Creates a timestamp from seconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// Creates a timestamp from nanoseconds since the Unix epoch.
    ///
    /// The sub-microsecond remainder is discarded: the conversion
    /// truncates toward zero and never rounds. This is lossy.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: i128) -> Self {
        Self((nanos / 1_000) as i64)
    }

    /// Creates a timestamp from the current system time.
    #[must_use]
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Self(d.as_micros() as i64),
            Err(e) => Self(-(e.duration().as_micros() as i64)),
        }
    }

    /// Returns the timestamp as microseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0 / 1_000
    }

    /// Returns the timestamp as seconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0 / 1_000_000
    }

    /// Adds a duration, saturating at [`Timestamp::MAX`].
    #[inline]
    #[must_use]
    pub fn add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_micros() as i64))
    }

    /// Subtracts a duration, saturating at [`Timestamp::MIN`].
    #[inline]
    #[must_use]
    pub fn sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.as_micros() as i64))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as ISO 8601 when the value is in chrono's range
        let secs = self.0.div_euclid(1_000_000);
        let subsec_micros = self.0.rem_euclid(1_000_000) as u32;
        if let Some(dt) = chrono::DateTime::from_timestamp(secs, subsec_micros * 1_000) {
            return write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ"));
        }
        write!(f, "{}us", self.0)
    }
}

impl From<i64> for Timestamp {
    #[inline]
    fn from(micros: i64) -> Self {
        Self::from_micros(micros)
    }
}

impl From<Timestamp> for i64 {
    #[inline]
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let ts = Timestamp::from_secs(2);
        assert_eq!(ts.as_micros(), 2_000_000);
        assert_eq!(ts.as_millis(), 2_000);
        assert_eq!(ts.as_secs(), 2);
    }

    #[test]
    fn test_nanos_truncate() {
        // 1999 ns -> 1 us, never rounded up
        assert_eq!(Timestamp::from_nanos(1_999).as_micros(), 1);
        // Negative values truncate toward zero
        assert_eq!(Timestamp::from_nanos(-1_999).as_micros(), -1);
    }

    #[test]
    fn test_arithmetic() {
        let ts = Timestamp::from_micros(1_000_000);
        let later = ts.add(Duration::from_secs(1));
        assert_eq!(later.as_micros(), 2_000_000);
        assert_eq!(later.sub(Duration::from_secs(1)), ts);
    }

    #[test]
    fn test_ordering() {
        assert!(Timestamp::from_micros(-1) < Timestamp::EPOCH);
        assert!(Timestamp::EPOCH < Timestamp::from_micros(1));
    }

    #[test]
    fn test_now_is_after_epoch() {
        assert!(Timestamp::now() > Timestamp::EPOCH);
    }
}
