//! # strata-common
//!
//! Common types and constants for StrataDB clients.
//!
//! This crate provides the foundational types shared by every Strata
//! component. It includes:
//!
//! - **Types**: `ContainerKind`, `ContainerName`, `ColumnType`, `FieldValue`,
//!   `Timestamp`, and `RetentionPolicy`
//! - **Constants**: system-wide limits on schemas and names
//!
//! ## Example
//!
//! ```rust
//! use strata_common::types::{ContainerKind, ColumnType, FieldValue, Timestamp};
//!
//! let kind = ContainerKind::TimeSeries;
//! assert_eq!(kind.as_str(), "time_series");
//!
//! let value = FieldValue::Timestamp(Timestamp::from_micros(1_000_000));
//! assert_eq!(value.column_type(), Some(ColumnType::Timestamp));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{
    ColumnType, ContainerKind, ContainerName, FieldValue, InvalidContainerName, RetentionPolicy,
    Timestamp,
};
