//! Type definitions for StrataDB.
//!
//! This module contains the core data-model types used by the client.

mod containers;
mod timestamps;
mod values;

pub use containers::{ContainerKind, ContainerName, InvalidContainerName, RetentionPolicy};
pub use timestamps::Timestamp;
pub use values::{ColumnType, FieldValue};
