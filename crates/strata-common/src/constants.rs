//! System-wide constants and limits.

/// Maximum number of columns in a container schema.
pub const MAX_COLUMNS: usize = 1024;

/// Maximum length of a column name in bytes.
pub const MAX_COLUMN_NAME_LEN: usize = 256;

/// Maximum length of a container name in bytes.
pub const MAX_CONTAINER_NAME_LEN: usize = 512;

/// Maximum size of a single encoded row in bytes (1 MB).
pub const MAX_ROW_SIZE: usize = 1024 * 1024;

/// Maximum size of a blob field in bytes (512 KB).
pub const MAX_BLOB_SIZE: usize = 512 * 1024;
