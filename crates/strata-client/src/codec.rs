//! Kind-specific row encoding.
//!
//! Every row crosses the wire in a self-describing frame checked
//! against the bound schema on both ends.
//!
//! # Row Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//!   0       2   magic (0x5352 = "SR", little-endian)
//!   2       1   container kind tag
//!   3       1   flags (bit 0: schema declares a row key)
//!   4       2   column count
//!   6       ..  fields, one per column in schema declaration order
//! ```
//!
//! Each field starts with a tag byte: the column type tag in the low
//! bits, `0x40` when the value is null (no payload follows), and
//! `0x80` on the row key column of a collection so the store can index
//! it without consulting the schema. Payloads are little-endian:
//! bool is one byte, integers and timestamps are 8 bytes, floats are
//! IEEE 754 doubles, strings and blobs are a u32 length then the bytes.
//!
//! For a time series the row-time key is the first field. That
//! ordering, and the preserved declaration order of the remaining
//! columns, is a wire-compatibility invariant, not a cosmetic choice.
//! Timestamps travel as signed 64-bit epoch-microseconds; see
//! [`Timestamp::from_nanos`] for the documented lossy truncation from
//! finer-grained inputs.
//!
//! Encode and decode are stateless pure functions over the bound
//! schema. Their errors indicate a logic bug or protocol drift and are
//! never retried locally.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use strata_common::constants::{MAX_BLOB_SIZE, MAX_ROW_SIZE};
use strata_common::types::{ColumnType, ContainerKind, FieldValue, Timestamp};

use crate::error::{DecodeError, EncodeError};
use crate::row::Row;
use crate::schema::BoundSchema;

/// Magic bytes at the start of every encoded row.
pub const ROW_MAGIC: u16 = 0x5352;

/// Size of the row header in bytes.
pub const ROW_HEADER_SIZE: usize = 6;

/// Tag-byte bit marking a null value.
const NULL_BIT: u8 = 0x40;

/// Tag-byte bit marking the row key column of a collection.
const ROW_KEY_BIT: u8 = 0x80;

/// Header flag: the schema declares a row key.
const FLAG_HAS_ROW_KEY: u8 = 0x01;

/// Encodes and decodes rows for one bound schema.
///
/// Cloning is cheap; the codec shares the bound schema's column list.
#[derive(Debug, Clone)]
pub struct RowCodec {
    schema: BoundSchema,
}

impl RowCodec {
    /// Creates a codec for a bound schema.
    #[must_use]
    pub fn new(schema: BoundSchema) -> Self {
        Self { schema }
    }

    /// Returns the bound schema this codec encodes for.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &BoundSchema {
        &self.schema
    }

    /// Encodes a row into its wire representation.
    ///
    /// The row is checked for conformance first, so a rejected row
    /// produces no partial encoding.
    pub fn encode(&self, row: &Row) -> Result<Bytes, EncodeError> {
        self.schema.check_row(row)?;

        let kind = self.schema.kind();
        let mut buf = BytesMut::with_capacity(ROW_HEADER_SIZE + 16 * self.schema.columns().len());
        buf.put_u16_le(ROW_MAGIC);
        buf.put_u8(kind.tag());
        let flags = if self.schema.row_key_index().is_some() {
            FLAG_HAS_ROW_KEY
        } else {
            0
        };
        buf.put_u8(flags);
        buf.put_u16_le(self.schema.columns().len() as u16);

        for (i, def) in self.schema.columns().iter().enumerate() {
            // check_row guarantees presence and type agreement
            let value = row.get(def.name()).unwrap_or(&FieldValue::Null);
            let mut tag = def.column_type().tag();
            if kind == ContainerKind::Collection && Some(i) == self.schema.row_key_index() {
                tag |= ROW_KEY_BIT;
            }
            if value.is_null() {
                buf.put_u8(tag | NULL_BIT);
                continue;
            }
            buf.put_u8(tag);
            Self::encode_value(&mut buf, def.name(), value)?;
        }

        if buf.len() > MAX_ROW_SIZE {
            return Err(EncodeError::RowTooLarge {
                size: buf.len(),
                max: MAX_ROW_SIZE,
            });
        }
        Ok(buf.freeze())
    }

    fn encode_value(buf: &mut BytesMut, column: &str, value: &FieldValue) -> Result<(), EncodeError> {
        match value {
            FieldValue::Null => {}
            FieldValue::Bool(b) => buf.put_u8(u8::from(*b)),
            FieldValue::Integer(i) => buf.put_i64_le(*i),
            FieldValue::Float(x) => buf.put_f64_le(*x),
            FieldValue::Timestamp(ts) => buf.put_i64_le(ts.as_micros()),
            FieldValue::String(s) => {
                buf.put_u32_le(s.len() as u32);
                buf.put_slice(s.as_bytes());
            }
            FieldValue::Blob(b) => {
                if b.len() > MAX_BLOB_SIZE {
                    return Err(EncodeError::BlobTooLarge {
                        column: column.to_string(),
                        size: b.len(),
                        max: MAX_BLOB_SIZE,
                    });
                }
                buf.put_u32_le(b.len() as u32);
                buf.put_slice(b);
            }
        }
        Ok(())
    }

    /// Decodes a wire representation back into a logical row.
    ///
    /// Rejects bytes whose magic, kind, column count, type tags, or key
    /// markers disagree with the bound schema. Values are never coerced.
    pub fn decode(&self, bytes: &[u8]) -> Result<Row, DecodeError> {
        let mut buf = bytes;
        if buf.remaining() < ROW_HEADER_SIZE {
            return Err(DecodeError::Truncated);
        }

        let magic = buf.get_u16_le();
        if magic != ROW_MAGIC {
            return Err(DecodeError::SchemaMismatch {
                reason: format!("bad magic {magic:#06x}"),
            });
        }
        let kind_tag = buf.get_u8();
        if ContainerKind::from_tag(kind_tag) != Some(self.schema.kind()) {
            return Err(DecodeError::SchemaMismatch {
                reason: format!("kind tag {kind_tag} does not match {}", self.schema.kind()),
            });
        }
        let flags = buf.get_u8();
        let expect_key = self.schema.row_key_index().is_some();
        if (flags & FLAG_HAS_ROW_KEY != 0) != expect_key {
            return Err(DecodeError::SchemaMismatch {
                reason: "row key flag disagrees with schema".to_string(),
            });
        }
        let count = buf.get_u16_le() as usize;
        if count != self.schema.columns().len() {
            return Err(DecodeError::SchemaMismatch {
                reason: format!(
                    "column count {count} does not match schema ({})",
                    self.schema.columns().len()
                ),
            });
        }

        let mut row = Row::with_capacity(count);
        for (i, def) in self.schema.columns().iter().enumerate() {
            if buf.remaining() < 1 {
                return Err(DecodeError::Truncated);
            }
            let tag = buf.get_u8();
            let marked_key = tag & ROW_KEY_BIT != 0;
            let expect_marker = self.schema.kind() == ContainerKind::Collection
                && Some(i) == self.schema.row_key_index();
            if marked_key != expect_marker {
                return Err(DecodeError::SchemaMismatch {
                    reason: format!("row key marker disagrees at column '{}'", def.name()),
                });
            }
            let is_null = tag & NULL_BIT != 0;
            let type_tag = tag & !(ROW_KEY_BIT | NULL_BIT);
            if ColumnType::from_tag(type_tag) != Some(def.column_type()) {
                return Err(DecodeError::SchemaMismatch {
                    reason: format!(
                        "type tag {type_tag} at column '{}' does not match {}",
                        def.name(),
                        def.column_type()
                    ),
                });
            }
            if is_null {
                if !def.is_nullable() {
                    return Err(DecodeError::SchemaMismatch {
                        reason: format!("null in non-nullable column '{}'", def.name()),
                    });
                }
                row.set(def.name(), FieldValue::Null);
                continue;
            }
            let value = Self::decode_value(&mut buf, def.name(), def.column_type())?;
            row.set(def.name(), value);
        }

        if buf.remaining() > 0 {
            return Err(DecodeError::TrailingBytes {
                remaining: buf.remaining(),
            });
        }
        Ok(row)
    }

    fn decode_value(
        buf: &mut &[u8],
        column: &str,
        ty: ColumnType,
    ) -> Result<FieldValue, DecodeError> {
        let need = match ty {
            ColumnType::Bool => 1,
            ColumnType::Integer | ColumnType::Float | ColumnType::Timestamp => 8,
            ColumnType::String | ColumnType::Blob => 4,
        };
        if buf.remaining() < need {
            return Err(DecodeError::Truncated);
        }
        let value = match ty {
            ColumnType::Bool => FieldValue::Bool(buf.get_u8() != 0),
            ColumnType::Integer => FieldValue::Integer(buf.get_i64_le()),
            ColumnType::Float => FieldValue::Float(buf.get_f64_le()),
            ColumnType::Timestamp => FieldValue::Timestamp(Timestamp::from_micros(buf.get_i64_le())),
            ColumnType::String => {
                let len = buf.get_u32_le() as usize;
                if buf.remaining() < len {
                    return Err(DecodeError::Truncated);
                }
                let raw = buf.copy_to_bytes(len);
                let s = std::str::from_utf8(&raw)
                    .map_err(|_| DecodeError::InvalidUtf8 {
                        column: column.to_string(),
                    })?
                    .to_string();
                FieldValue::String(s)
            }
            ColumnType::Blob => {
                let len = buf.get_u32_le() as usize;
                if buf.remaining() < len {
                    return Err(DecodeError::Truncated);
                }
                FieldValue::Blob(buf.copy_to_bytes(len))
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, Schema};

    fn ts_codec() -> RowCodec {
        let schema = Schema::new()
            .column(ColumnDef::new("ts", ColumnType::Timestamp))
            .column(ColumnDef::new("value", ColumnType::Float))
            .column(ColumnDef::new("note", ColumnType::String).nullable(true));
        RowCodec::new(BoundSchema::bind(ContainerKind::TimeSeries, &schema).unwrap())
    }

    fn collection_codec() -> RowCodec {
        let schema = Schema::new()
            .column(ColumnDef::new("id", ColumnType::String).row_key())
            .column(ColumnDef::new("count", ColumnType::Integer))
            .column(ColumnDef::new("payload", ColumnType::Blob).nullable(true));
        RowCodec::new(BoundSchema::bind(ContainerKind::Collection, &schema).unwrap())
    }

    #[test]
    fn test_round_trip_time_series() {
        let codec = ts_codec();
        let row = Row::new()
            .with("ts", Timestamp::from_micros(1_000_000))
            .with("value", 2.5)
            .with("note", "warm");
        let encoded = codec.encode(&row).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, row);
    }

    #[test]
    fn test_round_trip_with_null() {
        let codec = ts_codec();
        let row = Row::new()
            .with("ts", Timestamp::from_micros(7))
            .with("value", 0.0)
            .with("note", FieldValue::Null);
        let decoded = codec.decode(&codec.encode(&row).unwrap()).unwrap();
        assert_eq!(decoded.get("note"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_round_trip_collection_key_marker() {
        let codec = collection_codec();
        let row = Row::new()
            .with("id", "user-1")
            .with("count", 3i64)
            .with("payload", Bytes::from_static(b"\x01\x02"));
        let encoded = codec.encode(&row).unwrap();

        // The key column's tag byte carries the marker bit
        let key_tag = encoded[ROW_HEADER_SIZE];
        assert_eq!(key_tag & ROW_KEY_BIT, ROW_KEY_BIT);

        assert_eq!(codec.decode(&encoded).unwrap(), row);
    }

    #[test]
    fn test_time_series_row_time_is_first_field() {
        let codec = ts_codec();
        let row = Row::new()
            .with("value", 1.0)
            .with("ts", Timestamp::from_micros(42))
            .with("note", FieldValue::Null);
        let encoded = codec.encode(&row).unwrap();

        // First field after the header is the row-time key regardless of
        // the order the caller populated the row
        let tag = encoded[ROW_HEADER_SIZE];
        assert_eq!(tag, ColumnType::Timestamp.tag());
        let micros = i64::from_le_bytes(
            encoded[ROW_HEADER_SIZE + 1..ROW_HEADER_SIZE + 9]
                .try_into()
                .unwrap(),
        );
        assert_eq!(micros, 42);
    }

    #[test]
    fn test_decode_rejects_wrong_schema() {
        let ts = ts_codec();
        let coll = collection_codec();
        let row = Row::new()
            .with("id", "a")
            .with("count", 1i64)
            .with("payload", FieldValue::Null);
        let encoded = coll.encode(&row).unwrap();

        // A time series codec must refuse a collection row outright
        assert!(matches!(
            ts.decode(&encoded),
            Err(DecodeError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncation_and_trailing() {
        let codec = ts_codec();
        let row = Row::new()
            .with("ts", Timestamp::from_micros(1))
            .with("value", 1.0)
            .with("note", FieldValue::Null);
        let encoded = codec.encode(&row).unwrap();

        assert!(matches!(
            codec.decode(&encoded[..encoded.len() - 1]),
            Err(DecodeError::Truncated)
        ));

        let mut padded = encoded.to_vec();
        padded.push(0);
        assert!(matches!(
            codec.decode(&padded),
            Err(DecodeError::TrailingBytes { remaining: 1 })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let codec = ts_codec();
        let row = Row::new()
            .with("ts", Timestamp::from_micros(1))
            .with("value", 1.0)
            .with("note", FieldValue::Null);
        let mut encoded = codec.encode(&row).unwrap().to_vec();
        encoded[0] ^= 0xFF;
        assert!(matches!(
            codec.decode(&encoded),
            Err(DecodeError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_nonconforming_row_atomically() {
        let codec = ts_codec();
        let row = Row::new().with("ts", Timestamp::from_micros(1));
        // Missing column: no bytes are produced
        assert!(matches!(
            codec.encode(&row),
            Err(EncodeError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_blob() {
        let codec = collection_codec();
        let row = Row::new()
            .with("id", "a")
            .with("count", 1i64)
            .with("payload", Bytes::from(vec![0u8; MAX_BLOB_SIZE + 1]));
        assert!(matches!(
            codec.encode(&row),
            Err(EncodeError::BlobTooLarge { .. })
        ));
    }
}
