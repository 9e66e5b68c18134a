//! Composite codec framework (component B): typed builders over the
//! primitive codecs in [`primitive`], expressed as one tagged
//! `CodecDefinition` enum rather than recursive trait objects, per the
//! design notes on declarative codec tables. Every variant exposes the
//! same `encode`/`decode` contract.

pub mod array;
pub mod dataset;
pub mod enum_codec;
pub mod primitive;
pub mod value;

use std::sync::Arc;

use crate::cursor::{ByteCursor, ByteWriter};
use crate::error::{PtpError, ValidationError};

pub use array::ArrayCodec;
pub use dataset::{DatasetCodec, FieldDefinition};
pub use enum_codec::{EnumCodec, EnumEntry, EnumTable};
pub use primitive::PrimitiveKind;
pub use value::Value;

/// Opaque encode/decode pair for formats not reducible to the other
/// variants (Canon's event stream, Sony's SDIO OSD image parser). The
/// `name` is carried for error messages and registry lookups.
#[derive(Clone)]
pub struct CustomCodec {
    pub name: &'static str,
    pub encode: Arc<dyn Fn(&Value) -> Result<Vec<u8>, PtpError> + Send + Sync>,
    pub decode: Arc<dyn Fn(&[u8]) -> Result<(Value, usize), PtpError> + Send + Sync>,
}

impl std::fmt::Debug for CustomCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCodec").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub enum CodecDefinition {
    Primitive(PrimitiveKind),
    Array(ArrayCodec),
    Enum(EnumCodec),
    Dataset(DatasetCodec),
    Custom(CustomCodec),
}

impl CodecDefinition {
    pub fn primitive(kind: PrimitiveKind) -> Arc<Self> {
        Arc::new(CodecDefinition::Primitive(kind))
    }

    pub fn array(inner: Arc<CodecDefinition>) -> Arc<Self> {
        Arc::new(CodecDefinition::Array(ArrayCodec { inner }))
    }

    pub fn enum_of(name: &'static str, base: Arc<CodecDefinition>, table: EnumTable) -> Arc<Self> {
        Arc::new(CodecDefinition::Enum(EnumCodec { name, base, table }))
    }

    pub fn dataset(name: &'static str, fields: Vec<FieldDefinition>) -> Arc<Self> {
        Arc::new(CodecDefinition::Dataset(DatasetCodec { name, fields }))
    }

    /// Infallible for well-typed inputs; fails with `ValidationError` if
    /// an enum codec is asked to encode a name outside its table.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, PtpError> {
        let mut w = ByteWriter::new();
        match self {
            CodecDefinition::Primitive(kind) => kind.encode(value, &mut w)?,
            CodecDefinition::Array(array) => array.encode(value, &mut w)?,
            CodecDefinition::Enum(e) => e.encode(value, &mut w)?,
            CodecDefinition::Dataset(d) => d.encode(value, &mut w)?,
            CodecDefinition::Custom(c) => return (c.encode)(value),
        }
        Ok(w.into_bytes())
    }

    /// Returns the decoded value and the number of bytes consumed.
    pub fn decode(&self, bytes: &[u8]) -> Result<(Value, usize), PtpError> {
        match self {
            CodecDefinition::Custom(c) => return (c.decode)(bytes),
            _ => {}
        }
        let mut cursor = ByteCursor::new(bytes);
        let value = match self {
            CodecDefinition::Primitive(kind) => kind.decode(&mut cursor, true)?,
            CodecDefinition::Array(array) => array.decode(&mut cursor)?,
            CodecDefinition::Enum(e) => e.decode(&mut cursor)?,
            CodecDefinition::Dataset(d) => d.decode(&mut cursor)?,
            CodecDefinition::Custom(_) => unreachable!(),
        };
        Ok((value, cursor.position()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            CodecDefinition::Primitive(k) => match k {
                PrimitiveKind::U8 => "uint8",
                PrimitiveKind::I8 => "int8",
                PrimitiveKind::U16 => "uint16",
                PrimitiveKind::I16 => "int16",
                PrimitiveKind::U32 => "uint32",
                PrimitiveKind::I32 => "int32",
                PrimitiveKind::U64 => "uint64",
                PrimitiveKind::I64 => "int64",
                PrimitiveKind::U128 => "uint128",
                PrimitiveKind::I128 => "int128",
                PrimitiveKind::String => "string",
            },
            CodecDefinition::Array(_) => "array",
            CodecDefinition::Enum(e) => e.name,
            CodecDefinition::Dataset(d) => d.name,
            CodecDefinition::Custom(c) => c.name,
        }
    }
}

pub(crate) fn unknown_enum_name(codec: &'static str, name: String) -> PtpError {
    PtpError::Validation(ValidationError::UnknownEnumName { codec, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_codec_round_trips_through_the_enum_dispatch() {
        let codec = CodecDefinition::primitive(PrimitiveKind::U32);
        let bytes = codec.encode(&Value::U32(42)).unwrap();
        let (value, consumed) = codec.decode(&bytes).unwrap();
        assert_eq!(value, Value::U32(42));
        assert_eq!(consumed, 4);
    }
}
