//! Fixed-width primitive codecs (component A) and the PTP string codec,
//! expressed as the leaf variant of `CodecDefinition` rather than as
//! standalone closures (see the design notes on declarative codec
//! tables with polymorphic closures).

use crate::cursor::{ByteCursor, ByteWriter};
use crate::error::ProtocolError;

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    /// Length-prefixed UTF-16LE string (§4.A).
    String,
}

impl PrimitiveKind {
    /// Fixed encoded size in bytes, or `None` for variable-length kinds
    /// (`String`). Used by the array codec to bound-check before
    /// decoding fixed-width element arrays.
    pub fn fixed_size(self) -> Option<usize> {
        use PrimitiveKind::*;
        match self {
            U8 | I8 => Some(1),
            U16 | I16 => Some(2),
            U32 | I32 => Some(4),
            U64 | I64 => Some(8),
            U128 | I128 => Some(16),
            String => None,
        }
    }

    pub fn decode(self, cursor: &mut ByteCursor, strict_strings: bool) -> Result<Value, ProtocolError> {
        use PrimitiveKind::*;
        Ok(match self {
            U8 => Value::U8(cursor.read_u8()?),
            I8 => Value::I8(cursor.read_i8()?),
            U16 => Value::U16(cursor.read_u16_le()?),
            I16 => Value::I16(cursor.read_i16_le()?),
            U32 => Value::U32(cursor.read_u32_le()?),
            I32 => Value::I32(cursor.read_i32_le()?),
            U64 => Value::U64(cursor.read_u64_le()?),
            I64 => Value::I64(cursor.read_i64_le()?),
            U128 => Value::U128(cursor.read_u128_le()?),
            I128 => Value::I128(cursor.read_i128_le()?),
            String => Value::Str(cursor.read_ptp_string(strict_strings)?),
        })
    }

    pub fn encode(self, value: &Value, out: &mut ByteWriter) -> Result<(), ProtocolError> {
        use PrimitiveKind::*;
        macro_rules! expect {
            ($pat:pat => $body:expr) => {
                match value {
                    $pat => $body,
                    other => {
                        return Err(ProtocolError::MalformedDataset {
                            field: "<primitive>",
                            reason: format!("expected {self:?}, got {other:?}"),
                        })
                    }
                }
            };
        }
        match self {
            U8 => expect!(Value::U8(v) => out.write_u8(*v)),
            I8 => expect!(Value::I8(v) => out.write_i8(*v)),
            U16 => expect!(Value::U16(v) => out.write_u16_le(*v)),
            I16 => expect!(Value::I16(v) => out.write_i16_le(*v)),
            U32 => expect!(Value::U32(v) => out.write_u32_le(*v)),
            I32 => expect!(Value::I32(v) => out.write_i32_le(*v)),
            U64 => expect!(Value::U64(v) => out.write_u64_le(*v)),
            I64 => expect!(Value::I64(v) => out.write_i64_le(*v)),
            U128 => expect!(Value::U128(v) => out.write_u128_le(*v)),
            I128 => expect!(Value::I128(v) => out.write_i128_le(*v)),
            String => expect!(Value::Str(v) => out.write_ptp_string(v)),
        }
        Ok(())
    }
}

/// PTP data type tags (§3), used to resolve a property's wire datatype
/// to a `PrimitiveKind` when building registry codecs.
pub mod datatype {
    pub const UINT8: u16 = 0x0001;
    pub const INT8: u16 = 0x0002;
    pub const UINT16: u16 = 0x0003;
    pub const INT16: u16 = 0x0004;
    pub const UINT32: u16 = 0x0005;
    pub const INT32: u16 = 0x0006;
    pub const UINT64: u16 = 0x0007;
    pub const INT64: u16 = 0x0008;
    pub const UINT128: u16 = 0x0009;
    pub const INT128: u16 = 0x000A;
    pub const STRING: u16 = 0xFFFF;
    /// Array variants: 0x40xx, bit 0x4000 set over the scalar tag.
    pub const ARRAY_BIT: u16 = 0x4000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_size_matches_wire_width() {
        assert_eq!(PrimitiveKind::U8.fixed_size(), Some(1));
        assert_eq!(PrimitiveKind::U64.fixed_size(), Some(8));
        assert_eq!(PrimitiveKind::U128.fixed_size(), Some(16));
        assert_eq!(PrimitiveKind::String.fixed_size(), None);
    }

    #[test]
    fn u16_round_trips() {
        let mut w = ByteWriter::new();
        PrimitiveKind::U16.encode(&Value::U16(400), &mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0x90, 0x01]);
        let mut c = ByteCursor::new(&bytes);
        let decoded = PrimitiveKind::U16.decode(&mut c, true).unwrap();
        assert_eq!(decoded, Value::U16(400));
    }

    #[test]
    fn type_mismatch_on_encode_is_an_error() {
        let mut w = ByteWriter::new();
        let err = PrimitiveKind::U16.encode(&Value::U8(1), &mut w);
        assert!(err.is_err());
    }
}
