//! Array codec (§4.A): `count: u32` followed by `count` instances of an
//! inner codec.

use std::sync::Arc;

use crate::cursor::{ByteCursor, ByteWriter};
use crate::error::{PtpError, ProtocolError};

use super::{CodecDefinition, Value};

#[derive(Debug, Clone)]
pub struct ArrayCodec {
    pub inner: Arc<CodecDefinition>,
}

impl ArrayCodec {
    pub fn encode(&self, value: &Value, out: &mut ByteWriter) -> Result<(), PtpError> {
        let items = value.as_array().ok_or_else(|| {
            PtpError::Protocol(ProtocolError::MalformedDataset {
                field: "<array>",
                reason: format!("expected Value::Array, got {value:?}"),
            })
        })?;
        out.write_u32_le(items.len() as u32);
        for item in items {
            out.write_bytes(&self.inner.encode(item)?);
        }
        Ok(())
    }

    pub fn decode(&self, cursor: &mut ByteCursor) -> Result<Value, PtpError> {
        let count = cursor.read_u32_le()?;

        // Fixed-width inners let us bound-check before decoding, per §4.A.
        if let CodecDefinition::Primitive(kind) = self.inner.as_ref() {
            if let Some(elem_size) = kind.fixed_size() {
                let needed = count as usize * elem_size;
                if cursor.remaining() < needed {
                    return Err(PtpError::Protocol(ProtocolError::MalformedArray {
                        count,
                        needed,
                        available: cursor.remaining(),
                    }));
                }
            }
        }

        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (item, consumed) = self.inner.decode(cursor.peek_remaining())?;
            items.push(item);
            cursor.advance(consumed)?;
        }
        Ok(Value::Array(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecDefinition;

    #[test]
    fn array_of_u16_round_trips() {
        let codec = CodecDefinition::array(CodecDefinition::primitive(super::super::PrimitiveKind::U16));
        let value = Value::Array(vec![Value::U16(1), Value::U16(2), Value::U16(3)]);
        let bytes = codec.encode(&value).unwrap();
        let (decoded, consumed) = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn empty_array_round_trips() {
        let codec = CodecDefinition::array(CodecDefinition::primitive(super::super::PrimitiveKind::U32));
        let value = Value::Array(vec![]);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let (decoded, _) = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn short_buffer_is_malformed_array() {
        let codec = CodecDefinition::array(CodecDefinition::primitive(super::super::PrimitiveKind::U32));
        // count = 10 but no element bytes follow
        let mut bytes = vec![];
        bytes.extend_from_slice(&10u32.to_le_bytes());
        let err = codec.decode(&bytes).unwrap_err();
        assert!(matches!(err, PtpError::Protocol(ProtocolError::MalformedArray { .. })));
    }
}
