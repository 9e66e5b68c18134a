//! Dataset codec (§4.B): an ordered list of named fields, each with its
//! own codec, decoding to a `Value::Dataset` map and encoding back in
//! declared field order.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cursor::{ByteCursor, ByteWriter};
use crate::error::{PtpError, ProtocolError};

use super::value::Value;
use super::CodecDefinition;

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub codec: Arc<CodecDefinition>,
    /// Optional fields are absent when zero bytes remain at their turn;
    /// they're skipped rather than failing the whole dataset decode.
    pub optional: bool,
}

impl FieldDefinition {
    pub fn required(name: &'static str, codec: Arc<CodecDefinition>) -> Self {
        Self { name, codec, optional: false }
    }

    pub fn optional(name: &'static str, codec: Arc<CodecDefinition>) -> Self {
        Self { name, codec, optional: true }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetCodec {
    pub name: &'static str,
    pub fields: Vec<FieldDefinition>,
}

impl DatasetCodec {
    pub fn encode(&self, value: &Value, out: &mut ByteWriter) -> Result<(), PtpError> {
        let map = value.as_dataset().ok_or_else(|| {
            PtpError::Protocol(ProtocolError::MalformedDataset {
                field: self.name,
                reason: format!("expected Value::Dataset, got {value:?}"),
            })
        })?;
        for field in &self.fields {
            match map.get(field.name) {
                Some(v) => out.write_bytes(&field.codec.encode(v)?),
                None if field.optional => {}
                None => {
                    return Err(PtpError::Protocol(ProtocolError::MalformedDataset {
                        field: field.name,
                        reason: "missing required field".into(),
                    }))
                }
            }
        }
        Ok(())
    }

    pub fn decode(&self, cursor: &mut ByteCursor) -> Result<Value, PtpError> {
        let mut map = BTreeMap::new();
        for field in &self.fields {
            if field.optional && cursor.is_empty() {
                continue;
            }
            let (value, consumed) = field.codec.decode(cursor.peek_remaining()).map_err(|e| {
                wrap_field_error(field.name, e)
            })?;
            cursor.advance(consumed)?;
            map.insert(field.name.to_string(), value);
        }
        Ok(Value::Dataset(map))
    }
}

fn wrap_field_error(field: &'static str, err: PtpError) -> PtpError {
    match err {
        PtpError::Protocol(ProtocolError::ShortRead { expected, actual }) => {
            PtpError::Protocol(ProtocolError::MalformedDataset {
                field,
                reason: format!("short read: expected {expected}, got {actual}"),
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PrimitiveKind;

    fn storage_info_codec() -> Arc<CodecDefinition> {
        CodecDefinition::dataset(
            "StorageInfo",
            vec![
                FieldDefinition::required("storage_type", CodecDefinition::primitive(PrimitiveKind::U16)),
                FieldDefinition::required("free_space_images", CodecDefinition::primitive(PrimitiveKind::U32)),
                FieldDefinition::optional("volume_label", CodecDefinition::primitive(PrimitiveKind::String)),
            ],
        )
    }

    #[test]
    fn dataset_round_trips_with_optional_field_present() {
        let codec = storage_info_codec();
        let mut map = BTreeMap::new();
        map.insert("storage_type".to_string(), Value::U16(3));
        map.insert("free_space_images".to_string(), Value::U32(500));
        map.insert("volume_label".to_string(), Value::Str("SD1".into()));
        let value = Value::Dataset(map);

        let bytes = codec.encode(&value).unwrap();
        let (decoded, consumed) = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn optional_field_absent_when_no_bytes_remain() {
        let codec = storage_info_codec();
        let mut w = ByteWriter::new();
        w.write_u16_le(3);
        w.write_u32_le(500);
        let bytes = w.into_bytes();

        let (decoded, consumed) = codec.decode(&bytes).unwrap();
        let map = decoded.as_dataset().unwrap();
        assert!(!map.contains_key("volume_label"));
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn missing_required_field_fails_to_encode() {
        let codec = storage_info_codec();
        let mut map = BTreeMap::new();
        map.insert("storage_type".to_string(), Value::U16(3));
        let value = Value::Dataset(map);
        let err = codec.encode(&value);
        assert!(err.is_err());
    }
}
