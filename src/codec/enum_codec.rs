//! Enum codec (§4.B): symbolic name <-> numeric value over a base
//! codec, with a declared table of `{ numeric, name, description }`.
//!
//! Encode looks up `name -> numeric` and fails with `UnknownEnumName`
//! when absent. Decode looks up `numeric -> name`; when an alias is
//! declared (two entries sharing one numeric value), the first declared
//! entry wins on decode, preserving display-name preference without
//! losing either name on encode. An unmatched numeric decodes to
//! `Value::Raw(n)` rather than failing, since vendor devices routinely
//! report values outside the shipped table.

use std::sync::Arc;

use crate::cursor::{ByteCursor, ByteWriter};
use crate::error::PtpError;

use super::value::Value;
use super::CodecDefinition;

#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub numeric: u64,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct EnumTable {
    entries: Vec<EnumEntry>,
}

impl EnumTable {
    pub fn new(entries: Vec<EnumEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[EnumEntry] {
        &self.entries
    }

    fn numeric_for(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.numeric)
    }

    /// First declared entry matching `numeric` wins (alias preservation).
    fn name_for(&self, numeric: u64) -> Option<&'static str> {
        self.entries.iter().find(|e| e.numeric == numeric).map(|e| e.name)
    }
}

#[derive(Debug, Clone)]
pub struct EnumCodec {
    pub name: &'static str,
    pub base: Arc<CodecDefinition>,
    pub table: EnumTable,
}

impl EnumCodec {
    pub fn encode(&self, value: &Value, out: &mut ByteWriter) -> Result<(), PtpError> {
        let name = value
            .as_str()
            .ok_or_else(|| super::unknown_enum_name(self.name, format!("{value:?}")))?;
        let numeric = self
            .table
            .numeric_for(name)
            .ok_or_else(|| super::unknown_enum_name(self.name, name.to_string()))?;
        let numeric_value = numeric_to_base_value(&self.base, numeric)?;
        self.base.encode(&numeric_value).map(|bytes| out.write_bytes(&bytes))?;
        Ok(())
    }

    pub fn decode(&self, cursor: &mut ByteCursor) -> Result<Value, PtpError> {
        let (base_value, consumed) = self.base.decode(cursor.peek_remaining())?;
        cursor.advance(consumed)?;
        let numeric = base_value.as_u64().ok_or_else(|| {
            PtpError::Protocol(crate::error::ProtocolError::MalformedDataset {
                field: "<enum base>",
                reason: format!("base codec decoded a non-numeric value {base_value:?}"),
            })
        })?;
        Ok(match self.table.name_for(numeric) {
            Some(name) => Value::Enum(name.to_string()),
            None => Value::Raw(numeric),
        })
    }
}

fn numeric_to_base_value(base: &CodecDefinition, numeric: u64) -> Result<Value, PtpError> {
    use super::PrimitiveKind;
    Ok(match base {
        CodecDefinition::Primitive(PrimitiveKind::U8) => Value::U8(numeric as u8),
        CodecDefinition::Primitive(PrimitiveKind::U16) => Value::U16(numeric as u16),
        CodecDefinition::Primitive(PrimitiveKind::U32) => Value::U32(numeric as u32),
        CodecDefinition::Primitive(PrimitiveKind::U64) => Value::U64(numeric),
        CodecDefinition::Primitive(PrimitiveKind::I8) => Value::I8(numeric as i8),
        CodecDefinition::Primitive(PrimitiveKind::I16) => Value::I16(numeric as i16),
        CodecDefinition::Primitive(PrimitiveKind::I32) => Value::I32(numeric as i32),
        CodecDefinition::Primitive(PrimitiveKind::I64) => Value::I64(numeric as i64),
        other => {
            return Err(PtpError::Protocol(crate::error::ProtocolError::MalformedDataset {
                field: "<enum base>",
                reason: format!("unsupported enum base codec {other:?}"),
            }))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PrimitiveKind;

    fn iso_table() -> EnumTable {
        EnumTable::new(vec![
            EnumEntry { numeric: 100, name: "ISO_100", description: "" },
            EnumEntry { numeric: 400, name: "ISO_400", description: "" },
        ])
    }

    #[test]
    fn known_name_round_trips() {
        let codec = CodecDefinition::enum_of(
            "ExposureIndex",
            CodecDefinition::primitive(PrimitiveKind::U16),
            iso_table(),
        );
        let bytes = codec.encode(&Value::Enum("ISO_400".into())).unwrap();
        assert_eq!(bytes, vec![0x90, 0x01]);
        let (decoded, _) = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, Value::Enum("ISO_400".into()));
    }

    #[test]
    fn unknown_name_fails_to_encode() {
        let codec = CodecDefinition::enum_of(
            "ExposureIndex",
            CodecDefinition::primitive(PrimitiveKind::U16),
            iso_table(),
        );
        let err = codec.encode(&Value::Enum("ISO_12800".into()));
        assert!(err.is_err());
    }

    #[test]
    fn unknown_numeric_decodes_to_raw() {
        let codec = CodecDefinition::enum_of(
            "ExposureIndex",
            CodecDefinition::primitive(PrimitiveKind::U16),
            iso_table(),
        );
        let bytes = 12800u16.to_le_bytes();
        let (decoded, _) = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, Value::Raw(12800));
    }

    #[test]
    fn alias_preservation_first_declared_wins() {
        let table = EnumTable::new(vec![
            EnumEntry { numeric: 1, name: "A", description: "" },
            EnumEntry { numeric: 1, name: "B", description: "" },
        ]);
        let codec =
            CodecDefinition::enum_of("Aliased", CodecDefinition::primitive(PrimitiveKind::U8), table);
        let encoded_a = codec.encode(&Value::Enum("A".into())).unwrap();
        let encoded_b = codec.encode(&Value::Enum("B".into())).unwrap();
        assert_eq!(encoded_a, encoded_b);
        let (decoded_a, _) = codec.decode(&encoded_a).unwrap();
        let (decoded_b, _) = codec.decode(&encoded_b).unwrap();
        assert_eq!(decoded_a, Value::Enum("A".into()));
        assert_eq!(decoded_b, Value::Enum("A".into()));
    }
}
