//! Runtime value representation produced/consumed by `CodecDefinition`.
//!
//! Strategy (b) from the design notes: rather than generating a distinct
//! Rust type per dataset/operation via codegen, every codec operates on
//! this one tagged `Value`. Callers that want compile-time shape
//! checking can still build typed wrappers on top (see `registry::datasets`
//! for `DeviceInfo`/`StorageInfo`/`ObjectInfo`), but the codec layer
//! itself stays purely data-driven.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(u128),
    I128(i128),
    Str(String),
    Array(Vec<Value>),
    /// A successfully matched enum entry, keyed by symbolic name.
    Enum(String),
    /// An enum-coded numeric value with no matching table entry.
    Raw(u64),
    /// Decoded in declared field order; `BTreeMap` keeps iteration
    /// deterministic for logging/tests even though field order in the
    /// wire encoding comes from the dataset definition, not the map.
    Dataset(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U8(v) => Some(*v as u32),
            Value::U16(v) => Some(*v as u32),
            Value::U32(v) => Some(*v),
            Value::Raw(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(v) => Some(*v as u64),
            Value::U16(v) => Some(*v as u64),
            Value::U32(v) => Some(*v as u64),
            Value::U64(v) => Some(*v),
            Value::Raw(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dataset(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U128(v) => write!(f, "{v}"),
            Value::I128(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Enum(name) => write!(f, "{name}"),
            Value::Raw(n) => write!(f, "Raw({n})"),
            Value::Dataset(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decoded values round-trip through JSON, the way a hosting
    /// application logs or persists a `DeviceInfo`/`PtpEvent` snapshot.
    #[test]
    fn dataset_value_round_trips_through_json() {
        let mut fields = BTreeMap::new();
        fields.insert("manufacturer".to_string(), Value::Str("Acme".into()));
        fields.insert("battery_level".to_string(), Value::U8(80));
        let value = Value::Dataset(fields);

        let json = serde_json::to_string(&value).unwrap();
        let round_tripped: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, value);
    }

    #[test]
    fn raw_and_enum_values_round_trip_through_json() {
        for value in [Value::Raw(12800), Value::Enum("ISO_400".into())] {
            let json = serde_json::to_string(&value).unwrap();
            let round_tripped: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(round_tripped, value);
        }
    }
}
