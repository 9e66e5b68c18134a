//! Definition entities (§3): operations, properties, events, responses,
//! and their shared parameter shape. These are immutable once built
//! (constructed once per registry, per the lifecycle in §3).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::{CodecDefinition, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    /// No DATA container is transmitted.
    None,
    /// Host -> device data phase; caller supplies the bytes.
    In,
    /// Device -> host data phase; the engine reads and optionally
    /// decodes the DATA container.
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Get,
    Set,
    GetSet,
}

/// A named, codec-typed parameter belonging to an operation or event.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub codec: Arc<CodecDefinition>,
    pub required: bool,
    pub default_value: Option<Value>,
}

impl ParameterDefinition {
    pub fn required(name: &'static str, codec: Arc<CodecDefinition>) -> Self {
        Self { name, codec, required: true, default_value: None }
    }

    pub fn optional(name: &'static str, codec: Arc<CodecDefinition>, default_value: Value) -> Self {
        Self { name, codec, required: false, default_value: Some(default_value) }
    }
}

pub const MAX_OPERATION_PARAMETERS: usize = 5;

#[derive(Debug, Clone)]
pub struct OperationDefinition {
    pub code: u16,
    pub name: &'static str,
    pub description: &'static str,
    pub data_direction: DataDirection,
    /// Serialized into the COMMAND container (PTP hard limit: 5).
    pub operation_parameters: Vec<ParameterDefinition>,
    /// Read back from the RESPONSE container.
    pub response_parameters: Vec<ParameterDefinition>,
    pub data_codec: Option<Arc<CodecDefinition>>,
}

impl OperationDefinition {
    /// Builder-style constructor validating the PTP parameter-count
    /// limit at construction time rather than at every call site.
    pub fn new(
        code: u16,
        name: &'static str,
        description: &'static str,
        data_direction: DataDirection,
        operation_parameters: Vec<ParameterDefinition>,
        response_parameters: Vec<ParameterDefinition>,
        data_codec: Option<Arc<CodecDefinition>>,
    ) -> Result<Self, crate::error::ValidationError> {
        if operation_parameters.len() > MAX_OPERATION_PARAMETERS {
            return Err(crate::error::ValidationError::TooManyParameters {
                op: name,
                count: operation_parameters.len(),
            });
        }
        if response_parameters.len() > MAX_OPERATION_PARAMETERS {
            return Err(crate::error::ValidationError::TooManyParameters {
                op: name,
                count: response_parameters.len(),
            });
        }
        Ok(Self {
            code,
            name,
            description,
            data_direction,
            operation_parameters,
            response_parameters,
            data_codec,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    pub code: u16,
    pub name: &'static str,
    pub description: &'static str,
    pub datatype: u16,
    pub codec: Arc<CodecDefinition>,
    pub access: Access,
}

/// Runtime descriptor returned by `GetDevicePropDesc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub current: Value,
    pub default: Value,
    pub form: PropertyForm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyForm {
    None,
    Range { min: Value, max: Value, step: Value },
    Enum { allowed_values: Vec<Value> },
}

#[derive(Debug, Clone)]
pub struct EventDefinition {
    pub code: u16,
    pub name: &'static str,
    pub parameters: Vec<ParameterDefinition>,
}

#[derive(Debug, Clone)]
pub struct ResponseDefinition {
    pub code: u16,
    pub name: &'static str,
    pub description: &'static str,
    pub recoverable: bool,
}
