//! Definition registry (component D) and vendor override model
//! (component E, §4.D-E).

pub mod canon;
pub mod datasets;
pub mod definitions;
pub mod generic;
pub mod nikon;
pub mod sony;
pub mod vendor;

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::CodecDefinition;
use crate::error::ValidationError;

pub use definitions::{
    Access, DataDirection, EventDefinition, OperationDefinition, ParameterDefinition,
    PropertyDefinition, PropertyDescriptor, PropertyForm, ResponseDefinition,
};
pub use vendor::VendorRegistry;

/// Read-only lookup surface implemented by both a plain [`Registry`]
/// and a [`VendorRegistry`], so the engine and camera façade can work
/// against either without caring which.
pub trait RegistryView {
    fn operation(&self, name: &str) -> Option<Arc<OperationDefinition>>;
    fn operation_by_code(&self, code: u16) -> Option<Arc<OperationDefinition>>;
    fn property(&self, name: &str) -> Option<Arc<PropertyDefinition>>;
    fn property_by_code(&self, code: u16) -> Option<Arc<PropertyDefinition>>;
    fn event(&self, name: &str) -> Option<Arc<EventDefinition>>;
    fn event_by_code(&self, code: u16) -> Option<Arc<EventDefinition>>;
    fn response(&self, code: u16) -> Option<Arc<ResponseDefinition>>;
    fn response_by_name(&self, name: &str) -> Option<Arc<ResponseDefinition>>;
    fn codec(&self, name: &str) -> Option<Arc<CodecDefinition>>;
}

/// An immutable bundle of operation, property, event, response, and
/// codec definitions for one camera class (§4.D). Byte order is fixed
/// to little-endian for USB PTP; a registry has no other configuration
/// today, but the field exists so a PTP/IP variant has somewhere to
/// plug in.
#[derive(Debug, Clone)]
pub struct Registry {
    pub little_endian: bool,
    operations: HashMap<&'static str, Arc<OperationDefinition>>,
    operations_by_code: HashMap<u16, Arc<OperationDefinition>>,
    properties: HashMap<&'static str, Arc<PropertyDefinition>>,
    properties_by_code: HashMap<u16, Arc<PropertyDefinition>>,
    events: HashMap<&'static str, Arc<EventDefinition>>,
    events_by_code: HashMap<u16, Arc<EventDefinition>>,
    responses_by_code: HashMap<u16, Arc<ResponseDefinition>>,
    responses_by_name: HashMap<&'static str, Arc<ResponseDefinition>>,
    codecs: HashMap<&'static str, Arc<CodecDefinition>>,
}

impl RegistryView for Registry {
    fn operation(&self, name: &str) -> Option<Arc<OperationDefinition>> {
        self.operations.get(name).cloned()
    }
    fn operation_by_code(&self, code: u16) -> Option<Arc<OperationDefinition>> {
        self.operations_by_code.get(&code).cloned()
    }
    fn property(&self, name: &str) -> Option<Arc<PropertyDefinition>> {
        self.properties.get(name).cloned()
    }
    fn property_by_code(&self, code: u16) -> Option<Arc<PropertyDefinition>> {
        self.properties_by_code.get(&code).cloned()
    }
    fn event(&self, name: &str) -> Option<Arc<EventDefinition>> {
        self.events.get(name).cloned()
    }
    fn event_by_code(&self, code: u16) -> Option<Arc<EventDefinition>> {
        self.events_by_code.get(&code).cloned()
    }
    fn response(&self, code: u16) -> Option<Arc<ResponseDefinition>> {
        self.responses_by_code.get(&code).cloned()
    }
    fn response_by_name(&self, name: &str) -> Option<Arc<ResponseDefinition>> {
        self.responses_by_name.get(name).cloned()
    }
    fn codec(&self, name: &str) -> Option<Arc<CodecDefinition>> {
        self.codecs.get(name).cloned()
    }
}

/// Builds a [`Registry`], guaranteeing every codec a definition refers
/// to by symbolic handle was registered first.
#[derive(Default)]
pub struct RegistryBuilder {
    operations: HashMap<&'static str, Arc<OperationDefinition>>,
    operations_by_code: HashMap<u16, Arc<OperationDefinition>>,
    properties: HashMap<&'static str, Arc<PropertyDefinition>>,
    properties_by_code: HashMap<u16, Arc<PropertyDefinition>>,
    events: HashMap<&'static str, Arc<EventDefinition>>,
    events_by_code: HashMap<u16, Arc<EventDefinition>>,
    responses_by_code: HashMap<u16, Arc<ResponseDefinition>>,
    responses_by_name: HashMap<&'static str, Arc<ResponseDefinition>>,
    codecs: HashMap<&'static str, Arc<CodecDefinition>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codec(mut self, name: &'static str, codec: Arc<CodecDefinition>) -> Self {
        self.codecs.insert(name, codec);
        self
    }

    pub fn operation(mut self, op: OperationDefinition) -> Self {
        let op = Arc::new(op);
        self.operations_by_code.insert(op.code, op.clone());
        self.operations.insert(op.name, op);
        self
    }

    pub fn property(mut self, prop: PropertyDefinition) -> Self {
        let prop = Arc::new(prop);
        self.properties_by_code.insert(prop.code, prop.clone());
        self.properties.insert(prop.name, prop);
        self
    }

    pub fn event(mut self, event: EventDefinition) -> Self {
        let event = Arc::new(event);
        self.events_by_code.insert(event.code, event.clone());
        self.events.insert(event.name, event);
        self
    }

    pub fn response(mut self, response: ResponseDefinition) -> Self {
        let response = Arc::new(response);
        self.responses_by_code.insert(response.code, response.clone());
        self.responses_by_name.insert(response.name, response);
        self
    }

    pub fn build(self) -> Result<Registry, ValidationError> {
        Ok(Registry {
            little_endian: true,
            operations: self.operations,
            operations_by_code: self.operations_by_code,
            properties: self.properties,
            properties_by_code: self.properties_by_code,
            events: self.events,
            events_by_code: self.events_by_code,
            responses_by_code: self.responses_by_code,
            responses_by_name: self.responses_by_name,
            codecs: self.codecs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PrimitiveKind;

    #[test]
    fn lookup_by_name_and_code_agree() {
        let registry = RegistryBuilder::new()
            .response(ResponseDefinition { code: 0x2001, name: "OK", description: "", recoverable: false })
            .build()
            .unwrap();
        assert_eq!(registry.response(0x2001).unwrap().name, "OK");
        assert_eq!(registry.response_by_name("OK").unwrap().code, 0x2001);
    }

    #[test]
    fn too_many_operation_parameters_is_rejected_at_construction() {
        let params: Vec<_> = (0..6)
            .map(|i| {
                ParameterDefinition::required(
                    Box::leak(format!("p{i}").into_boxed_str()),
                    CodecDefinition::primitive(PrimitiveKind::U32),
                )
            })
            .collect();
        let err = OperationDefinition::new(
            0x9999,
            "TooManyParams",
            "",
            DataDirection::None,
            params,
            vec![],
            None,
        );
        assert!(err.is_err());
    }
}
