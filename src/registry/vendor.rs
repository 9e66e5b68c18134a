//! Vendor override model (component E, §4.E): a vendor registry IS-A
//! generic registry, with vendor entries shadowing generic ones by both
//! symbolic name and numeric code.

use std::sync::Arc;

use crate::codec::CodecDefinition;

use super::{
    EventDefinition, OperationDefinition, PropertyDefinition, Registry, RegistryBuilder,
    RegistryView, ResponseDefinition,
};

/// `vendor_entries ∪ generic`, vendor wins on collision. The generic
/// registry has no knowledge of any vendor; only `VendorRegistry`
/// depends downward on it.
pub struct VendorRegistry {
    generic: Arc<Registry>,
    overrides: Registry,
}

impl VendorRegistry {
    pub fn new(generic: Arc<Registry>, overrides: Registry) -> Self {
        Self { generic, overrides }
    }

    pub fn generic(&self) -> &Registry {
        &self.generic
    }
}

impl RegistryView for VendorRegistry {
    fn operation(&self, name: &str) -> Option<Arc<OperationDefinition>> {
        self.overrides.operation(name).or_else(|| self.generic.operation(name))
    }
    fn operation_by_code(&self, code: u16) -> Option<Arc<OperationDefinition>> {
        self.overrides.operation_by_code(code).or_else(|| self.generic.operation_by_code(code))
    }
    fn property(&self, name: &str) -> Option<Arc<PropertyDefinition>> {
        self.overrides.property(name).or_else(|| self.generic.property(name))
    }
    fn property_by_code(&self, code: u16) -> Option<Arc<PropertyDefinition>> {
        self.overrides.property_by_code(code).or_else(|| self.generic.property_by_code(code))
    }
    fn event(&self, name: &str) -> Option<Arc<EventDefinition>> {
        self.overrides.event(name).or_else(|| self.generic.event(name))
    }
    fn event_by_code(&self, code: u16) -> Option<Arc<EventDefinition>> {
        self.overrides.event_by_code(code).or_else(|| self.generic.event_by_code(code))
    }
    fn response(&self, code: u16) -> Option<Arc<ResponseDefinition>> {
        self.overrides.response(code).or_else(|| self.generic.response(code))
    }
    fn response_by_name(&self, name: &str) -> Option<Arc<ResponseDefinition>> {
        self.overrides.response_by_name(name).or_else(|| self.generic.response_by_name(name))
    }
    fn codec(&self, name: &str) -> Option<Arc<CodecDefinition>> {
        self.overrides.codec(name).or_else(|| self.generic.codec(name))
    }
}

/// Helper for building the `overrides` half of a `VendorRegistry` with
/// the same builder ergonomics as a plain registry.
pub fn vendor_overrides(builder: RegistryBuilder) -> Result<Registry, crate::error::ValidationError> {
    builder.build()
}
