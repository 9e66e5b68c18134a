//! Nikon vendor registry (§4.E): a representative slice of Nikon's
//! `0x9xxx` operations and `0xDxxx` properties layered over the generic
//! set. Nikon cameras deliver events over the standard interrupt
//! endpoint, so unlike Canon this vendor needs no event-pump override.

use std::sync::Arc;

use crate::codec::{CodecDefinition, PrimitiveKind};

use super::definitions::{Access, DataDirection, OperationDefinition, ParameterDefinition, PropertyDefinition};
use super::{Registry, RegistryBuilder, VendorRegistry};

pub mod operation_code {
    pub const GET_VENDOR_PROP_CODES: u16 = 0x9203;
    pub const AF_DRIVE: u16 = 0x90C1;
}

pub mod property_code {
    pub const SHOOTING_BANK: u16 = 0xD010;
    pub const WHITE_BALANCE_FINE_TUNE: u16 = 0xD035;
    pub const EXPOSURE_REMAINING: u16 = 0xD1E2;
}

fn u32p(name: &'static str) -> ParameterDefinition {
    ParameterDefinition::required(name, CodecDefinition::primitive(PrimitiveKind::U32))
}

pub fn build(generic: Arc<Registry>) -> Result<VendorRegistry, crate::error::ValidationError> {
    let overrides = RegistryBuilder::new()
        .operation(OperationDefinition::new(
            operation_code::GET_VENDOR_PROP_CODES,
            "GetVendorPropCodes",
            "Retrieves the list of Nikon-specific device property codes",
            DataDirection::Out,
            vec![],
            vec![],
            Some(CodecDefinition::array(CodecDefinition::primitive(PrimitiveKind::U16))),
        )?)
        .operation(OperationDefinition::new(
            operation_code::AF_DRIVE,
            "AfDrive",
            "Triggers an autofocus drive cycle",
            DataDirection::None,
            vec![],
            vec![],
            None,
        )?)
        .property(PropertyDefinition {
            code: property_code::SHOOTING_BANK,
            name: "ShootingBank",
            description: "Active shooting bank (A/B/C/D)",
            datatype: 0x0002,
            codec: CodecDefinition::primitive(PrimitiveKind::U8),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::WHITE_BALANCE_FINE_TUNE,
            name: "WhiteBalanceFineTune",
            description: "Amber-blue fine tune offset",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::I16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::EXPOSURE_REMAINING,
            name: "ExposuresRemaining",
            description: "Estimated remaining exposures on current media",
            datatype: 0x0006,
            codec: CodecDefinition::primitive(PrimitiveKind::U32),
            access: Access::Get,
        })
        .build()?;

    Ok(VendorRegistry::new(generic, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryView;

    #[test]
    fn nikon_overrides_extend_generic_without_shadowing() {
        let generic = Arc::new(crate::registry::generic::build().unwrap());
        let vendor = build(generic).unwrap();
        assert!(vendor.operation("AfDrive").is_some());
        assert!(vendor.property("ShootingBank").is_some());
        assert!(vendor.operation("GetDeviceInfo").is_some());
    }
}
