//! Sony vendor registry (§4.E worked example): the SDIO connect-phase
//! operations Sony cameras require before any other command is
//! accepted, plus a couple of Sony-specific properties layered over the
//! generic set.

use std::sync::Arc;

use crate::codec::{CodecDefinition, PrimitiveKind};

use super::definitions::{Access, DataDirection, OperationDefinition, ParameterDefinition, PropertyDefinition};
use super::{Registry, RegistryBuilder, VendorRegistry};

pub mod operation_code {
    /// SDIOConnect: three-phase handshake Sony cameras require right
    /// after `OpenSession` (phase parameter: 1, 2, then 3).
    pub const SDIO_CONNECT: u16 = 0x9201;
    pub const SDIO_GET_EXT_DEVICE_INFO: u16 = 0x9202;
}

pub mod property_code {
    pub const SHUTTER_SPEED: u16 = 0xD20D;
    pub const STILL_IMAGE_STORE_DESTINATION: u16 = 0xD215;
}

fn u32p(name: &'static str) -> ParameterDefinition {
    ParameterDefinition::required(name, CodecDefinition::primitive(PrimitiveKind::U32))
}

pub fn build(generic: Arc<Registry>) -> Result<VendorRegistry, crate::error::ValidationError> {
    let overrides = RegistryBuilder::new()
        .operation(OperationDefinition::new(
            operation_code::SDIO_CONNECT,
            "SDIOConnect",
            "Sony SDIO connect-phase handshake (phase 1/2/3)",
            DataDirection::None,
            vec![u32p("phase_type"), u32p("keycode1"), u32p("keycode2")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::SDIO_GET_EXT_DEVICE_INFO,
            "SDIOGetExtDeviceInfo",
            "Retrieves Sony's extended property/operation support lists",
            DataDirection::Out,
            vec![u32p("version")],
            vec![],
            Some(CodecDefinition::array(CodecDefinition::primitive(PrimitiveKind::U16))),
        )?)
        .property(PropertyDefinition {
            code: property_code::SHUTTER_SPEED,
            name: "ShutterSpeed",
            description: "Shutter speed, packed as numerator<<16 | denominator",
            datatype: 0x0006,
            codec: CodecDefinition::primitive(PrimitiveKind::U32),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::STILL_IMAGE_STORE_DESTINATION,
            name: "StillImageStoreDestination",
            description: "Host / card / both",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .build()?;

    Ok(VendorRegistry::new(generic, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryView;

    #[test]
    fn sdio_connect_shadows_nothing_but_extends_generic() {
        let generic = Arc::new(crate::registry::generic::build().unwrap());
        let vendor = build(generic).unwrap();
        assert!(vendor.operation("SDIOConnect").is_some());
        assert!(vendor.operation("OpenSession").is_some());
        assert!(vendor.property("ShutterSpeed").is_some());
    }
}
