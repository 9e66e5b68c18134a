//! The generic (vendor-neutral) registry: the standard operation,
//! response, event, and property sets named in spec §6, plus the
//! dataset codecs in [`super::datasets`]. Vendor registries are built
//! by layering overrides on top of [`build()`]'s output (§4.E).

use std::sync::Arc;

use crate::codec::{CodecDefinition, PrimitiveKind};

use super::datasets::{device_info_codec, object_info_codec, storage_info_codec};
use super::definitions::{
    Access, DataDirection, EventDefinition, OperationDefinition, ParameterDefinition,
    PropertyDefinition, ResponseDefinition,
};
use super::{Registry, RegistryBuilder};

/// Standard PTP operation codes (§6, minimum set, plus a few more the
/// transaction engine and façade exercise directly).
pub mod operation_code {
    pub const GET_DEVICE_INFO: u16 = 0x1001;
    pub const OPEN_SESSION: u16 = 0x1002;
    pub const CLOSE_SESSION: u16 = 0x1003;
    pub const GET_STORAGE_IDS: u16 = 0x1004;
    pub const GET_STORAGE_INFO: u16 = 0x1005;
    pub const GET_NUM_OBJECTS: u16 = 0x1006;
    pub const GET_OBJECT_HANDLES: u16 = 0x1007;
    pub const GET_OBJECT_INFO: u16 = 0x1008;
    pub const GET_OBJECT: u16 = 0x1009;
    pub const GET_THUMB: u16 = 0x100A;
    pub const DELETE_OBJECT: u16 = 0x100B;
    pub const INITIATE_CAPTURE: u16 = 0x100E;
    pub const GET_DEVICE_PROP_DESC: u16 = 0x1014;
    pub const GET_DEVICE_PROP_VALUE: u16 = 0x1015;
    pub const SET_DEVICE_PROP_VALUE: u16 = 0x1016;
    pub const GET_PARTIAL_OBJECT: u16 = 0x101B;
}

/// Standard PTP response codes (§6, minimum set).
pub mod response_code {
    pub const OK: u16 = 0x2001;
    pub const GENERAL_ERROR: u16 = 0x2002;
    pub const SESSION_NOT_OPEN: u16 = 0x2003;
    pub const INVALID_TRANSACTION_ID: u16 = 0x2004;
    pub const OPERATION_NOT_SUPPORTED: u16 = 0x2005;
    pub const PARAMETER_NOT_SUPPORTED: u16 = 0x2006;
    pub const INCOMPLETE_TRANSFER: u16 = 0x2007;
    pub const INVALID_STORAGE_ID: u16 = 0x2008;
    pub const INVALID_OBJECT_HANDLE: u16 = 0x2009;
    pub const DEVICE_PROP_NOT_SUPPORTED: u16 = 0x200A;
    pub const STORE_FULL: u16 = 0x200C;
    pub const DEVICE_BUSY: u16 = 0x2019;
}

/// Standard PTP event codes.
pub mod event_code {
    pub const CANCEL_TRANSACTION: u16 = 0x4001;
    pub const OBJECT_ADDED: u16 = 0x4002;
    pub const OBJECT_REMOVED: u16 = 0x4003;
    pub const STORE_ADDED: u16 = 0x4004;
    pub const STORE_REMOVED: u16 = 0x4005;
    pub const DEVICE_PROP_CHANGED: u16 = 0x4006;
    pub const OBJECT_INFO_CHANGED: u16 = 0x4007;
    pub const DEVICE_INFO_CHANGED: u16 = 0x4008;
    pub const REQUEST_OBJECT_TRANSFER: u16 = 0x4009;
    pub const STORE_FULL: u16 = 0x400A;
    pub const CAPTURE_COMPLETE: u16 = 0x400D;
}

/// Standard PTP device property codes (a representative subset).
pub mod property_code {
    pub const BATTERY_LEVEL: u16 = 0x5001;
    pub const FUNCTIONAL_MODE: u16 = 0x5002;
    pub const IMAGE_SIZE: u16 = 0x5003;
    pub const WHITE_BALANCE: u16 = 0x5005;
    pub const F_NUMBER: u16 = 0x5007;
    pub const FOCUS_MODE: u16 = 0x500A;
    pub const FLASH_MODE: u16 = 0x500C;
    pub const EXPOSURE_PROGRAM_MODE: u16 = 0x500E;
    pub const EXPOSURE_INDEX: u16 = 0x500F;
    pub const STILL_CAPTURE_MODE: u16 = 0x5013;
}

fn u32p(name: &'static str) -> ParameterDefinition {
    ParameterDefinition::required(name, CodecDefinition::primitive(PrimitiveKind::U32))
}

/// Builds the generic registry. Infallible in practice (the tables
/// below never exceed 5 parameters), but returns `Result` since
/// `OperationDefinition::new` validates that invariant rather than
/// assuming it.
pub fn build() -> Result<Registry, crate::error::ValidationError> {
    let mut builder = RegistryBuilder::new()
        .codec("uint8", CodecDefinition::primitive(PrimitiveKind::U8))
        .codec("uint16", CodecDefinition::primitive(PrimitiveKind::U16))
        .codec("uint32", CodecDefinition::primitive(PrimitiveKind::U32))
        .codec("uint64", CodecDefinition::primitive(PrimitiveKind::U64))
        .codec("string", CodecDefinition::primitive(PrimitiveKind::String))
        .codec("device_info", device_info_codec())
        .codec("storage_info", storage_info_codec())
        .codec("object_info", object_info_codec());

    builder = builder
        .operation(OperationDefinition::new(
            operation_code::GET_DEVICE_INFO,
            "GetDeviceInfo",
            "Retrieves the device's DeviceInfo dataset",
            DataDirection::Out,
            vec![],
            vec![],
            Some(device_info_codec()),
        )?)
        .operation(OperationDefinition::new(
            operation_code::OPEN_SESSION,
            "OpenSession",
            "Opens a session; transaction ID 0 is reserved for this call",
            DataDirection::None,
            vec![u32p("session_id")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::CLOSE_SESSION,
            "CloseSession",
            "Closes the currently open session",
            DataDirection::None,
            vec![],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_STORAGE_IDS,
            "GetStorageIDs",
            "Retrieves the list of storage IDs",
            DataDirection::Out,
            vec![],
            vec![],
            Some(CodecDefinition::array(CodecDefinition::primitive(PrimitiveKind::U32))),
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_STORAGE_INFO,
            "GetStorageInfo",
            "Retrieves the StorageInfo dataset for a storage ID",
            DataDirection::Out,
            vec![u32p("storage_id")],
            vec![],
            Some(storage_info_codec()),
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_NUM_OBJECTS,
            "GetNumObjects",
            "Retrieves the number of objects matching a filter",
            DataDirection::None,
            vec![u32p("storage_id")],
            vec![u32p("num_objects")],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_OBJECT_HANDLES,
            "GetObjectHandles",
            "Retrieves object handles matching a filter",
            DataDirection::Out,
            vec![u32p("storage_id"), u32p("object_format_code"), u32p("association_handle")],
            vec![],
            Some(CodecDefinition::array(CodecDefinition::primitive(PrimitiveKind::U32))),
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_OBJECT_INFO,
            "GetObjectInfo",
            "Retrieves the ObjectInfo dataset for an object handle",
            DataDirection::Out,
            vec![u32p("object_handle")],
            vec![],
            Some(object_info_codec()),
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_OBJECT,
            "GetObject",
            "Retrieves the full binary object for an object handle",
            DataDirection::Out,
            vec![u32p("object_handle")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_THUMB,
            "GetThumb",
            "Retrieves the thumbnail for an object handle",
            DataDirection::Out,
            vec![u32p("object_handle")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::DELETE_OBJECT,
            "DeleteObject",
            "Deletes an object",
            DataDirection::None,
            vec![u32p("object_handle"), u32p("object_format_code")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::INITIATE_CAPTURE,
            "InitiateCapture",
            "Triggers a still capture",
            DataDirection::None,
            vec![u32p("storage_id"), u32p("object_format_code")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_DEVICE_PROP_DESC,
            "GetDevicePropDesc",
            "Retrieves a property descriptor (current/default/form)",
            DataDirection::Out,
            vec![u32p("property_code")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_DEVICE_PROP_VALUE,
            "GetDevicePropValue",
            "Retrieves a property's current value",
            DataDirection::Out,
            vec![u32p("property_code")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::SET_DEVICE_PROP_VALUE,
            "SetDevicePropValue",
            "Sets a property's value",
            DataDirection::In,
            vec![u32p("property_code")],
            vec![],
            None,
        )?)
        .operation(OperationDefinition::new(
            operation_code::GET_PARTIAL_OBJECT,
            "GetPartialObject",
            "Retrieves a byte range of an object",
            DataDirection::Out,
            vec![u32p("object_handle"), u32p("offset"), u32p("max_bytes")],
            vec![u32p("bytes_returned")],
            None,
        )?);

    builder = builder
        .response(ResponseDefinition { code: response_code::OK, name: "OK", description: "Operation succeeded", recoverable: false })
        .response(ResponseDefinition { code: response_code::GENERAL_ERROR, name: "GeneralError", description: "Unspecified device error", recoverable: false })
        .response(ResponseDefinition { code: response_code::SESSION_NOT_OPEN, name: "SessionNotOpen", description: "No session is open", recoverable: false })
        .response(ResponseDefinition { code: response_code::INVALID_TRANSACTION_ID, name: "InvalidTransactionID", description: "Transaction ID out of sequence", recoverable: false })
        .response(ResponseDefinition { code: response_code::OPERATION_NOT_SUPPORTED, name: "OperationNotSupported", description: "Device does not implement this operation", recoverable: false })
        .response(ResponseDefinition { code: response_code::PARAMETER_NOT_SUPPORTED, name: "ParameterNotSupported", description: "One or more parameters are invalid", recoverable: false })
        .response(ResponseDefinition { code: response_code::INCOMPLETE_TRANSFER, name: "IncompleteTransfer", description: "Data phase ended early", recoverable: true })
        .response(ResponseDefinition { code: response_code::INVALID_STORAGE_ID, name: "InvalidStorageID", description: "Storage ID does not exist", recoverable: false })
        .response(ResponseDefinition { code: response_code::INVALID_OBJECT_HANDLE, name: "InvalidObjectHandle", description: "Object handle does not exist", recoverable: false })
        .response(ResponseDefinition { code: response_code::DEVICE_PROP_NOT_SUPPORTED, name: "DevicePropNotSupported", description: "Property is not supported", recoverable: false })
        .response(ResponseDefinition { code: response_code::STORE_FULL, name: "StoreFull", description: "Storage is full", recoverable: false })
        .response(ResponseDefinition { code: response_code::DEVICE_BUSY, name: "DeviceBusy", description: "Device is busy; retry later", recoverable: true });

    builder = builder
        .event(EventDefinition { code: event_code::CANCEL_TRANSACTION, name: "CancelTransaction", parameters: vec![] })
        .event(EventDefinition { code: event_code::OBJECT_ADDED, name: "ObjectAdded", parameters: vec![u32p("object_handle")] })
        .event(EventDefinition { code: event_code::OBJECT_REMOVED, name: "ObjectRemoved", parameters: vec![u32p("object_handle")] })
        .event(EventDefinition { code: event_code::STORE_ADDED, name: "StoreAdded", parameters: vec![u32p("storage_id")] })
        .event(EventDefinition { code: event_code::STORE_REMOVED, name: "StoreRemoved", parameters: vec![u32p("storage_id")] })
        .event(EventDefinition { code: event_code::DEVICE_PROP_CHANGED, name: "DevicePropChanged", parameters: vec![u32p("property_code")] })
        .event(EventDefinition { code: event_code::OBJECT_INFO_CHANGED, name: "ObjectInfoChanged", parameters: vec![u32p("object_handle")] })
        .event(EventDefinition { code: event_code::DEVICE_INFO_CHANGED, name: "DeviceInfoChanged", parameters: vec![] })
        .event(EventDefinition { code: event_code::REQUEST_OBJECT_TRANSFER, name: "RequestObjectTransfer", parameters: vec![u32p("object_handle")] })
        .event(EventDefinition { code: event_code::STORE_FULL, name: "StoreFull", parameters: vec![u32p("storage_id")] })
        .event(EventDefinition { code: event_code::CAPTURE_COMPLETE, name: "CaptureComplete", parameters: vec![u32p("transaction_id")] });

    builder = builder
        .property(PropertyDefinition {
            code: property_code::BATTERY_LEVEL,
            name: "BatteryLevel",
            description: "Battery level (0-100 or vendor scale)",
            datatype: 0x0002,
            codec: CodecDefinition::primitive(PrimitiveKind::U8),
            access: Access::Get,
        })
        .property(PropertyDefinition {
            code: property_code::FUNCTIONAL_MODE,
            name: "FunctionalMode",
            description: "Device functional mode",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::IMAGE_SIZE,
            name: "ImageSize",
            description: "Capture resolution as a WxH string",
            datatype: 0xFFFF,
            codec: CodecDefinition::primitive(PrimitiveKind::String),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::WHITE_BALANCE,
            name: "WhiteBalance",
            description: "White balance mode",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::F_NUMBER,
            name: "FNumber",
            description: "Aperture, in units of f/100",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::FOCUS_MODE,
            name: "FocusMode",
            description: "Autofocus mode",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::FLASH_MODE,
            name: "FlashMode",
            description: "Flash mode",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::EXPOSURE_PROGRAM_MODE,
            name: "ExposureProgramMode",
            description: "Exposure program (manual/aperture/shutter/auto)",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::EXPOSURE_INDEX,
            name: "ExposureIndex",
            description: "ISO sensitivity",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        })
        .property(PropertyDefinition {
            code: property_code::STILL_CAPTURE_MODE,
            name: "StillCaptureMode",
            description: "Single/burst/timelapse capture mode",
            datatype: 0x0004,
            codec: CodecDefinition::primitive(PrimitiveKind::U16),
            access: Access::GetSet,
        });

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryView;

    #[test]
    fn generic_registry_builds_and_resolves_minimum_set() {
        let registry = build().unwrap();
        assert!(registry.operation("OpenSession").is_some());
        assert_eq!(registry.operation_by_code(0x1002).unwrap().name, "OpenSession");
        assert!(registry.response(0x2001).is_some());
        assert!(registry.event("ObjectAdded").is_some());
        assert!(registry.property("ExposureIndex").is_some());
    }

    #[test]
    fn get_partial_object_declares_offset_parameter() {
        let registry = build().unwrap();
        let op = registry.operation("GetPartialObject").unwrap();
        assert!(op.operation_parameters.iter().any(|p| p.name == "offset"));
        // The bound on that parameter (offsets at and above 2^32 - 1 are
        // rejected) is enforced by `camera::validate_get_partial_object_offset`
        // and exercised in `camera::mod::tests`, since this registry layer
        // only declares shape, not the façade's validation behavior.
    }
}
