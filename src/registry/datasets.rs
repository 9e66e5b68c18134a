//! Dataset codec builders for the standard PTP datasets referenced by
//! the generic operation set (§6): `DeviceInfo`, `StorageInfo`, and
//! `ObjectInfo`. Field order and optionality follow ISO 15740's wire
//! layout for each.

use std::sync::Arc;

use crate::codec::{CodecDefinition, FieldDefinition, PrimitiveKind};

/// `DeviceInfo` (returned by `GetDeviceInfo`): standard-version, vendor
/// extension identity, and the four capability arrays plus free-form
/// identity strings. The four `uint16` arrays are closed over rather
/// than decoded as vendor-specific datasets themselves, since a code
/// array's element codec is always `uint16` regardless of vendor.
pub fn device_info_codec() -> Arc<CodecDefinition> {
    let uint16_array = CodecDefinition::array(CodecDefinition::primitive(PrimitiveKind::U16));
    CodecDefinition::dataset(
        "DeviceInfo",
        vec![
            FieldDefinition::required("standard_version", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("vendor_extension_id", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("vendor_extension_version", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("vendor_extension_desc", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("functional_mode", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("operations_supported", uint16_array.clone()),
            FieldDefinition::required("events_supported", uint16_array.clone()),
            FieldDefinition::required("device_properties_supported", uint16_array.clone()),
            FieldDefinition::required("capture_formats", uint16_array.clone()),
            FieldDefinition::required("image_formats", uint16_array),
            FieldDefinition::required("manufacturer", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("model", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("device_version", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("serial_number", CodecDefinition::primitive(PrimitiveKind::String)),
        ],
    )
}

/// `StorageInfo` (returned by `GetStorageInfo`). `free_space_in_images`
/// is `0xFFFFFFFF` when the device can't report a count; that's a
/// plain sentinel value in the `u32`, not a codec-level concern.
pub fn storage_info_codec() -> Arc<CodecDefinition> {
    CodecDefinition::dataset(
        "StorageInfo",
        vec![
            FieldDefinition::required("storage_type", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("filesystem_type", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("access_capability", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("max_capacity", CodecDefinition::primitive(PrimitiveKind::U64)),
            FieldDefinition::required("free_space_in_bytes", CodecDefinition::primitive(PrimitiveKind::U64)),
            FieldDefinition::required("free_space_in_images", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("storage_description", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("volume_label", CodecDefinition::primitive(PrimitiveKind::String)),
        ],
    )
}

/// `ObjectInfo` (returned by `GetObjectInfo`). The four capture-time
/// fields are modeled as required strings; devices that don't report
/// them send an empty PTP string (a single `0x00` byte), which the
/// string codec decodes to `""` rather than treating as absent.
pub fn object_info_codec() -> Arc<CodecDefinition> {
    CodecDefinition::dataset(
        "ObjectInfo",
        vec![
            FieldDefinition::required("storage_id", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("object_format", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("protection_status", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("object_compressed_size", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("thumb_format", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("thumb_compressed_size", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("thumb_pix_width", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("thumb_pix_height", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("image_pix_width", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("image_pix_height", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("image_bit_depth", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("parent_object", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("association_type", CodecDefinition::primitive(PrimitiveKind::U16)),
            FieldDefinition::required("association_desc", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("sequence_number", CodecDefinition::primitive(PrimitiveKind::U32)),
            FieldDefinition::required("filename", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("capture_date", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::required("modification_date", CodecDefinition::primitive(PrimitiveKind::String)),
            FieldDefinition::optional("keywords", CodecDefinition::primitive(PrimitiveKind::String)),
        ],
    )
}
