//! Nikon façade (§4.E): event delivery and property access use the
//! generic path unmodified — Nikon bodies deliver events over the
//! standard interrupt endpoint and expose vendor properties through the
//! ordinary `GetDevicePropValue`/`SetDevicePropValue` pair. The only
//! override is discovering which Nikon-specific property codes the
//! connected body actually supports right after `OpenSession`.

use std::sync::{Arc, Mutex};

use crate::cursor::ByteCursor;
use crate::engine::EngineConfig;
use crate::error::Result;
use crate::registry::nikon;
use crate::registry::RegistryView;
use crate::transport::Transport;

use super::{Camera, Vendor};

pub struct NikonVendor {
    supported_props: Mutex<Vec<u16>>,
}

impl NikonVendor {
    pub fn new() -> Self {
        Self { supported_props: Mutex::new(Vec::new()) }
    }

    /// Property codes reported by the last `GetVendorPropCodes` call,
    /// empty until `after_open_session` has run.
    pub fn supported_properties(&self) -> Vec<u16> {
        self.supported_props.lock().unwrap().clone()
    }
}

impl Default for NikonVendor {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport + 'static> Vendor<T> for NikonVendor {
    fn after_open_session(&self, camera: &Camera<T>) -> Result<()> {
        let response = camera.send("GetVendorPropCodes", &[], None, None)?;
        let codes = match response.data {
            Some(bytes) => decode_u16_array(&bytes)?,
            None => Vec::new(),
        };
        log::debug!("Nikon body reports {} vendor property codes", codes.len());
        *self.supported_props.lock().unwrap() = codes;
        Ok(())
    }
}

fn decode_u16_array(bytes: &[u8]) -> Result<Vec<u16>> {
    let mut cursor = ByteCursor::new(bytes);
    let count = cursor.read_u32_le()?;
    let mut codes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        codes.push(cursor.read_u16_le()?);
    }
    Ok(codes)
}

/// Builds a [`Camera`] wired to the Nikon vendor registry (layered over
/// the generic set per §4.E) and [`NikonVendor`]'s property-code probe.
pub fn camera<T: Transport + 'static>(
    transport: T,
    config: EngineConfig,
) -> Result<Camera<T>, crate::error::ValidationError> {
    let generic = Arc::new(crate::registry::generic::build()?);
    let registry: Arc<dyn RegistryView + Send + Sync> = Arc::new(nikon::build(generic)?);
    Ok(Camera::new(transport, registry, Arc::new(NikonVendor::new()), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::registry::generic::response_code;
    use crate::transport::{ClassRequest, ClassStatus, DeviceSelector, Endpoint};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct FakeTransport {
        inbound: StdMutex<VecDeque<Vec<u8>>>,
    }

    impl Transport for FakeTransport {
        fn connect(&self, _selector: &DeviceSelector) -> crate::error::Result<()> {
            Ok(())
        }
        fn disconnect(&self) -> crate::error::Result<()> {
            Ok(())
        }
        fn send(&self, _bytes: &[u8], _timeout: Duration) -> crate::error::Result<()> {
            Ok(())
        }
        fn receive(&self, max_len: usize, _timeout: Duration) -> crate::error::Result<Vec<u8>> {
            let mut bytes = self.inbound.lock().unwrap().pop_front().unwrap_or_default();
            bytes.truncate(max_len);
            Ok(bytes)
        }
        fn class_request(&self, _request: ClassRequest) -> crate::error::Result<ClassStatus> {
            Ok(ClassStatus { response_code: response_code::OK, params: vec![] })
        }
        fn clear_halt(&self, _endpoint: Endpoint) -> crate::error::Result<()> {
            Ok(())
        }
        fn read_event(&self, _timeout: Duration) -> crate::error::Result<Option<Vec<u8>>> {
            std::thread::sleep(Duration::from_millis(5));
            Ok(None)
        }
    }

    fn encode_u16_array(values: &[u16]) -> Vec<u8> {
        let mut writer = crate::cursor::ByteWriter::new();
        writer.write_u32_le(values.len() as u32);
        for v in values {
            writer.write_u16_le(*v);
        }
        writer.into_bytes()
    }

    #[test]
    fn open_session_probes_vendor_property_codes() {
        let transport = FakeTransport { inbound: StdMutex::new(VecDeque::new()) };
        {
            let mut inbound = transport.inbound.lock().unwrap();
            // OpenSession response.
            inbound.push_back(Container::response(response_code::OK, 0, &[]).encode());
            // GetVendorPropCodes: data container then response.
            let codes = encode_u16_array(&[nikon::property_code::SHOOTING_BANK, nikon::property_code::EXPOSURE_REMAINING]);
            inbound.push_back(Container::data(nikon::operation_code::GET_VENDOR_PROP_CODES, 1, codes).encode());
            inbound.push_back(Container::response(response_code::OK, 1, &[]).encode());
        }
        let camera = camera(transport, EngineConfig::default()).unwrap();
        camera.connect(&DeviceSelector::default()).unwrap();
        assert!(camera.is_session_open());
        camera.disconnect().unwrap();
    }
}
