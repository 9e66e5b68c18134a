//! Generic still-image camera: no vendor handshake, no event-delivery
//! override, property access through `GetDevicePropValue`/
//! `SetDevicePropValue` (§4.I's default path). Used directly by cameras
//! that implement nothing beyond the standard PTP operation set, and as
//! the base every vendor façade's `Vendor` impl falls back to.

use std::sync::Arc;

use crate::engine::EngineConfig;
use crate::registry::RegistryView;
use crate::transport::Transport;

use super::{Camera, Vendor};

/// The no-op [`Vendor`]: every hook uses `Camera`'s generic default.
pub struct GenericVendor;

impl<T: Transport + 'static> Vendor<T> for GenericVendor {}

/// Builds a [`Camera`] wired to the generic registry and the no-op
/// vendor strategy.
pub fn camera<T: Transport + 'static>(
    transport: T,
    config: EngineConfig,
) -> Result<Camera<T>, crate::error::ValidationError> {
    let registry: Arc<dyn RegistryView + Send + Sync> = Arc::new(crate::registry::generic::build()?);
    Ok(Camera::new(transport, registry, Arc::new(GenericVendor), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ClassRequest, ClassStatus, DeviceSelector, Endpoint};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeTransport {
        inbound: Mutex<VecDeque<Vec<u8>>>,
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
            Ok(ClassStatus { response_code: 0x2001, params: vec![] })
        }
        fn clear_halt(&self, _endpoint: Endpoint) -> crate::error::Result<()> {
            Ok(())
        }
        fn read_event(&self, _timeout: Duration) -> crate::error::Result<Option<Vec<u8>>> {
            std::thread::sleep(Duration::from_millis(5));
            Ok(None)
        }
    }

    #[test]
    fn generic_camera_connects_with_the_no_op_vendor() {
        let transport = FakeTransport { inbound: Mutex::new(VecDeque::new()) };
        transport.inbound.lock().unwrap().push_back(
            crate::container::Container::response(crate::registry::generic::response_code::OK, 0, &[]).encode(),
        );
        let camera = camera(transport, EngineConfig::default()).unwrap();
        camera.connect(&DeviceSelector::default()).unwrap();
        assert!(camera.is_session_open());
        camera.disconnect().unwrap();
    }
}
