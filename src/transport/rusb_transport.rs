//! Default [`Transport`] backed by `rusb` (libusb), feature-gated
//! behind `rusb-transport`. Endpoint discovery and class-request
//! encoding are grounded in the same libusb idioms as the rest of the
//! pack's USB code; the retry/chunking policy itself belongs to the
//! transaction engine, not here — this layer is a thin, honest wrapper
//! around one bulk/interrupt/control transfer at a time.
#![cfg(feature = "rusb-transport")]

use std::sync::RwLock;
use std::time::Duration;

use log::{debug, warn};
use rusb::{Direction, TransferType, UsbContext};

use crate::error::{PtpError, Result, TransportError};

use super::{ClassRequest, ClassStatus, DeviceSelector, Endpoint, Transport};

/// Still Image class per USB-IF: interface_class = 0x06, subclass =
/// 0x01. Referenced by §6's "USB wire formats".
const STILL_IMAGE_CLASS: u8 = 0x06;
const STILL_IMAGE_SUBCLASS: u8 = 0x01;

mod class_request {
    pub const CANCEL: u8 = 0x64;
    pub const GET_EXTENDED_EVENT_DATA: u8 = 0x65;
    pub const DEVICE_RESET: u8 = 0x66;
    pub const GET_DEVICE_STATUS: u8 = 0x67;
}

pub struct Endpoints {
    pub bulk_in: u8,
    pub bulk_out: u8,
    pub interrupt_in: Option<u8>,
}

/// Finds the still-image interface on `device` and returns its
/// interface number, endpoint addresses, and alternate setting.
pub fn find_still_image_interface<T: UsbContext>(
    device: &rusb::Device<T>,
) -> Result<(u8, u8, Endpoints)> {
    let config = device
        .active_config_descriptor()
        .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;

    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            if descriptor.class_code() == STILL_IMAGE_CLASS
                && descriptor.sub_class_code() == STILL_IMAGE_SUBCLASS
            {
                let mut bulk_in = None;
                let mut bulk_out = None;
                let mut interrupt_in = None;
                for ep in descriptor.endpoint_descriptors() {
                    match (ep.transfer_type(), ep.direction()) {
                        (TransferType::Bulk, Direction::In) => bulk_in = Some(ep.address()),
                        (TransferType::Bulk, Direction::Out) => bulk_out = Some(ep.address()),
                        (TransferType::Interrupt, Direction::In) => {
                            interrupt_in = Some(ep.address())
                        }
                        _ => {}
                    }
                }
                if let (Some(bulk_in), Some(bulk_out)) = (bulk_in, bulk_out) {
                    return Ok((
                        descriptor.interface_number(),
                        descriptor.setting_number(),
                        Endpoints { bulk_in, bulk_out, interrupt_in },
                    ));
                }
            }
        }
    }

    Err(PtpError::Transport(TransportError::TransferFailed(
        "no still-image (class 0x06/0x01) interface found".into(),
    )))
}

fn device_matches(device_desc: &rusb::DeviceDescriptor, selector: &DeviceSelector) -> bool {
    if let Some(vid) = selector.vendor_id {
        if device_desc.vendor_id() != vid {
            return false;
        }
    }
    if let Some(pid) = selector.product_id {
        if device_desc.product_id() != pid {
            return false;
        }
    }
    true
}

struct Connection {
    handle: rusb::DeviceHandle<rusb::Context>,
    interface_number: u8,
    endpoints: Endpoints,
}

/// `rusb`/libusb transfers on a `DeviceHandle` are safe to issue from
/// multiple threads concurrently as long as they target different
/// endpoints, so the connection state only needs a lock around the
/// one-time connect/disconnect transition, not around every transfer.
pub struct RusbTransport {
    context: rusb::Context,
    connection: RwLock<Option<Connection>>,
}

impl RusbTransport {
    pub fn new() -> Result<Self> {
        let context = rusb::Context::new().map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
        Ok(Self { context, connection: RwLock::new(None) })
    }

    fn not_connected() -> PtpError {
        PtpError::Transport(TransportError::TransferFailed("not connected".into()))
    }
}

impl Transport for RusbTransport {
    fn connect(&self, selector: &DeviceSelector) -> Result<()> {
        let devices = self
            .context
            .devices()
            .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;

        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };
            if !device_matches(&device_desc, selector) {
                continue;
            }
            let (interface_number, _alt_setting, endpoints) = match find_still_image_interface(&device) {
                Ok(found) => found,
                Err(_) => continue,
            };

            let mut handle = match device.open() {
                Ok(h) => h,
                Err(_) => continue,
            };

            if let Some(wanted_serial) = &selector.serial_number {
                let languages = handle
                    .read_languages(Duration::from_secs(1))
                    .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
                let matches = languages.first().is_some_and(|lang| {
                    handle
                        .read_serial_number_string(*lang, &device_desc, Duration::from_secs(1))
                        .map(|serial| &serial == wanted_serial)
                        .unwrap_or(false)
                });
                if !matches {
                    continue;
                }
            }

            handle
                .claim_interface(interface_number)
                .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;

            *self.connection.write().unwrap() = Some(Connection { handle, interface_number, endpoints });
            debug!("connected to still-image interface {interface_number}");
            return Ok(());
        }

        Err(PtpError::Transport(TransportError::TransferFailed(
            "no matching still-image device found".into(),
        )))
    }

    fn disconnect(&self) -> Result<()> {
        if let Some(connection) = self.connection.write().unwrap().take() {
            let _ = connection.handle.release_interface(connection.interface_number);
        }
        Ok(())
    }

    fn send(&self, bytes: &[u8], timeout: Duration) -> Result<()> {
        let guard = self.connection.read().unwrap();
        let connection = guard.as_ref().ok_or_else(Self::not_connected)?;
        connection
            .handle
            .write_bulk(connection.endpoints.bulk_out, bytes, timeout)
            .map_err(|e| match e {
                rusb::Error::Pipe => {
                    PtpError::Transport(TransportError::Stalled { endpoint: Endpoint::BulkOut })
                }
                rusb::Error::Timeout => PtpError::Transport(TransportError::Timeout(timeout)),
                other => PtpError::Transport(TransportError::Usb(other)),
            })?;
        Ok(())
    }

    fn receive(&self, max_len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let guard = self.connection.read().unwrap();
        let connection = guard.as_ref().ok_or_else(Self::not_connected)?;
        let mut buf = vec![0u8; max_len];
        let received = connection
            .handle
            .read_bulk(connection.endpoints.bulk_in, &mut buf, timeout)
            .map_err(|e| match e {
                rusb::Error::Pipe => {
                    PtpError::Transport(TransportError::Stalled { endpoint: Endpoint::BulkIn })
                }
                rusb::Error::Timeout => PtpError::Transport(TransportError::Timeout(timeout)),
                other => PtpError::Transport(TransportError::Usb(other)),
            })?;
        buf.truncate(received);
        Ok(buf)
    }

    fn class_request(&self, request: ClassRequest) -> Result<ClassStatus> {
        let guard = self.connection.read().unwrap();
        let connection = guard.as_ref().ok_or_else(Self::not_connected)?;
        let interface = connection.interface_number as u16;
        let timeout = Duration::from_secs(5);
        match request {
            ClassRequest::Reset => {
                connection
                    .handle
                    .write_control(0x21, class_request::DEVICE_RESET, 0, interface, &[], timeout)
                    .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
                Ok(ClassStatus { response_code: 0x2001, params: vec![] })
            }
            ClassRequest::Cancel(transaction_id) => {
                let mut payload = [0u8; 6];
                payload[0..2].copy_from_slice(&0x4001u16.to_le_bytes());
                payload[2..6].copy_from_slice(&transaction_id.to_le_bytes());
                connection
                    .handle
                    .write_control(0x21, class_request::CANCEL, 0, interface, &payload, timeout)
                    .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
                Ok(ClassStatus { response_code: 0x2001, params: vec![] })
            }
            ClassRequest::GetDeviceStatus => {
                let mut buf = [0u8; 34];
                let received = connection
                    .handle
                    .read_control(0xA1, class_request::GET_DEVICE_STATUS, 0, interface, &mut buf, timeout)
                    .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
                if received < 4 {
                    return Err(PtpError::Transport(TransportError::TransferFailed(
                        "Get_Device_Status reply shorter than its own header".into(),
                    )));
                }
                let code = u16::from_le_bytes([buf[2], buf[3]]);
                let params = buf[4..received]
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok(ClassStatus { response_code: code, params })
            }
            ClassRequest::GetExtendedEventData => {
                let mut buf = [0u8; 256];
                let received = connection
                    .handle
                    .read_control(
                        0xA1,
                        class_request::GET_EXTENDED_EVENT_DATA,
                        0,
                        interface,
                        &mut buf,
                        timeout,
                    )
                    .map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
                let params = buf[..received]
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok(ClassStatus { response_code: 0x2001, params })
            }
        }
    }

    fn clear_halt(&self, endpoint: Endpoint) -> Result<()> {
        let guard = self.connection.read().unwrap();
        let connection = guard.as_ref().ok_or_else(Self::not_connected)?;
        let address = match endpoint {
            Endpoint::BulkIn => connection.endpoints.bulk_in,
            Endpoint::BulkOut => connection.endpoints.bulk_out,
            Endpoint::Interrupt => connection.endpoints.interrupt_in.ok_or_else(|| {
                PtpError::Transport(TransportError::TransferFailed(
                    "device has no interrupt endpoint".into(),
                ))
            })?,
        };
        connection.handle.clear_halt(address).map_err(|e| PtpError::Transport(TransportError::Usb(e)))?;
        Ok(())
    }

    fn read_event(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let guard = self.connection.read().unwrap();
        let connection = guard.as_ref().ok_or_else(Self::not_connected)?;
        let endpoint = connection.endpoints.interrupt_in.ok_or_else(|| {
            PtpError::Transport(TransportError::TransferFailed(
                "device has no interrupt endpoint".into(),
            ))
        })?;
        let mut buf = vec![0u8; 64];
        match connection.handle.read_interrupt(endpoint, &mut buf, timeout) {
            Ok(received) => {
                buf.truncate(received);
                Ok(Some(buf))
            }
            Err(rusb::Error::Timeout) => Ok(None),
            Err(rusb::Error::Pipe) => {
                Err(PtpError::Transport(TransportError::Stalled { endpoint: Endpoint::Interrupt }))
            }
            Err(e) => {
                warn!("interrupt read failed: {e}");
                Err(PtpError::Transport(TransportError::Usb(e)))
            }
        }
    }

    fn is_little_endian(&self) -> bool {
        true
    }
}
