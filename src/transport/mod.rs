//! Transport collaborator contract (§6): the boundary the transaction
//! engine consumes. USB enumeration, device selection, and permission
//! flows live on the other side of this trait — out of scope here.

pub mod rusb_transport;

use std::time::Duration;

use crate::error::Result;

#[cfg(feature = "rusb-transport")]
pub use rusb_transport::RusbTransport;

/// Selects a single still-image-class USB device. All fields are
/// optional filters; an empty selector matches the first still-image
/// interface found.
#[derive(Debug, Clone, Default)]
pub struct DeviceSelector {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub serial_number: Option<String>,
}

impl DeviceSelector {
    pub fn with_ids(vendor_id: u16, product_id: u16) -> Self {
        Self { vendor_id: Some(vendor_id), product_id: Some(product_id), serial_number: None }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }
}

/// One of the three endpoints a still-image interface exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    BulkIn,
    BulkOut,
    Interrupt,
}

/// Class-specific control requests defined by the Still Image class
/// (PIMA 15740 Annex D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRequest {
    /// `Reset` (0x66): resets the device's PTP session state.
    Reset,
    /// `Cancel_Request` (0x64), carrying the transaction ID to cancel.
    Cancel(u32),
    /// `Get_Device_Status` (0x67): status code plus any stalled-endpoint
    /// addresses reported as parameters.
    GetDeviceStatus,
    /// `Get_Extended_Event_Data` (0xC1, vendor-extended on some devices).
    GetExtendedEventData,
}

/// Result of a class request: a PTP response code and any parameters
/// the device attached (stalled-endpoint addresses for
/// `Get_Device_Status`).
#[derive(Debug, Clone)]
pub struct ClassStatus {
    pub response_code: u16,
    pub params: Vec<u32>,
}

/// The boundary the transaction engine and event pump consume. USB
/// device/interface acquisition happens in `connect`; everything else
/// operates on the already-open interface.
///
/// Every method takes `&self`, not `&mut self`: libusb (and therefore
/// `rusb`) lets multiple threads issue transfers against the same
/// `DeviceHandle` concurrently as long as they target different
/// endpoints, the way the teacher's `BulkTransfer`/`InterruptPoller`
/// both hold a shared `&DeviceHandle`. That's what lets the engine's
/// bulk pipe and the event pump's interrupt reads run at the same time
/// (§5) without the whole transport behind one exclusive lock;
/// implementations use interior mutability for the one-time
/// connect/disconnect state change.
pub trait Transport: Send + Sync {
    fn connect(&self, selector: &DeviceSelector) -> Result<()>;
    fn disconnect(&self) -> Result<()>;

    /// Sends one bulk-OUT transfer. The caller (the engine) chunks data
    /// phases larger than a single transfer itself; `send` is one frame.
    fn send(&self, bytes: &[u8], timeout: Duration) -> Result<()>;

    /// One bulk-IN transfer; may return fewer than `max_len` bytes on a
    /// short packet.
    fn receive(&self, max_len: usize, timeout: Duration) -> Result<Vec<u8>>;

    fn class_request(&self, request: ClassRequest) -> Result<ClassStatus>;

    fn clear_halt(&self, endpoint: Endpoint) -> Result<()>;

    /// One interrupt-IN transfer, used by the event pump's read loop.
    /// Returns `Ok(None)` on a plain timeout (not an error — the pump
    /// just re-issues the read); `Err` for anything else, including a
    /// `Clear_Halt`-induced cancellation the pump is waiting on.
    fn read_event(&self, timeout: Duration) -> Result<Option<Vec<u8>>>;

    fn is_little_endian(&self) -> bool {
        true
    }
}
