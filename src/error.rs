//! Error taxonomy for the PTP transaction engine and codec layer.
//!
//! Mirrors the five-way split in the design: protocol-level framing
//! problems, device-reported failures, transport-level failures,
//! caller-side validation problems, and explicit cancellation.

use thiserror::Error;

/// Top-level error type returned by every fallible public operation.
#[derive(Error, Debug)]
pub enum PtpError {
    /// Malformed container, unexpected container type, length mismatch,
    /// or short read. The transaction aborts; the session stays open.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The device answered with a non-OK response code.
    #[error("device error: {code:#06x} ({name}), params={params:?}")]
    Device {
        code: u16,
        name: &'static str,
        params: Vec<u32>,
        recoverable: bool,
    },

    /// STALL that survived recovery, a read/write timeout, or a closed
    /// endpoint. The session is marked suspect.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Caller supplied a value outside a codec's domain, too many
    /// operation parameters, or wrote a read-only property. Never
    /// reaches the wire.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Caller-initiated cancellation via `Cancel_Request`.
    #[error("operation canceled")]
    Canceled,
}

impl PtpError {
    pub fn device(code: u16, name: &'static str, params: Vec<u32>, recoverable: bool) -> Self {
        PtpError::Device { code, name, params, recoverable }
    }

    /// True when the caller may safely retry the same operation without
    /// re-establishing the session (§7: only STALL is locally recovered;
    /// everything else surfaces, but these kinds surface in a way that
    /// does not necessarily require a fresh `connect`).
    pub fn is_recoverable(&self) -> bool {
        match self {
            PtpError::Device { recoverable, .. } => *recoverable,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed container: {0}")]
    MalformedFrame(String),

    #[error("short read: expected at least {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("container length {declared} does not match {received} bytes received")]
    LengthMismatch { declared: u32, received: usize },

    #[error("unexpected container type: expected {expected:?}, got {actual:?}")]
    UnexpectedContainerType { expected: crate::container::ContainerType, actual: crate::container::ContainerType },

    #[error("malformed PTP string: {0}")]
    MalformedString(String),

    #[error("malformed array: need {needed} bytes for {count} elements, have {available}")]
    MalformedArray { count: u32, needed: usize, available: usize },

    #[error("malformed dataset field '{field}': {reason}")]
    MalformedDataset { field: &'static str, reason: String },

    #[error("unknown enum code {code} for codec '{codec}'")]
    UnknownEnumCode { codec: &'static str, code: u64 },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("STALL recovery failed after {attempts} attempt(s): {reason}")]
    StallRecoveryFailed { attempts: u32, reason: String },

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// The endpoint returned STALL. The engine runs STALL recovery
    /// (§4.G) and retries the step once before giving up.
    #[error("STALL on {endpoint:?}")]
    Stalled { endpoint: crate::transport::Endpoint },

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("endpoint closed")]
    EndpointClosed,

    #[cfg(feature = "rusb-transport")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unknown enum name '{name}' for codec '{codec}'")]
    UnknownEnumName { codec: &'static str, name: String },

    #[error("operation '{op}' declares {count} parameters, exceeding the PTP limit of 5")]
    TooManyParameters { op: &'static str, count: usize },

    #[error("property '{name}' is not writable (access = Get)")]
    NotWritable { name: &'static str },

    #[error("unknown symbol '{0}' in registry")]
    UnknownSymbol(String),

    #[error("offset {offset} exceeds the maximum supported by GetPartialObject ({max})")]
    OffsetOutOfRange { offset: u64, max: u64 },

    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("response data of {actual} bytes exceeds the caller's max_data_len of {max}")]
    DataExceedsMaxLen { max: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PtpError>;
