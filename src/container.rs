//! Container framing (§4.C): the bit-exact 12-byte header shared by
//! COMMAND, DATA, RESPONSE, and EVENT containers.
//!
//! ```text
//! offset  size  field
//! 0       4     length           (total container length including header)
//! 4       2     container_type   (1=COMMAND, 2=DATA, 3=RESPONSE, 4=EVENT)
//! 6       2     code             (op/response/event code)
//! 8       4     transaction_id
//! 12      ...   payload
//! ```

use crate::cursor::{ByteCursor, ByteWriter};
use crate::error::ProtocolError;

pub const HEADER_LEN: usize = 12;
pub const MAX_PARAMETERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    Command,
    Data,
    Response,
    Event,
}

impl ContainerType {
    fn to_u16(self) -> u16 {
        match self {
            ContainerType::Command => 1,
            ContainerType::Data => 2,
            ContainerType::Response => 3,
            ContainerType::Event => 4,
        }
    }

    fn from_u16(v: u16) -> Result<Self, ProtocolError> {
        match v {
            1 => Ok(ContainerType::Command),
            2 => Ok(ContainerType::Data),
            3 => Ok(ContainerType::Response),
            4 => Ok(ContainerType::Event),
            other => Err(ProtocolError::MalformedFrame(format!(
                "unknown container_type {other}"
            ))),
        }
    }
}

/// A parsed or to-be-built PTP container. `payload` holds the raw bytes
/// after the header: for COMMAND/RESPONSE/EVENT this is `N * u32`
/// parameters (`N <= 5`); for DATA it is codec-specific.
#[derive(Debug, Clone)]
pub struct Container {
    pub container_type: ContainerType,
    pub code: u16,
    pub transaction_id: u32,
    pub payload: Vec<u8>,
}

impl Container {
    pub fn command(code: u16, transaction_id: u32, params: &[u32]) -> Self {
        assert!(params.len() <= MAX_PARAMETERS, "PTP allows at most 5 operation parameters");
        Container {
            container_type: ContainerType::Command,
            code,
            transaction_id,
            payload: params_to_payload(params),
        }
    }

    pub fn response(code: u16, transaction_id: u32, params: &[u32]) -> Self {
        assert!(params.len() <= MAX_PARAMETERS, "PTP allows at most 5 response parameters");
        Container {
            container_type: ContainerType::Response,
            code,
            transaction_id,
            payload: params_to_payload(params),
        }
    }

    pub fn data(code: u16, transaction_id: u32, payload: Vec<u8>) -> Self {
        Container { container_type: ContainerType::Data, code, transaction_id, payload }
    }

    pub fn event(code: u16, transaction_id: u32, params: &[u32]) -> Self {
        assert!(params.len() <= MAX_PARAMETERS, "PTP allows at most 5 event parameters");
        Container {
            container_type: ContainerType::Event,
            code,
            transaction_id,
            payload: params_to_payload(params),
        }
    }

    pub fn length(&self) -> u32 {
        (HEADER_LEN + self.payload.len()) as u32
    }

    /// Decodes `payload` as `u32` parameters, used for COMMAND/RESPONSE/
    /// EVENT containers. Trailing bytes that don't fill a full `u32` are
    /// ignored, matching the framer's tolerance for device padding.
    pub fn params(&self) -> Vec<u32> {
        self.payload
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(HEADER_LEN + self.payload.len());
        w.write_u32_le(self.length());
        w.write_u16_le(self.container_type.to_u16());
        w.write_u16_le(self.code);
        w.write_u32_le(self.transaction_id);
        w.write_bytes(&self.payload);
        w.into_bytes()
    }

    /// Parses a complete container from `bytes`. `bytes` may be longer
    /// than `length` (device padding); trailing bytes beyond `length`
    /// are ignored. Fails if fewer than `length` bytes are available.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut c = ByteCursor::new(bytes);
        let length = c.read_u32_le()?;
        if length < HEADER_LEN as u32 {
            return Err(ProtocolError::MalformedFrame(format!(
                "declared length {length} is shorter than the 12-byte header"
            )));
        }
        if (bytes.len() as u32) < length {
            return Err(ProtocolError::LengthMismatch {
                declared: length,
                received: bytes.len(),
            });
        }
        let container_type = ContainerType::from_u16(c.read_u16_le()?)?;
        let code = c.read_u16_le()?;
        let transaction_id = c.read_u32_le()?;
        let payload_len = (length as usize) - HEADER_LEN;
        let payload = c.read_bytes(payload_len)?.to_vec();
        Ok(Container { container_type, code, transaction_id, payload })
    }

    /// How many more bytes are needed to complete this container, given
    /// `received_so_far` bytes have arrived across one or more chunked
    /// reads. Returns `None` once `received_so_far` covers `length` (as
    /// declared by the first 4 bytes of `received_so_far`).
    pub fn bytes_needed(received_so_far: &[u8]) -> Result<Option<usize>, ProtocolError> {
        if received_so_far.len() < 4 {
            return Ok(Some(4 - received_so_far.len()));
        }
        let length = u32::from_le_bytes(received_so_far[0..4].try_into().unwrap()) as usize;
        if received_so_far.len() >= length {
            Ok(None)
        } else {
            Ok(Some(length - received_so_far.len()))
        }
    }
}

fn params_to_payload(params: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(params.len() * 4);
    for p in params {
        w.write_u32_le(*p);
    }
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_session_command_round_trips() {
        // length=16, type=1, code=0x1002, txn=0, param session_id=1
        let expected = [
            0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
            0x00, 0x00,
        ];
        let container = Container::command(0x1002, 0, &[1]);
        assert_eq!(container.encode(), expected);

        let decoded = Container::decode(&expected).unwrap();
        assert_eq!(decoded.container_type, ContainerType::Command);
        assert_eq!(decoded.code, 0x1002);
        assert_eq!(decoded.transaction_id, 0);
        assert_eq!(decoded.params(), vec![1]);
    }

    #[test]
    fn ok_response_round_trips() {
        // length=12, type=3, code=0x2001, txn=0
        let expected = [0x0C, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x20, 0x00, 0x00, 0x00, 0x00];
        let container = Container::response(0x2001, 0, &[]);
        assert_eq!(container.encode(), expected);
        assert_eq!(container.length(), 12);

        let decoded = Container::decode(&expected).unwrap();
        assert_eq!(decoded.container_type, ContainerType::Response);
        assert!(decoded.params().is_empty());
    }

    #[test]
    fn event_with_two_params_round_trips() {
        // length=20, type=4, code=0x4003, txn=5, params=[1, 2]
        let bytes = [
            0x14, 0x00, 0x00, 0x00, 0x04, 0x00, 0x03, 0x40, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
        ];
        let decoded = Container::decode(&bytes).unwrap();
        assert_eq!(decoded.container_type, ContainerType::Event);
        assert_eq!(decoded.code, 0x4003);
        assert_eq!(decoded.transaction_id, 5);
        assert_eq!(decoded.params(), vec![1, 2]);
    }

    #[test]
    fn trailing_padding_is_ignored() {
        let mut bytes = Container::response(0x2001, 0, &[]).encode();
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let decoded = Container::decode(&bytes).unwrap();
        assert_eq!(decoded.length(), 12);
    }

    #[test]
    fn declared_length_exceeding_first_chunk_is_an_error_not_a_panic() {
        let full = Container::data(0x1001, 1, vec![0u8; 100]).encode();
        let first_chunk = &full[..20];
        let err = Container::decode(first_chunk).unwrap_err();
        match err {
            ProtocolError::LengthMismatch { declared, received } => {
                assert_eq!(declared, full.len() as u32);
                assert_eq!(received, 20);
            }
            _ => panic!("wrong error variant"),
        }
    }

    #[test]
    fn bytes_needed_tracks_chunked_arrival() {
        let full = Container::data(0x1001, 1, vec![0u8; 200]).encode();
        assert_eq!(Container::bytes_needed(&full[..2]).unwrap(), Some(2));
        assert_eq!(
            Container::bytes_needed(&full[..4]).unwrap(),
            Some(full.len() - 4)
        );
        assert_eq!(Container::bytes_needed(&full).unwrap(), None);
    }

    #[test]
    #[should_panic]
    fn six_parameters_panics_in_constructor() {
        Container::command(0x1234, 1, &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn zero_and_five_parameters_are_both_valid() {
        let _ = Container::command(0x1001, 1, &[]);
        let _ = Container::command(0x9999, 1, &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn length_below_header_size_is_malformed() {
        let bytes = [0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let err = Container::decode(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame(_)));
    }
}
