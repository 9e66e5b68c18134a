//! Transaction engine (§4.G, "the hardest subsystem"): turns one
//! `execute(operation, params, data?)` call into the correct sequence
//! of COMMAND/DATA/RESPONSE container frames, with STALL recovery,
//! chunked large transfers, and per-operation timeouts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use tracing::instrument;

use crate::container::{Container, ContainerType};
use crate::error::{PtpError, ProtocolError, Result, TransportError, ValidationError};
use crate::registry::{DataDirection, OperationDefinition, RegistryView};
use crate::registry::generic::response_code;
use crate::session::Session;
use crate::transport::{ClassRequest, Endpoint, Transport};

/// 64 KiB, per §4.G's chunking requirement.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const STALL_POLL_INTERVAL: Duration = Duration::from_millis(50);
const STALL_POLL_ATTEMPTS: u32 = 10;

/// Builder-style configuration, matching the teacher's
/// `BulkTransfer::with_timeout`/`with_retries`/`with_chunk_size` style.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_timeout: Duration,
    pub chunk_size: usize,
    pub stall_poll_interval: Duration,
    pub stall_poll_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stall_poll_interval: STALL_POLL_INTERVAL,
            stall_poll_attempts: STALL_POLL_ATTEMPTS,
        }
    }
}

impl EngineConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_stall_poll_interval(mut self, interval: Duration) -> Self {
        self.stall_poll_interval = interval;
        self
    }

    pub fn with_stall_poll_attempts(mut self, attempts: u32) -> Self {
        self.stall_poll_attempts = attempts;
        self
    }
}

/// The result of one `execute` call: the device's response code and
/// parameters, plus the DATA payload if the operation has one.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub response_code: u16,
    pub response_params: Vec<u32>,
    pub data: Option<Vec<u8>>,
}

/// Owns the transport and the session's transaction-ID counter.
///
/// `transport` is an `Arc<T>` rather than a `Mutex<T>`: `Transport`
/// methods take `&self`, so the engine's bulk COMMAND/DATA/RESPONSE
/// sequence and an event pump's concurrent interrupt reads can both
/// reach the same handle without fighting over one lock (§5). What the
/// engine *does* need serialized is its own bulk pipe — two overlapping
/// `execute` calls must not interleave their frames — so `sequencer`
/// holds that ordering guarantee on its own, independent of the
/// transport's internal locking.
pub struct Engine<T: Transport> {
    transport: Arc<T>,
    sequencer: Mutex<()>,
    session: Mutex<Option<Session>>,
    config: EngineConfig,
    registry: Arc<dyn RegistryView + Send + Sync>,
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T, registry: Arc<dyn RegistryView + Send + Sync>, config: EngineConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            sequencer: Mutex::new(()),
            session: Mutex::new(None),
            config,
            registry,
        }
    }

    /// The shared transport handle, for collaborators (the event pump)
    /// that need to read the interrupt endpoint concurrently with
    /// in-flight operations.
    pub fn transport_handle(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }

    pub fn connect(&self, selector: &crate::transport::DeviceSelector) -> Result<()> {
        self.transport.connect(selector)
    }

    pub fn disconnect(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        self.transport.disconnect()
    }

    pub fn is_session_open(&self) -> bool {
        self.session.lock().unwrap().as_ref().is_some_and(Session::is_open)
    }

    /// `OpenSession` is transaction ID 0, sent before a `Session` exists.
    /// On an OK response the engine adopts the new session.
    #[instrument(skip(self, op))]
    pub fn open_session(&self, session_id: u32, op: &OperationDefinition) -> Result<EngineResponse> {
        let _order = self.sequencer.lock().unwrap();
        let timeout = self.config.default_timeout;
        let response =
            self.run_transaction(op, Session::OPEN_SESSION_TRANSACTION_ID, &[session_id], None, timeout)?;
        if response.response_code == response_code::OK {
            *self.session.lock().unwrap() = Some(Session::new(session_id));
        }
        Ok(response)
    }

    #[instrument(skip(self, op))]
    pub fn close_session(&self, op: &OperationDefinition) -> Result<EngineResponse> {
        let response = self.execute(op, &[], None, None)?;
        self.session.lock().unwrap().as_ref().inspect(|s| s.close());
        Ok(response)
    }

    /// Executes any operation other than `OpenSession` against the
    /// currently open session, allocating the next transaction ID.
    #[instrument(skip(self, op, data_out), fields(op = op.name))]
    pub fn execute(
        &self,
        op: &OperationDefinition,
        params: &[u32],
        data_out: Option<Vec<u8>>,
        timeout_override: Option<Duration>,
    ) -> Result<EngineResponse> {
        let transaction_id = {
            let guard = self.session.lock().unwrap();
            let session = guard.as_ref().ok_or(PtpError::Validation(ValidationError::MissingParameter("session")))?;
            if !session.is_open() {
                return Err(PtpError::Validation(ValidationError::MissingParameter("session")));
            }
            session.next_transaction_id()
        };

        let timeout = timeout_override.unwrap_or(self.config.default_timeout);
        let result = {
            let _order = self.sequencer.lock().unwrap();
            self.run_transaction(op, transaction_id, params, data_out, timeout)
        };

        if let Err(err) = &result {
            if let PtpError::Transport(_) = err {
                if let Some(session) = self.session.lock().unwrap().as_ref() {
                    session.mark_suspect();
                }
                if let PtpError::Transport(TransportError::Timeout(_)) = err {
                    let _ = self.transport.class_request(ClassRequest::Cancel(transaction_id));
                }
            }
        }
        result
    }

    fn run_transaction(
        &self,
        op: &OperationDefinition,
        transaction_id: u32,
        params: &[u32],
        data_out: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<EngineResponse> {
        debug!("executing {} (txn={transaction_id})", op.name);

        let command = Container::command(op.code, transaction_id, params);
        self.send_container(command, timeout)?;

        if op.data_direction == DataDirection::In {
            let bytes = data_out.ok_or(PtpError::Validation(ValidationError::MissingParameter("data")))?;
            let data_container = Container::data(op.code, transaction_id, bytes);
            self.send_container(data_container, timeout)?;
        }

        let mut data_received = None;
        if op.data_direction == DataDirection::Out {
            let container = self.receive_container(timeout)?;
            if container.container_type != ContainerType::Data {
                return Err(PtpError::Protocol(ProtocolError::UnexpectedContainerType {
                    expected: ContainerType::Data,
                    actual: container.container_type,
                }));
            }
            data_received = Some(container.payload);
        }

        let response = self.receive_container(timeout)?;
        if response.container_type != ContainerType::Response {
            return Err(PtpError::Protocol(ProtocolError::UnexpectedContainerType {
                expected: ContainerType::Response,
                actual: response.container_type,
            }));
        }

        if let Some(session) = self.session.lock().unwrap().as_ref() {
            session.clear_suspect();
        }

        Ok(EngineResponse {
            response_code: response.code,
            response_params: response.params(),
            data: data_received,
        })
    }

    /// Resolves an `EngineResponse` with a non-OK code into a
    /// `PtpError::Device`, looking up its name/recoverable flag in the
    /// registry. Callers that only care about success can ignore this
    /// and inspect `response_code` directly.
    pub fn into_device_result(&self, response: EngineResponse) -> Result<EngineResponse> {
        if response.response_code == response_code::OK {
            return Ok(response);
        }
        let (name, recoverable) = match self.registry.response(response.response_code) {
            Some(def) => (def.name, def.recoverable),
            None => ("Unknown", false),
        };
        Err(PtpError::device(response.response_code, name, response.response_params, recoverable))
    }

    fn send_container(&self, container: Container, timeout: Duration) -> Result<()> {
        let bytes = container.encode();
        for chunk in bytes.chunks(self.config.chunk_size.max(1)) {
            self.send_with_recovery(chunk, timeout)?;
        }
        Ok(())
    }

    fn receive_container(&self, timeout: Duration) -> Result<Container> {
        let mut buf = Vec::new();
        loop {
            let chunk = self.receive_with_recovery(self.config.chunk_size, timeout)?;
            let short_packet = chunk.len() < self.config.chunk_size;
            let got_nothing = chunk.is_empty();
            buf.extend_from_slice(&chunk);

            match Container::bytes_needed(&buf) {
                Ok(None) => break,
                Ok(Some(_)) if short_packet || got_nothing => break,
                Ok(Some(_)) => continue,
                Err(e) => return Err(PtpError::Protocol(e)),
            }
        }
        Container::decode(&buf).map_err(PtpError::Protocol)
    }

    fn send_with_recovery(&self, bytes: &[u8], timeout: Duration) -> Result<()> {
        match self.transport.send(bytes, timeout) {
            Ok(()) => Ok(()),
            Err(PtpError::Transport(TransportError::Stalled { endpoint })) => {
                self.recover_from_stall(endpoint)?;
                self.transport.send(bytes, timeout)
            }
            Err(e) => Err(e),
        }
    }

    fn receive_with_recovery(&self, max_len: usize, timeout: Duration) -> Result<Vec<u8>> {
        match self.transport.receive(max_len, timeout) {
            Ok(bytes) => Ok(bytes),
            Err(PtpError::Transport(TransportError::Stalled { endpoint })) => {
                self.recover_from_stall(endpoint)?;
                self.transport.receive(max_len, timeout)
            }
            Err(e) => Err(e),
        }
    }

    /// PIMA 15740 §D.7.2.1 STALL recovery: probe status, clear the
    /// affected endpoint(s), poll until the device reports OK, and give
    /// the caller one retry of the step that stalled.
    fn recover_from_stall(&self, endpoint: Endpoint) -> Result<()> {
        warn!("STALL on {endpoint:?}, running recovery");
        let _ = self.transport.class_request(ClassRequest::GetDeviceStatus)?;

        match endpoint {
            Endpoint::BulkIn | Endpoint::BulkOut => {
                self.transport.clear_halt(Endpoint::BulkIn)?;
                self.transport.clear_halt(Endpoint::BulkOut)?;
            }
            Endpoint::Interrupt => self.transport.clear_halt(Endpoint::Interrupt)?,
        }

        for attempt in 0..self.config.stall_poll_attempts {
            let status = self.transport.class_request(ClassRequest::GetDeviceStatus)?;
            if status.response_code == response_code::OK {
                debug!("STALL recovery succeeded after {attempt} poll(s)");
                return Ok(());
            }
            if attempt + 1 < self.config.stall_poll_attempts {
                std::thread::sleep(self.config.stall_poll_interval);
            }
        }

        Err(PtpError::Transport(TransportError::StallRecoveryFailed {
            attempts: self.config.stall_poll_attempts,
            reason: "Get_Device_Status never returned OK".into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Access, ParameterDefinition};
    use crate::codec::{CodecDefinition, PrimitiveKind};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// A scriptable fake `Transport`: each test preloads the exact byte
    /// sequences it expects the engine to receive, and records every
    /// `send` call for later assertions. `&self`-only methods plus
    /// interior mutability, matching the real `Transport` contract.
    struct FakeTransport {
        inbound: StdMutex<VecDeque<Result<Vec<u8>>>>,
        sent: StdMutex<Vec<Vec<u8>>>,
        stalls_remaining: StdMutex<u32>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                inbound: StdMutex::new(VecDeque::new()),
                sent: StdMutex::new(Vec::new()),
                stalls_remaining: StdMutex::new(0),
            }
        }

        fn push_inbound(&self, bytes: Vec<u8>) {
            self.inbound.lock().unwrap().push_back(Ok(bytes));
        }

        fn stall_next_receive_once(&self) {
            *self.stalls_remaining.lock().unwrap() = 1;
        }
    }

    impl Transport for FakeTransport {
        fn connect(&self, _selector: &crate::transport::DeviceSelector) -> Result<()> {
            Ok(())
        }
        fn disconnect(&self) -> Result<()> {
            Ok(())
        }
        fn send(&self, bytes: &[u8], _timeout: Duration) -> Result<()> {
            self.sent.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
        fn receive(&self, max_len: usize, _timeout: Duration) -> Result<Vec<u8>> {
            let mut remaining = self.stalls_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PtpError::Transport(TransportError::Stalled { endpoint: Endpoint::BulkIn }));
            }
            drop(remaining);
            let mut queue = self.inbound.lock().unwrap();
            match queue.pop_front() {
                Some(Ok(mut bytes)) => {
                    bytes.truncate(max_len);
                    Ok(bytes)
                }
                Some(Err(e)) => Err(e),
                None => Ok(vec![]),
            }
        }
        fn class_request(&self, request: ClassRequest) -> Result<crate::transport::ClassStatus> {
            match request {
                ClassRequest::GetDeviceStatus => {
                    Ok(crate::transport::ClassStatus { response_code: response_code::OK, params: vec![] })
                }
                _ => Ok(crate::transport::ClassStatus { response_code: response_code::OK, params: vec![] }),
            }
        }
        fn clear_halt(&self, _endpoint: Endpoint) -> Result<()> {
            Ok(())
        }
        fn read_event(&self, _timeout: Duration) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
    }

    fn open_session_op() -> OperationDefinition {
        OperationDefinition::new(
            0x1002,
            "OpenSession",
            "",
            DataDirection::None,
            vec![ParameterDefinition::required("session_id", CodecDefinition::primitive(PrimitiveKind::U32))],
            vec![],
            None,
        )
        .unwrap()
    }

    fn get_device_info_op() -> OperationDefinition {
        OperationDefinition::new(0x1001, "GetDeviceInfo", "", DataDirection::Out, vec![], vec![], None).unwrap()
    }

    fn set_prop_op() -> OperationDefinition {
        OperationDefinition::new(
            0x1016,
            "SetDevicePropValue",
            "",
            DataDirection::In,
            vec![ParameterDefinition::required("property_code", CodecDefinition::primitive(PrimitiveKind::U32))],
            vec![],
            None,
        )
        .unwrap()
    }

    fn ok_response(transaction_id: u32) -> Vec<u8> {
        Container::response(response_code::OK, transaction_id, &[]).encode()
    }

    fn registry() -> Arc<dyn RegistryView + Send + Sync> {
        Arc::new(crate::registry::generic::build().unwrap())
    }

    #[test]
    fn open_session_uses_transaction_id_zero_and_adopts_session() {
        let transport = FakeTransport::new();
        transport.push_inbound(ok_response(0));
        let engine = Engine::new(transport, registry(), EngineConfig::default());

        let response = engine.open_session(1, &open_session_op()).unwrap();
        assert_eq!(response.response_code, response_code::OK);
        assert!(engine.is_session_open());

        let sent = engine.transport.sent.lock().unwrap().clone();
        let command = Container::decode(&sent[0]).unwrap();
        assert_eq!(command.transaction_id, 0);
    }

    #[test]
    fn get_device_info_reads_data_then_response_in_order() {
        let transport = FakeTransport::new();
        transport.push_inbound(ok_response(0));
        let engine = Engine::new(transport, registry(), EngineConfig::default());
        engine.open_session(1, &open_session_op()).unwrap();

        let data_bytes = b"hello-device-info".to_vec();
        engine.transport.push_inbound(Container::data(0x1001, 1, data_bytes.clone()).encode());
        engine.transport.push_inbound(ok_response(1));

        let response = engine.execute(&get_device_info_op(), &[], None, None).unwrap();
        assert_eq!(response.response_code, response_code::OK);
        assert_eq!(response.data.unwrap(), data_bytes);
    }

    #[test]
    fn set_prop_value_sends_command_then_data() {
        let transport = FakeTransport::new();
        transport.push_inbound(ok_response(0));
        let engine = Engine::new(transport, registry(), EngineConfig::default());
        engine.open_session(1, &open_session_op()).unwrap();
        engine.transport.push_inbound(ok_response(1));

        let response = engine
            .execute(&set_prop_op(), &[0x500F], Some(vec![0x90, 0x01]), None)
            .unwrap();
        assert_eq!(response.response_code, response_code::OK);

        let sent = engine.transport.sent.lock().unwrap().clone();
        // sent[0] = OpenSession command, sent[1] = SetDevicePropValue command, sent[2] = DATA
        let data_container = Container::decode(&sent[2]).unwrap();
        assert_eq!(data_container.container_type, ContainerType::Data);
        assert_eq!(data_container.payload, vec![0x90, 0x01]);
    }

    #[test]
    fn transaction_ids_increment_across_calls() {
        let transport = FakeTransport::new();
        transport.push_inbound(ok_response(0));
        let engine = Engine::new(transport, registry(), EngineConfig::default());
        engine.open_session(1, &open_session_op()).unwrap();

        engine.transport.push_inbound(ok_response(1));
        engine.execute(&set_prop_op(), &[1], Some(vec![0]), None).unwrap();
        engine.transport.push_inbound(ok_response(2));
        engine.execute(&set_prop_op(), &[1], Some(vec![0]), None).unwrap();

        let sent = engine.transport.sent.lock().unwrap().clone();
        let first_cmd = Container::decode(&sent[1]).unwrap();
        let second_cmd = Container::decode(&sent[3]).unwrap();
        assert_eq!(first_cmd.transaction_id, 1);
        assert_eq!(second_cmd.transaction_id, 2);
    }

    #[test]
    fn stall_during_receive_triggers_recovery_then_succeeds() {
        let transport = FakeTransport::new();
        transport.push_inbound(ok_response(0));
        let engine = Engine::new(transport, registry(), EngineConfig::default());
        engine.open_session(1, &open_session_op()).unwrap();

        engine.transport.stall_next_receive_once();
        engine.transport.push_inbound(ok_response(1));

        let response = engine.execute(&set_prop_op(), &[1], Some(vec![0]), None).unwrap();
        assert_eq!(response.response_code, response_code::OK);
    }

    #[test]
    fn non_ok_response_surfaces_as_device_error_via_into_device_result() {
        let transport = FakeTransport::new();
        transport.push_inbound(ok_response(0));
        let engine = Engine::new(transport, registry(), EngineConfig::default());
        engine.open_session(1, &open_session_op()).unwrap();
        engine.transport.push_inbound(
            Container::response(response_code::SESSION_NOT_OPEN, 1, &[]).encode(),
        );

        let response = engine.execute(&set_prop_op(), &[1], Some(vec![0]), None).unwrap();
        let err = engine.into_device_result(response).unwrap_err();
        match err {
            PtpError::Device { code, name, .. } => {
                assert_eq!(code, response_code::SESSION_NOT_OPEN);
                assert_eq!(name, "SessionNotOpen");
            }
            _ => panic!("expected a device error"),
        }
    }
}
