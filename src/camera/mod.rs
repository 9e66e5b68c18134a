//! Camera façade (component I, §4.I): wires a registry, a transaction
//! engine, and an event pump behind one typed `connect`/`disconnect`/
//! `send`/`get`/`set`/`on`/`off` contract.
//!
//! Vendor differences compose in rather than subclass: `Camera<T>` is
//! one concrete type for every vendor; a [`Vendor`] implementation
//! injected at construction overrides only the hooks that vendor needs
//! (connect-time handshake, event delivery, property read/write path).

pub mod canon;
pub mod generic;
pub mod nikon;
pub mod sony;

use std::sync::{Arc, Mutex};

use log::info;

use crate::codec::Value;
use crate::engine::{Engine, EngineConfig, EngineResponse};
use crate::error::{PtpError, Result, ValidationError};
use crate::event_pump::{EventHandler, EventHandlers, EventPump};
use crate::registry::{Access, OperationDefinition, RegistryView};
use crate::transport::{DeviceSelector, Transport};

/// Session ID the façade opens with unless overridden. Canon requires
/// exactly 1; every other vendor accepts any positive value, so this
/// default works everywhere (§3).
pub const DEFAULT_SESSION_ID: u32 = 1;

/// Vendor-specific hooks a [`Camera`] defers to around the shared
/// connect/get/set/event-delivery contract (§4.I). Every method carries
/// a generic-PTP default; a vendor overrides only what it needs to.
pub trait Vendor<T: Transport + 'static>: Send + Sync {
    /// Runs immediately after `OpenSession` succeeds: Sony's SDIO
    /// connect phases, Canon's `SetRemoteMode`/`SetEventMode`. Default:
    /// no-op.
    fn after_open_session(&self, _camera: &Camera<T>) -> Result<()> {
        Ok(())
    }

    /// Runs before the transport disconnects. Default: no-op.
    fn before_disconnect(&self, _camera: &Camera<T>) -> Result<()> {
        Ok(())
    }

    /// Builds the event pump this vendor delivers events through.
    /// Default: read the interrupt endpoint directly. Canon overrides
    /// this to poll `CanonGetEventData` instead (§4.H).
    fn build_event_pump(&self, camera: &Camera<T>) -> EventPump<T> {
        EventPump::interrupt(
            camera.engine.transport_handle(),
            Arc::clone(&camera.registry),
            camera.handlers.clone(),
            camera.config.default_timeout,
        )
    }

    /// Reads a property's current value. Default: `GetDevicePropValue`.
    fn get_property(&self, camera: &Camera<T>, property: &str) -> Result<Value> {
        camera.get_property_generic(property)
    }

    /// Writes a property's value. Default: `SetDevicePropValue`.
    fn set_property(&self, camera: &Camera<T>, property: &str, value: Value) -> Result<()> {
        camera.set_property_generic(property, value)
    }
}

/// The façade itself: one instance per camera connection. Generic over
/// `Transport` so the same type serves the shipped `RusbTransport` and
/// any test double.
pub struct Camera<T: Transport + 'static> {
    engine: Arc<Engine<T>>,
    registry: Arc<dyn RegistryView + Send + Sync>,
    handlers: EventHandlers,
    pump: Mutex<Option<Arc<EventPump<T>>>>,
    vendor: Arc<dyn Vendor<T>>,
    config: EngineConfig,
    session_id: u32,
}

impl<T: Transport + 'static> Camera<T> {
    pub fn new(
        transport: T,
        registry: Arc<dyn RegistryView + Send + Sync>,
        vendor: Arc<dyn Vendor<T>>,
        config: EngineConfig,
    ) -> Self {
        let engine = Arc::new(Engine::new(transport, Arc::clone(&registry), config.clone()));
        Self {
            engine,
            registry,
            handlers: EventHandlers::new(),
            pump: Mutex::new(None),
            vendor,
            config,
            session_id: DEFAULT_SESSION_ID,
        }
    }

    pub fn with_session_id(mut self, session_id: u32) -> Self {
        self.session_id = session_id;
        self
    }

    pub(crate) fn engine(&self) -> &Arc<Engine<T>> {
        &self.engine
    }

    pub(crate) fn registry(&self) -> &Arc<dyn RegistryView + Send + Sync> {
        &self.registry
    }

    pub(crate) fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn operation(&self, name: &str) -> Result<Arc<OperationDefinition>> {
        self.registry
            .operation(name)
            .ok_or_else(|| PtpError::Validation(ValidationError::UnknownSymbol(name.to_string())))
    }

    /// Opens the transport, issues `OpenSession`, runs the vendor's
    /// connect-time handshake, and starts the event pump (§4.I).
    pub fn connect(&self, selector: &DeviceSelector) -> Result<()> {
        self.engine.connect(selector)?;
        let open_session = self.operation("OpenSession")?;
        let response = self.engine.open_session(self.session_id, &open_session)?;
        self.engine.into_device_result(response)?;
        self.vendor.after_open_session(self)?;

        let pump = Arc::new(self.vendor.build_event_pump(self));
        pump.start();
        *self.pump.lock().unwrap() = Some(pump);

        info!("camera connected (session {})", self.session_id);
        Ok(())
    }

    /// Stops the event pump, closes the session, and closes the
    /// transport. `CloseSession` failures don't block tearing down the
    /// rest (§4.I).
    pub fn disconnect(&self) -> Result<()> {
        self.vendor.before_disconnect(self)?;

        if let Some(pump) = self.pump.lock().unwrap().take() {
            pump.stop();
        }
        if let Ok(close_session) = self.operation("CloseSession") {
            let _ = self.engine.close_session(&close_session);
        }
        self.engine.disconnect()
    }

    pub fn is_session_open(&self) -> bool {
        self.engine.is_session_open()
    }

    /// Executes an arbitrary operation by symbolic name (§4.I). `data`
    /// supplies the data-out phase's bytes; `max_data_len` caps the
    /// data-in phase's payload, guarding against a misbehaving device
    /// returning an unbounded transfer.
    pub fn send(
        &self,
        op_name: &str,
        params: &[u32],
        data: Option<Vec<u8>>,
        max_data_len: Option<usize>,
    ) -> Result<EngineResponse> {
        let op = self.operation(op_name)?;
        validate_get_partial_object_offset(&op, params)?;
        let response = self.engine.execute(&op, params, data, None)?;
        if let (Some(max), Some(bytes)) = (max_data_len, response.data.as_ref()) {
            if bytes.len() > max {
                return Err(PtpError::Validation(ValidationError::DataExceedsMaxLen {
                    max,
                    actual: bytes.len(),
                }));
            }
        }
        self.engine.into_device_result(response)
    }

    pub fn get(&self, property: &str) -> Result<Value> {
        self.vendor.get_property(self, property)
    }

    pub fn set(&self, property: &str, value: Value) -> Result<()> {
        self.vendor.set_property(self, property, value)
    }

    pub fn on(&self, event_name: &'static str, handler: EventHandler) {
        self.handlers.on(event_name, handler);
    }

    pub fn on_any(&self, handler: EventHandler) {
        self.handlers.on_any(handler);
    }

    pub fn off(&self, event_name: &'static str) {
        self.handlers.off(event_name);
    }

    /// `GetDevicePropValue` against the shared registry's codec for
    /// `property`. Vendors that read properties differently (Canon's
    /// event-cache, Sony's extended device info slice) override
    /// [`Vendor::get_property`] instead of calling this.
    pub(crate) fn get_property_generic(&self, property: &str) -> Result<Value> {
        let prop = self
            .registry
            .property(property)
            .ok_or_else(|| PtpError::Validation(ValidationError::UnknownSymbol(property.to_string())))?;
        let op = self.operation("GetDevicePropValue")?;
        let response = self.engine.execute(&op, &[prop.code as u32], None, None)?;
        let response = self.engine.into_device_result(response)?;
        let data = response.data.ok_or(PtpError::Validation(ValidationError::MissingParameter("data")))?;
        let (value, _) = prop.codec.decode(&data)?;
        Ok(value)
    }

    pub(crate) fn set_property_generic(&self, property: &str, value: Value) -> Result<()> {
        let prop = self
            .registry
            .property(property)
            .ok_or_else(|| PtpError::Validation(ValidationError::UnknownSymbol(property.to_string())))?;
        if prop.access == Access::Get {
            return Err(PtpError::Validation(ValidationError::NotWritable { name: prop.name }));
        }
        let bytes = prop.codec.encode(&value)?;
        let op = self.operation("SetDevicePropValue")?;
        let response = self.engine.execute(&op, &[prop.code as u32], Some(bytes), None)?;
        self.engine.into_device_result(response)?;
        Ok(())
    }
}

/// `GetPartialObject`'s `offset` parameter is a plain `u32` operation
/// parameter with no codec-level bound, so the engine happily sends
/// `0xFFFFFFFF` to the device. Spec §8 rejects offsets at and above
/// `2^32 - 1` before the transaction ever reaches the wire; this looks
/// up the parameter by name rather than hardcoding its position so the
/// check keeps working if the operation's parameter order changes.
fn validate_get_partial_object_offset(op: &OperationDefinition, params: &[u32]) -> Result<()> {
    if op.name != "GetPartialObject" {
        return Ok(());
    }
    let Some(index) = op.operation_parameters.iter().position(|p| p.name == "offset") else {
        return Ok(());
    };
    if let Some(&offset) = params.get(index) {
        if offset as u64 >= u32::MAX as u64 {
            return Err(PtpError::Validation(ValidationError::OffsetOutOfRange {
                offset: offset as u64,
                max: u32::MAX as u64 - 1,
            }));
        }
    }
    Ok(())
}
