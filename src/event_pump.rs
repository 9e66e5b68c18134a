//! Event pump (§4.H): a persistent interrupt-endpoint reader that
//! decodes EVENT containers and dispatches them to registered handlers.
//! Modeled on the teacher's `InterruptPoller` — an `Arc<AtomicBool>`
//! run flag, one transfer in flight at a time, `stop()` settable from
//! another thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::container::{Container, ContainerType};
use crate::registry::RegistryView;
use crate::transport::{Endpoint, Transport};

/// A decoded EVENT container: code, transaction ID (0 when the device
/// doesn't correlate it to a transaction), and raw u32 parameters.
/// Vendor façades reinterpret `params` against their own layout (Canon
/// packs `(property_code, value)` tuples) before handing events to
/// application handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtpEvent {
    pub code: u16,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

pub type EventHandler = Arc<dyn Fn(&PtpEvent) + Send + Sync>;

/// Registered handlers, keyed by event symbolic name. `*` (via
/// [`EventHandlers::on_any`]) receives every event regardless of code.
#[derive(Default, Clone)]
pub struct EventHandlers {
    inner: Arc<Mutex<HashMap<&'static str, Vec<EventHandler>>>>,
    any: Arc<Mutex<Vec<EventHandler>>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event_name: &'static str, handler: EventHandler) {
        self.inner.lock().unwrap().entry(event_name).or_default().push(handler);
    }

    pub fn on_any(&self, handler: EventHandler) {
        self.any.lock().unwrap().push(handler);
    }

    pub fn off(&self, event_name: &'static str) {
        self.inner.lock().unwrap().remove(event_name);
    }

    /// Invoked by the pump once per decoded event. Handlers for a
    /// single event fire sequentially, in registration order (§5).
    fn dispatch(&self, name: Option<&'static str>, event: &PtpEvent) {
        if let Some(name) = name {
            if let Some(handlers) = self.inner.lock().unwrap().get(name) {
                for handler in handlers {
                    handler(event);
                }
            }
        }
        for handler in self.any.lock().unwrap().iter() {
            handler(event);
        }
    }
}

/// Source of events fed to the pump's dispatch loop: either the
/// interrupt endpoint directly, or a fixed-interval poll of a vendor
/// operation (Canon EOS cameras, which emit no interrupt traffic).
enum Source<T: Transport> {
    Interrupt { transport: Arc<T>, timeout: Duration },
    Poll { poll: Arc<dyn Fn() -> crate::error::Result<Vec<PtpEvent>> + Send + Sync>, interval: Duration },
}

/// Drives one interrupt-endpoint (or polling) read loop per camera
/// connection. `start` spawns the loop on its own thread; `stop` sets
/// the run flag and clears the interrupt halt to unblock a pending
/// read, matching the teacher's `InterruptPoller::stop`.
pub struct EventPump<T: Transport> {
    source: Source<T>,
    registry: Arc<dyn RegistryView + Send + Sync>,
    handlers: EventHandlers,
    running: Arc<AtomicBool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport + 'static> EventPump<T> {
    /// Reads one interrupt container at a time from `transport`.
    pub fn interrupt(
        transport: Arc<T>,
        registry: Arc<dyn RegistryView + Send + Sync>,
        handlers: EventHandlers,
        timeout: Duration,
    ) -> Self {
        Self {
            source: Source::Interrupt { transport, timeout },
            registry,
            handlers,
            running: Arc::new(AtomicBool::new(false)),
            join: Mutex::new(None),
        }
    }

    /// Polls `poll` (typically `CanonGetEventData`) at `interval`
    /// instead of reading the interrupt endpoint. Returned events are
    /// dispatched identically to interrupt-originated ones (§4.H).
    pub fn polling(
        poll: Arc<dyn Fn() -> crate::error::Result<Vec<PtpEvent>> + Send + Sync>,
        interval: Duration,
        registry: Arc<dyn RegistryView + Send + Sync>,
        handlers: EventHandlers,
    ) -> Self {
        Self {
            source: Source::Poll { poll, interval },
            registry,
            handlers,
            running: Arc::new(AtomicBool::new(false)),
            join: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let pump = Arc::clone(self);
        let handle = std::thread::spawn(move || pump.run());
        *self.join.lock().unwrap() = Some(handle);
    }

    /// Stops the pump. For the interrupt source, clears the halt to
    /// force the pending read to return so the loop can observe the
    /// flag and exit (§4.H cancellation).
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Source::Interrupt { transport, .. } = &self.source {
            let _ = transport.clear_halt(Endpoint::Interrupt);
        }
        if let Some(handle) = self.join.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    fn run(&self) {
        match &self.source {
            Source::Interrupt { transport, timeout } => self.run_interrupt(transport, *timeout),
            Source::Poll { poll, interval } => self.run_poll(poll, *interval),
        }
    }

    fn run_interrupt(&self, transport: &Arc<T>, timeout: Duration) {
        while self.running.load(Ordering::SeqCst) {
            match transport.read_event(timeout) {
                Ok(Some(bytes)) => self.decode_and_dispatch(&bytes),
                Ok(None) => continue,
                Err(e) => {
                    warn!("event pump interrupt read failed, stopping: {e}");
                    self.running.store(false, Ordering::SeqCst);
                }
            }
        }
    }

    fn run_poll(&self, poll: &Arc<dyn Fn() -> crate::error::Result<Vec<PtpEvent>> + Send + Sync>, interval: Duration) {
        while self.running.load(Ordering::SeqCst) {
            match poll() {
                Ok(events) => {
                    for event in events {
                        self.dispatch(event);
                    }
                }
                Err(e) => warn!("event poll failed: {e}"),
            }
            std::thread::sleep(interval);
        }
    }

    /// Parse failures never propagate to handlers (§4.H); they are
    /// logged and the pump continues.
    fn decode_and_dispatch(&self, bytes: &[u8]) {
        let container = match Container::decode(bytes) {
            Ok(c) => c,
            Err(e) => {
                warn!("malformed EVENT container, discarding: {e}");
                return;
            }
        };
        if container.container_type != ContainerType::Event {
            debug!("expected an EVENT container on the interrupt endpoint, got {:?}", container.container_type);
            return;
        }
        self.dispatch(PtpEvent {
            code: container.code,
            transaction_id: container.transaction_id,
            params: container.params(),
        });
    }

    fn dispatch(&self, event: PtpEvent) {
        let name = self.registry.event_by_code(event.code).map(|def| def.name);
        self.handlers.dispatch(name, &event);
    }
}

impl<T: Transport> Drop for EventPump<T> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
