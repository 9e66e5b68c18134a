//! # ptp-rs
//!
//! Host-side Picture Transfer Protocol (ISO 15740) library.
//!
//! This crate implements the transaction engine, container codec,
//! type/codec system, and operation/property registry a PTP host needs
//! to talk to a still-image camera, plus vendor overrides for Sony,
//! Canon, and Nikon. It does not enumerate USB devices, decode images,
//! or provide a UI — callers supply a [`transport::Transport`]
//! implementation (a `rusb`-backed one ships by default behind the
//! `rusb-transport` feature) and get back a typed [`camera::Camera`]
//! façade.
//!
//! ## Example
//!
//! ```no_run
//! use ptp_rs::camera::generic;
//! use ptp_rs::engine::EngineConfig;
//! use ptp_rs::transport::{DeviceSelector, RusbTransport};
//!
//! fn main() -> anyhow::Result<()> {
//!     let transport = RusbTransport::new()?;
//!     let camera = generic::camera(transport, EngineConfig::default())?;
//!     camera.connect(&DeviceSelector::default())?;
//!
//!     let battery = camera.get("BatteryLevel")?;
//!     println!("battery: {battery}");
//!
//!     camera.disconnect()?;
//!     Ok(())
//! }
//! ```

pub mod camera;
pub mod codec;
pub mod container;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod event_pump;
pub mod registry;
pub mod session;
pub mod transport;

pub use camera::{Camera, Vendor};
pub use codec::{CodecDefinition, Value};
pub use container::{Container, ContainerType};
pub use engine::{Engine, EngineConfig, EngineResponse};
pub use error::{PtpError, Result};
pub use event_pump::{EventHandlers, EventPump, PtpEvent};
pub use registry::{Registry, RegistryBuilder, RegistryView, VendorRegistry};
pub use transport::{DeviceSelector, Transport};

#[cfg(feature = "rusb-transport")]
pub use transport::RusbTransport;
