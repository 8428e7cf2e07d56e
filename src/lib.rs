//! Single-channel LoRa packet forwarder
//!
//! This crate turns an SX1272 or SX1276 transceiver on an SPI bus into a
//! minimal LoRaWAN gateway. It listens on one frequency and spreading
//! factor and forwards every valid packet to one or more network servers
//! using the Semtech UDP protocol (PUSH_DATA).
//!
//! # Features
//! - SX1272/SX1276 detection by version register
//! - Register bus abstraction with an embedded-hal SPI implementation
//! - `rxpk` uplink and `stat` status datagrams
//! - Multiple servers, each resolved on every send
//! - No unsafe code
//!
//! # Example
//! ```no_run
//! use lora_forwarder::{
//!     config::Config,
//!     forward::UdpTransport,
//!     gateway::Gateway,
//!     identity::GatewayIdentity,
//! };
//!
//! # use lora_forwarder::radio::{BusError, RegisterBus};
//! # struct Bus;
//! # impl RegisterBus for Bus {
//! #     fn read_register(&mut self, _: u8) -> Result<u8, BusError> { Ok(0x22) }
//! #     fn write_register(&mut self, _: u8, _: u8) -> Result<(), BusError> { Ok(()) }
//! #     fn set_reset_line(&mut self, _: bool) -> Result<(), BusError> { Ok(()) }
//! #     fn read_interrupt_line(&mut self) -> Result<bool, BusError> { Ok(false) }
//! #     fn delay_ms(&mut self, _: u32) {}
//! # }
//! # fn open_bus() -> Bus { Bus }
//! # fn main() -> Result<(), lora_forwarder::GatewayError> {
//! let config = Config::load("global_conf.json")?;
//! let identity = GatewayIdentity::resolve(&config.gateway)?;
//!
//! let mut gateway = Gateway::start(open_bus(), UdpTransport::bind()?, &config, identity)?;
//! gateway.run()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Gateway configuration
pub mod config;

/// Crate error type
pub mod error;

/// Datagram delivery
pub mod forward;

/// Main loop
pub mod gateway;

/// Gateway identity
pub mod identity;

/// Semtech UDP protocol encoding
pub mod protocol;

/// Radio hardware abstraction layer
pub mod radio;

/// Packet counters
pub mod stats;

pub use error::GatewayError;
