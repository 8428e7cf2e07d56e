//! Gateway configuration
//!
//! This module loads the JSON configuration file read at startup. It
//! includes:
//! - Radio parameters and host wiring (`SX127x_conf`)
//! - Gateway identity, status timing and forwarding servers (`gateway_conf`)
//!
//! Everything is validated here; the rest of the crate receives typed,
//! immutable values.

/// Configuration file format and validation
pub mod file;

pub use file::{Config, ConfigError, GatewayConf, RadioHardware};
