use std::io;

use crate::config::ConfigError;
use crate::forward::ForwardError;
use crate::protocol::EncodeError;
use crate::radio::RadioError;

/// Gateway error type
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Radio layer error
    #[error("radio: {0}")]
    Radio(#[from] RadioError),
    /// Datagram could not be built
    #[error("encode: {0}")]
    Encode(#[from] EncodeError),
    /// Datagram could not be delivered
    #[error("forward: {0}")]
    Forward(#[from] ForwardError),
    /// Invalid configuration
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// Socket setup failed
    #[error("socket: {0}")]
    Io(#[from] io::Error),
}
