//! Semtech UDP gateway protocol, PUSH_DATA direction
//!
//! Every datagram starts with a 12-byte header:
//!
//! ```text
//!  0      1..=2   3          4..=11
//! +------+-------+----------+------------------+
//! | 0x01 | token | PUSH_DATA| gateway id (EUI) |
//! +------+-------+----------+------------------+
//! ```
//!
//! followed by a JSON object, either `{"rxpk":[...]}` for a received packet
//! or `{"stat":{...}}` for a status report. There is no length field; the
//! JSON runs to the end of the datagram.

use core::fmt;

use serde::Serialize;

use crate::radio::registers::FIFO_CAPACITY;

/// Uplink packet payload
pub mod rxpk;
/// Gateway status payload
pub mod stat;

pub use rxpk::{encode_uplink, Rxpk};
pub use stat::{encode_status, Stat};

/// Protocol version byte
pub const PROTOCOL_VERSION: u8 = 0x01;
/// Identifier of PUSH_DATA datagrams
pub const PKT_PUSH_DATA: u8 = 0x00;
/// Fixed header length in bytes
pub const HEADER_LEN: usize = 12;
/// Largest datagram the encoder will produce
pub const MAX_DATAGRAM_LEN: usize = 2048;
/// Room for the fixed `rxpk` keys and worst-case numeric field widths
const RXPK_FIELDS_OVERHEAD: usize = 256;

/// Encoded length of `n` bytes in padded base64
pub const fn base64_len(n: usize) -> usize {
    4 * ((n + 2) / 3)
}

// A full FIFO must always fit in one uplink datagram
const _: () = assert!(HEADER_LEN + base64_len(FIFO_CAPACITY) + RXPK_FIELDS_OVERHEAD <= MAX_DATAGRAM_LEN);

/// Errors while building a datagram
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON serialization failed
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    /// The encoded datagram exceeds [`MAX_DATAGRAM_LEN`]
    #[error("datagram of {len} bytes exceeds limit of {max}")]
    Oversize {
        /// Encoded length
        len: usize,
        /// Limit
        max: usize,
    },
}

/// 8-byte gateway identifier.
///
/// Built from a 6-byte MAC by inserting `FF FF` after the OUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayId([u8; 8]);

impl GatewayId {
    /// Expand a MAC address into a gateway id
    pub fn from_mac(mac: [u8; 6]) -> Self {
        Self([mac[0], mac[1], mac[2], 0xFF, 0xFF, mac[3], mac[4], mac[5]])
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Header of a PUSH_DATA datagram
pub fn push_data_header(token: u16, gateway_id: &GatewayId) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = PROTOCOL_VERSION;
    header[1..3].copy_from_slice(&token.to_be_bytes());
    header[3] = PKT_PUSH_DATA;
    header[4..].copy_from_slice(gateway_id.as_bytes());
    header
}

/// Header with a fresh random token, then the JSON body
fn build_datagram<T: Serialize>(gateway_id: &GatewayId, body: &T) -> Result<Vec<u8>, EncodeError> {
    let mut datagram = Vec::with_capacity(MAX_DATAGRAM_LEN);
    datagram.extend_from_slice(&push_data_header(rand::random(), gateway_id));
    serde_json::to_writer(&mut datagram, body)?;

    if datagram.len() > MAX_DATAGRAM_LEN {
        return Err(EncodeError::Oversize {
            len: datagram.len(),
            max: MAX_DATAGRAM_LEN,
        });
    }
    Ok(datagram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_id_from_mac() {
        let id = GatewayId::from_mac([0xb8, 0x27, 0xeb, 0x12, 0x34, 0x56]);
        assert_eq!(id.as_bytes(), &[0xb8, 0x27, 0xeb, 0xff, 0xff, 0x12, 0x34, 0x56]);
        assert_eq!(id.to_string(), "b8:27:eb:ff:ff:12:34:56");
    }

    #[test]
    fn test_header_layout() {
        let id = GatewayId::from_mac([1, 2, 3, 4, 5, 6]);
        let header = push_data_header(0xABCD, &id);
        assert_eq!(
            header,
            [0x01, 0xAB, 0xCD, 0x00, 1, 2, 3, 0xFF, 0xFF, 4, 5, 6]
        );
    }

    #[test]
    fn test_base64_len() {
        assert_eq!(base64_len(0), 0);
        assert_eq!(base64_len(1), 4);
        assert_eq!(base64_len(3), 4);
        assert_eq!(base64_len(4), 8);
        assert_eq!(base64_len(256), 344);
    }
}
