use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use super::{build_datagram, EncodeError, GatewayId};
use crate::radio::{LinkQuality, RadioConfig, ReceivedFrame};

/// Modulation tag for LoRa packets
pub const MODULATION_LORA: &str = "LORA";
/// Coding rate the radio is programmed with
pub const CODING_RATE: &str = "4/5";
/// CRC status: payload CRC checked and valid
pub const STAT_CRC_OK: u8 = 1;

/// One entry of the `rxpk` array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rxpk {
    /// Capture time in microseconds, wrapping at 32 bits
    pub tmst: u32,
    /// Center frequency in MHz
    pub freq: f64,
    /// IF channel, always 0 on a single-channel gateway
    pub chan: u8,
    /// RF chain, always 0
    pub rfch: u8,
    /// CRC status
    pub stat: u8,
    /// Modulation
    pub modu: &'static str,
    /// Data rate, e.g. `SF7BW125`
    pub datr: String,
    /// Coding rate
    pub codr: &'static str,
    /// RSSI in dBm
    pub rssi: i16,
    /// SNR in dB
    pub lsnr: f64,
    /// Payload size in bytes
    pub size: usize,
    /// Base64 payload
    pub data: String,
}

impl Rxpk {
    /// Describe `frame` as received with `radio` settings
    pub fn new(frame: &ReceivedFrame, quality: LinkQuality, radio: &RadioConfig) -> Self {
        Self {
            tmst: frame.timestamp_us as u32,
            freq: radio.frequency_mhz(),
            chan: 0,
            rfch: 0,
            stat: STAT_CRC_OK,
            modu: MODULATION_LORA,
            datr: radio.data_rate(),
            codr: CODING_RATE,
            rssi: quality.rssi,
            lsnr: quality.snr as f64,
            size: frame.len(),
            data: STANDARD.encode(&frame.payload[..]),
        }
    }
}

#[derive(Serialize)]
struct RxpkBody<'a> {
    rxpk: [&'a Rxpk; 1],
}

/// Build the PUSH_DATA datagram carrying one received packet
pub fn encode_uplink(
    gateway_id: &GatewayId,
    frame: &ReceivedFrame,
    quality: LinkQuality,
    radio: &RadioConfig,
) -> Result<Vec<u8>, EncodeError> {
    let rxpk = Rxpk::new(frame, quality, radio);
    build_datagram(gateway_id, &RxpkBody { rxpk: [&rxpk] })
}
