//! Link quality of a received packet
//!
//! Pure conversions from the raw RegPktSnrValue / RegPktRssiValue bytes.

use super::registers::SNR_SIGN_BIT;
use super::sx127x::ChipVariant;

/// Signal quality of a single received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkQuality {
    /// Signal to noise ratio in dB
    pub snr: i8,
    /// Corrected packet RSSI in dBm
    pub rssi: i16,
}

/// Decode the packet SNR register.
///
/// The register holds SNR x 4 with the sign in bit 7. A negative value is
/// negated as a full byte before the divide, so `0x84` yields -31.
pub fn decode_snr(raw: u8) -> i8 {
    if raw & SNR_SIGN_BIT != 0 {
        let magnitude = (!raw).wrapping_add(1) >> 2;
        -(magnitude as i8)
    } else {
        ((raw & 0x7F) >> 2) as i8
    }
}

/// Packet RSSI in dBm: the raw register minus the variant's offset
pub fn decode_rssi(raw: u8, variant: ChipVariant) -> i16 {
    raw as i16 - variant.rssi_correction()
}

/// Derive SNR and RSSI from the raw status registers
pub fn extract_quality(raw_snr: u8, raw_rssi: u8, variant: ChipVariant) -> LinkQuality {
    LinkQuality {
        snr: decode_snr(raw_snr),
        rssi: decode_rssi(raw_rssi, variant),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snr_positive() {
        assert_eq!(decode_snr(0x05), 1);
        assert_eq!(decode_snr(0x28), 10);
        assert_eq!(decode_snr(0x7F), 31);
    }

    #[test]
    fn test_snr_negative() {
        assert_eq!(decode_snr(0x84), -31);
        assert_eq!(decode_snr(0xFC), -1);
        assert_eq!(decode_snr(0xD8), -10);
        assert_eq!(decode_snr(0x80), -32);
    }

    #[test]
    fn test_rssi_correction() {
        assert_eq!(decode_rssi(100, ChipVariant::Sx1272), -39);
        assert_eq!(decode_rssi(100, ChipVariant::Sx1276), -57);
        assert_eq!(decode_rssi(0, ChipVariant::Sx1276), -157);
    }

    #[test]
    fn test_extract_quality() {
        let quality = extract_quality(0x84, 100, ChipVariant::Sx1272);
        assert_eq!(quality, LinkQuality { snr: -31, rssi: -39 });
    }
}
