//! SX127x register map
//!
//! Register addresses are shared by the SX1272 and SX1276. The modem
//! configuration registers are not: field positions differ between the two
//! variants, so their bitfields live in the [`sx1272`] and [`sx1276`]
//! submodules.

#![allow(missing_docs)]

/// Crystal oscillator frequency in Hz
pub const FXOSC: u64 = 32_000_000;
/// Frequency synthesizer step is FXOSC / 2^19
pub const FSTEP_SHIFT: u32 = 19;
/// Capacity of the on-chip FIFO in bytes
pub const FIFO_CAPACITY: usize = 256;

pub const REG_FIFO: u8 = 0x00;
pub const REG_OP_MODE: u8 = 0x01;
pub const REG_FRF_MSB: u8 = 0x06;
pub const REG_FRF_MID: u8 = 0x07;
pub const REG_FRF_LSB: u8 = 0x08;
pub const REG_LNA: u8 = 0x0C;
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
pub const REG_IRQ_FLAGS: u8 = 0x12;
pub const REG_RX_NB_BYTES: u8 = 0x13;
pub const REG_PKT_SNR_VALUE: u8 = 0x19;
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;
pub const REG_SYMB_TIMEOUT_LSB: u8 = 0x1F;
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
pub const REG_MAX_PAYLOAD_LENGTH: u8 = 0x23;
pub const REG_HOP_PERIOD: u8 = 0x24;
pub const REG_MODEM_CONFIG_3: u8 = 0x26;
pub const REG_SYNC_WORD: u8 = 0x39;
pub const REG_VERSION: u8 = 0x42;

// RegOpMode
pub const MODE_LONG_RANGE_MODE: u8 = 0x80;
pub const MODE_SLEEP: u8 = 0x00;
pub const MODE_RX_CONTINUOUS: u8 = 0x05;

// RegIrqFlags, write 1 to clear
pub const IRQ_PAYLOAD_CRC_ERROR_MASK: u8 = 0x20;
pub const IRQ_RX_DONE_MASK: u8 = 0x40;

// RegLna: G1 (max gain), default LNA boost current
pub const LNA_MAX_GAIN: u8 = 0x23;

// RegPktSnrValue: two's complement, quarter-dB units
pub const SNR_SIGN_BIT: u8 = 0x80;

/// LoRaWAN public network sync word
pub const SYNC_WORD_LORAWAN: u8 = 0x34;

/// Symbol timeout for SF10-SF12
pub const SYMB_TIMEOUT_LONG_SYMBOL: u8 = 0x05;
/// Symbol timeout for SF7-SF9
pub const SYMB_TIMEOUT_SHORT_SYMBOL: u8 = 0x08;

pub const MAX_PAYLOAD_LENGTH: u8 = 0x80;
pub const PAYLOAD_LENGTH: u8 = 0x40;
/// Frequency hopping disabled period
pub const HOP_PERIOD_MAX: u8 = 0xFF;

/// Spreading factor field, bits 7-4 of RegModemConfig2 on both variants
pub const MC2_SF_SHIFT: u8 = 4;

/// SX1272 field layout
pub mod sx1272 {
    /// RegVersion signature
    pub const VERSION: u8 = 0x22;
    /// Packet RSSI offset in dB
    pub const RSSI_CORRECTION: i16 = 139;

    // RegModemConfig1
    pub const MC1_BW_SHIFT: u8 = 6;
    pub const MC1_BW_125: u8 = 0b00;
    pub const MC1_BW_250: u8 = 0b01;
    pub const MC1_BW_500: u8 = 0b10;
    pub const MC1_CR_SHIFT: u8 = 3;
    pub const MC1_CR_4_5: u8 = 0b001;
    pub const MC1_RX_PAYLOAD_CRC_ON: u8 = 0x02;
    pub const MC1_LOW_DATA_RATE_OPTIMIZE: u8 = 0x01;

    // RegModemConfig2
    pub const MC2_AGC_AUTO_ON: u8 = 0x04;
}

/// SX1276/77/78/79 field layout
pub mod sx1276 {
    /// RegVersion signature
    pub const VERSION: u8 = 0x12;
    /// Packet RSSI offset in dB (HF port)
    pub const RSSI_CORRECTION: i16 = 157;

    // RegModemConfig1
    pub const MC1_BW_SHIFT: u8 = 4;
    pub const MC1_BW_125: u8 = 0b0111;
    pub const MC1_BW_250: u8 = 0b1000;
    pub const MC1_BW_500: u8 = 0b1001;
    pub const MC1_CR_SHIFT: u8 = 1;
    pub const MC1_CR_4_5: u8 = 0b001;

    // RegModemConfig2
    pub const MC2_RX_PAYLOAD_CRC_ON: u8 = 0x04;

    // RegModemConfig3
    pub const MC3_LOW_DATA_RATE_OPTIMIZE: u8 = 0x08;
    pub const MC3_AGC_AUTO_ON: u8 = 0x04;
}

/// Lowest carrier both variants tune to, in Hz
pub const MIN_FREQUENCY: u32 = 137_000_000;
/// Highest carrier both variants tune to, in Hz
pub const MAX_FREQUENCY: u32 = 1_020_000_000;

/// Whether `frequency` Hz lies in the tunable band
pub fn frequency_in_range(frequency: u32) -> bool {
    (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency)
}

/// 24-bit synthesizer word for `frequency` Hz, rounded to the nearest step
pub fn frequency_word(frequency: u32) -> u32 {
    let scaled = (frequency as u64) << FSTEP_SHIFT;
    ((scaled + FXOSC / 2) / FXOSC) as u32
}

/// Split a synthesizer word into its MSB, MID and LSB register bytes
pub fn frequency_bytes(word: u32) -> [u8; 3] {
    [(word >> 16) as u8, (word >> 8) as u8, word as u8]
}
