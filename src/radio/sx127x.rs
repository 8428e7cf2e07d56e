use std::time::Instant;

use heapless::Vec;
use log::{debug, info, warn};

use crate::radio::quality::{extract_quality, LinkQuality};
use crate::radio::registers::*;
use crate::radio::traits::{Bandwidth, BusError, RadioConfig, RegisterBus, SpreadingFactor};
use crate::stats::Counters;

/// Hold time for each edge of the reset pulse
const RESET_HOLD_MS: u32 = 100;

/// Possible errors in radio operations
#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    /// Register bus failure
    #[error(transparent)]
    Bus(#[from] BusError),
    /// Neither version signature matched after two reset attempts
    #[error("unrecognized transceiver, version register 0x{version:02X}")]
    UnrecognizedHardware {
        /// Last value read from RegVersion
        version: u8,
    },
    /// Configuration attempted before the chip variant is known
    #[error("transceiver not identified")]
    NotIdentified,
    /// A configuration register did not hold the value written to it
    #[error("register 0x{register:02X} reads back 0x{actual:02X}, wrote 0x{expected:02X}")]
    VerifyFailed {
        /// Register address
        register: u8,
        /// Value written
        expected: u8,
        /// Value read back
        actual: u8,
    },
    /// Carrier outside the tunable band
    #[error("frequency {0} Hz outside {} to {} Hz", MIN_FREQUENCY, MAX_FREQUENCY)]
    InvalidFrequency(u32),
}

/// Supported silicon revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipVariant {
    /// SX1272
    Sx1272,
    /// SX1276 and pin-compatible parts (RFM95)
    Sx1276,
}

impl ChipVariant {
    /// Value of RegVersion identifying this variant
    pub fn version_signature(self) -> u8 {
        match self {
            ChipVariant::Sx1272 => sx1272::VERSION,
            ChipVariant::Sx1276 => sx1276::VERSION,
        }
    }

    /// Offset subtracted from RegPktRssiValue
    pub fn rssi_correction(self) -> i16 {
        match self {
            ChipVariant::Sx1272 => sx1272::RSSI_CORRECTION,
            ChipVariant::Sx1276 => sx1276::RSSI_CORRECTION,
        }
    }

    /// Part name for logs
    pub fn name(self) -> &'static str {
        match self {
            ChipVariant::Sx1272 => "SX1272",
            ChipVariant::Sx1276 => "SX1276",
        }
    }

    /// Modem configuration register values: coding rate 4/5, explicit
    /// header, payload CRC on, AGC auto, and low data rate optimization
    /// whenever the spreading factor mandates it.
    pub fn modem_config(self, sf: SpreadingFactor, bw: Bandwidth) -> ModemConfig {
        let ldro = sf.requires_low_data_rate_optimize();
        let sf_field = sf.value() << MC2_SF_SHIFT;

        match self {
            ChipVariant::Sx1272 => {
                let bw_field = match bw {
                    Bandwidth::Khz125 => sx1272::MC1_BW_125,
                    Bandwidth::Khz250 => sx1272::MC1_BW_250,
                    Bandwidth::Khz500 => sx1272::MC1_BW_500,
                };
                let mut config_1 = (bw_field << sx1272::MC1_BW_SHIFT)
                    | (sx1272::MC1_CR_4_5 << sx1272::MC1_CR_SHIFT)
                    | sx1272::MC1_RX_PAYLOAD_CRC_ON;
                if ldro {
                    config_1 |= sx1272::MC1_LOW_DATA_RATE_OPTIMIZE;
                }
                ModemConfig {
                    config_1,
                    config_2: sf_field | sx1272::MC2_AGC_AUTO_ON,
                    config_3: None,
                }
            }
            ChipVariant::Sx1276 => {
                let bw_field = match bw {
                    Bandwidth::Khz125 => sx1276::MC1_BW_125,
                    Bandwidth::Khz250 => sx1276::MC1_BW_250,
                    Bandwidth::Khz500 => sx1276::MC1_BW_500,
                };
                let mut config_3 = sx1276::MC3_AGC_AUTO_ON;
                if ldro {
                    config_3 |= sx1276::MC3_LOW_DATA_RATE_OPTIMIZE;
                }
                ModemConfig {
                    config_1: (bw_field << sx1276::MC1_BW_SHIFT)
                        | (sx1276::MC1_CR_4_5 << sx1276::MC1_CR_SHIFT),
                    config_2: sf_field | sx1276::MC2_RX_PAYLOAD_CRC_ON,
                    config_3: Some(config_3),
                }
            }
        }
    }
}

/// Values for RegModemConfig1..3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModemConfig {
    /// RegModemConfig1
    pub config_1: u8,
    /// RegModemConfig2
    pub config_2: u8,
    /// RegModemConfig3, SX1276 only
    pub config_3: Option<u8>,
}

impl ModemConfig {
    /// Whether low data rate optimization is set for `variant`
    pub fn low_data_rate_optimize(&self, variant: ChipVariant) -> bool {
        match variant {
            ChipVariant::Sx1272 => self.config_1 & sx1272::MC1_LOW_DATA_RATE_OPTIMIZE != 0,
            ChipVariant::Sx1276 => self
                .config_3
                .map_or(false, |c| c & sx1276::MC3_LOW_DATA_RATE_OPTIMIZE != 0),
        }
    }
}

/// A packet pulled out of the FIFO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Payload bytes
    pub payload: Vec<u8, FIFO_CAPACITY>,
    /// Raw RegPktRssiValue
    pub raw_rssi: u8,
    /// Raw RegPktSnrValue
    pub raw_snr: u8,
    /// Capture time, microseconds since the driver was created
    pub timestamp_us: u64,
}

impl ReceivedFrame {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Decoded SNR and RSSI
    pub fn quality(&self, variant: ChipVariant) -> LinkQuality {
        extract_quality(self.raw_snr, self.raw_rssi, variant)
    }
}

/// SX1272/SX1276 receive driver
pub struct Sx127x<B: RegisterBus> {
    bus: B,
    variant: Option<ChipVariant>,
    epoch: Instant,
}

impl<B: RegisterBus> Sx127x<B> {
    /// Create a driver over `bus`. The chip is not touched until
    /// [`identify`](Self::identify).
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            variant: None,
            epoch: Instant::now(),
        }
    }

    /// Detected chip variant, if identification has run
    pub fn variant(&self) -> Option<ChipVariant> {
        self.variant
    }

    /// Shared access to the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Exclusive access to the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, RadioError> {
        Ok(self.bus.read_register(addr)?)
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), RadioError> {
        Ok(self.bus.write_register(addr, value)?)
    }

    /// Write a register and, when `verify` is set, read it back
    fn write_config(&mut self, addr: u8, value: u8, verify: bool) -> Result<(), RadioError> {
        self.write_register(addr, value)?;
        if verify {
            let actual = self.read_register(addr)?;
            if actual != value {
                return Err(RadioError::VerifyFailed {
                    register: addr,
                    expected: value,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Set operating mode, always in LoRa mode
    fn set_mode(&mut self, mode: u8) -> Result<(), RadioError> {
        self.write_register(REG_OP_MODE, MODE_LONG_RANGE_MODE | mode)
    }

    /// Drive reset to `first`, then `second`, holding each level
    fn pulse_reset(&mut self, first: bool, second: bool) -> Result<(), RadioError> {
        self.bus.set_reset_line(first)?;
        self.bus.delay_ms(RESET_HOLD_MS);
        self.bus.set_reset_line(second)?;
        self.bus.delay_ms(RESET_HOLD_MS);
        Ok(())
    }

    /// Reset the chip and match RegVersion against the known signatures.
    ///
    /// The SX1272 resets on a high pulse and the SX1276 on a low one, so the
    /// second attempt inverts the pulse.
    pub fn identify(&mut self) -> Result<ChipVariant, RadioError> {
        self.pulse_reset(true, false)?;
        let mut version = self.read_register(REG_VERSION)?;

        let variant = if version == ChipVariant::Sx1272.version_signature() {
            ChipVariant::Sx1272
        } else {
            self.pulse_reset(false, true)?;
            version = self.read_register(REG_VERSION)?;
            if version == ChipVariant::Sx1276.version_signature() {
                ChipVariant::Sx1276
            } else {
                return Err(RadioError::UnrecognizedHardware { version });
            }
        };

        info!("{} detected, starting", variant.name());
        self.variant = Some(variant);
        Ok(variant)
    }

    /// Program frequency and modem settings, then enter continuous receive
    pub fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
        let variant = self.variant.ok_or(RadioError::NotIdentified)?;
        let verify = config.verify_writes;
        if !frequency_in_range(config.frequency) {
            return Err(RadioError::InvalidFrequency(config.frequency));
        }

        // Frequency and modem registers only change in sleep
        self.set_mode(MODE_SLEEP)?;

        let [msb, mid, lsb] = frequency_bytes(frequency_word(config.frequency));
        self.write_config(REG_FRF_MSB, msb, verify)?;
        self.write_config(REG_FRF_MID, mid, verify)?;
        self.write_config(REG_FRF_LSB, lsb, verify)?;

        self.write_config(REG_SYNC_WORD, SYNC_WORD_LORAWAN, verify)?;

        let modem = variant.modem_config(config.spreading_factor, config.bandwidth);
        if let Some(config_3) = modem.config_3 {
            self.write_config(REG_MODEM_CONFIG_3, config_3, verify)?;
        }
        self.write_config(REG_MODEM_CONFIG_1, modem.config_1, verify)?;
        self.write_config(REG_MODEM_CONFIG_2, modem.config_2, verify)?;

        let symb_timeout = if config.spreading_factor.is_long_symbol() {
            SYMB_TIMEOUT_LONG_SYMBOL
        } else {
            SYMB_TIMEOUT_SHORT_SYMBOL
        };
        self.write_register(REG_SYMB_TIMEOUT_LSB, symb_timeout)?;
        self.write_register(REG_MAX_PAYLOAD_LENGTH, MAX_PAYLOAD_LENGTH)?;
        self.write_register(REG_PAYLOAD_LENGTH, PAYLOAD_LENGTH)?;
        self.write_register(REG_HOP_PERIOD, HOP_PERIOD_MAX)?;

        let rx_base = self.read_register(REG_FIFO_RX_BASE_ADDR)?;
        self.write_register(REG_FIFO_ADDR_PTR, rx_base)?;

        self.write_register(REG_LNA, LNA_MAX_GAIN)?;
        self.set_mode(MODE_RX_CONTINUOUS)?;

        debug!(
            "modem config {:02X} {:02X} {:?}, frf {:02X}{:02X}{:02X}",
            modem.config_1, modem.config_2, modem.config_3, msb, mid, lsb
        );
        Ok(())
    }

    /// Check DIO0 and, if a packet is waiting, pull it out of the FIFO.
    ///
    /// Returns `Ok(None)` when nothing arrived and when the packet failed
    /// its CRC; only the counters tell the two apart.
    pub fn poll_frame(
        &mut self,
        counters: &mut Counters,
    ) -> Result<Option<ReceivedFrame>, RadioError> {
        if !self.bus.read_interrupt_line()? {
            return Ok(None);
        }

        self.write_register(REG_IRQ_FLAGS, IRQ_RX_DONE_MASK)?;
        let irq_flags = self.read_register(REG_IRQ_FLAGS)?;
        counters.record_received();

        if irq_flags & IRQ_PAYLOAD_CRC_ERROR_MASK != 0 {
            warn!("CRC error, packet dropped");
            self.write_register(REG_IRQ_FLAGS, IRQ_PAYLOAD_CRC_ERROR_MASK)?;
            return Ok(None);
        }
        counters.record_accepted();

        let timestamp_us = self.epoch.elapsed().as_micros() as u64;
        let payload = self.read_fifo()?;
        debug!("rx data size {}", payload.len());

        let raw_snr = self.read_register(REG_PKT_SNR_VALUE)?;
        let raw_rssi = self.read_register(REG_PKT_RSSI_VALUE)?;

        Ok(Some(ReceivedFrame {
            payload,
            raw_rssi,
            raw_snr,
            timestamp_us,
        }))
    }

    /// Read the last received packet, one register transaction per byte.
    /// RegRxNbBytes is 8 bits wide, so the FIFO-sized buffer always fits.
    fn read_fifo(&mut self) -> Result<Vec<u8, FIFO_CAPACITY>, RadioError> {
        let current_addr = self.read_register(REG_FIFO_RX_CURRENT_ADDR)?;
        let len = self.read_register(REG_RX_NB_BYTES)?;
        self.write_register(REG_FIFO_ADDR_PTR, current_addr)?;

        (0..len).map(|_| self.read_register(REG_FIFO)).collect()
    }
}
