use core::fmt;

/// Failure on the register bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// SPI transfer error
    #[error("SPI transfer failed")]
    Spi,
    /// GPIO error
    #[error("GPIO access failed")]
    Gpio,
}

/// Register-level access to the transceiver.
///
/// Every register access is one 2-byte transaction on the wire: an address
/// byte (bit 7 clear for read, set for write) followed by the data byte.
pub trait RegisterBus {
    /// Read a single register
    fn read_register(&mut self, addr: u8) -> Result<u8, BusError>;

    /// Write a single register
    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), BusError>;

    /// Drive the reset line. Buses without a wired reset ignore this.
    fn set_reset_line(&mut self, high: bool) -> Result<(), BusError>;

    /// Sample the RX-done interrupt line (DIO0)
    fn read_interrupt_line(&mut self) -> Result<bool, BusError>;

    /// Block for `ms` milliseconds, used to time reset pulses
    fn delay_ms(&mut self, ms: u32);
}

/// LoRa spreading factor (SF7-SF12)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SpreadingFactor {
    /// SF7
    SF7 = 7,
    /// SF8
    SF8 = 8,
    /// SF9
    SF9 = 9,
    /// SF10
    SF10 = 10,
    /// SF11
    SF11 = 11,
    /// SF12
    SF12 = 12,
}

impl SpreadingFactor {
    /// All supported factors, lowest first
    pub const ALL: [SpreadingFactor; 6] = [
        SpreadingFactor::SF7,
        SpreadingFactor::SF8,
        SpreadingFactor::SF9,
        SpreadingFactor::SF10,
        SpreadingFactor::SF11,
        SpreadingFactor::SF12,
    ];

    /// Numeric value (7-12)
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Low data rate optimization is mandated by the chip at SF11 and SF12
    pub fn requires_low_data_rate_optimize(self) -> bool {
        matches!(self, SpreadingFactor::SF11 | SpreadingFactor::SF12)
    }

    /// Long-symbol factors use the short symbol timeout
    pub fn is_long_symbol(self) -> bool {
        self >= SpreadingFactor::SF10
    }
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            7 => Ok(SpreadingFactor::SF7),
            8 => Ok(SpreadingFactor::SF8),
            9 => Ok(SpreadingFactor::SF9),
            10 => Ok(SpreadingFactor::SF10),
            11 => Ok(SpreadingFactor::SF11),
            12 => Ok(SpreadingFactor::SF12),
            other => Err(other),
        }
    }
}

/// Channel bandwidth, restricted to the set both chip variants support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    /// 125 kHz
    Khz125,
    /// 250 kHz
    Khz250,
    /// 500 kHz
    Khz500,
}

impl Bandwidth {
    /// Width in kHz
    pub fn khz(self) -> u16 {
        match self {
            Bandwidth::Khz125 => 125,
            Bandwidth::Khz250 => 250,
            Bandwidth::Khz500 => 500,
        }
    }
}

impl TryFrom<u32> for Bandwidth {
    type Error = u32;

    fn try_from(khz: u32) -> Result<Self, Self::Error> {
        match khz {
            125 => Ok(Bandwidth::Khz125),
            250 => Ok(Bandwidth::Khz250),
            500 => Ok(Bandwidth::Khz500),
            other => Err(other),
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.khz())
    }
}

/// Receive parameters programmed at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioConfig {
    /// Center frequency in Hz
    pub frequency: u32,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Bandwidth
    pub bandwidth: Bandwidth,
    /// Read back configuration-critical registers after writing them
    pub verify_writes: bool,
}

impl RadioConfig {
    /// Create a receive configuration with write verification off
    pub fn new(frequency: u32, spreading_factor: SpreadingFactor, bandwidth: Bandwidth) -> Self {
        Self {
            frequency,
            spreading_factor,
            bandwidth,
            verify_writes: false,
        }
    }

    /// Data rate identifier as used on the wire, e.g. `SF7BW125`
    pub fn data_rate(&self) -> String {
        format!("SF{}BW{}", self.spreading_factor.value(), self.bandwidth)
    }

    /// Center frequency in MHz
    pub fn frequency_mhz(&self) -> f64 {
        self.frequency as f64 / 1_000_000.0
    }
}
