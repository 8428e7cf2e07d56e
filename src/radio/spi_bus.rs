use embedded_hal::{
    blocking::{
        delay::DelayMs,
        spi::{Transfer, Write},
    },
    digital::v2::{InputPin, OutputPin},
};

use crate::radio::traits::{BusError, RegisterBus};

/// Register bus over blocking SPI with a GPIO chip select
pub struct SpiRegisterBus<SPI, CS, RESET, DIO0, D>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DIO0: InputPin,
    D: DelayMs<u32>,
{
    spi: SPI,
    cs: CS,
    reset: Option<RESET>,
    dio0: DIO0,
    delay: D,
}

impl<SPI, CS, RESET, DIO0, D> SpiRegisterBus<SPI, CS, RESET, DIO0, D>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DIO0: InputPin,
    D: DelayMs<u32>,
{
    /// Create the bus. `reset` is `None` when the reset pin is not wired.
    pub fn new(spi: SPI, mut cs: CS, reset: Option<RESET>, dio0: DIO0, delay: D) -> Result<Self, BusError> {
        // Deselect until the first transaction
        cs.set_high().map_err(|_| BusError::Gpio)?;
        Ok(Self {
            spi,
            cs,
            reset,
            dio0,
            delay,
        })
    }

    /// Tear down into the underlying peripherals
    pub fn release(self) -> (SPI, CS, Option<RESET>, DIO0, D) {
        (self.spi, self.cs, self.reset, self.dio0, self.delay)
    }
}

impl<SPI, CS, RESET, DIO0, D> RegisterBus for SpiRegisterBus<SPI, CS, RESET, DIO0, D>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DIO0: InputPin,
    D: DelayMs<u32>,
{
    fn read_register(&mut self, addr: u8) -> Result<u8, BusError> {
        self.cs.set_low().map_err(|_| BusError::Gpio)?;
        let mut buffer = [addr & 0x7F, 0];
        let result = self.spi.transfer(&mut buffer).map(|b| b[1]);
        self.cs.set_high().map_err(|_| BusError::Gpio)?;
        result.map_err(|_| BusError::Spi)
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), BusError> {
        self.cs.set_low().map_err(|_| BusError::Gpio)?;
        let buffer = [addr | 0x80, value];
        let result = self.spi.write(&buffer);
        self.cs.set_high().map_err(|_| BusError::Gpio)?;
        result.map_err(|_| BusError::Spi)
    }

    fn set_reset_line(&mut self, high: bool) -> Result<(), BusError> {
        match self.reset.as_mut() {
            Some(reset) if high => reset.set_high().map_err(|_| BusError::Gpio),
            Some(reset) => reset.set_low().map_err(|_| BusError::Gpio),
            None => Ok(()),
        }
    }

    fn read_interrupt_line(&mut self) -> Result<bool, BusError> {
        self.dio0.is_high().map_err(|_| BusError::Gpio)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
