//! Linux host wiring: spidev for SPI, sysfs GPIO for chip select, reset and DIO0

use std::io;

use linux_embedded_hal::{
    spidev::{SpiModeFlags, SpidevOptions},
    sysfs_gpio::Direction,
    Delay, Spidev, SysfsPin,
};
use log::debug;

use crate::config::RadioHardware;
use crate::radio::spi_bus::SpiRegisterBus;
use crate::radio::traits::BusError;

/// Register bus as wired on a Linux host
pub type LinuxRegisterBus = SpiRegisterBus<Spidev, SysfsPin, SysfsPin, SysfsPin, Delay>;

/// Errors opening the host peripherals
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// spidev device could not be opened or configured
    #[error("SPI device {path}: {source}")]
    Spi {
        /// Device node
        path: String,
        /// Underlying error
        source: io::Error,
    },
    /// A GPIO could not be exported or set up
    #[error("GPIO {pin}: {source}")]
    Gpio {
        /// Pin number
        pin: u8,
        /// Underlying error
        source: linux_embedded_hal::sysfs_gpio::Error,
    },
    /// Initial pin state could not be set
    #[error(transparent)]
    Bus(#[from] BusError),
}

fn export_pin(pin: u8, direction: Direction) -> Result<SysfsPin, OpenError> {
    let gpio = SysfsPin::new(pin as u64);
    gpio.export()
        .and_then(|_| gpio.set_direction(direction))
        .map_err(|source| OpenError::Gpio { pin, source })?;
    debug!("exported GPIO {} as {:?}", pin, direction);
    Ok(gpio)
}

/// Open the SPI device and GPIOs named in `hw`
pub fn open(hw: &RadioHardware) -> Result<LinuxRegisterBus, OpenError> {
    let mut spi = Spidev::open(&hw.spi_device).map_err(|source| OpenError::Spi {
        path: hw.spi_device.clone(),
        source,
    })?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(hw.spi_speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options).map_err(|source| OpenError::Spi {
        path: hw.spi_device.clone(),
        source,
    })?;

    let cs = export_pin(hw.pin_nss, Direction::High)?;
    let dio0 = export_pin(hw.pin_dio0, Direction::In)?;
    let reset = hw
        .pin_rst
        .map(|pin| export_pin(pin, Direction::Out))
        .transpose()?;

    Ok(SpiRegisterBus::new(spi, cs, reset, dio0, Delay)?)
}
