pub mod quality;
pub mod registers;
pub mod spi_bus;
pub mod sx127x;
pub mod traits;
#[cfg(feature = "linux")]
pub mod linux;

pub use quality::{extract_quality, LinkQuality};
pub use spi_bus::SpiRegisterBus;
pub use sx127x::{ChipVariant, RadioError, ReceivedFrame, Sx127x};
pub use traits::{Bandwidth, BusError, RadioConfig, RegisterBus, SpreadingFactor};
