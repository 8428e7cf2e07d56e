use std::{fs, io, path::Path, time::Duration};

use log::info;
use serde::Deserialize;

use crate::forward::{ForwardDestination, ForwardPolicy};
use crate::radio::registers::{frequency_in_range, MAX_FREQUENCY, MIN_FREQUENCY};
use crate::radio::{Bandwidth, RadioConfig, SpreadingFactor};

/// Pin number meaning "not connected"
pub const PIN_UNUSED: u32 = 0xFF;

const DEFAULT_FREQUENCY: u32 = 868_100_000;
const DEFAULT_SPREADING_FACTOR: u8 = 7;
const DEFAULT_BANDWIDTH_KHZ: u32 = 125;
const DEFAULT_SPI_DEVICE: &str = "/dev/spidev0.0";
const DEFAULT_SPI_SPEED_HZ: u32 = 500_000;
const DEFAULT_IF_NAME: &str = "eth0";
const DEFAULT_STAT_INTERVAL_SECS: u64 = 5;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

// Field limits carried by the status report
const MAX_PLATFORM_LEN: usize = 24;
const MAX_EMAIL_LEN: usize = 40;
const MAX_DESCRIPTION_LEN: usize = 64;
const MAX_EUI_LEN: usize = 25;
const MAX_IF_NAME_LEN: usize = 16;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),
    /// File is not valid JSON or has wrongly typed fields
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A required pin is unset
    #[error("bad pin configuration, {0} must be defined")]
    MissingPin(&'static str),
    /// A pin number does not fit a GPIO index
    #[error("pin {name} has invalid value {value}")]
    InvalidPin {
        /// Config key
        name: &'static str,
        /// Value found
        value: u32,
    },
    /// Frequency outside the tunable band
    #[error("invalid frequency {0} Hz, expected {} to {} Hz", MIN_FREQUENCY, MAX_FREQUENCY)]
    InvalidFrequency(u32),
    /// Spreading factor outside SF7-SF12
    #[error("invalid spreading factor {0}, expected 7-12")]
    InvalidSpreadingFactor(u8),
    /// Bandwidth outside the supported set
    #[error("invalid bandwidth {0} kHz, expected 125, 250 or 500")]
    InvalidBandwidth(u32),
    /// Gateway id override is not a MAC address
    #[error("invalid gateway id override {0:?}")]
    InvalidEui(String),
    /// No link-layer address for the configured interface
    #[error("no hardware address for interface {0}")]
    NoInterfaceAddress(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "SX127x_conf", default)]
    radio: RawRadio,
    #[serde(rename = "gateway_conf", default)]
    gateway: RawGateway,
}

#[derive(Debug, Default, Deserialize)]
struct RawRadio {
    freq: Option<u32>,
    spread_factor: Option<u8>,
    bandwidth: Option<u32>,
    pin_nss: Option<u32>,
    pin_dio0: Option<u32>,
    pin_rst: Option<u32>,
    spi_device: Option<String>,
    spi_speed_hz: Option<u32>,
    #[serde(default)]
    verify_writes: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawGateway {
    ref_latitude: Option<f64>,
    ref_longitude: Option<f64>,
    ref_altitude: Option<i32>,
    if_name: Option<String>,
    eui: Option<String>,
    name: Option<String>,
    email: Option<String>,
    desc: Option<String>,
    stat_interval_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    forward_policy: ForwardPolicy,
    servers: Option<OneOrMany<RawServer>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Deserialize)]
struct RawServer {
    address: String,
    port: u16,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Host wiring of the transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioHardware {
    /// spidev node
    pub spi_device: String,
    /// SPI clock in Hz
    pub spi_speed_hz: u32,
    /// Chip select, as a Linux GPIO (BCM) number
    pub pin_nss: u8,
    /// DIO0 (RX done) GPIO
    pub pin_dio0: u8,
    /// Reset GPIO, if wired
    pub pin_rst: Option<u8>,
}

/// Gateway description reported to the servers
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConf {
    /// Reference latitude
    pub latitude: f64,
    /// Reference longitude
    pub longitude: f64,
    /// Reference altitude in meters
    pub altitude: i32,
    /// Interface whose MAC derives the gateway id
    pub if_name: String,
    /// Gateway id override, `aa:bb:cc:dd:ee:ff`
    pub eui: Option<String>,
    /// Platform name
    pub platform: String,
    /// Contact email
    pub email: String,
    /// Free form description
    pub description: String,
}

/// Validated gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Radio receive parameters
    pub radio: RadioConfig,
    /// Radio wiring
    pub hardware: RadioHardware,
    /// Identity and location
    pub gateway: GatewayConf,
    /// Servers in configuration order
    pub servers: Vec<ForwardDestination>,
    /// What to do when a server cannot be reached
    pub forward_policy: ForwardPolicy,
    /// Time between status reports
    pub stat_interval: Duration,
    /// Pause between radio polls
    pub poll_interval: Duration,
}

impl Config {
    /// Read and validate the configuration file at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Validate configuration from JSON text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let RawConfig { radio, gateway } = raw;

        let frequency = radio.freq.unwrap_or(DEFAULT_FREQUENCY);
        if !frequency_in_range(frequency) {
            return Err(ConfigError::InvalidFrequency(frequency));
        }
        let sf = radio.spread_factor.unwrap_or(DEFAULT_SPREADING_FACTOR);
        let spreading_factor =
            SpreadingFactor::try_from(sf).map_err(ConfigError::InvalidSpreadingFactor)?;
        let bandwidth = Bandwidth::try_from(radio.bandwidth.unwrap_or(DEFAULT_BANDWIDTH_KHZ))
            .map_err(ConfigError::InvalidBandwidth)?;
        let mut radio_config = RadioConfig::new(frequency, spreading_factor, bandwidth);
        radio_config.verify_writes = radio.verify_writes;

        let hardware = RadioHardware {
            spi_device: radio
                .spi_device
                .unwrap_or_else(|| DEFAULT_SPI_DEVICE.to_string()),
            spi_speed_hz: radio.spi_speed_hz.unwrap_or(DEFAULT_SPI_SPEED_HZ),
            pin_nss: pin("pin_nss", radio.pin_nss)?.ok_or(ConfigError::MissingPin("pin_nss"))?,
            pin_dio0: pin("pin_dio0", radio.pin_dio0)?
                .ok_or(ConfigError::MissingPin("pin_dio0"))?,
            pin_rst: pin("pin_rst", radio.pin_rst)?,
        };

        let gateway_conf = GatewayConf {
            latitude: gateway.ref_latitude.unwrap_or(0.0),
            longitude: gateway.ref_longitude.unwrap_or(0.0),
            altitude: gateway.ref_altitude.unwrap_or(0),
            if_name: limit(
                gateway.if_name.unwrap_or_else(|| DEFAULT_IF_NAME.to_string()),
                MAX_IF_NAME_LEN,
                "if_name too long",
            ),
            eui: gateway
                .eui
                .filter(|eui| !eui.is_empty())
                .map(|eui| limit(eui, MAX_EUI_LEN, "eui str too long")),
            platform: limit(gateway.name.unwrap_or_default(), MAX_PLATFORM_LEN, "name too long"),
            email: limit(gateway.email.unwrap_or_default(), MAX_EMAIL_LEN, "email too long"),
            description: limit(
                gateway.desc.unwrap_or_default(),
                MAX_DESCRIPTION_LEN,
                "description is too long",
            ),
        };

        let servers = match gateway.servers {
            None => Vec::new(),
            Some(OneOrMany::One(server)) => vec![server.into()],
            Some(OneOrMany::Many(servers)) => servers.into_iter().map(Into::into).collect(),
        };

        Ok(Self {
            radio: radio_config,
            hardware,
            gateway: gateway_conf,
            servers,
            forward_policy: gateway.forward_policy,
            stat_interval: Duration::from_secs(
                gateway.stat_interval_secs.unwrap_or(DEFAULT_STAT_INTERVAL_SECS),
            ),
            poll_interval: Duration::from_millis(
                gateway.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
        })
    }

    /// Log the loaded configuration
    pub fn log_summary(&self) {
        for server in &self.servers {
            info!(
                "server: address = {}; port = {}; enabled = {}",
                server.address, server.port, server.enabled
            );
        }
        let gw = &self.gateway;
        info!("Gateway Configuration");
        info!("  {} ({})", gw.platform, gw.email);
        info!("  {}", gw.description);
        info!(
            "  Latitude={:.8} Longitude={:.8} Altitude={}",
            gw.latitude, gw.longitude, gw.altitude
        );
        info!("  Interface {}", gw.if_name);
        info!(
            "  NSS={} DIO0={} Reset={}",
            self.hardware.pin_nss,
            self.hardware.pin_dio0,
            self.hardware
                .pin_rst
                .map_or_else(|| "unused".to_string(), |p| p.to_string())
        );
    }
}

impl From<RawServer> for ForwardDestination {
    fn from(server: RawServer) -> Self {
        ForwardDestination {
            address: server.address,
            port: server.port,
            enabled: server.enabled,
        }
    }
}

/// Map a raw pin value, treating absent and 0xFF as unused
fn pin(name: &'static str, value: Option<u32>) -> Result<Option<u8>, ConfigError> {
    match value {
        None | Some(PIN_UNUSED) => Ok(None),
        Some(value) => u8::try_from(value)
            .map(Some)
            .map_err(|_| ConfigError::InvalidPin { name, value }),
    }
}

/// Replace an over-long text field with a marker
fn limit(value: String, max: usize, marker: &str) -> String {
    if value.chars().count() <= max {
        value
    } else {
        marker.to_string()
    }
}
