//! Gateway identity and location

use std::{fs, path::Path};

use log::info;

use crate::config::{ConfigError, GatewayConf};
use crate::protocol::GatewayId;

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Who the gateway is and where it stands
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayIdentity {
    /// Identifier carried in every datagram header
    pub gateway_id: GatewayId,
    /// Platform name
    pub platform: String,
    /// Contact email
    pub email: String,
    /// Free form description
    pub description: String,
    /// Reference latitude
    pub latitude: f64,
    /// Reference longitude
    pub longitude: f64,
    /// Reference altitude in meters
    pub altitude: i32,
}

impl GatewayIdentity {
    /// Identity with the given id and the descriptive fields of `conf`
    pub fn new(gateway_id: GatewayId, conf: &GatewayConf) -> Self {
        Self {
            gateway_id,
            platform: conf.platform.clone(),
            email: conf.email.clone(),
            description: conf.description.clone(),
            latitude: conf.latitude,
            longitude: conf.longitude,
            altitude: conf.altitude,
        }
    }

    /// Build the identity from the configured override, or from the MAC of
    /// the configured interface
    pub fn resolve(conf: &GatewayConf) -> Result<Self, ConfigError> {
        Self::resolve_in(conf, Path::new(SYS_CLASS_NET))
    }

    /// As [`resolve`](Self::resolve), reading interfaces under `net_dir`
    pub fn resolve_in(conf: &GatewayConf, net_dir: &Path) -> Result<Self, ConfigError> {
        let mac = match &conf.eui {
            Some(eui) => {
                let mac = parse_mac(eui).ok_or_else(|| ConfigError::InvalidEui(eui.clone()))?;
                info!("Gateway ID overridden by config [{}]", eui);
                mac
            }
            None => interface_mac(net_dir, &conf.if_name)?,
        };
        Ok(Self::new(GatewayId::from_mac(mac), conf))
    }
}

/// Parse `aa:bb:cc:dd:ee:ff`
pub fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.trim().split(':');
    for byte in mac.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 2 {
            return None;
        }
        *byte = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

/// Link-layer address of `if_name` from `<net_dir>/<if_name>/address`
fn interface_mac(net_dir: &Path, if_name: &str) -> Result<[u8; 6], ConfigError> {
    let path = net_dir.join(if_name).join("address");
    let text = fs::read_to_string(&path)
        .map_err(|_| ConfigError::NoInterfaceAddress(if_name.to_string()))?;
    parse_mac(&text).ok_or_else(|| ConfigError::NoInterfaceAddress(if_name.to_string()))
}
