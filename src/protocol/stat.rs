use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{build_datagram, EncodeError};
use crate::identity::GatewayIdentity;
use crate::stats::Counters;

/// Layout of the `time` field
pub const STAT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S GMT";

/// The `stat` object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat<'a> {
    /// UTC time of the report
    pub time: String,
    /// Latitude
    pub lati: f64,
    /// Longitude
    pub long: f64,
    /// Altitude in meters
    pub alti: i32,
    /// Packets received
    pub rxnb: u32,
    /// Packets received with valid CRC
    pub rxok: u32,
    /// Packets forwarded
    pub rxfw: u32,
    /// Upstream acknowledge ratio, no acknowledgements are tracked
    pub ackr: f64,
    /// Downlinks received, no downlink support
    pub dwnb: u32,
    /// Packets transmitted, no downlink support
    pub txnb: u32,
    /// Platform
    pub pfrm: &'a str,
    /// Contact email
    pub mail: &'a str,
    /// Description
    pub desc: &'a str,
}

impl<'a> Stat<'a> {
    /// Status report for the interval described by `counters`
    pub fn new(identity: &'a GatewayIdentity, counters: &Counters, now: DateTime<Utc>) -> Self {
        Self {
            time: now.format(STAT_TIME_FORMAT).to_string(),
            lati: identity.latitude,
            long: identity.longitude,
            alti: identity.altitude,
            rxnb: counters.rx_received,
            rxok: counters.rx_ok,
            rxfw: counters.up_forwarded,
            ackr: 0.0,
            dwnb: 0,
            txnb: 0,
            pfrm: &identity.platform,
            mail: &identity.email,
            desc: &identity.description,
        }
    }
}

#[derive(Serialize)]
struct StatBody<'a> {
    stat: &'a Stat<'a>,
}

/// Build the PUSH_DATA datagram carrying a status report
pub fn encode_status(
    identity: &GatewayIdentity,
    counters: &Counters,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, EncodeError> {
    let stat = Stat::new(identity, counters, now);
    build_datagram(&identity.gateway_id, &StatBody { stat: &stat })
}
