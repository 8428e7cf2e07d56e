//! Gateway main loop
//!
//! Polls the radio, forwards every valid packet as an `rxpk` datagram and
//! sends a `stat` datagram once per statistics interval. Everything runs on
//! the calling thread; the radio is sampled, never waited on.

use std::{
    convert::Infallible,
    thread,
    time::{Duration, Instant},
};

use chrono::Utc;
use log::{debug, info, warn};

use crate::{
    config::Config,
    error::GatewayError,
    forward::{DatagramTransport, Forwarder},
    identity::GatewayIdentity,
    protocol::{self, HEADER_LEN},
    radio::{ChipVariant, RadioConfig, RadioError, RegisterBus, Sx127x},
    stats::Counters,
};

/// Default time between status reports
pub const DEFAULT_STAT_INTERVAL: Duration = Duration::from_secs(5);
/// Default pause between radio polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What happened during one loop iteration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A packet was received and reached at least one server
    pub frame_forwarded: bool,
    /// A valid packet was received
    pub frame_received: bool,
    /// A status report went out
    pub status_sent: bool,
}

/// Single-channel packet forwarder
pub struct Gateway<B: RegisterBus, T: DatagramTransport> {
    radio: Sx127x<B>,
    variant: ChipVariant,
    radio_config: RadioConfig,
    transport: T,
    forwarder: Forwarder,
    identity: GatewayIdentity,
    counters: Counters,
    stat_interval: Duration,
    poll_interval: Duration,
    last_stat: Option<Instant>,
}

impl<B: RegisterBus, T: DatagramTransport> Gateway<B, T> {
    /// Wrap an identified and configured radio
    pub fn new(
        radio: Sx127x<B>,
        radio_config: RadioConfig,
        transport: T,
        forwarder: Forwarder,
        identity: GatewayIdentity,
    ) -> Result<Self, GatewayError> {
        let variant = radio.variant().ok_or(RadioError::NotIdentified)?;
        Ok(Self {
            radio,
            variant,
            radio_config,
            transport,
            forwarder,
            identity,
            counters: Counters::new(),
            stat_interval: DEFAULT_STAT_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_stat: None,
        })
    }

    /// Identify and configure the radio on `bus`, then build the gateway
    pub fn start(
        bus: B,
        transport: T,
        config: &Config,
        identity: GatewayIdentity,
    ) -> Result<Self, GatewayError> {
        let mut radio = Sx127x::new(bus);
        radio.identify()?;
        radio.configure(&config.radio)?;

        info!("Gateway ID: {}", identity.gateway_id);
        info!(
            "Listening at SF{}, BW {} on {:.6} MHz",
            config.radio.spreading_factor.value(),
            config.radio.bandwidth,
            config.radio.frequency_mhz()
        );

        let forwarder = Forwarder::new(config.servers.clone(), config.forward_policy);
        let enabled = forwarder.destinations().iter().filter(|d| d.enabled).count();
        if enabled == 0 {
            warn!("no enabled server, packets will be received but not forwarded");
        } else {
            info!("forwarding to {} server(s), {:?} on failure", enabled, config.forward_policy);
        }
        Ok(Self::new(radio, config.radio, transport, forwarder, identity)?
            .with_intervals(config.stat_interval, config.poll_interval))
    }

    /// Override the statistics and poll intervals
    pub fn with_intervals(mut self, stat_interval: Duration, poll_interval: Duration) -> Self {
        self.stat_interval = stat_interval;
        self.poll_interval = poll_interval;
        self
    }

    /// Current counters
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Gateway identity
    pub fn identity(&self) -> &GatewayIdentity {
        &self.identity
    }

    /// Detected chip variant
    pub fn variant(&self) -> ChipVariant {
        self.variant
    }

    /// The radio driver
    pub fn radio_mut(&mut self) -> &mut Sx127x<B> {
        &mut self.radio
    }

    /// The datagram transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run forever, one tick per poll interval
    pub fn run(&mut self) -> Result<Infallible, GatewayError> {
        loop {
            self.tick(Instant::now())?;
            thread::sleep(self.poll_interval);
        }
    }

    /// One loop iteration at time `now`
    pub fn tick(&mut self, now: Instant) -> Result<TickReport, GatewayError> {
        let mut report = TickReport::default();

        if let Some(delivered) = self.receive_and_forward()? {
            report.frame_received = true;
            report.frame_forwarded = delivered > 0;
        }

        if self.status_due(now) {
            self.send_status()?;
            self.last_stat = Some(now);
            report.status_sent = true;
        }

        Ok(report)
    }

    /// Whether a status report is due at `now`. The first one goes out
    /// immediately.
    pub fn status_due(&self, now: Instant) -> bool {
        match self.last_stat {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.stat_interval,
        }
    }

    /// Poll once; on a packet, forward it and return the delivery count
    fn receive_and_forward(&mut self) -> Result<Option<usize>, GatewayError> {
        let frame = match self.radio.poll_frame(&mut self.counters)? {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let quality = frame.quality(self.variant);
        info!(
            "incoming packet, {} bytes, RSSI {} dBm, SNR {} dB",
            frame.len(),
            quality.rssi,
            quality.snr
        );

        let datagram = protocol::encode_uplink(
            &self.identity.gateway_id,
            &frame,
            quality,
            &self.radio_config,
        )?;
        debug!("{}", String::from_utf8_lossy(&datagram[HEADER_LEN..]));

        let delivered = self.forwarder.send(&mut self.transport, &datagram)?;
        if delivered > 0 {
            self.counters.record_forwarded();
        }
        Ok(Some(delivered))
    }

    /// Send the status report and start a new interval
    fn send_status(&mut self) -> Result<(), GatewayError> {
        let now = Utc::now();
        let datagram = protocol::encode_status(&self.identity, &self.counters, now)?;

        info!("gateway status update {}", now.format(protocol::stat::STAT_TIME_FORMAT));
        match self.counters.rx_ok_total {
            0 => info!("status: no packet yet..."),
            1 => info!("status: 1 packet received"),
            n => info!("status: {} packets received", n),
        }

        self.forwarder.send(&mut self.transport, &datagram)?;
        self.counters.reset_interval();
        Ok(())
    }
}
