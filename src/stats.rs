//! Packet counters reported in gateway status messages

/// Receive and forward counters.
///
/// `rx_received`, `rx_ok` and `up_forwarded` cover one statistics interval
/// and are cleared by [`Counters::reset_interval`]. `rx_ok_total` lives for
/// the whole process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    /// Packets seen on the radio, CRC valid or not
    pub rx_received: u32,
    /// Packets with a valid CRC
    pub rx_ok: u32,
    /// Packets with a valid CRC since startup
    pub rx_ok_total: u32,
    /// Packets forwarded to at least one server
    pub up_forwarded: u32,
}

impl Counters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// A packet raised RX-done
    pub fn record_received(&mut self) {
        self.rx_received = self.rx_received.wrapping_add(1);
    }

    /// A packet passed the CRC check
    pub fn record_accepted(&mut self) {
        self.rx_ok = self.rx_ok.wrapping_add(1);
        self.rx_ok_total = self.rx_ok_total.wrapping_add(1);
    }

    /// A packet went out to the servers
    pub fn record_forwarded(&mut self) {
        self.up_forwarded = self.up_forwarded.wrapping_add(1);
    }

    /// Clear the per-interval counters, keeping the lifetime total
    pub fn reset_interval(&mut self) {
        self.rx_received = 0;
        self.rx_ok = 0;
        self.up_forwarded = 0;
    }
}
