//! Datagram delivery to the configured servers
//!
//! Each server name is resolved again for every datagram, so DNS changes
//! are picked up without a restart. Resolution and sending block the
//! caller.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
};

use log::{debug, warn};
use serde::Deserialize;

/// A server entry from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardDestination {
    /// Host name or address
    pub address: String,
    /// UDP port
    pub port: u16,
    /// Disabled entries are skipped without being resolved
    pub enabled: bool,
}

impl ForwardDestination {
    /// Enabled destination
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            enabled: true,
        }
    }
}

/// Reaction to a server that cannot be resolved or sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardPolicy {
    /// Stop at the first failure and report it
    #[default]
    Abort,
    /// Log the failure and carry on with the next server
    Skip,
}

/// Forwarding errors
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Name lookup failed
    #[error("cannot resolve {host}:{port}: {source}")]
    Resolve {
        /// Host name
        host: String,
        /// Port
        port: u16,
        /// Underlying error
        source: io::Error,
    },
    /// Lookup succeeded but returned no IPv4 address
    #[error("no IPv4 address for {host}:{port}")]
    NoAddress {
        /// Host name
        host: String,
        /// Port
        port: u16,
    },
    /// The datagram could not be sent
    #[error("sendto {addr} failed: {source}")]
    Send {
        /// Destination
        addr: SocketAddr,
        /// Underlying error
        source: io::Error,
    },
}

/// Name resolution plus datagram send
pub trait DatagramTransport {
    /// Resolve `host` to an IPv4 socket address
    fn resolve(&mut self, host: &str, port: u16) -> Result<SocketAddr, ForwardError>;

    /// Send `datagram` to `addr` in one piece
    fn send_to(&mut self, datagram: &[u8], addr: SocketAddr) -> Result<(), ForwardError>;
}

/// Transport over a single unconnected UDP socket
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind an ephemeral IPv4 socket
    pub fn bind() -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        Ok(Self { socket })
    }

    /// Local address of the socket
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramTransport for UdpTransport {
    fn resolve(&mut self, host: &str, port: u16) -> Result<SocketAddr, ForwardError> {
        let mut addrs = (host, port)
            .to_socket_addrs()
            .map_err(|source| ForwardError::Resolve {
                host: host.to_string(),
                port,
                source,
            })?;
        addrs
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| ForwardError::NoAddress {
                host: host.to_string(),
                port,
            })
    }

    fn send_to(&mut self, datagram: &[u8], addr: SocketAddr) -> Result<(), ForwardError> {
        let sent = self
            .socket
            .send_to(datagram, addr)
            .map_err(|source| ForwardError::Send { addr, source })?;
        if sent != datagram.len() {
            return Err(ForwardError::Send {
                addr,
                source: io::Error::new(io::ErrorKind::WriteZero, "datagram truncated"),
            });
        }
        Ok(())
    }
}

/// Sends every datagram to each enabled destination, in order
#[derive(Debug, Clone)]
pub struct Forwarder {
    destinations: Vec<ForwardDestination>,
    policy: ForwardPolicy,
}

impl Forwarder {
    /// Create a forwarder over `destinations`
    pub fn new(destinations: Vec<ForwardDestination>, policy: ForwardPolicy) -> Self {
        Self {
            destinations,
            policy,
        }
    }

    /// Configured destinations
    pub fn destinations(&self) -> &[ForwardDestination] {
        &self.destinations
    }

    /// Deliver `datagram` and return how many destinations received it
    pub fn send<T: DatagramTransport>(
        &self,
        transport: &mut T,
        datagram: &[u8],
    ) -> Result<usize, ForwardError> {
        let mut delivered = 0;
        for dest in self.destinations.iter().filter(|d| d.enabled) {
            let result = transport
                .resolve(&dest.address, dest.port)
                .and_then(|addr| transport.send_to(datagram, addr).map(|_| addr));

            match result {
                Ok(addr) => {
                    debug!("sent {} bytes to {} ({})", datagram.len(), dest.address, addr);
                    delivered += 1;
                }
                Err(err) if self.policy == ForwardPolicy::Skip => {
                    warn!("skipping {}:{}: {}", dest.address, dest.port, err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(delivered)
    }
}
