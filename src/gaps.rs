//! Idle gap detection on TCP connections
//!
//! [`GapDetector`](struct.GapDetector.html) remembers, for each connection, the timestamp of the
//! last packet seen, and reports packets arriving after a gap larger than a threshold. This is
//! typically used on request/response protocols to find slow clients or servers.
//!
//! ```rust
//! use pcap_tcp::gaps::{GapConfig, GapDetector};
//! use pcap_tcp::DecodedPacket;
//!
//! fn report<I: Iterator<Item = DecodedPacket>>(packets: I) {
//!     let mut detector = GapDetector::new(GapConfig::default().with_threshold(2.0));
//!     for packet in packets {
//!         if let Some(alert) = detector.observe(&packet) {
//!             println!("{}: idle for {:.3}s", alert.key, alert.gap);
//!         }
//!     }
//! }
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

use crate::packet::DecodedPacket;

/// Default gap threshold, in seconds
pub const DEFAULT_THRESHOLD: f64 = 15.0;

/// One side of a TCP connection
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Endpoint {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Endpoint { addr, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

/// Identifier of a connection, independent of the packet direction
///
/// The endpoint with the lowest port comes first (usually the server side). When both ports
/// are equal, the endpoint with the lowest address comes first.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ConnectionKey {
    pub first: Endpoint,
    pub second: Endpoint,
}

impl ConnectionKey {
    pub fn new(a: Endpoint, b: Endpoint) -> Self {
        let a_first = match a.port.cmp(&b.port) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => a.addr <= b.addr,
        };
        if a_first {
            ConnectionKey {
                first: a,
                second: b,
            }
        } else {
            ConnectionKey {
                first: b,
                second: a,
            }
        }
    }

    pub fn from_packet(packet: &DecodedPacket) -> Self {
        ConnectionKey::new(
            Endpoint::new(packet.source(), packet.source_port()),
            Endpoint::new(packet.destination(), packet.dest_port()),
        )
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Gap detection parameters
#[derive(Clone, Debug, PartialEq)]
pub struct GapConfig {
    /// Gaps strictly larger than this value (in seconds) are reported
    pub threshold: f64,
    /// Ignore packets without payload (handshakes, pure acknowledgments)
    pub skip_empty_payload: bool,
    /// If set, only consider packets having at least one port below this value
    pub service_port_below: Option<u16>,
}

impl Default for GapConfig {
    fn default() -> Self {
        GapConfig {
            threshold: DEFAULT_THRESHOLD,
            skip_empty_payload: true,
            service_port_below: None,
        }
    }
}

impl GapConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_skip_empty_payload(mut self, skip: bool) -> Self {
        self.skip_empty_payload = skip;
        self
    }

    pub fn with_service_port_below(mut self, port: Option<u16>) -> Self {
        self.service_port_below = port;
        self
    }

    fn accepts(&self, packet: &DecodedPacket) -> bool {
        if self.skip_empty_payload && packet.payload.is_empty() {
            return false;
        }
        match self.service_port_below {
            Some(limit) => packet.source_port() < limit || packet.dest_port() < limit,
            None => true,
        }
    }
}

/// A packet received after an idle period on its connection
#[derive(Clone, Debug, PartialEq)]
pub struct GapAlert {
    pub key: ConnectionKey,
    /// Timestamp of the packet ending the gap
    pub timestamp: f64,
    /// Timestamp of the previous packet of the connection
    pub previous: f64,
    /// Duration of the gap, in seconds
    pub gap: f64,
}

/// Per-connection last-seen table
#[derive(Debug, Default)]
pub struct GapDetector {
    config: GapConfig,
    last_seen: HashMap<ConnectionKey, f64>,
}

impl GapDetector {
    pub fn new(config: GapConfig) -> Self {
        GapDetector {
            config,
            last_seen: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Record a packet, and return an alert if it ends a gap larger than the threshold
    ///
    /// Packets rejected by the configuration are ignored, and do not update the table.
    pub fn observe(&mut self, packet: &DecodedPacket) -> Option<GapAlert> {
        if !self.config.accepts(packet) {
            return None;
        }
        let key = ConnectionKey::from_packet(packet);
        let timestamp = packet.timestamp();
        let previous = self.last_seen.insert(key, timestamp)?;
        let gap = timestamp - previous;
        if gap > self.config.threshold {
            Some(GapAlert {
                key,
                timestamp,
                previous,
                gap,
            })
        } else {
            None
        }
    }

    /// Timestamp of the last accepted packet of a connection
    pub fn last_seen(&self, key: &ConnectionKey) -> Option<f64> {
        self.last_seen.get(key).copied()
    }

    /// Number of connections seen
    pub fn connections(&self) -> usize {
        self.last_seen.len()
    }
}
