use std::net::Ipv4Addr;

use crate::layers::{EtherType, IpProtocol, Ipv4Header, LinkHeader, TcpFlags, TcpHeader};

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// A TCP segment decoded from a captured frame
///
/// All layers have been decoded, and `payload` holds the frame bytes following the TCP header
/// (options excluded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPacket {
    pub ts_sec: u32,
    pub ts_usec: u32,
    /// Number of bytes captured for this frame
    pub caplen: u32,
    /// Length of the frame on the wire
    pub origlen: u32,
    pub link: LinkHeader,
    pub ip: Ipv4Header,
    pub tcp: TcpHeader,
    /// Offset of `payload` in the captured frame
    pub offset: usize,
    pub payload: Vec<u8>,
}

impl DecodedPacket {
    /// Capture timestamp, in seconds
    pub fn timestamp(&self) -> f64 {
        self.ts_sec as f64 + self.ts_usec as f64 / MICROS_PER_SEC
    }

    /// Protocol identifier announced by the link layer
    pub fn ethertype(&self) -> EtherType {
        self.link.ethertype()
    }

    /// Protocol identifier announced by the network layer
    pub fn protocol(&self) -> IpProtocol {
        self.ip.protocol
    }

    pub fn source(&self) -> Ipv4Addr {
        self.ip.source
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.ip.destination
    }

    pub fn source_port(&self) -> u16 {
        self.tcp.source_port
    }

    pub fn dest_port(&self) -> u16 {
        self.tcp.dest_port
    }

    pub fn seq(&self) -> u32 {
        self.tcp.seq
    }

    pub fn ack_seq(&self) -> u32 {
        self.tcp.ack_seq
    }

    pub fn flags(&self) -> TcpFlags {
        self.tcp.flags
    }
}
