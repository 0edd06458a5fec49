//! Protocol headers, from the link layer up to TCP
//!
//! Each layer decoder takes the bytes left by the layer below, and returns a tagged result: the
//! decoded header and the remaining bytes, a "not applicable" variant carrying the protocol
//! identifier that was found instead, or `Malformed` when the header does not fit in the
//! captured data.

mod ipv4;
mod link;
mod tcp;

pub use ipv4::*;
pub use link::*;
pub use tcp::*;

use std::fmt;

/// Protocol carried by a link layer frame
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EtherType {
    Ipv4,
    Arp,
    /// IEEE 802.1Q VLAN tag
    Vlan,
    Ipv6,
    Unknown(u16),
}

impl EtherType {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const VLAN: u16 = 0x8100;
    pub const IPV6: u16 = 0x86dd;

    pub fn value(self) -> u16 {
        match self {
            EtherType::Ipv4 => Self::IPV4,
            EtherType::Arp => Self::ARP,
            EtherType::Vlan => Self::VLAN,
            EtherType::Ipv6 => Self::IPV6,
            EtherType::Unknown(v) => v,
        }
    }
}

impl From<u16> for EtherType {
    fn from(v: u16) -> Self {
        match v {
            Self::IPV4 => EtherType::Ipv4,
            Self::ARP => EtherType::Arp,
            Self::VLAN => EtherType::Vlan,
            Self::IPV6 => EtherType::Ipv6,
            _ => EtherType::Unknown(v),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EtherType::Unknown(v) => write!(f, "EtherType({:#06x})", v),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Protocol carried by an IPv4 packet
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Unknown(u8),
}

impl IpProtocol {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;

    pub fn value(self) -> u8 {
        match self {
            IpProtocol::Icmp => Self::ICMP,
            IpProtocol::Tcp => Self::TCP,
            IpProtocol::Udp => Self::UDP,
            IpProtocol::Unknown(v) => v,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(v: u8) -> Self {
        match v {
            Self::ICMP => IpProtocol::Icmp,
            Self::TCP => IpProtocol::Tcp,
            Self::UDP => IpProtocol::Udp,
            _ => IpProtocol::Unknown(v),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IpProtocol::Unknown(v) => write!(f, "IpProtocol({})", v),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_values() {
        assert_eq!(EtherType::from(0x0800), EtherType::Ipv4);
        assert_eq!(EtherType::from(0x8100), EtherType::Vlan);
        assert_eq!(EtherType::from(0x88cc), EtherType::Unknown(0x88cc));
        assert_eq!(EtherType::Unknown(0x88cc).value(), 0x88cc);
        assert_eq!(EtherType::Arp.to_string(), "Arp");
        assert_eq!(EtherType::Unknown(0x88cc).to_string(), "EtherType(0x88cc)");
    }
    #[test]
    fn test_ip_protocol_values() {
        assert_eq!(IpProtocol::from(6), IpProtocol::Tcp);
        assert_eq!(IpProtocol::from(47), IpProtocol::Unknown(47));
        assert_eq!(IpProtocol::Udp.value(), 17);
    }
}
