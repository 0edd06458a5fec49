use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u64};
use nom::IResult;

use super::EtherType;
use crate::linktype::Linktype;
use crate::PcapError;

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const VLAN_TAG_LEN: usize = 4;
pub const LINUX_SLL_HEADER_LEN: usize = 16;

/// Link layer decoder, selected once per capture from its link type
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkLayer {
    /// LINKTYPE_ETHERNET (1)
    Ethernet,
    /// LINKTYPE_LINUX_SLL (113)
    LinuxSll,
}

impl LinkLayer {
    pub fn linktype(self) -> Linktype {
        match self {
            LinkLayer::Ethernet => Linktype::ETHERNET,
            LinkLayer::LinuxSll => Linktype::LINUX_SLL,
        }
    }

    /// Decode the link layer header at the start of a frame
    pub fn decode(self, i: &[u8]) -> LinkLayerResult {
        let res = match self {
            LinkLayer::Ethernet => {
                parse_ethernet_header(i).map(|(rem, h)| (rem, LinkHeader::Ethernet(h)))
            }
            LinkLayer::LinuxSll => {
                parse_sll_header(i).map(|(rem, h)| (rem, LinkHeader::LinuxSll(h)))
            }
        };
        match res {
            Ok((rem, header)) => LinkLayerResult::Decoded(header, rem),
            Err(_) => LinkLayerResult::Malformed,
        }
    }
}

impl TryFrom<Linktype> for LinkLayer {
    type Error = PcapError;

    fn try_from(linktype: Linktype) -> Result<Self, Self::Error> {
        match linktype {
            Linktype::ETHERNET => Ok(LinkLayer::Ethernet),
            Linktype::LINUX_SLL => Ok(LinkLayer::LinuxSll),
            _ => Err(PcapError::UnsupportedLinkType(linktype)),
        }
    }
}

/// Result of the link layer decoder
#[derive(Debug)]
pub enum LinkLayerResult<'a> {
    /// Header, and the bytes following it
    Decoded(LinkHeader, &'a [u8]),
    Malformed,
}

/// Decoded link layer header
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LinkHeader {
    Ethernet(EthernetHeader),
    LinuxSll(SllHeader),
}

impl LinkHeader {
    /// Protocol of the encapsulated network layer
    pub fn ethertype(&self) -> EtherType {
        match self {
            LinkHeader::Ethernet(h) => h.ethertype,
            LinkHeader::LinuxSll(h) => h.protocol,
        }
    }

    /// Number of bytes consumed by this header
    pub fn header_len(&self) -> usize {
        match self {
            LinkHeader::Ethernet(h) => h.header_len(),
            LinkHeader::LinuxSll(_) => LINUX_SLL_HEADER_LEN,
        }
    }
}

/// IEEE 802.1Q tag
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VlanTag {
    /// Tag control information: priority (3 bits), drop eligible (1 bit), VLAN id (12 bits)
    pub tci: u16,
}

impl VlanTag {
    pub fn vlan_id(&self) -> u16 {
        self.tci & 0x0fff
    }

    pub fn priority(&self) -> u8 {
        (self.tci >> 13) as u8
    }
}

/// Ethernet II header, with at most one 802.1Q tag
///
/// Stacked tags (QinQ) are not unwrapped: the frame is reported with ethertype `Vlan`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EthernetHeader {
    pub destination: [u8; 6],
    pub source: [u8; 6],
    pub vlan: Option<VlanTag>,
    /// Ethertype following the tag, if any
    pub ethertype: EtherType,
}

impl EthernetHeader {
    pub fn header_len(&self) -> usize {
        match self.vlan {
            Some(_) => ETHERNET_HEADER_LEN + VLAN_TAG_LEN,
            None => ETHERNET_HEADER_LEN,
        }
    }
}

fn mac_address(i: &[u8]) -> IResult<&[u8], [u8; 6]> {
    let (i, bytes) = take(6usize)(i)?;
    let mut addr = [0u8; 6];
    addr.copy_from_slice(bytes);
    Ok((i, addr))
}

pub fn parse_ethernet_header(i: &[u8]) -> IResult<&[u8], EthernetHeader> {
    let (i, destination) = mac_address(i)?;
    let (i, source) = mac_address(i)?;
    let (i, ethertype) = be_u16(i)?;
    let (i, vlan, ethertype) = if ethertype == EtherType::VLAN {
        let (i, tci) = be_u16(i)?;
        let (i, inner) = be_u16(i)?;
        (i, Some(VlanTag { tci }), inner)
    } else {
        (i, None, ethertype)
    };
    let header = EthernetHeader {
        destination,
        source,
        vlan,
        ethertype: EtherType::from(ethertype),
    };
    Ok((i, header))
}

/// Linux cooked capture header
///
/// See <http://www.tcpdump.org/linktypes/LINKTYPE_LINUX_SLL.html>
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SllHeader {
    pub packet_type: u16,
    pub arphrd_type: u16,
    pub ll_addr_len: u16,
    pub ll_addr: [u8; 8],
    pub protocol: EtherType,
}

pub fn parse_sll_header(i: &[u8]) -> IResult<&[u8], SllHeader> {
    let (i, packet_type) = be_u16(i)?;
    let (i, arphrd_type) = be_u16(i)?;
    let (i, ll_addr_len) = be_u16(i)?;
    let (i, ll_addr) = be_u64(i)?;
    let (i, protocol) = be_u16(i)?;
    let header = SllHeader {
        packet_type,
        arphrd_type,
        ll_addr_len,
        ll_addr: ll_addr.to_be_bytes(),
        protocol: EtherType::from(protocol),
    };
    Ok((i, header))
}
