use nom::bytes::complete::take;
use nom::error::{make_error, ErrorKind};
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::IResult;
use std::net::Ipv4Addr;

use super::{EtherType, IpProtocol};

/// Size of an IPv4 header without options
pub const IPV4_BASE_HEADER_LEN: usize = 20;

/// IPv4 header. Options are skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ipv4Header {
    pub version: u8,
    /// Header length in bytes (IHL * 4), including options
    pub header_len: usize,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

/// Result of the network layer decoder
#[derive(Debug)]
pub enum NetworkLayerResult<'a> {
    /// Header, and the bytes following it (options excluded)
    Ipv4(Ipv4Header, &'a [u8]),
    NotIpv4(EtherType),
    Malformed,
}

/// Decode the network layer, if the link layer announced IPv4
pub fn decode_network_layer(ethertype: EtherType, i: &[u8]) -> NetworkLayerResult {
    if ethertype != EtherType::Ipv4 {
        return NetworkLayerResult::NotIpv4(ethertype);
    }
    match parse_ipv4_header(i) {
        Ok((rem, header)) => NetworkLayerResult::Ipv4(header, rem),
        Err(_) => NetworkLayerResult::Malformed,
    }
}

/// Parse an IPv4 header, and skip its options
///
/// Fails if the header length field is lower than 5 words, or if the header does not fit in
/// the input.
pub fn parse_ipv4_header(input: &[u8]) -> IResult<&[u8], Ipv4Header> {
    let (i, version_ihl) = be_u8(input)?;
    let header_len = ((version_ihl & 0x0f) as usize) * 4;
    if header_len < IPV4_BASE_HEADER_LEN {
        return Err(nom::Err::Error(make_error(input, ErrorKind::Verify)));
    }
    let (i, tos) = be_u8(i)?;
    let (i, total_length) = be_u16(i)?;
    let (i, identification) = be_u16(i)?;
    let (i, flags_fragment) = be_u16(i)?;
    let (i, ttl) = be_u8(i)?;
    let (i, protocol) = be_u8(i)?;
    let (i, checksum) = be_u16(i)?;
    let (i, source) = be_u32(i)?;
    let (i, destination) = be_u32(i)?;
    let (i, _options) = take(header_len - IPV4_BASE_HEADER_LEN)(i)?;
    let header = Ipv4Header {
        version: version_ihl >> 4,
        header_len,
        tos,
        total_length,
        identification,
        flags_fragment,
        ttl,
        protocol: IpProtocol::from(protocol),
        checksum,
        source: Ipv4Addr::from(source),
        destination: Ipv4Addr::from(destination),
    };
    Ok((i, header))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use hex_literal::hex;

    // TCP, 192.168.1.10 -> 192.168.1.20, no options
    const IPV4_HDR: &[u8] = &hex!(
        "
45 00 00 28 12 34 40 00 40 06 00 00 C0 A8 01 0A
C0 A8 01 14 01 BB"
    );
    // UDP, 10.0.0.1 -> 10.0.0.2, one word of options
    const IPV4_HDR_OPTIONS: &[u8] = &hex!(
        "
46 00 00 20 12 34 40 00 40 11 00 00 0A 00 00 01
0A 00 00 02 01 01 01 00 14 E9"
    );

    #[test]
    fn test_ipv4_header() {
        let (rem, hdr) = parse_ipv4_header(IPV4_HDR).expect("ipv4 parsing failed");
        assert_eq!(rem, &hex!("01 BB"));
        assert_eq!(hdr.version, 4);
        assert_eq!(hdr.header_len, 20);
        assert_eq!(hdr.total_length, 40);
        assert_eq!(hdr.ttl, 64);
        assert_eq!(hdr.protocol, IpProtocol::Tcp);
        assert_eq!(hdr.source, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(hdr.destination.to_string(), "192.168.1.20");
    }
    #[test]
    fn test_ipv4_header_options() {
        let (rem, hdr) = parse_ipv4_header(IPV4_HDR_OPTIONS).expect("ipv4 parsing failed");
        assert_eq!(rem, &hex!("14 E9"));
        assert_eq!(hdr.header_len, 24);
        assert_eq!(hdr.protocol, IpProtocol::Udp);
    }
    #[test]
    fn test_ipv4_header_invalid() {
        // IHL of 4 words
        let mut data = IPV4_HDR.to_vec();
        data[0] = 0x44;
        assert!(parse_ipv4_header(&data).is_err());
        // options announced but not captured
        assert!(parse_ipv4_header(&IPV4_HDR_OPTIONS[..22]).is_err());
        assert!(parse_ipv4_header(&IPV4_HDR[..19]).is_err());
    }
    #[test]
    fn test_decode_network_layer() {
        assert!(matches!(
            decode_network_layer(EtherType::Arp, IPV4_HDR),
            NetworkLayerResult::NotIpv4(EtherType::Arp)
        ));
        assert!(matches!(
            decode_network_layer(EtherType::Ipv4, &IPV4_HDR[..10]),
            NetworkLayerResult::Malformed
        ));
        match decode_network_layer(EtherType::Ipv4, IPV4_HDR) {
            NetworkLayerResult::Ipv4(hdr, rem) => {
                assert_eq!(hdr.protocol, IpProtocol::Tcp);
                assert_eq!(rem.len(), 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
