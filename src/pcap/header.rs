use nom::number::streaming::le_u32;
use nom::IResult;

use crate::endianness::{ByteOrder, PcapBE, PcapEndianness, PcapLE};
use crate::linktype::Linktype;
use crate::PcapError;

/// Magic number of a microsecond-resolution pcap file, read in file order
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
/// [`PCAP_MAGIC`] as seen when the file was written with the other byte order
pub const PCAP_MAGIC_SWAPPED: u32 = 0xd4c3_b2a1;

/// Size of the pcap global header
pub const PCAP_HEADER_LEN: usize = 24;

/// PCAP global header
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PcapHeader {
    /// Byte order of the file, resolved from the magic number
    pub byte_order: ByteOrder,
    /// Version major number (currently 2)
    pub version_major: u16,
    /// Version minor number (currently 4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the following packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
}

impl PcapHeader {
    pub const fn size(&self) -> usize {
        PCAP_HEADER_LEN
    }

    pub fn is_bigendian(&self) -> bool {
        self.byte_order == ByteOrder::BigEndian
    }
}

/// Read the PCAP global header
///
/// The magic number is checked first: as soon as 4 bytes are available, an unknown magic fails
/// with `UnrecognizedFormat`, even if the rest of the header is missing. Other short inputs
/// return `Incomplete`.
pub fn parse_pcap_header(i: &[u8]) -> IResult<&[u8], PcapHeader, PcapError> {
    let (_, magic_number) = le_u32(i)?;
    match magic_number {
        PCAP_MAGIC => parse_pcap_header_e::<PcapLE>(i),
        PCAP_MAGIC_SWAPPED => parse_pcap_header_e::<PcapBE>(i),
        _ => Err(nom::Err::Error(PcapError::UnrecognizedFormat(magic_number))),
    }
}

fn parse_pcap_header_e<E: PcapEndianness>(i: &[u8]) -> IResult<&[u8], PcapHeader, PcapError> {
    let (i, _magic) = E::parse_u32(i)?;
    let (i, version_major) = E::parse_u16(i)?;
    let (i, version_minor) = E::parse_u16(i)?;
    let (i, thiszone) = E::parse_i32(i)?;
    let (i, sigfigs) = E::parse_u32(i)?;
    let (i, snaplen) = E::parse_u32(i)?;
    let (i, network) = E::parse_i32(i)?;
    let header = PcapHeader {
        byte_order: E::ORDER,
        version_major,
        version_minor,
        thiszone,
        sigfigs,
        snaplen,
        network: Linktype(network),
    };
    Ok((i, header))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use hex_literal::hex;

    pub const PCAP_HDR_LE: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
00 00 04 00 01 00 00 00"
    );
    pub const PCAP_HDR_BE: &[u8] = &hex!(
        "
A1 B2 C3 D4 00 02 00 04 FF FF FF C4 00 00 00 00
00 00 FF FF 00 00 00 71"
    );

    #[test]
    fn test_parse_pcap_header_le() {
        let (rem, hdr) = parse_pcap_header(PCAP_HDR_LE).expect("header parsing failed");
        assert!(rem.is_empty());
        assert_eq!(hdr.byte_order, ByteOrder::LittleEndian);
        assert_eq!(hdr.version_major, 2);
        assert_eq!(hdr.version_minor, 4);
        assert_eq!(hdr.snaplen, 262_144);
        assert_eq!(hdr.network, Linktype::ETHERNET);
    }
    #[test]
    fn test_parse_pcap_header_be() {
        let (rem, hdr) = parse_pcap_header(PCAP_HDR_BE).expect("header parsing failed");
        assert!(rem.is_empty());
        assert!(hdr.is_bigendian());
        assert_eq!(hdr.version_major, 2);
        assert_eq!(hdr.thiszone, -60);
        assert_eq!(hdr.snaplen, 65535);
        assert_eq!(hdr.network, Linktype::LINUX_SLL);
    }
    #[test]
    fn test_parse_pcap_header_bad_magic() {
        // pcapng section header block
        let data = hex!("0A 0D 0D 0A 1C 00 00 00");
        let res = parse_pcap_header(&data);
        assert_eq!(
            res,
            Err(nom::Err::Error(PcapError::UnrecognizedFormat(0x0a0d_0d0a)))
        );
        // nanosecond-resolution pcap is not supported
        let res = parse_pcap_header(&hex!("4D 3C B2 A1 02 00 04 00"));
        assert!(matches!(
            res,
            Err(nom::Err::Error(PcapError::UnrecognizedFormat(_)))
        ));
    }
    #[test]
    fn test_parse_pcap_header_incomplete() {
        let res = parse_pcap_header(&PCAP_HDR_LE[..20]);
        assert!(matches!(res, Err(nom::Err::Incomplete(_))));
        let res = parse_pcap_header(&PCAP_HDR_LE[..2]);
        assert!(matches!(res, Err(nom::Err::Incomplete(_))));
    }
}
