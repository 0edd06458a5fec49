use nom::bytes::complete::take;
use nom::error::{make_error, ErrorKind};
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::IResult;
use std::fmt;

use super::IpProtocol;

/// Size of a TCP header without options
pub const TCP_BASE_HEADER_LEN: usize = 20;

/// TCP control flags, as found in the 14th byte of the header
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;

    #[inline]
    fn bit(self, mask: u8) -> bool {
        self.0 & mask != 0
    }
    pub fn fin(self) -> bool {
        self.bit(Self::FIN)
    }
    pub fn syn(self) -> bool {
        self.bit(Self::SYN)
    }
    pub fn rst(self) -> bool {
        self.bit(Self::RST)
    }
    pub fn psh(self) -> bool {
        self.bit(Self::PSH)
    }
    pub fn ack(self) -> bool {
        self.bit(Self::ACK)
    }
    pub fn urg(self) -> bool {
        self.bit(Self::URG)
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (self.fin(), "FIN"),
            (self.syn(), "SYN"),
            (self.rst(), "RST"),
            (self.psh(), "PSH"),
            (self.ack(), "ACK"),
            (self.urg(), "URG"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// TCP header. Options are skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TcpHeader {
    pub source_port: u16,
    pub dest_port: u16,
    pub seq: u32,
    pub ack_seq: u32,
    /// Header length in bytes (data offset * 4), including options
    pub header_len: usize,
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_ptr: u16,
}

/// Result of the transport layer decoder
#[derive(Debug)]
pub enum TransportLayerResult<'a> {
    /// Header, and the segment payload
    Tcp(TcpHeader, &'a [u8]),
    NotTcp(IpProtocol),
    Malformed,
}

/// Decode the transport layer, if the network layer announced TCP
pub fn decode_transport_layer(protocol: IpProtocol, i: &[u8]) -> TransportLayerResult {
    if protocol != IpProtocol::Tcp {
        return TransportLayerResult::NotTcp(protocol);
    }
    match parse_tcp_header(i) {
        Ok((rem, header)) => TransportLayerResult::Tcp(header, rem),
        Err(_) => TransportLayerResult::Malformed,
    }
}

/// Parse a TCP header, and skip its options
pub fn parse_tcp_header(input: &[u8]) -> IResult<&[u8], TcpHeader> {
    let (i, source_port) = be_u16(input)?;
    let (i, dest_port) = be_u16(i)?;
    let (i, seq) = be_u32(i)?;
    let (i, ack_seq) = be_u32(i)?;
    let (i, data_offset) = be_u8(i)?;
    let header_len = ((data_offset >> 4) as usize) * 4;
    if header_len < TCP_BASE_HEADER_LEN {
        return Err(nom::Err::Error(make_error(input, ErrorKind::Verify)));
    }
    let (i, flags) = be_u8(i)?;
    let (i, window) = be_u16(i)?;
    let (i, checksum) = be_u16(i)?;
    let (i, urgent_ptr) = be_u16(i)?;
    let (i, _options) = take(header_len - TCP_BASE_HEADER_LEN)(i)?;
    let header = TcpHeader {
        source_port,
        dest_port,
        seq,
        ack_seq,
        header_len,
        flags: TcpFlags(flags),
        window,
        checksum,
        urgent_ptr,
    };
    Ok((i, header))
}
