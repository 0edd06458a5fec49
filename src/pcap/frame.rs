use nom::bytes::streaming::take;
use nom::{IResult, Needed};

use crate::endianness::{PcapBE, PcapEndianness, PcapLE};
use crate::PcapError;

/// Size of the record header preceding each frame
pub const FRAME_HEADER_LEN: usize = 16;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Frame record borrowed from the read buffer
#[derive(Debug)]
pub struct FrameRecord<'a> {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub caplen: u32,
    pub origlen: u32,
    pub data: &'a [u8],
}

/// One captured frame, detached from the reader
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    /// The date and time when this packet was captured (seconds since epoch).
    pub ts_sec: u32,
    /// The date and time when this packet was captured (microseconds part).
    pub ts_usec: u32,
    /// The number of bytes of packet data actually captured and saved in the file.
    pub caplen: u32,
    /// The length of the packet as it appeared on the network when it was captured.
    /// If `caplen` and `origlen` differ, the saved packet size was limited by `snaplen`.
    pub origlen: u32,
    /// Captured bytes, starting at the link layer header
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Capture timestamp, in seconds
    pub fn timestamp(&self) -> f64 {
        self.ts_sec as f64 + self.ts_usec as f64 / MICROS_PER_SEC
    }
}

impl<'a> From<FrameRecord<'a>> for RawFrame {
    fn from(r: FrameRecord<'a>) -> RawFrame {
        RawFrame {
            ts_sec: r.ts_sec,
            ts_usec: r.ts_usec,
            caplen: r.caplen,
            origlen: r.origlen,
            data: r.data.to_vec(),
        }
    }
}

pub(crate) type FrameParseFn = fn(&[u8]) -> IResult<&[u8], FrameRecord, PcapError>;

/// Read a PCAP record header and data
///
/// Each PCAP record starts with a small header, and is followed by packet data.
/// The packet data format depends on the LinkType.
pub fn parse_pcap_frame(i: &[u8]) -> IResult<&[u8], FrameRecord, PcapError> {
    parse_pcap_frame_e::<PcapLE>(i)
}

/// Read a PCAP record header and data (big-endian)
pub fn parse_pcap_frame_be(i: &[u8]) -> IResult<&[u8], FrameRecord, PcapError> {
    parse_pcap_frame_e::<PcapBE>(i)
}

fn parse_pcap_frame_e<E: PcapEndianness>(i: &[u8]) -> IResult<&[u8], FrameRecord, PcapError> {
    if i.len() < FRAME_HEADER_LEN {
        return Err(nom::Err::Incomplete(Needed::new(FRAME_HEADER_LEN - i.len())));
    }
    let (i, ts_sec) = E::parse_u32(i)?;
    let (i, ts_usec) = E::parse_u32(i)?;
    let (i, caplen) = E::parse_u32(i)?;
    let (i, origlen) = E::parse_u32(i)?;
    let (i, data) = take(caplen as usize)(i)?;
    let record = FrameRecord {
        ts_sec,
        ts_usec,
        caplen,
        origlen,
        data,
    };
    Ok((i, record))
}
