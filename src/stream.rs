use log::trace;
use nom::Offset;
use std::fmt;
use std::io::Read;
use std::iter::FusedIterator;

use crate::error::PcapError;
use crate::layers::{
    decode_network_layer, decode_transport_layer, EtherType, IpProtocol, LinkLayer,
    LinkLayerResult, NetworkLayerResult, TransportLayerResult,
};
use crate::packet::DecodedPacket;
use crate::pcap::{CaptureFile, RawFrame};

/// Decoding layer, used to report malformed frames
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layer {
    Link,
    Network,
    Transport,
}

/// Why a frame did not produce a packet
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    NotIpv4(EtherType),
    NotTcp(IpProtocol),
    /// A header was too short for the captured data, or had an invalid length field
    Malformed(Layer),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::NotIpv4(ethertype) => write!(f, "not IPv4: {}", ethertype),
            SkipReason::NotTcp(protocol) => write!(f, "not TCP: {}", protocol),
            SkipReason::Malformed(layer) => write!(f, "malformed {:?} header", layer),
        }
    }
}

/// Result of decoding one frame through the protocol chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Packet(DecodedPacket),
    Skipped(SkipReason),
}

/// Decode a frame through the link, network and transport layers
///
/// The frame is not modified, so decoding it again gives the same result.
pub fn decode_frame(link: LinkLayer, frame: &RawFrame) -> FrameOutcome {
    let data = frame.data.as_slice();
    let (link_header, rem) = match link.decode(data) {
        LinkLayerResult::Decoded(header, rem) => (header, rem),
        LinkLayerResult::Malformed => {
            return FrameOutcome::Skipped(SkipReason::Malformed(Layer::Link))
        }
    };
    let (ip, rem) = match decode_network_layer(link_header.ethertype(), rem) {
        NetworkLayerResult::Ipv4(header, rem) => (header, rem),
        NetworkLayerResult::NotIpv4(ethertype) => {
            return FrameOutcome::Skipped(SkipReason::NotIpv4(ethertype))
        }
        NetworkLayerResult::Malformed => {
            return FrameOutcome::Skipped(SkipReason::Malformed(Layer::Network))
        }
    };
    let (tcp, payload) = match decode_transport_layer(ip.protocol, rem) {
        TransportLayerResult::Tcp(header, payload) => (header, payload),
        TransportLayerResult::NotTcp(protocol) => {
            return FrameOutcome::Skipped(SkipReason::NotTcp(protocol))
        }
        TransportLayerResult::Malformed => {
            return FrameOutcome::Skipped(SkipReason::Malformed(Layer::Transport))
        }
    };
    let offset = data.offset(payload);
    FrameOutcome::Packet(DecodedPacket {
        ts_sec: frame.ts_sec,
        ts_usec: frame.ts_usec,
        caplen: frame.caplen,
        origlen: frame.origlen,
        link: link_header,
        ip,
        tcp,
        offset,
        payload: payload.to_vec(),
    })
}

/// Iterator over the TCP packets of a capture
///
/// Frames that are not TCP over IPv4 are skipped. A read or truncation error is returned once,
/// and ends the iteration.
pub struct TcpPackets<R: Read> {
    capture: CaptureFile<R>,
    done: bool,
}

impl<R: Read> TcpPackets<R> {
    pub(crate) fn new(capture: CaptureFile<R>) -> Self {
        TcpPackets {
            capture,
            done: false,
        }
    }

    /// The capture being read
    pub fn capture(&self) -> &CaptureFile<R> {
        &self.capture
    }
}

impl<R: Read> Iterator for TcpPackets<R> {
    type Item = Result<DecodedPacket, PcapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let link = self.capture.link_layer();
        loop {
            let frame = match self.capture.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            match decode_frame(link, &frame) {
                FrameOutcome::Packet(packet) => return Some(Ok(packet)),
                FrameOutcome::Skipped(reason) => {
                    trace!("frame {}: skipped, {}", self.capture.frames_read(), reason);
                }
            }
        }
    }
}

impl<R: Read> FusedIterator for TcpPackets<R> {}
