//! PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! A capture starts with a 24-byte global header, giving the byte order (from the magic number)
//! and the link type of every frame. Each frame is then stored as a 16-byte record header
//! followed by `caplen` bytes of data.
//!
//! [`CaptureFile`](struct.CaptureFile.html) reads a capture from any `Read` source. The global
//! header can also be parsed using [`parse_pcap_header`](fn.parse_pcap_header.html), and frames
//! using [`parse_pcap_frame`](fn.parse_pcap_frame.html) or
//! [`parse_pcap_frame_be`](fn.parse_pcap_frame_be.html).

mod frame;
mod header;
mod reader;

pub use frame::*;
pub use header::*;
pub use reader::*;
