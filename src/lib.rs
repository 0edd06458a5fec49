//! # PCAP to TCP decoder
//!
//! This crate reads captures in the legacy pcap format and decodes their frames down to the
//! TCP layer, giving for each TCP segment over IPv4 its timestamp, addresses, ports, sequence
//! numbers, flags and payload. Frames of other protocols are skipped.
//!
//! Supported link types are Ethernet (with an optional 802.1Q tag) and Linux cooked capture
//! (SLL). Captures are read through a circular buffer, so memory usage does not depend on the
//! capture size.
//!
//! # Example: streaming decoder
//!
//! The following code prints all TCP segments of a capture, using a
//! [CaptureFile](pcap/struct.CaptureFile.html) reader and its packet iterator.
//!
//! ```rust
//! use pcap_tcp::*;
//!
//! # fn main() -> Result<(), PcapError> {
//! # let path = "assets/tcp-gaps.pcap";
//! let capture = CaptureFile::open(path)?;
//! println!("link type: {}", capture.linktype());
//! let mut num_packets = 0;
//! for packet in capture.packets() {
//!     let packet = packet?;
//!     println!(
//!         "{:.6} {}:{} -> {}:{} [{}] {} bytes",
//!         packet.timestamp(),
//!         packet.source(),
//!         packet.source_port(),
//!         packet.destination(),
//!         packet.dest_port(),
//!         packet.flags(),
//!         packet.payload.len()
//!     );
//!     num_packets += 1;
//! }
//! println!("num_packets: {}", num_packets);
//! # Ok(())
//! # }
//! ```
//!
//! Frames can also be read one at a time with
//! [CaptureFile::next_frame](pcap/struct.CaptureFile.html#method.next_frame), and decoded with
//! [decode_frame](fn.decode_frame.html), which reports why a frame was skipped.
//!
//! # Example: idle connections
//!
//! The [gaps](gaps/index.html) module finds packets sent after a long idle period on their
//! connection. See `demos/find-slow-gaps.rs` for a complete program.

mod endianness;
mod error;
mod linktype;
mod packet;
mod stream;

pub use endianness::ByteOrder;
pub use error::*;
pub use linktype::*;
pub use packet::*;
pub use stream::*;

pub mod gaps;
pub mod layers;
pub mod pcap;

pub use gaps::{ConnectionKey, GapAlert, GapConfig, GapDetector};
pub use pcap::{CaptureFile, PcapHeader, RawFrame};
