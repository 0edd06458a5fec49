use circular::Buffer;
use log::{debug, warn};
use nom::{Needed, Offset};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::frame::{parse_pcap_frame, parse_pcap_frame_be, FrameParseFn, RawFrame};
use super::header::{parse_pcap_header, PcapHeader, PCAP_HEADER_LEN};
use crate::endianness::ByteOrder;
use crate::error::PcapError;
use crate::layers::LinkLayer;
use crate::linktype::Linktype;
use crate::stream::TcpPackets;

/// Buffer capacity used by [`CaptureFile::open`]
pub const DEFAULT_CAPACITY: usize = 65536;

/// Streaming reader over a legacy pcap capture
///
/// The reader is based on a circular buffer, which means memory usage is constant (apart from
/// frames larger than the buffer, which make it grow), and that it can be used to parse huge
/// files or infinite streams. It owns the underlying `Read` source, which is released when the
/// reader (or the packet iterator built from it) is dropped.
///
/// The global header is parsed when the reader is created, and the link layer decoder is
/// selected from its link type. Frames can then be read one at a time with
/// [`next_frame`](#method.next_frame), or decoded to TCP packets with
/// [`packets`](#method.packets).
///
/// ## Example
///
/// ```rust,no_run
/// use pcap_tcp::CaptureFile;
///
/// # fn main() -> Result<(), pcap_tcp::PcapError> {
/// let capture = CaptureFile::open("capture.pcap")?;
/// for packet in capture.packets() {
///     let packet = packet?;
///     println!(
///         "{} {}:{} -> {}:{} [{}]",
///         packet.timestamp(),
///         packet.source(),
///         packet.source_port(),
///         packet.destination(),
///         packet.dest_port(),
///         packet.flags()
///     );
/// }
/// # Ok(())
/// # }
/// ```
pub struct CaptureFile<R>
where
    R: Read,
{
    header: PcapHeader,
    link: LinkLayer,
    reader: R,
    buffer: Buffer,
    consumed: usize,
    frames_read: u64,
    reader_exhausted: bool,
    parse: FrameParseFn,
}

impl CaptureFile<File> {
    /// Open a capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<CaptureFile<File>, PcapError> {
        let file = File::open(path)?;
        CaptureFile::new(DEFAULT_CAPACITY, file)
    }
}

impl<R> CaptureFile<R>
where
    R: Read,
{
    /// Creates a new `CaptureFile<R>` with the provided buffer capacity, and read the global
    /// header.
    ///
    /// Returns `PcapError::Eof` if the source is empty.
    pub fn new(capacity: usize, reader: R) -> Result<CaptureFile<R>, PcapError> {
        let buffer = Buffer::with_capacity(capacity.max(PCAP_HEADER_LEN));
        Self::from_buffer(buffer, reader)
    }

    /// Creates a new `CaptureFile<R>` using the provided `Buffer`.
    pub fn from_buffer(mut buffer: Buffer, mut reader: R) -> Result<CaptureFile<R>, PcapError> {
        if buffer.capacity() < PCAP_HEADER_LEN {
            buffer.grow(PCAP_HEADER_LEN);
        }
        let mut reader_exhausted = false;
        let header = loop {
            match parse_pcap_header(buffer.data()) {
                Ok((_, header)) => break header,
                Err(nom::Err::Incomplete(_)) if !reader_exhausted => {
                    reader_exhausted = fill_buffer(&mut buffer, &mut reader)?;
                }
                Err(nom::Err::Incomplete(_)) => {
                    let available = buffer.available_data();
                    if available == 0 {
                        return Err(PcapError::Eof);
                    }
                    return Err(PcapError::TruncatedHeader { available });
                }
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(e),
            }
        };
        debug!(
            "pcap header: version {}.{}, {:?}, snaplen {}, link type {}",
            header.version_major,
            header.version_minor,
            header.byte_order,
            header.snaplen,
            header.network
        );
        let link = LinkLayer::try_from(header.network)?;
        let parse: FrameParseFn = match header.byte_order {
            ByteOrder::LittleEndian => parse_pcap_frame,
            ByteOrder::BigEndian => parse_pcap_frame_be,
        };
        buffer.consume(header.size());
        Ok(CaptureFile {
            header,
            link,
            reader,
            buffer,
            consumed: PCAP_HEADER_LEN,
            frames_read: 0,
            reader_exhausted,
            parse,
        })
    }

    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    pub fn linktype(&self) -> Linktype {
        self.header.network
    }

    /// Link layer decoder for the frames of this capture
    pub fn link_layer(&self) -> LinkLayer {
        self.link
    }

    /// Number of bytes of the source consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Number of frames returned so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` when the source ends exactly after a frame. A frame cut by the end of
    /// the source is an error (`TruncatedFrame`), and no data is returned for it.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>, PcapError> {
        loop {
            let data = self.buffer.data();
            match (self.parse)(data) {
                Ok((rem, record)) => {
                    let offset = data.offset(rem);
                    let frame = RawFrame::from(record);
                    self.buffer.consume(offset);
                    self.consumed += offset;
                    self.frames_read += 1;
                    return Ok(Some(frame));
                }
                Err(nom::Err::Incomplete(needed)) => {
                    let available = self.buffer.available_data();
                    let expected = match needed {
                        Needed::Size(n) => available + n.get(),
                        Needed::Unknown => available + 1,
                    };
                    if self.reader_exhausted {
                        if available == 0 {
                            return Ok(None);
                        }
                        warn!(
                            "truncated frame at offset {}: {} of {} bytes",
                            self.consumed, available, expected
                        );
                        return Err(PcapError::TruncatedFrame {
                            expected,
                            available,
                        });
                    }
                    // caplen is untrusted: only grow a full buffer, one doubling at a time
                    let capacity = self.buffer.capacity();
                    if expected > capacity && available == capacity {
                        self.buffer.grow((capacity * 2).min(expected));
                    }
                    self.refill()?;
                }
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(e),
            }
        }
    }

    /// Decode the capture to TCP packets
    pub fn packets(self) -> TcpPackets<R> {
        TcpPackets::new(self)
    }

    fn refill(&mut self) -> Result<(), PcapError> {
        self.reader_exhausted = fill_buffer(&mut self.buffer, &mut self.reader)?;
        Ok(())
    }
}

/// Shift the buffer and read as much data as possible. Returns true if the reader is exhausted.
fn fill_buffer<R: Read>(buffer: &mut Buffer, reader: &mut R) -> Result<bool, PcapError> {
    buffer.shift();
    // check if available space is empty, so we can distinguish
    // a read() returning 0 because of EOF or because we requested 0
    if buffer.available_space() == 0 {
        return Ok(false);
    }
    loop {
        match reader.read(buffer.space()) {
            Ok(sz) => {
                buffer.fill(sz);
                return Ok(sz == 0);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::header::tests::{PCAP_HDR_BE, PCAP_HDR_LE};
    use std::io;

    /// Returns at most `chunk` bytes per read
    struct ChunkedReader<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl<'a> Read for ChunkedReader<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn capture_le(frames: &[&[u8]]) -> Vec<u8> {
        let mut v = PCAP_HDR_LE.to_vec();
        for (idx, f) in frames.iter().enumerate() {
            v.extend_from_slice(&(idx as u32).to_le_bytes());
            v.extend_from_slice(&0u32.to_le_bytes());
            v.extend_from_slice(&(f.len() as u32).to_le_bytes());
            v.extend_from_slice(&(f.len() as u32).to_le_bytes());
            v.extend_from_slice(f);
        }
        v
    }

    #[test]
    fn test_empty_source() {
        let empty: &[u8] = &[];
        assert_eq!(CaptureFile::new(1024, empty).err(), Some(PcapError::Eof));
    }
    #[test]
    fn test_truncated_header() {
        let res = CaptureFile::new(1024, &PCAP_HDR_LE[..23]);
        assert_eq!(
            res.err(),
            Some(PcapError::TruncatedHeader { available: 23 })
        );
        let res = CaptureFile::new(1024, &PCAP_HDR_LE[..1]);
        assert_eq!(res.err(), Some(PcapError::TruncatedHeader { available: 1 }));
    }
    #[test]
    fn test_unsupported_linktype() {
        let mut data = PCAP_HDR_LE.to_vec();
        data[20] = 101;
        let res = CaptureFile::new(1024, &data[..]);
        assert_eq!(
            res.err(),
            Some(PcapError::UnsupportedLinkType(Linktype::RAW))
        );
    }
    #[test]
    fn test_header_byte_order() {
        let capture = CaptureFile::new(1024, PCAP_HDR_BE).expect("CaptureFile");
        assert_eq!(capture.byte_order(), ByteOrder::BigEndian);
        assert_eq!(capture.linktype(), Linktype::LINUX_SLL);
        assert_eq!(capture.link_layer(), LinkLayer::LinuxSll);
        assert_eq!(capture.consumed(), 24);
    }
    #[test]
    fn test_next_frame() {
        let data = capture_le(&[&[1, 2, 3], &[], &[4, 5]]);
        let mut capture = CaptureFile::new(1024, &data[..]).expect("CaptureFile");
        let f = capture.next_frame().expect("frame 1").expect("frame 1");
        assert_eq!(f.data, vec![1, 2, 3]);
        assert_eq!(f.ts_sec, 0);
        let f = capture.next_frame().expect("frame 2").expect("frame 2");
        assert!(f.data.is_empty());
        let f = capture.next_frame().expect("frame 3").expect("frame 3");
        assert_eq!(f.data, vec![4, 5]);
        assert_eq!(f.ts_sec, 2);
        assert_eq!(capture.next_frame(), Ok(None));
        assert_eq!(capture.frames_read(), 3);
        assert_eq!(capture.consumed(), data.len());
    }
    #[test]
    fn test_next_frame_small_reads_and_buffer() {
        let big = vec![0xaa; 300];
        let data = capture_le(&[&big, &[1], &big]);
        let reader = ChunkedReader {
            data: &data,
            chunk: 7,
        };
        // buffer smaller than a frame
        let mut capture = CaptureFile::new(32, reader).expect("CaptureFile");
        let mut sizes = Vec::new();
        while let Some(f) = capture.next_frame().expect("next_frame") {
            sizes.push(f.data.len());
        }
        assert_eq!(sizes, vec![300, 1, 300]);
    }
    #[test]
    fn test_truncated_frame_body() {
        let data = capture_le(&[&[1, 2, 3], &[4, 5, 6, 7]]);
        let mut capture = CaptureFile::new(1024, &data[..data.len() - 1]).expect("CaptureFile");
        assert!(capture.next_frame().expect("frame 1").is_some());
        assert_eq!(
            capture.next_frame(),
            Err(PcapError::TruncatedFrame {
                expected: 20,
                available: 19
            })
        );
    }
    #[test]
    fn test_huge_caplen_truncated() {
        let mut data = PCAP_HDR_LE.to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0x2000_0000u32.to_le_bytes());
        data.extend_from_slice(&0x2000_0000u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);
        let mut capture = CaptureFile::new(1024, &data[..]).expect("CaptureFile");
        assert_eq!(
            capture.next_frame(),
            Err(PcapError::TruncatedFrame {
                expected: 0x2000_0010,
                available: 20
            })
        );
        assert_eq!(capture.buffer.capacity(), 1024);
    }
    #[test]
    fn test_buffer_growth_bounded_by_data() {
        // the declared frame is larger than the source: the buffer only doubles while full
        let mut data = PCAP_HDR_LE.to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        data.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        data.extend_from_slice(&[0x55; 100]);
        let reader = ChunkedReader {
            data: &data,
            chunk: 7,
        };
        let mut capture = CaptureFile::new(32, reader).expect("CaptureFile");
        assert_eq!(
            capture.next_frame(),
            Err(PcapError::TruncatedFrame {
                expected: 0xffff_ffff + 16,
                available: 116
            })
        );
        assert!(capture.buffer.capacity() <= 256);
    }
    #[test]
    fn test_truncated_frame_header() {
        let data = capture_le(&[&[1, 2, 3]]);
        let mut data = data.clone();
        data.extend_from_slice(&[0, 0, 0, 0, 0]);
        let mut capture = CaptureFile::new(1024, &data[..]).expect("CaptureFile");
        assert!(capture.next_frame().expect("frame 1").is_some());
        assert_eq!(
            capture.next_frame(),
            Err(PcapError::TruncatedFrame {
                expected: 16,
                available: 5
            })
        );
    }
    #[test]
    fn test_read_error() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }
        assert_eq!(
            CaptureFile::new(1024, FailingReader).err(),
            Some(PcapError::ReadError(io::ErrorKind::PermissionDenied))
        );
    }
}
