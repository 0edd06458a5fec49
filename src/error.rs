use crate::linktype::Linktype;
use nom::error::{ErrorKind, ParseError};
use std::io;
use thiserror::Error;

/// Fatal errors while opening or reading a capture file
///
/// Frames whose protocol chain is not TCP over IPv4 are skipped, and never reported here.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PcapError {
    /// The input contained no data at all
    #[error("no data")]
    Eof,
    #[error("read error: {0}")]
    ReadError(io::ErrorKind),

    #[error("unrecognized file format (magic {0:#010x})")]
    UnrecognizedFormat(u32),
    #[error("truncated file header ({available} of 24 bytes)")]
    TruncatedHeader { available: usize },
    #[error("truncated frame ({available} of {expected} bytes)")]
    TruncatedFrame { expected: usize, available: usize },
    #[error("unsupported link type {0}")]
    UnsupportedLinkType(Linktype),

    #[error("nom error: {0:?}")]
    NomError(ErrorKind),
}

impl<I> ParseError<I> for PcapError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        PcapError::NomError(kind)
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<io::Error> for PcapError {
    fn from(e: io::Error) -> Self {
        PcapError::ReadError(e.kind())
    }
}
