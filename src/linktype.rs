use rusticata_macros::newtype_enum;

/// Data link type, as stored in the pcap file header
///
/// Only `ETHERNET` and `LINUX_SLL` can be decoded, the other names are used
/// to report unsupported captures.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,
    RAW = 101,
    LINUX_SLL = 113,
    LINUX_SLL2 = 276,
}
}

#[cfg(test)]
mod tests {
    use super::Linktype;
    use crate::PcapError;

    #[test]
    fn test_linktype_display() {
        assert_eq!(Linktype::LINUX_SLL.to_string(), "LINUX_SLL");
        assert_eq!(Linktype(113), Linktype::LINUX_SLL);
        assert_eq!(
            PcapError::UnsupportedLinkType(Linktype(276)).to_string(),
            "unsupported link type LINUX_SLL2"
        );
    }
}
