use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder};

use super::{Error, Name, NameError, Type};

/// The enumeration that represents known types of DNS resource records data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(NsData),
    /// Anything that isn't interpreted, including A and AAAA records whose
    /// data has the wrong length
    Unknown(Vec<u8>),
}

/// Result of decoding the name held by an NS record
///
/// The name is first decoded against the whole message at the record data
/// offset. If that fails the record data is decoded on its own, and if that
/// fails too the raw bytes are kept. Each fallback keeps the errors that led
/// to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NsData {
    Name(Name),
    Isolated {
        name: Name,
        message_error: Error,
    },
    Raw {
        data: Vec<u8>,
        message_error: Error,
        isolated_error: Error,
    },
}

impl NsData {
    fn parse(original: &[u8], offset: usize, rdata: &[u8]) -> NsData {
        let rdata_end = offset + rdata.len();
        let message_error = match Name::scan(original, offset) {
            Ok((name, end)) if end == rdata_end => return NsData::Name(name),
            Ok((_, end)) => NameError::RdataLengthMismatch { end, rdata_end }.into(),
            Err(err) => err,
        };

        let isolated_error = match Name::scan(rdata, 0) {
            Ok((name, end)) if end == rdata.len() => {
                return NsData::Isolated {
                    name,
                    message_error,
                }
            }
            Ok((_, end)) => NameError::RdataLengthMismatch {
                end,
                rdata_end: rdata.len(),
            }
            .into(),
            Err(err) => err,
        };

        NsData::Raw {
            data: rdata.to_vec(),
            message_error,
            isolated_error,
        }
    }

    /// The name server, when either decoding succeeded
    pub fn name(&self) -> Option<&Name> {
        match *self {
            NsData::Name(ref name) | NsData::Isolated { ref name, .. } => Some(name),
            NsData::Raw { .. } => None,
        }
    }
}

/// Renders every group as four lowercase hex digits, without `::` shortening
pub fn format_ipv6(ip: &Ipv6Addr) -> String {
    ip.segments()
        .iter()
        .map(|segment| format!("{:04x}", segment))
        .collect::<Vec<_>>()
        .join(":")
}

impl RRData {
    /// Interprets `rdata`, which starts at `offset` in the `original` message
    pub fn parse(typ: Type, rdata: &[u8], offset: usize, original: &[u8]) -> RRData {
        match typ {
            Type::A if rdata.len() == 4 => RRData::A(Ipv4Addr::from(BigEndian::read_u32(rdata))),
            Type::AAAA if rdata.len() == 16 => {
                RRData::AAAA(Ipv6Addr::from(BigEndian::read_u128(rdata)))
            }
            Type::NS => RRData::NS(NsData::parse(original, offset, rdata)),
            _ => RRData::Unknown(rdata.to_vec()),
        }
    }

    /// The address as dotted quad or full-length hex groups
    pub fn ip(&self) -> Option<String> {
        match *self {
            RRData::A(ip) => Some(ip.to_string()),
            RRData::AAAA(ref ip) => Some(format_ipv6(ip)),
            _ => None,
        }
    }

    /// Appends the record data in wire form, names uncompressed
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match *self {
            RRData::A(ip) => buf.extend_from_slice(&ip.octets()),
            RRData::AAAA(ip) => buf.extend_from_slice(&ip.octets()),
            RRData::NS(NsData::Raw { ref data, .. }) | RRData::Unknown(ref data) => {
                buf.extend_from_slice(data)
            }
            RRData::NS(NsData::Name(ref name)) | RRData::NS(NsData::Isolated { ref name, .. }) => {
                name.write_to(buf)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_a() {
        let rdata = [93, 184, 216, 34];
        let data = RRData::parse(Type::A, &rdata, 0, &rdata);
        assert_eq!(data, RRData::A(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(data.ip().unwrap(), "93.184.216.34");
    }

    #[test]
    fn parse_aaaa() {
        let mut rdata = [0u8; 16];
        rdata[15] = 1;
        let data = RRData::parse(Type::AAAA, &rdata, 0, &rdata);
        assert_eq!(
            data.ip().unwrap(),
            "0000:0000:0000:0000:0000:0000:0000:0001"
        );
    }

    #[test]
    fn aaaa_lowercase_hex() {
        let ip: Ipv6Addr = "2001:DB8::ABCD".parse().unwrap();
        assert_eq!(format_ipv6(&ip), "2001:0db8:0000:0000:0000:0000:0000:abcd");
    }

    #[test]
    fn wrong_address_length() {
        let rdata = [1, 2, 3];
        let data = RRData::parse(Type::A, &rdata, 0, &rdata);
        assert_eq!(data, RRData::Unknown(vec![1, 2, 3]));
        assert_eq!(data.ip(), None);

        let data = RRData::parse(Type::AAAA, &[0u8; 4], 0, &[0u8; 4]);
        assert_eq!(data.ip(), None);
    }

    #[test]
    fn ns_with_pointer_into_message() {
        // 0: "example.com", 13: "ns1" + ptr(0)
        let message = b"\x07example\x03com\x00\x03ns1\xc0\x00";
        let data = RRData::parse(Type::NS, &message[13..], 13, message);
        match data {
            RRData::NS(NsData::Name(ref name)) => assert_eq!(name.as_str(), "ns1.example.com"),
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn ns_falls_back_to_isolated_rdata() {
        // the pointer lands on a bad label in the message but on a
        // terminator inside the record data
        let message = b"\x00\x40\x01\x00\xc0\x01";
        let data = NsData::parse(message, 2, &message[2..]);
        match data {
            NsData::Isolated {
                ref name,
                ref message_error,
            } => {
                assert_eq!(name.as_str(), "\u{0}");
                assert_eq!(
                    *message_error,
                    Error::MalformedName(NameError::UnknownLabelFormat(1))
                );
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn ns_keeps_raw_bytes() {
        let message = b"\x00\x03ns";
        let data = NsData::parse(message, 1, &message[1..]);
        assert_eq!(data.name(), None);
        match data {
            NsData::Raw {
                data,
                message_error,
                isolated_error,
            } => {
                assert_eq!(data, b"\x03ns".to_vec());
                assert!(message_error.is_truncated());
                assert!(isolated_error.is_truncated());
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn other_types_are_opaque() {
        let rdata = b"\x04text";
        let data = RRData::parse(Type::TXT, rdata, 0, rdata);
        assert_eq!(data, RRData::Unknown(rdata.to_vec()));
    }
}
