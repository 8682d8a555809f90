use std::collections::HashSet;
use std::fmt;
use std::hash;
use std::str::from_utf8;

use byteorder::{BigEndian, ByteOrder};
use serde::{Serialize, Serializer};

use super::{Error, NameError};

/// Longest label allowed by RFC 1035, section 2.3.4
pub const MAX_LABEL_LEN: usize = 63;
/// Longest name allowed on the wire, length octets included
pub const MAX_NAME_LEN: usize = 255;

const POINTER_MASK: u8 = 0b1100_0000;

/// An owned domain name
///
/// Names decoded from a packet have all compression pointers resolved, so a
/// `Name` never borrows from the buffer it was read from. The root name is
/// stored as an empty string and displayed as `"."`.
///
/// Comparison and hashing ignore ASCII case.
#[derive(Debug, Clone)]
pub struct Name(String);

impl Name {
    pub fn root() -> Name {
        Name(String::new())
    }

    /// Parses a dotted name, validating it for use on the wire
    ///
    /// A single trailing dot is accepted. Every label must be between 1 and
    /// 63 bytes and the wire form must not exceed 255 bytes.
    pub fn from_str(name: &str) -> Result<Name, Error> {
        let trimmed = name.strip_suffix('.').unwrap_or(name);
        if trimmed.is_empty() {
            return Ok(Name::root());
        }

        let mut wire_len = 1;
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(Error::EmptyLabel(name.to_owned()));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong {
                    label: label.to_owned(),
                    len: label.len(),
                });
            }
            wire_len += label.len() + 1;
        }
        if wire_len > MAX_NAME_LEN {
            return Err(Error::NameTooLong(wire_len));
        }

        Ok(Name(trimmed.to_owned()))
    }

    /// Decodes a possibly compressed name starting at `offset` of `data`
    ///
    /// `data` must be the whole message since pointers are absolute offsets
    /// from its start. Returns the name and the offset right after it: after
    /// the terminating zero octet, or after the *first* pointer followed.
    ///
    /// Every pointer must point strictly before itself and at an offset not
    /// visited yet, so decoding terminates on any input.
    pub fn scan(data: &[u8], offset: usize) -> Result<(Name, usize), Error> {
        let mut name = String::new();
        let mut wire_len = 1;
        let mut pos = offset;
        let mut resume_at = None;
        let mut visited = HashSet::new();
        visited.insert(offset);

        loop {
            let byte = *data.get(pos).ok_or(Error::Truncated("domain name"))?;
            if byte == 0 {
                let next = resume_at.unwrap_or(pos + 1);
                return Ok((Name(name), next));
            } else if byte & POINTER_MASK == POINTER_MASK {
                if data.len() < pos + 2 {
                    return Err(Error::Truncated("compression pointer"));
                }
                let target = (BigEndian::read_u16(&data[pos..pos + 2]) & 0x3fff) as usize;
                if target >= data.len() {
                    return Err(NameError::PointerOutOfRange { at: pos, target }.into());
                }
                if target >= pos {
                    return Err(NameError::PointerNotBackward { at: pos, target }.into());
                }
                if !visited.insert(target) {
                    return Err(NameError::PointerLoop { at: pos, target }.into());
                }
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                pos = target;
            } else if byte & POINTER_MASK == 0 {
                let end = pos + byte as usize + 1;
                if end > data.len() {
                    return Err(Error::Truncated("label"));
                }
                wire_len += byte as usize + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(NameError::TooLong.into());
                }
                let label = from_utf8(&data[pos + 1..end])
                    .map_err(|_| NameError::LabelIsNotUtf8(pos))?;
                if label.contains('.') {
                    return Err(NameError::LabelContainsDot(pos).into());
                }
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(label);
                pos = end;
            } else {
                return Err(NameError::UnknownLabelFormat(pos).into());
            }
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|label| !label.is_empty())
    }

    /// Length of the uncompressed wire form
    pub fn wire_len(&self) -> usize {
        self.labels().map(|label| label.len() + 1).sum::<usize>() + 1
    }

    /// The last two labels, or the whole name if it is shorter
    pub fn registrable_domain(&self) -> Name {
        let labels: Vec<&str> = self.labels().collect();
        let start = labels.len().saturating_sub(2);
        Name(labels[start..].join("."))
    }

    /// Appends the uncompressed wire form
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        for label in self.labels() {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
    }
}

/// Decodes the name at `offset`, see [`Name::scan`]
pub fn decode_name(data: &[u8], offset: usize) -> Result<(Name, usize), Error> {
    Name::scan(data, offset)
}

/// Validates `name` and returns its uncompressed wire form
pub fn encode_name(name: &str) -> Result<Vec<u8>, Error> {
    let name = Name::from_str(name)?;
    let mut buf = Vec::with_capacity(name.wire_len());
    name.write_to(&mut buf);
    Ok(buf)
}

impl fmt::Display for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            fmt.write_str(".")
        } else {
            fmt.write_str(&self.0)
        }
    }
}

impl hash::Hash for Name {
    fn hash<H>(&self, state: &mut H)
    where
        H: hash::Hasher,
    {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Name) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Name {}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn packet_with(tail: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 12];
        buf.extend_from_slice(tail);
        buf
    }

    #[test]
    fn encode_then_decode() {
        for name in &["example.com", "ilab1.cs.rutgers.edu", "a", "x-y.z0"] {
            let wire = encode_name(name).unwrap();
            let (decoded, next) = decode_name(&wire, 0).unwrap();
            assert_eq!(decoded.as_str(), *name);
            assert_eq!(next, wire.len());
        }
    }

    #[test]
    fn encode_longest_name() {
        // 4 labels of 63 bytes = 4 * 64 + 1 = 257, so use 3 * 63 + 61
        let label = "a".repeat(63);
        let name = format!("{0}.{0}.{0}.{1}", label, "b".repeat(61));
        let wire = encode_name(&name).unwrap();
        assert_eq!(wire.len(), 255);
        assert_eq!(decode_name(&wire, 0).unwrap().0.as_str(), name);
    }

    #[test]
    fn encode_wire_format() {
        assert_eq!(
            encode_name("example.com.").unwrap(),
            b"\x07example\x03com\x00".to_vec()
        );
        assert_eq!(encode_name(".").unwrap(), vec![0]);
    }

    #[test]
    fn reject_long_label() {
        let name = format!("{}.com", "a".repeat(64));
        match encode_name(&name) {
            Err(Error::LabelTooLong { len, .. }) => assert_eq!(len, 64),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn reject_long_name() {
        let label = "a".repeat(63);
        let name = format!("{0}.{0}.{0}.{0}", label);
        assert_eq!(encode_name(&name), Err(Error::NameTooLong(257)));
    }

    #[test]
    fn reject_empty_label() {
        assert!(matches!(
            Name::from_str("a..b"),
            Err(Error::EmptyLabel(..))
        ));
    }

    #[test]
    fn follow_pointer() {
        // "a.b.c" at 12, then a bare pointer to it at 19
        let buf = packet_with(b"\x01a\x01b\x01c\x00\xc0\x0c");
        let (first, next) = decode_name(&buf, 12).unwrap();
        assert_eq!(first.as_str(), "a.b.c");
        assert_eq!(next, 19);

        let (second, next) = decode_name(&buf, 19).unwrap();
        assert_eq!(second.as_str(), "a.b.c");
        assert_eq!(next, 21);
    }

    #[test]
    fn cursor_fixed_at_first_pointer() {
        // 12: "b.c", 17: "a" + ptr(12), 21: "x" + ptr(17)
        let buf = packet_with(b"\x01b\x01c\x00\x01a\xc0\x0c\x01x\xc0\x11");
        let (name, next) = decode_name(&buf, 21).unwrap();
        assert_eq!(name.as_str(), "x.a.b.c");
        assert_eq!(next, 25);
    }

    #[test]
    fn pointer_back_to_start() {
        let buf = packet_with(b"\x01a\xc0\x0c");
        let err = decode_name(&buf, 12).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedName(NameError::PointerLoop { at: 14, target: 12 })
        );
    }

    #[test]
    fn pointer_to_itself() {
        let buf = packet_with(b"\xc0\x0c");
        let err = decode_name(&buf, 12).unwrap_err();
        assert!(err.is_malformed_name());
    }

    #[test]
    fn pointer_cycle_between_runs() {
        // 12: "a" + ptr(16), 16: "b" + ptr(12)
        let buf = packet_with(b"\x01a\xc0\x10\x01b\xc0\x0c");
        assert!(decode_name(&buf, 16).unwrap_err().is_malformed_name());
    }

    #[test]
    fn pointer_out_of_range() {
        let buf = packet_with(b"\xc0\xff");
        assert!(decode_name(&buf, 12).unwrap_err().is_malformed_name());
    }

    #[test]
    fn decoded_name_too_long() {
        // five full labels make 5 * 64 + 1 = 321 bytes
        let mut tail = Vec::new();
        for _ in 0..5 {
            tail.push(63);
            tail.extend_from_slice(&[b'a'; 63]);
        }
        tail.push(0);
        let buf = packet_with(&tail);
        assert_eq!(
            decode_name(&buf, 12),
            Err(Error::MalformedName(NameError::TooLong))
        );
    }

    #[test]
    fn reject_dot_inside_label() {
        let buf = packet_with(b"\x03a.b\x03com\x00");
        assert_eq!(
            decode_name(&buf, 12),
            Err(Error::MalformedName(NameError::LabelContainsDot(12)))
        );
    }

    #[test]
    fn truncated_label() {
        let buf = packet_with(b"\x07exam");
        assert!(decode_name(&buf, 12).unwrap_err().is_truncated());
    }

    #[test]
    fn missing_terminator() {
        let buf = packet_with(b"\x03com");
        assert!(decode_name(&buf, 12).unwrap_err().is_truncated());
    }

    #[test]
    fn unknown_label_format() {
        let buf = packet_with(b"\x41abc\x00");
        assert_eq!(
            decode_name(&buf, 12).unwrap_err(),
            Error::MalformedName(NameError::UnknownLabelFormat(12))
        );
    }

    #[test]
    fn case_insensitive_eq() {
        let lower = Name::from_str("ns1.example.com").unwrap();
        let upper = Name::from_str("NS1.Example.COM.").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn registrable_domain() {
        let name = Name::from_str("ilab1.cs.rutgers.edu").unwrap();
        assert_eq!(name.registrable_domain().as_str(), "rutgers.edu");
        let short = Name::from_str("com").unwrap();
        assert_eq!(short.registrable_domain().as_str(), "com");
    }

    #[test]
    fn root_display() {
        assert_eq!(Name::root().to_string(), ".");
        assert_eq!(decode_name(b"\x00", 0).unwrap().0, Name::root());
    }
}
