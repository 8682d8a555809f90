use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use super::{Error, Opcode, ResponseCode};

pub const HEADER_SIZE: usize = 12;

mod flag {
    pub const QUERY: u16 = 0b1000_0000_0000_0000;
    pub const OPCODE_MASK: u16 = 0b0111_1000_0000_0000;
    pub const AUTHORITATIVE: u16 = 0b0000_0100_0000_0000;
    pub const TRUNCATED: u16 = 0b0000_0010_0000_0000;
    pub const RECURSION_DESIRED: u16 = 0b0000_0001_0000_0000;
    pub const RECURSION_AVAILABLE: u16 = 0b0000_0000_1000_0000;
    pub const RESPONSE_CODE_MASK: u16 = 0b0000_0000_0000_1111;
}

/// Represents parsed header of the packet
///
/// `query` is true for queries, which have the QR bit *cleared*.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Header {
    pub id: u16,
    pub query: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: ResponseCode,
    pub questions: u16,
    pub answers: u16,
    pub nameservers: u16,
    pub additional: u16,
}

impl Header {
    /// Decodes the fixed 12-byte header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Header, Error> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Truncated("header"));
        }
        let flags = BigEndian::read_u16(&data[2..4]);
        Ok(Header {
            id: BigEndian::read_u16(&data[..2]),
            query: flags & flag::QUERY == 0,
            opcode: (((flags & flag::OPCODE_MASK) >> flag::OPCODE_MASK.trailing_zeros()) as u8)
                .into(),
            authoritative: flags & flag::AUTHORITATIVE != 0,
            truncated: flags & flag::TRUNCATED != 0,
            recursion_desired: flags & flag::RECURSION_DESIRED != 0,
            recursion_available: flags & flag::RECURSION_AVAILABLE != 0,
            response_code: ((flags & flag::RESPONSE_CODE_MASK) as u8).into(),
            questions: BigEndian::read_u16(&data[4..6]),
            answers: BigEndian::read_u16(&data[6..8]),
            nameservers: BigEndian::read_u16(&data[8..10]),
            additional: BigEndian::read_u16(&data[10..12]),
        })
    }

    /// Packs the flag bits; bits 4 to 6 are always zero
    pub fn flags(&self) -> u16 {
        let mut flags = 0u16;
        if !self.query {
            flags |= flag::QUERY;
        }
        flags |= (u8::from(self.opcode) as u16) << flag::OPCODE_MASK.trailing_zeros();
        if self.authoritative {
            flags |= flag::AUTHORITATIVE;
        }
        if self.truncated {
            flags |= flag::TRUNCATED;
        }
        if self.recursion_desired {
            flags |= flag::RECURSION_DESIRED;
        }
        if self.recursion_available {
            flags |= flag::RECURSION_AVAILABLE;
        }
        flags | u8::from(self.response_code) as u16
    }

    /// Writes the header into the first 12 bytes of `data`
    ///
    /// # Panics
    ///
    /// When the buffer is shorter than 12 bytes.
    pub fn write(&self, data: &mut [u8]) {
        if data.len() < HEADER_SIZE {
            panic!("Header size is exactly 12 bytes");
        }
        BigEndian::write_u16(&mut data[..2], self.id);
        BigEndian::write_u16(&mut data[2..4], self.flags());
        BigEndian::write_u16(&mut data[4..6], self.questions);
        BigEndian::write_u16(&mut data[6..8], self.answers);
        BigEndian::write_u16(&mut data[8..10], self.nameservers);
        BigEndian::write_u16(&mut data[10..12], self.additional);
    }
}

/// Same layout as the original exercise output, one number per field
impl Serialize for Header {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Header", 12)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("qr", &u8::from(!self.query))?;
        state.serialize_field("opcode", &u8::from(self.opcode))?;
        state.serialize_field("aa", &u8::from(self.authoritative))?;
        state.serialize_field("tc", &u8::from(self.truncated))?;
        state.serialize_field("rd", &u8::from(self.recursion_desired))?;
        state.serialize_field("ra", &u8::from(self.recursion_available))?;
        state.serialize_field("rcode", &u8::from(self.response_code))?;
        state.serialize_field("qdcount", &self.questions)?;
        state.serialize_field("ancount", &self.answers)?;
        state.serialize_field("nscount", &self.nameservers)?;
        state.serialize_field("arcount", &self.additional)?;
        state.end()
    }
}
