use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{Class, Header, Name, NsData, RRData, Type};

/// Parsed DNS packet
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Response {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    #[serde(rename = "authorities")]
    pub nameservers: Vec<ResourceRecord>,
    #[serde(rename = "additionals")]
    pub additional: Vec<ResourceRecord>,
}

/// A parsed chunk of data in the Query section of the packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Type,
    pub qclass: Class,
}

/// A single DNS record
///
/// `rdlength` is the declared length of the record data, whatever `data`
/// ended up holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub typ: Type,
    pub cls: Class,
    pub ttl: u32,
    pub rdlength: u16,
    pub data: RRData,
}

impl ResourceRecord {
    pub fn is_address(&self) -> bool {
        self.typ == Type::A || self.typ == Type::AAAA
    }

    /// Target of an NS record, if it could be decoded
    pub fn ns_name(&self) -> Option<&Name> {
        match self.data {
            RRData::NS(ref ns) => ns.name(),
            _ => None,
        }
    }
}

impl Serialize for Question {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Question", 3)?;
        state.serialize_field("qname", &self.qname)?;
        state.serialize_field("qtype", &u16::from(self.qtype))?;
        state.serialize_field("qclass", &u16::from(self.qclass))?;
        state.end()
    }
}

/// Numeric type and class, plus `ip` for addresses and `nsname` for NS
/// records; undecodable NS data is shown as its byte list
impl Serialize for ResourceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResourceRecord", 6)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &u16::from(self.typ))?;
        state.serialize_field("class", &u16::from(self.cls))?;
        state.serialize_field("ttl", &self.ttl)?;
        state.serialize_field("rdlength", &self.rdlength)?;
        match self.data {
            RRData::A(..) | RRData::AAAA(..) => {
                state.serialize_field("ip", &self.data.ip())?;
            }
            RRData::NS(NsData::Raw { ref data, .. }) => {
                state.serialize_field("nsname", data)?;
            }
            RRData::NS(ref ns) => {
                state.serialize_field("nsname", &ns.name())?;
            }
            RRData::Unknown(..) => state.skip_field("ip")?,
        }
        state.end()
    }
}
