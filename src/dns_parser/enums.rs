use std::fmt;
use std::str::FromStr;

use super::Error;

/// The TYPE value of a resource record or question
///
/// Only `A`, `AAAA` and `NS` payloads are interpreted by the parser, the
/// other named variants exist so that they display with their mnemonic.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Type {
    /// a host address
    A,
    /// an authoritative name server
    NS,
    /// the canonical name for an alias
    CNAME,
    /// marks the start of a zone of authority
    SOA,
    /// a domain name pointer
    PTR,
    /// mail exchange
    MX,
    /// text strings
    TXT,
    /// IPv6 host address (RFC 3596)
    AAAA,
    /// service record (RFC 2782)
    SRV,
    /// any other type code, kept as is
    Other(u16),
}

/// The CLASS value of a resource record or question
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Class {
    /// the Internet
    IN,
    Other(u16),
}

/// The OPCODE value according to RFC 1035
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Opcode {
    StandardQuery,
    InverseQuery,
    ServerStatusRequest,
    Reserved(u8),
}

/// The RCODE value according to RFC 1035
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(u8),
}

impl From<u16> for Type {
    fn from(code: u16) -> Type {
        match code {
            1 => Type::A,
            2 => Type::NS,
            5 => Type::CNAME,
            6 => Type::SOA,
            12 => Type::PTR,
            15 => Type::MX,
            16 => Type::TXT,
            28 => Type::AAAA,
            33 => Type::SRV,
            x => Type::Other(x),
        }
    }
}

impl From<Type> for u16 {
    fn from(typ: Type) -> u16 {
        match typ {
            Type::A => 1,
            Type::NS => 2,
            Type::CNAME => 5,
            Type::SOA => 6,
            Type::PTR => 12,
            Type::MX => 15,
            Type::TXT => 16,
            Type::AAAA => 28,
            Type::SRV => 33,
            Type::Other(x) => x,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Type::A => f.write_str("A"),
            Type::NS => f.write_str("NS"),
            Type::CNAME => f.write_str("CNAME"),
            Type::SOA => f.write_str("SOA"),
            Type::PTR => f.write_str("PTR"),
            Type::MX => f.write_str("MX"),
            Type::TXT => f.write_str("TXT"),
            Type::AAAA => f.write_str("AAAA"),
            Type::SRV => f.write_str("SRV"),
            Type::Other(x) => write!(f, "TYPE{}", x),
        }
    }
}

/// Accepts mnemonics (`"aaaa"`, `"NS"`), `TYPEnn` and bare numeric codes
impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Type, Error> {
        let upper = s.to_ascii_uppercase();
        let typ = match upper.as_str() {
            "A" => Type::A,
            "NS" => Type::NS,
            "CNAME" => Type::CNAME,
            "SOA" => Type::SOA,
            "PTR" => Type::PTR,
            "MX" => Type::MX,
            "TXT" => Type::TXT,
            "AAAA" => Type::AAAA,
            "SRV" => Type::SRV,
            other => {
                let digits = other.strip_prefix("TYPE").unwrap_or(other);
                digits
                    .parse::<u16>()
                    .map(Type::from)
                    .map_err(|_| Error::UnknownType(s.to_owned()))?
            }
        };
        Ok(typ)
    }
}

impl From<u16> for Class {
    fn from(code: u16) -> Class {
        match code {
            1 => Class::IN,
            x => Class::Other(x),
        }
    }
}

impl From<Class> for u16 {
    fn from(cls: Class) -> u16 {
        match cls {
            Class::IN => 1,
            Class::Other(x) => x,
        }
    }
}

impl From<u8> for Opcode {
    fn from(code: u8) -> Opcode {
        match code {
            0 => Opcode::StandardQuery,
            1 => Opcode::InverseQuery,
            2 => Opcode::ServerStatusRequest,
            x => Opcode::Reserved(x),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        match opcode {
            Opcode::StandardQuery => 0,
            Opcode::InverseQuery => 1,
            Opcode::ServerStatusRequest => 2,
            Opcode::Reserved(x) => x & 0x0f,
        }
    }
}

impl From<u8> for ResponseCode {
    fn from(code: u8) -> ResponseCode {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            x => ResponseCode::Reserved(x),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(rcode: ResponseCode) -> u8 {
        match rcode {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Reserved(x) => x & 0x0f,
        }
    }
}
