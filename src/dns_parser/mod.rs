//! DNS wire format: query encoding and response decoding
//!
//! Everything here works on borrowed byte buffers and returns owned values;
//! compression pointers are resolved while decoding.

mod builder;
mod enums;
mod error;
mod header;
mod name;
mod parser;
mod rrdata;
mod structs;

pub use self::builder::{
    encode_query, Additional, Answers, Builder, MoveTo, Nameservers, QuerySpec, Questions,
};
pub use self::enums::{Class, Opcode, ResponseCode, Type};
pub use self::error::{Error, NameError};
pub use self::header::{Header, HEADER_SIZE};
pub use self::name::{decode_name, encode_name, Name, MAX_LABEL_LEN, MAX_NAME_LEN};
pub use self::parser::{decode_header, decode_record, decode_response};
pub use self::rrdata::{format_ipv6, NsData, RRData};
pub use self::structs::{Question, ResourceRecord, Response};
