use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder};

use super::{Class, Error, Header, Name, Opcode, Question, RRData, ResponseCode, Type};

pub enum Questions {}
pub enum Answers {}
pub enum Nameservers {}
pub enum Additional {}

pub trait MoveTo<T> {}
impl<T> MoveTo<T> for T {}

impl MoveTo<Answers> for Questions {}

impl MoveTo<Nameservers> for Questions {}
impl MoveTo<Nameservers> for Answers {}

impl MoveTo<Additional> for Questions {}
impl MoveTo<Additional> for Answers {}
impl MoveTo<Additional> for Nameservers {}

/// Offsets of the section counts inside the header
const QUESTION_COUNT: usize = 4;
const ANSWER_COUNT: usize = 6;
const NAMESERVER_COUNT: usize = 8;
const ADDITIONAL_COUNT: usize = 10;

/// Everything needed to encode one query message
///
/// Built fresh for every outgoing message; the builder methods consume the
/// value and return a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    id: u16,
    opcode: Opcode,
    recursion_desired: bool,
    questions: Vec<Question>,
}

impl QuerySpec {
    /// A standard query without questions
    pub fn new(id: u16, recursion_desired: bool) -> QuerySpec {
        QuerySpec {
            id,
            opcode: Opcode::StandardQuery,
            recursion_desired,
            questions: Vec::new(),
        }
    }

    /// Adds an `IN` question, validating `qname` first
    pub fn question(self, qname: &str, qtype: Type) -> Result<QuerySpec, Error> {
        let qname = Name::from_str(qname)?;
        Ok(self.with_question(Question {
            qname,
            qtype,
            qclass: Class::IN,
        }))
    }

    pub fn with_question(mut self, question: Question) -> QuerySpec {
        self.questions.push(question);
        self
    }

    pub fn with_opcode(mut self, opcode: Opcode) -> QuerySpec {
        self.opcode = opcode;
        self
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Serializes the header and question section
    ///
    /// Fails when there are no questions or more than fit in the count
    /// field. Names were validated when the questions were added.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        if self.questions.is_empty() {
            return Err(Error::NoQuestions);
        }
        if self.questions.len() > u16::MAX as usize {
            return Err(Error::TooManyQuestions(self.questions.len()));
        }

        let mut builder = Builder::with_header(Header {
            id: self.id,
            query: true,
            opcode: self.opcode,
            authoritative: false,
            truncated: false,
            recursion_desired: self.recursion_desired,
            recursion_available: false,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        });
        builder.set_max_size(None);
        for question in &self.questions {
            builder = builder.add_question(&question.qname, question.qtype, question.qclass);
        }
        Ok(builder.build().unwrap_or_else(|x| x))
    }
}

/// Encodes `spec` into a query message, see [`QuerySpec::encode`]
pub fn encode_query(spec: &QuerySpec) -> Result<Vec<u8>, Error> {
    spec.encode()
}

/// Allows to build a DNS packet
///
/// Both query and answer packets may be built with this interface. Names are
/// always written uncompressed.
pub struct Builder<S> {
    buf: Vec<u8>,
    max_size: Option<usize>,
    _state: PhantomData<S>,
}

impl Builder<Questions> {
    pub fn new_response(id: u16, recursion: bool, authoritative: bool) -> Builder<Questions> {
        Builder::with_header(Header {
            id,
            query: false,
            opcode: Opcode::StandardQuery,
            authoritative,
            truncated: false,
            recursion_desired: recursion,
            recursion_available: false,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        })
    }

    fn with_header(head: Header) -> Builder<Questions> {
        let mut buf = Vec::with_capacity(512);
        buf.extend([0u8; 12].iter());
        head.write(&mut buf[..12]);
        Builder {
            buf,
            max_size: Some(512),
            _state: PhantomData,
        }
    }
}

/// Increments the count at `offset`
///
/// # Panics
///
/// When the count is already 65535.
fn inc_count(buf: &mut [u8], offset: usize, what: &str) {
    let count = BigEndian::read_u16(&buf[offset..offset + 2]);
    match count.checked_add(1) {
        Some(count) => BigEndian::write_u16(&mut buf[offset..offset + 2], count),
        None => panic!("Too many {}", what),
    }
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

impl<T> Builder<T> {
    /// # Panics
    ///
    /// When `data` encodes to more than 65535 bytes.
    fn write_rr(&mut self, name: &Name, typ: Type, cls: Class, ttl: u32, data: &RRData) {
        name.write_to(&mut self.buf);
        put_u16(&mut self.buf, typ.into());
        put_u16(&mut self.buf, cls.into());
        let mut ttl_bytes = [0u8; 4];
        BigEndian::write_u32(&mut ttl_bytes, ttl);
        self.buf.extend_from_slice(&ttl_bytes);

        let size_offset = self.buf.len();
        put_u16(&mut self.buf, 0);

        let data_offset = self.buf.len();
        data.write_to(&mut self.buf);
        let data_size = self.buf.len() - data_offset;
        assert!(
            data_size <= u16::MAX as usize,
            "record data of {} bytes does not fit in rdlength",
            data_size
        );

        BigEndian::write_u16(
            &mut self.buf[size_offset..size_offset + 2],
            data_size as u16,
        );
    }

    /// Returns the final packet
    ///
    /// When packet is not truncated method returns `Ok(packet)`. If
    /// packet is truncated the method returns `Err(packet)`. In both
    /// cases the packet is fully valid.
    pub fn build(mut self) -> Result<Vec<u8>, Vec<u8>> {
        match self.max_size {
            Some(max_size) if self.buf.len() > max_size => {
                self.buf[2] |= 0b0000_0010;
                Err(self.buf)
            }
            _ => Ok(self.buf),
        }
    }

    pub fn move_to<U>(self) -> Builder<U>
    where
        T: MoveTo<U>,
    {
        Builder {
            buf: self.buf,
            max_size: self.max_size,
            _state: PhantomData,
        }
    }

    pub fn set_max_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
    }

}

impl<T: MoveTo<Questions>> Builder<T> {
    /// Adds a question to the packet
    ///
    /// # Panics
    ///
    /// * There are already 65535 questions in the buffer.
    pub fn add_question(self, qname: &Name, qtype: Type, qclass: Class) -> Builder<Questions> {
        let mut builder = self.move_to::<Questions>();

        qname.write_to(&mut builder.buf);
        put_u16(&mut builder.buf, qtype.into());
        put_u16(&mut builder.buf, qclass.into());
        inc_count(&mut builder.buf, QUESTION_COUNT, "questions");
        builder
    }
}

impl<T: MoveTo<Answers>> Builder<T> {
    /// Adds an answer record
    ///
    /// # Panics
    ///
    /// * There are already 65535 answers in the buffer.
    /// * `data` encodes to more than 65535 bytes.
    pub fn add_answer(
        self,
        name: &Name,
        typ: Type,
        ttl: u32,
        data: &RRData,
    ) -> Builder<Answers> {
        let mut builder = self.move_to::<Answers>();

        builder.write_rr(name, typ, Class::IN, ttl, data);
        inc_count(&mut builder.buf, ANSWER_COUNT, "answers");

        builder
    }
}

impl<T: MoveTo<Nameservers>> Builder<T> {
    pub fn add_nameserver(
        self,
        name: &Name,
        typ: Type,
        ttl: u32,
        data: &RRData,
    ) -> Builder<Nameservers> {
        let mut builder = self.move_to::<Nameservers>();

        builder.write_rr(name, typ, Class::IN, ttl, data);
        inc_count(&mut builder.buf, NAMESERVER_COUNT, "nameservers");

        builder
    }
}

impl<T: MoveTo<Additional>> Builder<T> {
    pub fn add_additional(
        self,
        name: &Name,
        typ: Type,
        ttl: u32,
        data: &RRData,
    ) -> Builder<Additional> {
        let mut builder = self.move_to::<Additional>();

        builder.write_rr(name, typ, Class::IN, ttl, data);
        inc_count(&mut builder.buf, ADDITIONAL_COUNT, "additional answers");

        builder
    }
}

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::dns_parser::{decode_header, decode_response, NsData};

    #[test]
    fn build_query() {
        let spec = QuerySpec::new(1573, true)
            .question("example.com", Type::A)
            .unwrap();
        let result = b"\x06%\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
                      \x07example\x03com\x00\x00\x01\x00\x01";
        assert_eq!(&encode_query(&spec).unwrap()[..], &result[..]);
    }

    #[test]
    fn build_srv_query() {
        let spec = QuerySpec::new(23513, true)
            .question("_xmpp-server._tcp.gmail.com", Type::SRV)
            .unwrap();
        let result = b"[\xd9\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
            \x0c_xmpp-server\x04_tcp\x05gmail\x03com\x00\x00!\x00\x01";
        assert_eq!(&encode_query(&spec).unwrap()[..], &result[..]);
    }

    #[test]
    fn iterative_query_clears_rd() {
        let spec = QuerySpec::new(1337, false)
            .question("ilab1.cs.rutgers.edu", Type::A)
            .unwrap();
        let packet = encode_query(&spec).unwrap();
        assert_eq!(&packet[2..4], b"\x00\x00");
    }

    #[test]
    fn header_round_trip() {
        let spec = QuerySpec::new(0xabcd, true)
            .question("a.example", Type::AAAA)
            .unwrap()
            .question("b.example", Type::NS)
            .unwrap()
            .with_opcode(Opcode::ServerStatusRequest);
        let header = decode_header(&encode_query(&spec).unwrap()).unwrap();
        assert_eq!(header.id, 0xabcd);
        assert!(header.query);
        assert_eq!(header.opcode, Opcode::ServerStatusRequest);
        assert!(header.recursion_desired);
        assert!(!header.authoritative);
        assert!(!header.truncated);
        assert!(!header.recursion_available);
        assert_eq!(header.response_code, ResponseCode::NoError);
        assert_eq!(header.questions, 2);
        assert_eq!(header.answers + header.nameservers + header.additional, 0);
    }

    #[test]
    fn no_questions() {
        assert_eq!(
            encode_query(&QuerySpec::new(1, false)),
            Err(Error::NoQuestions)
        );
    }

    #[test]
    fn oversized_label_rejected_before_encoding() {
        let label = "x".repeat(64);
        let result = QuerySpec::new(1, false).question(&format!("{}.com", label), Type::A);
        assert!(matches!(result, Err(Error::LabelTooLong { len: 64, .. })));
    }

    #[test]
    fn build_referral_response() {
        let zone = Name::from_str("example.com").unwrap();
        let ns1 = Name::from_str("ns1.example.com").unwrap();
        let packet = Builder::new_response(7, false, false)
            .add_question(&Name::from_str("www.example.com").unwrap(), Type::A, Class::IN)
            .add_nameserver(&zone, Type::NS, 3600, &RRData::NS(NsData::Name(ns1.clone())))
            .add_additional(&ns1, Type::A, 3600, &RRData::A(Ipv4Addr::new(192, 0, 2, 1)))
            .build()
            .unwrap();

        let response = decode_response(&packet).unwrap();
        assert_eq!(response.header.id, 7);
        assert_eq!(response.header.nameservers, 1);
        assert_eq!(response.header.additional, 1);
        assert_eq!(response.nameservers[0].ns_name(), Some(&ns1));
        assert_eq!(response.additional[0].data.ip().unwrap(), "192.0.2.1");
    }

    #[test]
    fn oversized_response_is_truncated() {
        let name = Name::from_str("host.example.com").unwrap();
        let mut builder = Builder::new_response(1, false, true).move_to::<Answers>();
        for i in 0..40 {
            builder = builder.add_answer(&name, Type::A, 60, &RRData::A(Ipv4Addr::new(10, 0, 0, i)));
        }
        let packet = builder.build().unwrap_err();
        assert!(decode_header(&packet).unwrap().truncated);
    }

    #[test]
    #[should_panic(expected = "record data")]
    fn oversized_record_data() {
        let name = Name::from_str("big.example").unwrap();
        let _ = Builder::new_response(1, false, true).add_answer(
            &name,
            Type::TXT,
            60,
            &RRData::Unknown(vec![0; 0x1_0000]),
        );
    }
}
