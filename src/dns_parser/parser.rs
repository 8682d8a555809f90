use byteorder::{BigEndian, ByteOrder};

use super::{Error, Header, Name, Question, RRData, ResourceRecord, Response, HEADER_SIZE};

/// Size of type, class, ttl and rdlength that follow a record owner name
const RECORD_FIXED_SIZE: usize = 10;

/// Decodes the fixed header at the start of a message
pub fn decode_header(data: &[u8]) -> Result<Header, Error> {
    Header::parse(data)
}

/// Decodes one resource record starting at `offset` of the message `data`
///
/// Returns the record and the offset of whatever follows it.
pub fn decode_record(data: &[u8], offset: usize) -> Result<(ResourceRecord, usize), Error> {
    let (name, pos) = Name::scan(data, offset)?;
    if data.len() < pos + RECORD_FIXED_SIZE {
        return Err(Error::Truncated("resource record"));
    }
    let typ = BigEndian::read_u16(&data[pos..pos + 2]).into();
    let cls = BigEndian::read_u16(&data[pos + 2..pos + 4]).into();
    let ttl = BigEndian::read_u32(&data[pos + 4..pos + 8]);
    let rdlength = BigEndian::read_u16(&data[pos + 8..pos + 10]);

    let rdata_start = pos + RECORD_FIXED_SIZE;
    let rdata_end = rdata_start + rdlength as usize;
    if data.len() < rdata_end {
        return Err(Error::Truncated("record data"));
    }
    let rdata = &data[rdata_start..rdata_end];

    let record = ResourceRecord {
        name,
        typ,
        cls,
        ttl,
        rdlength,
        data: RRData::parse(typ, rdata, rdata_start, data),
    };
    Ok((record, rdata_end))
}

fn decode_question(data: &[u8], offset: usize) -> Result<(Question, usize), Error> {
    let (qname, pos) = Name::scan(data, offset)?;
    if data.len() < pos + 4 {
        return Err(Error::Truncated("question"));
    }
    let question = Question {
        qname,
        qtype: BigEndian::read_u16(&data[pos..pos + 2]).into(),
        qclass: BigEndian::read_u16(&data[pos + 2..pos + 4]).into(),
    };
    Ok((question, pos + 4))
}

/// Decodes `count` entries with `decode`, failing with `CountMismatch` when
/// the message ends right on an entry boundary before all of them are read
fn decode_section<T, F>(
    data: &[u8],
    offset: &mut usize,
    section: &'static str,
    count: u16,
    decode: F,
) -> Result<Vec<T>, Error>
where
    F: Fn(&[u8], usize) -> Result<(T, usize), Error>,
{
    let mut entries = Vec::with_capacity(count as usize);
    for decoded in 0..count {
        if *offset >= data.len() {
            return Err(Error::CountMismatch {
                section,
                declared: count,
                decoded,
            });
        }
        let (entry, next) = decode(data, *offset)?;
        entries.push(entry);
        *offset = next;
    }
    Ok(entries)
}

/// Decodes a whole message: header, questions and the three record sections
///
/// Bytes following the last declared record are ignored.
pub fn decode_response(data: &[u8]) -> Result<Response, Error> {
    let header = Header::parse(data)?;
    let mut offset = HEADER_SIZE;

    let questions = decode_section(
        data,
        &mut offset,
        "question",
        header.questions,
        decode_question,
    )?;
    let answers = decode_section(data, &mut offset, "answer", header.answers, decode_record)?;
    let nameservers = decode_section(
        data,
        &mut offset,
        "authority",
        header.nameservers,
        decode_record,
    )?;
    let additional = decode_section(
        data,
        &mut offset,
        "additional",
        header.additional,
        decode_record,
    )?;

    Ok(Response {
        header,
        questions,
        answers,
        nameservers,
        additional,
    })
}

impl Response {
    pub fn parse(data: &[u8]) -> Result<Response, Error> {
        decode_response(data)
    }
}
