use thiserror::Error;

/// Error encoding or parsing a DNS packet
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("packet is truncated: {0}")]
    Truncated(&'static str),
    #[error("malformed domain name: {0}")]
    MalformedName(#[from] NameError),
    #[error("{section} section declares {declared} entries but only {decoded} are present")]
    CountMismatch {
        section: &'static str,
        declared: u16,
        decoded: u16,
    },
    #[error("label {label:?} is {len} bytes long, the limit is 63")]
    LabelTooLong { label: String, len: usize },
    #[error("domain name is {0} bytes long on the wire, the limit is 255")]
    NameTooLong(usize),
    #[error("domain name {0:?} contains an empty label")]
    EmptyLabel(String),
    #[error("query has no questions")]
    NoQuestions,
    #[error("query has {0} questions, the limit is 65535")]
    TooManyQuestions(usize),
    #[error("record type {0:?} is unknown")]
    UnknownType(String),
}

/// Reasons a name on the wire is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("compression pointer at {at} loops back to already visited offset {target}")]
    PointerLoop { at: usize, target: usize },
    #[error("compression pointer at {at} targets {target} which is not before it")]
    PointerNotBackward { at: usize, target: usize },
    #[error("compression pointer at {at} targets {target} outside of the packet")]
    PointerOutOfRange { at: usize, target: usize },
    #[error("label at {0} has unknown label format")]
    UnknownLabelFormat(usize),
    #[error("label at {0} is not valid UTF-8")]
    LabelIsNotUtf8(usize),
    #[error("label at {0} contains a dot")]
    LabelContainsDot(usize),
    #[error("name is longer than 255 bytes")]
    TooLong,
    #[error("name ends at {end} but record data ends at {rdata_end}")]
    RdataLengthMismatch { end: usize, rdata_end: usize },
}

impl Error {
    pub fn is_truncated(&self) -> bool {
        matches!(*self, Error::Truncated(..))
    }

    pub fn is_malformed_name(&self) -> bool {
        matches!(*self, Error::MalformedName(..))
    }
}
