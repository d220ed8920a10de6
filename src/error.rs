use serde::Serialize;

use crate::spacepacket::Apid;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Not enough bytes")]
    NotEnoughData { actual: usize, minimum: usize },

    /// Fewer bytes than a primary header remain.
    #[error("truncated header: need {minimum} bytes, got {actual}")]
    TruncatedHeader { actual: usize, minimum: usize },

    #[error("no schema registered for apid {0:#04x}")]
    UnknownApid(Apid),

    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] Malformed),

    /// A schema definition is invalid and cannot be used to decode packets.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("schema {schema} is not {expected} length framed")]
    FramingMismatch {
        schema: String,
        expected: &'static str,
    },

    #[error("record has no field named {0}")]
    MissingField(String),

    #[error("field {name} does not have the expected shape")]
    FieldShape { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reason a single packet was rejected by a decoder.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum Malformed {
    #[error("packet of {actual} bytes is shorter than a primary header")]
    ShortHeader { actual: usize },

    /// The bytes available do not agree with the packet data length in the header,
    /// typically because the stream ended early or the length field is corrupt.
    #[error("header declares {declared} bytes but packet has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("expected {expected} bits for fixed length packet, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("packet has {actual} bits, less than the {minimum} bits of fixed fields")]
    ShortPayload { actual: usize, minimum: usize },

    #[error("{remaining} bits remaining is not a multiple of {element} bit elements")]
    UnevenExpand { remaining: usize, element: usize },
}

/// Construction time schema defects.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("schema {0} has no fields")]
    Empty(String),
    #[error("duplicate field name {0}")]
    DuplicateField(String),
    #[error("field {name} has unsupported bit width {bits}")]
    BitWidth { name: String, bits: u32 },
    #[error("array field {0} has zero elements")]
    EmptyArray(String),
    #[error("expand field {0} must be the last field")]
    ExpandNotLast(String),
    #[error("fixed length schema {0} cannot have an expand field")]
    ExpandInFixed(String),
    #[error("variable length schema {0} requires a trailing expand field")]
    MissingExpand(String),
    #[error("schema {schema} fields total {actual} bits, expected {expected}")]
    TotalBits {
        schema: String,
        expected: usize,
        actual: usize,
    },
    #[error("schema {schema} fields exceed the {max} bits of packet data a header can declare")]
    PacketTooLarge { schema: String, max: usize },
    #[error("{name} {apid:#x} is not an 11 bit apid")]
    InvalidApid { name: &'static str, apid: Apid },
    #[error("{first} and {second} are both apid {apid:#04x}")]
    DuplicateApid {
        apid: Apid,
        first: &'static str,
        second: &'static str,
    },
}
