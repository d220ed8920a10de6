//! Schema driven decoding of packets into [Record]s.
//!
//! Each packet is decoded independently. A packet that does not fit its schema is
//! excluded from the output and reported as a [Diagnostic] so one bad packet never
//! prevents decoding of the rest.
mod fixed;
mod record;
mod variable;

use std::fmt::Display;

use serde::Serialize;
use tracing::warn;

use crate::bits::BitReader;
use crate::error::Malformed;
use crate::schema::{Framing, Schema, Shape};
use crate::spacepacket::{Apid, PrimaryHeader, RawPacket};

pub use fixed::decode_fixed;
pub use record::{Layout, Record, Value};
pub use variable::decode_variable;

/// Report of data that was skipped rather than decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No schema is registered for `apid`; all of its packets were skipped.
    UnknownApid {
        apid: Apid,
        name: Option<String>,
        packets: usize,
    },
    /// A single packet was excluded.
    MalformedPacket {
        apid: Apid,
        /// Index of the packet within the APID's packets
        index: usize,
        /// Byte offset of the packet in the input stream
        offset: usize,
        reason: Malformed,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownApid {
                apid,
                name,
                packets,
            } => write!(
                f,
                "skipped {packets} packets for apid {apid:#04x} ({})",
                name.as_deref().unwrap_or("unknown")
            ),
            Diagnostic::MalformedPacket {
                apid,
                index,
                offset,
                reason,
            } => write!(
                f,
                "apid {apid:#04x} packet {index} at offset {offset}: {reason}"
            ),
        }
    }
}

/// Records decoded from one APID's packets along with any packets that were rejected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Decoded {
    /// Successfully decoded records in stream order
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
}

fn decode_one(
    packet: &RawPacket,
    schema: &Schema,
    include_headers: bool,
) -> Result<Record, Malformed> {
    match schema.framing() {
        Framing::Fixed => fixed::check_length(packet, schema)?,
        Framing::Variable => variable::check_length(packet, schema)?,
    }
    read_record(packet, schema, include_headers)
}

/// Decode a single packet with the discipline of the schema's framing.
///
/// # Errors
/// [crate::Error::MalformedPacket] if the packet does not fit `schema`.
pub fn decode_packet(
    packet: &RawPacket,
    schema: &Schema,
    include_headers: bool,
) -> crate::Result<Record> {
    Ok(decode_one(packet, schema, include_headers)?)
}

/// Decode with the discipline of the schema's framing.
pub(crate) fn decode_packets(
    packets: &[RawPacket],
    schema: &Schema,
    include_headers: bool,
) -> Decoded {
    let mut decoded = Decoded::default();
    for (index, packet) in packets.iter().enumerate() {
        match decode_one(packet, schema, include_headers) {
            Ok(record) => decoded.records.push(record),
            Err(reason) => {
                warn!(
                    apid = packet.header.apid,
                    index,
                    offset = packet.offset,
                    schema = schema.name(),
                    "dropping packet: {reason}"
                );
                decoded.diagnostics.push(Diagnostic::MalformedPacket {
                    apid: packet.header.apid,
                    index,
                    offset: packet.offset,
                    reason,
                });
            }
        }
    }
    decoded
}

fn header_values(header: &PrimaryHeader) -> [Value; 7] {
    [
        Value::Scalar(header.version.into()),
        Value::Scalar(header.type_flag.into()),
        Value::Scalar(header.has_secondary_header.into()),
        Value::Scalar(header.apid.into()),
        Value::Scalar(header.sequence_flags.into()),
        Value::Scalar(header.sequence_id.into()),
        Value::Scalar(header.len_minus1.into()),
    ]
}

/// Walk the schema fields over the packet's user data. The packet length must already
/// have been checked against the schema.
fn read_record(
    packet: &RawPacket,
    schema: &Schema,
    include_headers: bool,
) -> Result<Record, Malformed> {
    let layout = schema.layout(include_headers);
    let mut values = Vec::with_capacity(layout.len());
    if include_headers {
        values.extend(header_values(&packet.header));
    }

    let mut reader = BitReader::new(packet.payload());
    let short = |_| Malformed::ShortPayload {
        actual: packet.data.len() * 8,
        minimum: PrimaryHeader::LEN * 8 + schema.fixed_bits(),
    };
    for field in schema.fields() {
        let value = match field.shape {
            Shape::Scalar => Value::Scalar(reader.read(field.bits).map_err(short)?),
            Shape::Array(len) => Value::Array(reader.read_many(field.bits, len).map_err(short)?),
            Shape::Expand => {
                let count = reader.remaining() / field.bits as usize;
                Value::Array(reader.read_many(field.bits, count).map_err(short)?)
            }
        };
        values.push(value);
    }

    Ok(Record::new(layout.clone(), values))
}
