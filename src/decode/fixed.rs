use crate::error::Malformed;
use crate::schema::{Framing, Schema};
use crate::spacepacket::RawPacket;
use crate::{Error, Result};

use super::{decode_packets, Decoded};

/// Decode packets that all share the fixed layout of `schema`.
///
/// Each packet must be exactly the header plus [Schema::fixed_bits] long. Packets that
/// are not are excluded from [Decoded::records] and reported in
/// [Decoded::diagnostics]. When `include_headers` is set each record starts with the
/// primary header values (see [crate::schema::HEADER_FIELDS]).
///
/// # Errors
/// [Error::FramingMismatch] if `schema` is not a [Framing::Fixed] schema.
pub fn decode_fixed(
    packets: &[RawPacket],
    schema: &Schema,
    include_headers: bool,
) -> Result<Decoded> {
    if schema.framing() != Framing::Fixed {
        return Err(Error::FramingMismatch {
            schema: schema.name().to_string(),
            expected: Framing::Fixed.as_str(),
        });
    }
    Ok(decode_packets(packets, schema, include_headers))
}

pub(super) fn check_length(
    packet: &RawPacket,
    schema: &Schema,
) -> std::result::Result<(), Malformed> {
    packet.validate()?;
    let expected = schema.packet_bits().unwrap_or_default();
    let actual = packet.data.len() * 8;
    if actual != expected {
        return Err(Malformed::WidthMismatch { expected, actual });
    }
    Ok(())
}
