use crate::error::Malformed;
use crate::schema::{Framing, Schema};
use crate::spacepacket::{PrimaryHeader, RawPacket};
use crate::{Error, Result};

use super::{decode_packets, Decoded};

/// Decode packets whose trailing expand field is sized by each packet's length.
///
/// The leading fields are decoded as with [super::decode_fixed]. The expand field gets
/// `(packet bits - header bits - fixed bits) / element bits` elements. A packet shorter
/// than the fixed fields, or whose remaining bits are not a whole number of elements, is
/// excluded and reported in [Decoded::diagnostics].
///
/// # Errors
/// [Error::FramingMismatch] if `schema` is not a [Framing::Variable] schema.
pub fn decode_variable(
    packets: &[RawPacket],
    schema: &Schema,
    include_headers: bool,
) -> Result<Decoded> {
    if schema.framing() != Framing::Variable {
        return Err(Error::FramingMismatch {
            schema: schema.name().to_string(),
            expected: Framing::Variable.as_str(),
        });
    }
    Ok(decode_packets(packets, schema, include_headers))
}

pub(super) fn check_length(
    packet: &RawPacket,
    schema: &Schema,
) -> std::result::Result<(), Malformed> {
    packet.validate()?;
    let actual = packet.data.len() * 8;
    let minimum = PrimaryHeader::LEN * 8 + schema.fixed_bits();
    if actual < minimum {
        return Err(Malformed::ShortPayload { actual, minimum });
    }
    let element = schema.expand().map_or(1, |f| f.bits as usize);
    let remaining = actual - minimum;
    if remaining % element != 0 {
        return Err(Malformed::UnevenExpand { remaining, element });
    }
    Ok(())
}
