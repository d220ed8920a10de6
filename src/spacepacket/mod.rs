mod demux;
mod summary;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::Malformed;
use crate::Error;

pub use demux::{split_by_apid, split_packets, ApidStreams, PacketSplitter};
pub use summary::{ApidSummary, Summary};

pub type Apid = u16;

/// Packet is the first packet in a packet group
pub const SEQ_FIRST: u8 = 1;
/// Packet is a part of a packet group, but not first and not last
pub const SEQ_CONTINUATION: u8 = 0;
/// Packet is the last packet in a packet group
pub const SEQ_LAST: u8 = 2;
/// Packet is not part of a packet group, i.e., standalone.
pub const SEQ_UNSEGMENTED: u8 = 3;

/// CCSDS Primary Header
///
/// The primary header format is common to all CCSDS space packets.
///
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub version: u8,
    pub type_flag: u8,
    pub has_secondary_header: bool,
    pub apid: Apid,
    /// Defines a packets grouping. See the `SEQ_*` values.
    pub sequence_flags: u8,
    pub sequence_id: u16,
    pub len_minus1: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    pub const SEQ_MAX: u16 = 16383;
    pub const APID_MAX: Apid = 0x7ff;
    /// Largest packet data field a header can declare.
    pub const MAX_DATA_LEN: usize = 65536;

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        Some(PrimaryHeader {
            version: (d1 >> 13 & 0x7) as u8,
            type_flag: (d1 >> 12 & 0x1) as u8,
            has_secondary_header: (d1 >> 11 & 0x1) == 1,
            apid: (d1 & 0x7ff),
            sequence_flags: (d2 >> 14 & 0x3) as u8,
            sequence_id: (d2 & 0x3fff),
            len_minus1: d3,
        })
    }

    /// Encode to the 6 byte wire format.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let d1 = (u16::from(self.version & 0x7) << 13)
            | (u16::from(self.type_flag & 0x1) << 12)
            | (u16::from(self.has_secondary_header) << 11)
            | (self.apid & 0x7ff);
        let d2 = (u16::from(self.sequence_flags & 0x3) << 14) | (self.sequence_id & 0x3fff);
        let mut buf = [0u8; Self::LEN];
        buf[..2].copy_from_slice(&d1.to_be_bytes());
        buf[2..4].copy_from_slice(&d2.to_be_bytes());
        buf[4..].copy_from_slice(&self.len_minus1.to_be_bytes());
        buf
    }

    /// Total packet length in bytes, header included, as declared by this header.
    #[must_use]
    pub fn packet_len(&self) -> usize {
        Self::LEN + self.len_minus1 as usize + 1
    }
}

/// A single packet's bytes, header included, borrowed from the input stream.
#[derive(Debug, Clone, Copy)]
pub struct RawPacket<'a> {
    pub header: PrimaryHeader,
    /// Byte offset of the first header byte in the input stream.
    pub offset: usize,
    /// All packet bytes available in the stream. This may be shorter than
    /// `header.packet_len()` for the last packet of a truncated stream.
    pub data: &'a [u8],
}

impl<'a> RawPacket<'a> {
    /// Decode a packet from the start of `dat`. Bytes beyond the declared packet length
    /// are ignored; a packet with fewer bytes than declared is returned as is.
    ///
    /// # Errors
    /// [Error::TruncatedHeader] if there are not enough bytes for a header.
    pub fn decode(dat: &'a [u8], offset: usize) -> crate::Result<Self> {
        let header = PrimaryHeader::decode(dat).ok_or(Error::TruncatedHeader {
            actual: dat.len(),
            minimum: PrimaryHeader::LEN,
        })?;
        let end = header.packet_len().min(dat.len());
        Ok(RawPacket {
            header,
            offset,
            data: &dat[..end],
        })
    }

    /// Bytes after the primary header.
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[PrimaryHeader::LEN.min(self.data.len())..]
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.header.packet_len()
    }

    /// Check the packet bytes agree with the header.
    ///
    /// # Errors
    /// [Malformed::ShortHeader] if there are not enough bytes for a header and
    /// [Malformed::LengthMismatch] if the header declares a different length than
    /// what is available.
    pub fn validate(&self) -> Result<(), Malformed> {
        if self.data.len() < PrimaryHeader::LEN {
            return Err(Malformed::ShortHeader {
                actual: self.data.len(),
            });
        }
        if !self.is_complete() {
            return Err(Malformed::LengthMismatch {
                declared: self.header.packet_len(),
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

impl Display for RawPacket<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packet{{apid: {}, seq: {}, offset: {}, data:[len={}]}}",
            self.header.apid,
            self.header.sequence_id,
            self.offset,
            self.data.len()
        )
    }
}

/// Calculate the number of missing sequence ids.
///
/// `cur` is the current sequence id. `last` is the sequence id seen before `cur`.
#[must_use]
pub fn missing_packets(cur: u16, last: u16) -> u16 {
    let expected = if last + 1 > PrimaryHeader::SEQ_MAX {
        0
    } else {
        last + 1
    };
    if cur != expected {
        if last + 1 > cur {
            return cur + PrimaryHeader::SEQ_MAX - last;
        }
        return cur - last - 1;
    }
    0
}
