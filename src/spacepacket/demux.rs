use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{Apid, RawPacket};

/// Iterator providing the [RawPacket]s of a byte synchronized packet stream in stream
/// order.
///
/// Framing is driven entirely by the packet data length field of each header. Iteration
/// stops when fewer than [super::PrimaryHeader::LEN] bytes remain; those bytes are
/// available via [PacketSplitter::residual]. A packet whose declared length runs past the
/// end of the stream is provided truncated to the bytes that are available.
#[derive(Debug, Clone)]
pub struct PacketSplitter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> PacketSplitter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        PacketSplitter { buf, offset: 0 }
    }

    /// Current byte offset into the stream.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left over that are too few to contain a header. Only meaningful once the
    /// iterator is exhausted.
    #[must_use]
    pub fn residual(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }
}

impl<'a> Iterator for PacketSplitter<'a> {
    type Item = RawPacket<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.buf[self.offset..];
        let packet = match RawPacket::decode(rest, self.offset) {
            Ok(packet) => packet,
            Err(err) => {
                if !rest.is_empty() {
                    debug!(offset = self.offset, "dropping trailing bytes: {err}");
                }
                return None;
            }
        };
        trace!(%packet, "split packet");
        self.offset += packet.data.len();
        Some(packet)
    }
}

/// Return an iterator over the packets in `buf`. See [PacketSplitter].
pub fn split_packets(buf: &[u8]) -> PacketSplitter<'_> {
    PacketSplitter::new(buf)
}

/// Packets of a stream grouped by APID.
#[derive(Debug, Clone, Default)]
pub struct ApidStreams<'a> {
    /// Packets for each APID, in stream order.
    pub streams: BTreeMap<Apid, Vec<RawPacket<'a>>>,
    /// Trailing bytes too short to contain a header.
    pub residual: &'a [u8],
}

impl<'a> ApidStreams<'a> {
    #[must_use]
    pub fn apids(&self) -> Vec<Apid> {
        self.streams.keys().copied().collect()
    }

    #[must_use]
    pub fn get(&self, apid: Apid) -> Option<&[RawPacket<'a>]> {
        self.streams.get(&apid).map(Vec::as_slice)
    }

    /// Total number of packets across all APIDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// All packets merged back into stream order.
    #[must_use]
    pub fn in_stream_order(&self) -> Vec<RawPacket<'a>> {
        let mut packets: Vec<RawPacket<'a>> = self.streams.values().flatten().copied().collect();
        packets.sort_by_key(|p| p.offset);
        packets
    }
}

/// Demultiplex a mixed APID stream into per-APID packet lists.
///
/// Packet payloads are not interpreted.
///
/// # Examples
/// ```
/// use meddea::spacepacket::split_by_apid;
///
/// let dat: &[u8] = &[
///     0x0, 0xa3, 0xc0, 0x0, 0x0, 0x1, 0xab, 0xcd,
///     0x0, 0xa0, 0xc0, 0x0, 0x0, 0x1, 0x12, 0x34,
///     0x0, 0xa3, 0xc0, 0x1, 0x0, 0x1, 0xab, 0xcd,
/// ];
/// let streams = split_by_apid(dat);
/// assert_eq!(streams.apids(), vec![0xa0, 0xa3]);
/// assert_eq!(streams.get(0xa3).unwrap().len(), 2);
/// ```
pub fn split_by_apid(buf: &[u8]) -> ApidStreams<'_> {
    let mut splitter = PacketSplitter::new(buf);
    let mut streams: BTreeMap<Apid, Vec<RawPacket>> = BTreeMap::new();
    for packet in splitter.by_ref() {
        streams.entry(packet.header.apid).or_default().push(packet);
    }
    let residual = splitter.residual();
    debug!(
        apids = streams.len(),
        residual = residual.len(),
        "demultiplexed stream"
    );
    ApidStreams { streams, residual }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_by_apid_in_stream_order() {
        #[rustfmt::skip]
        let dat: &[u8] = &[
            0x0, 0xa3, 0xc0, 0x01, 0x0, 0x0, 0x01,
            0x0, 0xa0, 0xc0, 0x01, 0x0, 0x1, 0x02, 0x03,
            0x0, 0xa3, 0xc0, 0x02, 0x0, 0x0, 0x04,
        ];
        let streams = split_by_apid(dat);

        assert_eq!(streams.len(), 3);
        let hk = streams.get(0xa3).unwrap();
        assert_eq!(hk.len(), 2);
        assert_eq!(hk[0].offset, 0);
        assert_eq!(hk[0].header.sequence_id, 1);
        assert_eq!(hk[1].offset, 15);
        assert_eq!(hk[1].payload(), &[0x04]);
        let ph = streams.get(0xa0).unwrap();
        assert_eq!(ph[0].data, &dat[7..15]);
        assert!(streams.residual.is_empty());
    }

    #[test]
    fn residual_shorter_than_header_is_dropped() {
        #[rustfmt::skip]
        let dat: &[u8] = &[
            0x0, 0xa3, 0xc0, 0x01, 0x0, 0x0, 0x01,
            0x0, 0xa3, 0xc0,
        ];
        let streams = split_by_apid(dat);

        assert_eq!(streams.len(), 1);
        assert_eq!(streams.residual, &[0x0, 0xa3, 0xc0]);
    }

    #[test]
    fn declared_length_past_end_is_truncated() {
        #[rustfmt::skip]
        let dat: &[u8] = &[
            0x0, 0xa3, 0xc0, 0x01, 0x0, 0x0, 0x01,
            0x0, 0xa3, 0xc0, 0x02, 0xff, 0xff, 0x02, 0x03,
        ];
        let mut splitter = split_packets(dat);

        let first = splitter.next().unwrap();
        assert!(first.is_complete());
        let second = splitter.next().unwrap();
        assert!(!second.is_complete());
        assert_eq!(second.data, &dat[7..]);
        assert!(splitter.next().is_none());
        assert!(splitter.residual().is_empty());
        assert_eq!(splitter.offset(), dat.len());
    }

    #[test]
    fn empty_stream() {
        let streams = split_by_apid(&[]);
        assert!(streams.is_empty());
        assert!(streams.residual.is_empty());
    }
}
