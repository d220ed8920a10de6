use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{missing_packets, Apid, RawPacket};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ApidSummary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
}

/// Tracks stats on packet iteration.
///
/// # Example
/// ```
/// use meddea::spacepacket::{split_packets, Summary};
/// let dat: &[u8] = &[0x0, 0xa3, 0xc0, 0x01, 0x0, 0x1, 0xab, 0xcd];
///
/// let mut summary = Summary::default();
/// split_packets(dat).for_each(|p| summary.add(&p));
/// assert_eq!(summary.count, 1);
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
    pub apids: BTreeMap<Apid, ApidSummary>,

    #[serde(skip)]
    last_seq: BTreeMap<Apid, u16>,
}

impl Summary {
    pub fn add(&mut self, packet: &RawPacket) {
        self.count += 1;
        self.bytes += packet.data.len();

        let hdr = packet.header;
        let apid = self.apids.entry(hdr.apid).or_default();
        apid.count += 1;
        apid.bytes += packet.data.len();

        if let Some(last) = self.last_seq.get(&hdr.apid) {
            let missing = missing_packets(hdr.sequence_id, *last) as usize;
            apid.missing += missing;
            self.missing += missing;
        }
        self.last_seq.insert(hdr.apid, hdr.sequence_id);
    }
}

impl<'a, 'b> FromIterator<&'b RawPacket<'a>> for Summary
where
    'a: 'b,
{
    fn from_iter<T: IntoIterator<Item = &'b RawPacket<'a>>>(iter: T) -> Self {
        let mut summary = Summary::default();
        for packet in iter {
            summary.add(packet);
        }
        summary
    }
}
