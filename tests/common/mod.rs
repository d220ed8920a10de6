#![allow(dead_code)]
use meddea::schema::{HISTOGRAM_BINS, HOUSEKEEPING_VALUES};
use meddea::spacepacket::SEQ_UNSEGMENTED;
use meddea::{Apid, PrimaryHeader};

pub const APID_HISTOGRAM: Apid = 0xA2;
pub const APID_PHOTON: Apid = 0xA0;
pub const APID_HOUSEKEEPING: Apid = 0xA3;
pub const APID_COMMAND: Apid = 0xA5;

/// Build a complete packet with a valid primary header around `payload`.
pub fn packet(apid: Apid, seq: u16, payload: &[u8]) -> Vec<u8> {
    assert!(!payload.is_empty(), "packets carry at least one payload byte");
    let header = PrimaryHeader {
        version: 0,
        type_flag: 0,
        has_secondary_header: false,
        apid,
        sequence_flags: SEQ_UNSEGMENTED,
        sequence_id: seq,
        len_minus1: u16::try_from(payload.len() - 1).unwrap(),
    };
    let mut dat = header.encode().to_vec();
    dat.extend_from_slice(payload);
    dat
}

pub fn words(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn housekeeping(seq: u16, time: u32, values: [u16; HOUSEKEEPING_VALUES], checksum: u16) -> Vec<u8> {
    let mut payload = time.to_be_bytes().to_vec();
    payload.extend(words(&values));
    payload.extend(checksum.to_be_bytes());
    packet(APID_HOUSEKEEPING, seq, &payload)
}

pub fn photon(seq: u16, time: u64, pixel_data: &[u16]) -> Vec<u8> {
    let mut payload = time.to_be_bytes().to_vec();
    payload.extend(words(&[0x10, 0x20, 0xBEEF]));
    payload.extend(words(pixel_data));
    packet(APID_PHOTON, seq, &payload)
}

/// Histogram packet for `num_pixels` pixels where every bin of pixel `i` holds `i`.
pub fn histogram(seq: u16, num_pixels: usize, pixels_per_detector: usize) -> Vec<u8> {
    let mut payload = 100u64.to_be_bytes().to_vec();
    payload.extend(200u64.to_be_bytes());
    for i in 0..num_pixels {
        let det = u8::try_from(i / pixels_per_detector).unwrap();
        let pix = u8::try_from(i % pixels_per_detector).unwrap();
        payload.push(0xAA);
        payload.push((det << 5) | (pix & 0x1f));
        let count = u16::try_from(i).unwrap();
        payload.extend(words(&[count; HISTOGRAM_BINS]));
    }
    payload.extend(0x1234u16.to_be_bytes());
    packet(APID_HISTOGRAM, seq, &payload)
}
