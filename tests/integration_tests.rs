mod common;

use std::io::Write;

use common::*;
use meddea::schema::{
    CHECKSUM, HEADER_FIELDS, HISTOGRAM_BINS, HISTOGRAM_DATA, HISTOGRAM_DETNUM, HISTOGRAM_PIXNUM,
    HOUSEKEEPING, PIXEL_DATA, TIME,
};
use meddea::telemetry::{Histogram, Housekeeping, Photon};
use meddea::{
    parse, parse_file, parse_reader, split_by_apid, Diagnostic, Malformed, MissionConfig,
    Registry, Value,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

fn registry() -> Registry {
    Registry::new(MissionConfig::default()).unwrap()
}

#[test]
fn histogram_packet_field_names() {
    let registry = registry();
    let dat = histogram(0, 32, 8);

    let parsed = parse(&dat, &registry, false);

    let records = parsed.get(APID_HISTOGRAM).unwrap();
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.len(), 2 + 32 * 4 + 1);
    for i in 0..32 {
        let data = rec.array(&format!("{HISTOGRAM_DATA}{i}")).unwrap();
        assert_eq!(data.len(), HISTOGRAM_BINS);
        assert!(data.iter().all(|v| *v == i as u64), "pixel {i}");
    }
    assert_eq!(rec.scalar(&format!("{HISTOGRAM_DETNUM}9")).unwrap(), 1);
    assert_eq!(rec.scalar(&format!("{HISTOGRAM_PIXNUM}9")).unwrap(), 1);
    assert_eq!(rec.scalar(CHECKSUM).unwrap(), 0x1234);
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn histogram_packet_with_configured_pixels() {
    let config = MissionConfig::builder()
        .pixels_per_detector(4)
        .detector_count(2)
        .build();
    let registry = Registry::new(config).unwrap();
    let dat = histogram(0, 8, 4);

    let parsed = parse(&dat, &registry, false);

    let rec = &parsed.get(APID_HISTOGRAM).unwrap()[0];
    assert_eq!(rec.len(), 2 + 8 * 4 + 1);

    let hist = Histogram::try_from(rec).unwrap();
    assert_eq!(hist.counts.shape(), &[8, HISTOGRAM_BINS]);
    assert_eq!(hist.pixels[5].detector, 1);
    assert_eq!(hist.pixels[5].pixel, 1);
    assert_eq!(hist.totals()[3], 3 * HISTOGRAM_BINS as u64);
}

#[test]
fn histogram_packet_for_wrong_pixel_count_is_rejected() {
    let registry = registry();
    let dat = histogram(0, 16, 8);

    let parsed = parse(&dat, &registry, false);

    assert_eq!(parsed.get(APID_HISTOGRAM).map(<[_]>::len), Some(0));
    assert!(matches!(
        parsed.diagnostics[..],
        [Diagnostic::MalformedPacket {
            reason: Malformed::WidthMismatch { .. },
            ..
        }]
    ));
}

#[test_case(0 ; "no pixel data")]
#[test_case(1 ; "one word")]
#[test_case(100 ; "many words")]
fn photon_pixel_data_length(count: usize) {
    let registry = registry();
    let pixels: Vec<u16> = (0..count).map(|v| v as u16).collect();
    let dat = photon(0, 42, &pixels);

    let parsed = parse(&dat, &registry, false);

    let records = parsed.get(APID_PHOTON).unwrap();
    assert_eq!(records.len(), 1);
    let data = records[0].array(PIXEL_DATA).unwrap();
    assert_eq!(data.len(), count);
    assert_eq!(records[0].scalar(TIME).unwrap(), 42);

    let photon = Photon::try_from(&records[0]).unwrap();
    assert_eq!(photon.pixel_data, pixels);
    assert_eq!(photon.checksum, 0xBEEF);
}

#[test]
fn photon_packets_have_independent_lengths() {
    let registry = registry();
    let mut dat = photon(0, 1, &[1, 2, 3]);
    dat.extend(photon(1, 2, &[4]));
    dat.extend(photon(2, 3, &[5, 6]));

    let parsed = parse(&dat, &registry, false);

    let lens: Vec<usize> = parsed
        .get(APID_PHOTON)
        .unwrap()
        .iter()
        .map(|r| r.array(PIXEL_DATA).unwrap().len())
        .collect();
    assert_eq!(lens, vec![3, 1, 2]);
}

#[test]
fn housekeeping_end_to_end() {
    let registry = registry();
    let values = [0, 1, 2, 3, 4, 5, 6, 7];
    let mut dat = housekeeping(0, 1, values, 0xABCD);
    dat.extend(housekeeping(1, 1, values, 0xABCD));

    let parsed = parse(&dat, &registry, false);

    assert_eq!(parsed.apids().collect::<Vec<_>>(), vec![APID_HOUSEKEEPING]);
    let records = parsed.get(APID_HOUSEKEEPING).unwrap();
    assert_eq!(records.len(), 2);
    for rec in records {
        assert_eq!(rec.names().collect::<Vec<_>>(), vec![TIME, HOUSEKEEPING, CHECKSUM]);
        assert_eq!(rec.get(TIME), Some(&Value::Scalar(1)));
        assert_eq!(
            rec.get(HOUSEKEEPING),
            Some(&Value::Array(vec![0, 1, 2, 3, 4, 5, 6, 7]))
        );
        assert_eq!(rec.get(CHECKSUM), Some(&Value::Scalar(0xABCD)));

        let hk = Housekeeping::try_from(rec).unwrap();
        assert_eq!(hk.values, values);
    }
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn headers_are_prepended_when_requested() {
    let registry = registry();
    let dat = housekeeping(7, 1, [0; 8], 0);

    let parsed = parse(&dat, &registry, true);

    let rec = &parsed.get(APID_HOUSEKEEPING).unwrap()[0];
    let names: Vec<&str> = rec.names().collect();
    assert_eq!(names[..HEADER_FIELDS.len()], HEADER_FIELDS);
    assert_eq!(names[HEADER_FIELDS.len()..], [TIME, HOUSEKEEPING, CHECKSUM]);
    assert_eq!(rec.scalar("CCSDS_APID").unwrap(), u64::from(APID_HOUSEKEEPING));
    assert_eq!(rec.scalar("CCSDS_SEQUENCE_COUNT").unwrap(), 7);
    assert_eq!(rec.scalar("CCSDS_PACKET_LENGTH").unwrap(), 21);
}

#[test]
fn corrupted_length_drops_only_that_packet() {
    let registry = registry();
    let mut dat = housekeeping(0, 1, [0; 8], 0);
    let mut bad = housekeeping(1, 2, [0; 8], 0);
    // declare 100 bytes more than are present
    bad[4..6].copy_from_slice(&121u16.to_be_bytes());
    dat.extend(&bad);

    let parsed = parse(&dat, &registry, false);

    assert_eq!(parsed.get(APID_HOUSEKEEPING).unwrap().len(), 1);
    assert_eq!(
        parsed.diagnostics,
        vec![Diagnostic::MalformedPacket {
            apid: APID_HOUSEKEEPING,
            index: 1,
            offset: 28,
            reason: Malformed::LengthMismatch {
                declared: 128,
                actual: 28
            },
        }]
    );
}

#[test]
fn unknown_apids_are_reported_once() {
    let registry = registry();
    let mut dat = packet(0x10, 0, &[1, 2, 3, 4]);
    dat.extend(packet(0x11, 0, &[1, 2]));
    dat.extend(packet(0x10, 1, &[5, 6, 7, 8]));
    dat.extend(packet(APID_COMMAND, 0, &[9]));

    let parsed = parse(&dat, &registry, false);

    assert!(parsed.is_empty());
    assert_eq!(parsed.unknown_apids(), vec![0x10, 0x11, APID_COMMAND]);
    assert_eq!(
        parsed.diagnostics[0],
        Diagnostic::UnknownApid {
            apid: 0x10,
            name: None,
            packets: 2
        }
    );
    assert_eq!(
        parsed.diagnostics[2],
        Diagnostic::UnknownApid {
            apid: APID_COMMAND,
            name: Some("command response".to_string()),
            packets: 1
        }
    );
}

#[test]
fn mixed_stream_decodes_each_apid() {
    let registry = registry();
    let mut dat = housekeeping(0, 1, [1; 8], 0);
    dat.extend(photon(0, 5, &[1, 2]));
    dat.extend(packet(0x55, 0, &[0; 10]));
    dat.extend(histogram(0, 32, 8));
    dat.extend(photon(1, 6, &[3]));
    dat.extend(housekeeping(1, 2, [2; 8], 0));

    let parsed = parse(&dat, &registry, false);

    assert_eq!(
        parsed.apids().collect::<Vec<_>>(),
        vec![APID_PHOTON, APID_HISTOGRAM, APID_HOUSEKEEPING]
    );
    assert_eq!(parsed.record_count(), 5);
    let times: Vec<u64> = parsed
        .get(APID_HOUSEKEEPING)
        .unwrap()
        .iter()
        .map(|r| r.scalar(TIME).unwrap())
        .collect();
    assert_eq!(times, vec![1, 2]);
    assert_eq!(parsed.unknown_apids(), vec![0x55]);
}

#[test]
fn parse_is_idempotent() {
    let registry = registry();
    let mut dat = housekeeping(0, 1, [1; 8], 0);
    dat.extend(photon(0, 5, &[1, 2]));
    dat.extend(histogram(0, 32, 8));
    dat.extend(packet(0x55, 0, &[0; 10]));

    let first = parse(&dat, &registry, true);
    let second = parse(&dat, &registry, true);

    assert_eq!(first.records, second.records);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn split_packets_partition_the_stream() {
    let mut rng = StdRng::seed_from_u64(0x00A0_00A3);
    let apids = [APID_HISTOGRAM, APID_PHOTON, APID_HOUSEKEEPING, 0x7ff, 0];

    for _ in 0..20 {
        let mut dat = Vec::default();
        for seq in 0..rng.gen_range(0..50u16) {
            let apid = apids[rng.gen_range(0..apids.len())];
            let payload: Vec<u8> = (0..rng.gen_range(1..300)).map(|_| rng.gen()).collect();
            dat.extend(packet(apid, seq, &payload));
        }
        let residual: Vec<u8> = (0..rng.gen_range(0..6)).map(|_| rng.gen()).collect();
        dat.extend(&residual);

        let streams = split_by_apid(&dat);

        let mut joined: Vec<u8> = streams
            .in_stream_order()
            .iter()
            .flat_map(|p| p.data.iter().copied())
            .collect();
        joined.extend_from_slice(streams.residual);
        assert_eq!(joined, dat);
        assert_eq!(streams.residual, &residual[..]);
        for apid in streams.apids() {
            assert!(streams
                .get(apid)
                .unwrap()
                .iter()
                .all(|p| p.header.apid == apid));
        }
    }
}

#[test]
fn empty_and_short_input() {
    let registry = registry();
    assert!(parse(&[], &registry, false).is_empty());

    let parsed = parse(&[0x0, 0xa3, 0xc0], &registry, false);
    assert!(parsed.is_empty());
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn parse_from_file_and_reader() {
    let registry = registry();
    let mut dat = housekeeping(0, 1, [1; 8], 0);
    dat.extend(photon(0, 5, &[1, 2]));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&dat).unwrap();
    file.flush().unwrap();

    let from_file = parse_file(file.path(), &registry, false).unwrap();
    let from_reader = parse_reader(&dat[..], &registry, false).unwrap();
    let from_buf = parse(&dat, &registry, false);

    assert_eq!(from_file.records, from_buf.records);
    assert_eq!(from_reader.records, from_buf.records);
    assert_eq!(from_file.record_count(), 2);
}

#[test]
fn parse_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = parse_file(dir.path().join("nope.dat"), &registry(), false);
    assert!(matches!(result, Err(meddea::Error::Io(_))));
}

#[test]
fn records_serialize_in_field_order() {
    let registry = registry();
    let dat = housekeeping(0, 1, [0, 1, 2, 3, 4, 5, 6, 7], 0xABCD);

    let parsed = parse(&dat, &registry, false);

    let json = serde_json::to_string(&parsed.get(APID_HOUSEKEEPING).unwrap()[0]).unwrap();
    assert_eq!(
        json,
        r#"{"TIME":1,"HOUSEKEEPING":[0,1,2,3,4,5,6,7],"CHECKSUM":43981}"#
    );
}
