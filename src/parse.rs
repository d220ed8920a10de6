use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::decode::{decode_packets, Diagnostic, Record};
use crate::schema::Registry;
use crate::spacepacket::{split_by_apid, Apid, RawPacket};
use crate::Result;

/// Decoded records for every APID with a registered schema.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Parsed {
    /// Records for each decoded APID in stream order. APIDs whose packets were all
    /// rejected are present with no records.
    pub records: BTreeMap<Apid, Vec<Record>>,
    /// Everything skipped while decoding, unknown APIDs first in APID order followed by
    /// rejected packets in APID and stream order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    /// Records for `apid`, or `None` if the stream had no packets for it or it has no schema.
    #[must_use]
    pub fn get(&self, apid: Apid) -> Option<&[Record]> {
        self.records.get(&apid).map(Vec::as_slice)
    }

    pub fn apids(&self) -> impl Iterator<Item = Apid> + '_ {
        self.records.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of decoded records across all APIDs.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// APIDs skipped because they have no schema.
    #[must_use]
    pub fn unknown_apids(&self) -> Vec<Apid> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::UnknownApid { apid, .. } => Some(*apid),
                Diagnostic::MalformedPacket { .. } => None,
            })
            .collect()
    }
}

enum Outcome {
    Skipped(Diagnostic),
    Decoded(Vec<Record>, Vec<Diagnostic>),
}

fn decode_apid(
    apid: Apid,
    packets: &[RawPacket],
    registry: &Registry,
    include_headers: bool,
) -> Outcome {
    let Ok(schema) = registry.schema_for(apid) else {
        let name = registry.name_for(apid).map(ToString::to_string);
        info!(
            apid,
            name = name.as_deref().unwrap_or("unknown"),
            packets = packets.len(),
            "skipping apid without a schema"
        );
        return Outcome::Skipped(Diagnostic::UnknownApid {
            apid,
            name,
            packets: packets.len(),
        });
    };

    debug!(
        apid,
        schema = schema.name(),
        framing = schema.framing().as_str(),
        packets = packets.len(),
        "decoding"
    );
    let decoded = decode_packets(packets, schema, include_headers);
    Outcome::Decoded(decoded.records, decoded.diagnostics)
}

/// Demultiplex `buf` and decode each APID with its registered schema.
///
/// This never fails. APIDs without a schema are skipped and packets that do not fit their
/// schema are excluded; both are reported in [Parsed::diagnostics]. Trailing bytes too
/// short to contain a primary header are ignored. APIDs are decoded in parallel.
///
/// # Examples
/// ```
/// use meddea::{parse, MissionConfig, Registry};
///
/// let dat: &[u8] = &[
///     0x0, 0xa3, 0xc0, 0x0, 0x0, 0x15,
///     0x0, 0x0, 0x0, 0x1,
///     0x0, 0x0, 0x0, 0x1, 0x0, 0x2, 0x0, 0x3, 0x0, 0x4, 0x0, 0x5, 0x0, 0x6, 0x0, 0x7,
///     0xab, 0xcd,
/// ];
/// let registry = Registry::new(MissionConfig::default()).unwrap();
/// let parsed = parse(dat, &registry, false);
///
/// let hk = parsed.get(0xa3).unwrap();
/// assert_eq!(hk[0].scalar("CHECKSUM").unwrap(), 0xabcd);
/// ```
pub fn parse(buf: &[u8], registry: &Registry, include_headers: bool) -> Parsed {
    let streams: Vec<(Apid, Vec<RawPacket>)> =
        split_by_apid(buf).streams.into_iter().collect();

    let outcomes: Vec<(Apid, Outcome)> = streams
        .par_iter()
        .map(|(apid, packets)| {
            (
                *apid,
                decode_apid(*apid, packets, registry, include_headers),
            )
        })
        .collect();

    let mut parsed = Parsed::default();
    let mut malformed = Vec::default();
    for (apid, outcome) in outcomes {
        match outcome {
            Outcome::Skipped(diag) => parsed.diagnostics.push(diag),
            Outcome::Decoded(records, diagnostics) => {
                parsed.records.insert(apid, records);
                malformed.extend(diagnostics);
            }
        }
    }
    parsed.diagnostics.extend(malformed);

    debug!(
        apids = parsed.records.len(),
        records = parsed.record_count(),
        diagnostics = parsed.diagnostics.len(),
        "parsed stream"
    );
    parsed
}

/// Read all bytes from `reader` and [parse] them.
///
/// # Errors
/// [crate::Error::Io] if reading fails.
pub fn parse_reader<R>(
    mut reader: R,
    registry: &Registry,
    include_headers: bool,
) -> Result<Parsed>
where
    R: Read,
{
    let mut buf = Vec::default();
    reader.read_to_end(&mut buf)?;
    Ok(parse(&buf, registry, include_headers))
}

/// Read a level 0 file and [parse] it.
///
/// # Errors
/// [crate::Error::Io] if the file cannot be opened or read.
pub fn parse_file<P>(path: P, registry: &Registry, include_headers: bool) -> Result<Parsed>
where
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "parsing file");
    parse_reader(BufReader::new(file), registry, include_headers)
}
