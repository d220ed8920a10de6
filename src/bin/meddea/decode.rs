use std::collections::BTreeMap;
use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use meddea::{parse_file, Apid, Diagnostic, Record, Registry};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
struct Output<'a> {
    records: BTreeMap<Apid, &'a [Record]>,
    diagnostics: &'a [Diagnostic],
}

pub fn decode(input: &Path, registry: &Registry, apids: &[Apid], headers: bool) -> Result<()> {
    let parsed = parse_file(input, registry, headers)
        .with_context(|| format!("decoding {input:?}"))?;

    let mut records = BTreeMap::default();
    for apid in parsed.apids() {
        if !apids.is_empty() && !apids.contains(&apid) {
            continue;
        }
        if let Some(recs) = parsed.get(apid) {
            records.insert(apid, recs);
        }
    }
    for apid in apids {
        if parsed.get(*apid).is_none() {
            warn!("no records decoded for apid {apid}");
        }
    }
    info!(
        "decoded {} records, {} diagnostics",
        parsed.record_count(),
        parsed.diagnostics.len()
    );

    let output = Output {
        records,
        diagnostics: &parsed.diagnostics,
    };
    let mut out = BufWriter::new(stdout());
    serde_json::to_writer_pretty(&mut out, &output).context("serializing to json")?;
    writeln!(out).context("writing to stdout")?;
    out.flush().context("writing to stdout")
}
