use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use meddea::schema::PIXEL_DATA;
use meddea::spacepacket::{split_packets, Summary};
use meddea::{parse, Apid, Registry};
use serde::Serialize;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApidInfo {
    apid: Apid,
    name: String,
    packets: usize,
    bytes: usize,
    missing: usize,
    decoded: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    packets: usize,
    bytes: usize,
    missing: usize,
    residual: usize,
    apids: Vec<ApidInfo>,
    /// Total photon packet pixel data words, if there are any photon packets
    pixel_words: Option<usize>,
    diagnostics: Vec<String>,
}

fn summarize(fpath: &Path, registry: &Registry) -> Result<Info> {
    let dat = std::fs::read(fpath).with_context(|| format!("reading {fpath:?}"))?;

    let mut splitter = split_packets(&dat);
    let mut summary = Summary::default();
    splitter.by_ref().for_each(|p| summary.add(&p));
    let residual = splitter.residual().len();

    let parsed = parse(&dat, registry, false);

    let apids = summary
        .apids
        .iter()
        .map(|(apid, s)| ApidInfo {
            apid: *apid,
            name: registry.name_for(*apid).unwrap_or("unknown").to_string(),
            packets: s.count,
            bytes: s.bytes,
            missing: s.missing,
            decoded: parsed.get(*apid).map(<[_]>::len),
        })
        .collect();

    let pixel_words = parsed.get(registry.config().apid_photon).map(|records| {
        records
            .iter()
            .filter_map(|r| r.array(PIXEL_DATA).ok())
            .map(<[u64]>::len)
            .sum()
    });

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        packets: summary.count,
        bytes: summary.bytes,
        missing: summary.missing,
        residual,
        apids,
        pixel_words,
        diagnostics: parsed.diagnostics.iter().map(ToString::to_string).collect(),
    })
}

pub fn summary(fpath: &Path, registry: &Registry, format: &Format) -> Result<()> {
    let info = summarize(fpath, registry)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => "-".to_string(),
            _ => v.to_string()
        };
        format!("{v:>width$}", width = usize::try_from(num).unwrap_or_default())
    });
    handlebars_helper!(right_pad: |num: u64, v: str| {
        format!("{v:<width$}", width = usize::try_from(num).unwrap_or_default())
    });
    handlebars_helper!(hex_apid: |v: u64| format!("{v:#04x}"));
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_helper("rpad", Box::new(right_pad));
    hb.register_helper("hex", Box::new(hex_apid));
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("compiling template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================
Packets:  {{ packets }}
Bytes:    {{ bytes }}
Missing:  {{ missing }}
Residual: {{ residual }}
{{ #if pixel_words includeZero=true }}Photon pixel words: {{ pixel_words }}
{{ /if }}-------------------------------------------------------------------------------
APID  Name                Packets        Bytes   Missing   Decoded
-------------------------------------------------------------------------------
{{ #each apids }}{{ hex apid }}  {{ rpad 16 name }}  {{ lpad 9 packets }}  {{ lpad 11 bytes }}  {{ lpad 8 missing }}  {{ lpad 8 decoded }}
{{ /each }}{{ #each diagnostics }}{{ this }}
{{ /each }}";
