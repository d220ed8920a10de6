use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::SchemaError;
use crate::spacepacket::{Apid, PrimaryHeader};
use crate::{Error, Result};

use super::{Framing, Schema, MAX_DATA_BITS};

/// Number of bins in a single pixel histogram.
pub const HISTOGRAM_BINS: usize = 512;

pub const START_TIME: &str = "START_TIME";
pub const END_TIME: &str = "END_TIME";
pub const HISTOGRAM_SYNC: &str = "HISTOGRAM_SYNC";
pub const HISTOGRAM_DETNUM: &str = "HISTOGRAM_DETNUM";
pub const HISTOGRAM_PIXNUM: &str = "HISTOGRAM_PIXNUM";
pub const HISTOGRAM_DATA: &str = "HISTOGRAM_DATA";
pub const TIME: &str = "TIME";
pub const INT_TIME: &str = "INT_TIME";
pub const FLAGS: &str = "FLAGS";
pub const CHECKSUM: &str = "CHECKSUM";
pub const PIXEL_DATA: &str = "PIXEL_DATA";
pub const HOUSEKEEPING: &str = "HOUSEKEEPING";

/// Number of values in a housekeeping packet.
pub const HOUSEKEEPING_VALUES: usize = 8;

/// Instrument constants that determine which APIDs are decoded and the size of
/// histogram packets.
///
/// # Examples
/// ```
/// use meddea::schema::MissionConfig;
///
/// let config = MissionConfig::builder().detector_count(2).build();
/// assert_eq!(config.num_pixels(), Some(16));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct MissionConfig {
    /// Physical pixels reported per detector in a histogram packet
    #[builder(default = 8)]
    pub pixels_per_detector: usize,
    #[builder(default = 4)]
    pub detector_count: usize,

    #[builder(default = 0xA2)]
    pub apid_histogram: Apid,
    #[builder(default = 0xA0)]
    pub apid_photon: Apid,
    #[builder(default = 0xA3)]
    pub apid_housekeeping: Apid,
    /// Command responses are recognized by name but not decoded.
    #[builder(default = 0xA5)]
    pub apid_command: Apid,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MissionConfig {
    /// Number of pixel histograms in a histogram packet, or `None` if it overflows.
    #[must_use]
    pub fn num_pixels(&self) -> Option<usize> {
        self.pixels_per_detector.checked_mul(self.detector_count)
    }

    /// Check the configured APIDs fit in a header and do not collide.
    ///
    /// # Errors
    /// [SchemaError::InvalidApid] or [SchemaError::DuplicateApid].
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        let apids = [
            ("apid_histogram", self.apid_histogram),
            ("apid_photon", self.apid_photon),
            ("apid_housekeeping", self.apid_housekeeping),
            ("apid_command", self.apid_command),
        ];
        for (idx, (name, apid)) in apids.iter().enumerate() {
            if *apid > PrimaryHeader::APID_MAX {
                return Err(SchemaError::InvalidApid {
                    name: *name,
                    apid: *apid,
                });
            }
            if let Some((first, _)) = apids[..idx].iter().find(|(_, a)| a == apid) {
                return Err(SchemaError::DuplicateApid {
                    apid: *apid,
                    first: *first,
                    second: *name,
                });
            }
        }
        Ok(())
    }
}

/// Histogram packets: start/end times, then for each pixel in detector-major order a sync
/// byte, 3 bit detector number, 5 bit pixel number and [HISTOGRAM_BINS] 16 bit counts,
/// then a checksum.
///
/// # Errors
/// [SchemaError] if the layout is invalid.
pub fn histogram_schema(config: &MissionConfig) -> std::result::Result<Schema, SchemaError> {
    let pixel_bits = 8 + 3 + 5 + 16 * HISTOGRAM_BINS;
    let fixed_bits = 2 * 64 + 16;
    // checked before unrolling so an absurd config cannot allocate its fields
    let num_pixels = config
        .num_pixels()
        .filter(|n| *n <= (MAX_DATA_BITS - fixed_bits) / pixel_bits)
        .ok_or_else(|| SchemaError::PacketTooLarge {
            schema: "histogram".to_string(),
            max: MAX_DATA_BITS,
        })?;
    Schema::builder("histogram", Framing::Fixed)
        .field(START_TIME, 64)
        .field(END_TIME, 64)
        .repeat(num_pixels, |b, i| {
            b.field(format!("{HISTOGRAM_SYNC}{i}"), 8)
                .field(format!("{HISTOGRAM_DETNUM}{i}"), 3)
                .field(format!("{HISTOGRAM_PIXNUM}{i}"), 5)
                .array(format!("{HISTOGRAM_DATA}{i}"), 16, HISTOGRAM_BINS)
        })
        .field(CHECKSUM, 16)
        .total_bits(fixed_bits + num_pixels * pixel_bits)
        .build()
}

/// Photon packets: four fixed fields followed by a variable number of 16 bit pixel data
/// words.
///
/// # Errors
/// [SchemaError] if the layout is invalid.
pub fn photon_schema() -> std::result::Result<Schema, SchemaError> {
    Schema::builder("photon", Framing::Variable)
        .field(TIME, 64)
        .field(INT_TIME, 16)
        .field(FLAGS, 16)
        .field(CHECKSUM, 16)
        .expand(PIXEL_DATA, 16)
        .build()
}

/// Housekeeping packets: 32 bit time, [HOUSEKEEPING_VALUES] 16 bit values, checksum.
///
/// # Errors
/// [SchemaError] if the layout is invalid.
pub fn housekeeping_schema() -> std::result::Result<Schema, SchemaError> {
    Schema::builder("housekeeping", Framing::Fixed)
        .field(TIME, 32)
        .array(HOUSEKEEPING, 16, HOUSEKEEPING_VALUES)
        .field(CHECKSUM, 16)
        .total_bits(32 + 16 * HOUSEKEEPING_VALUES + 16)
        .build()
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    schema: Option<Schema>,
}

/// Immutable table of APID names and the schemas used to decode them.
#[derive(Debug, Clone)]
pub struct Registry {
    config: MissionConfig,
    entries: BTreeMap<Apid, Entry>,
}

impl Registry {
    /// Create a registry with the built-in histogram, photon and housekeeping schemas and
    /// the command response name.
    ///
    /// # Errors
    /// [Error::Schema] if the configured APIDs are invalid or collide, or a built-in
    /// schema cannot be constructed for `config`.
    pub fn new(config: MissionConfig) -> Result<Self> {
        config.validate()?;
        let registry = Registry::empty(config.clone())
            .with_schema(config.apid_histogram, histogram_schema(&config)?)
            .with_schema(config.apid_photon, photon_schema()?)
            .with_schema(config.apid_housekeeping, housekeeping_schema()?)
            .with_name(config.apid_command, "command response");
        Ok(registry)
    }

    /// Create a registry without any APIDs.
    #[must_use]
    pub fn empty(config: MissionConfig) -> Self {
        Registry {
            config,
            entries: BTreeMap::default(),
        }
    }

    /// Register `schema` for `apid`, named after the schema, replacing any existing entry.
    #[must_use]
    pub fn with_schema(mut self, apid: Apid, schema: Schema) -> Self {
        self.entries.insert(
            apid,
            Entry {
                name: schema.name().to_string(),
                schema: Some(schema),
            },
        );
        self
    }

    /// Name `apid` without providing a schema for it. Such APIDs are recognized but not
    /// decoded.
    #[must_use]
    pub fn with_name(mut self, apid: Apid, name: impl Into<String>) -> Self {
        let name = name.into();
        self.entries
            .entry(apid)
            .and_modify(|e| e.name.clone_from(&name))
            .or_insert(Entry { name, schema: None });
        self
    }

    #[must_use]
    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Look up the schema for `apid`. The framing discipline is available from
    /// [Schema::framing].
    ///
    /// # Errors
    /// [Error::UnknownApid] if there is no schema for `apid`.
    pub fn schema_for(&self, apid: Apid) -> Result<&Schema> {
        self.entries
            .get(&apid)
            .and_then(|e| e.schema.as_ref())
            .ok_or(Error::UnknownApid(apid))
    }

    /// Display name for `apid`, if known.
    #[must_use]
    pub fn name_for(&self, apid: Apid) -> Option<&str> {
        self.entries.get(&apid).map(|e| e.name.as_str())
    }

    /// All APIDs with a name or schema.
    pub fn apids(&self) -> impl Iterator<Item = Apid> + '_ {
        self.entries.keys().copied()
    }
}
