//! Decoding of PADRE MeDDEA level 0 spacepacket streams.
//!
//! A level 0 stream is a concatenation of CCSDS space packets for several APIDs. The
//! stream is demultiplexed by APID and each APID's packets are decoded with a declarative
//! [Schema] into [Record]s of named unsigned integer fields.
//!
//! References:
//! * CCSDS Space Packet Protocol 133.0-B-1
//!     - https://public.ccsds.org/Pubs/133x0b1c2.pdf
//!
//! # Example
//! ```
//! use meddea::{parse, MissionConfig, Registry};
//!
//! let registry = Registry::new(MissionConfig::default()).unwrap();
//! let parsed = parse(&[], &registry, true);
//! if let Some(photons) = parsed.get(registry.config().apid_photon) {
//!     println!("{} photon packets", photons.len());
//! }
//! ```
mod bits;
mod error;
mod parse;

pub mod decode;
pub mod schema;
pub mod spacepacket;
pub mod telemetry;

pub use bits::BitReader;
pub use decode::{
    decode_fixed, decode_packet, decode_variable, Decoded, Diagnostic, Record, Value,
};
pub use error::{Error, Malformed, Result, SchemaError};
pub use parse::{parse, parse_file, parse_reader, Parsed};
pub use schema::{Framing, MissionConfig, Registry, Schema, SchemaBuilder};
pub use spacepacket::{split_by_apid, Apid, PrimaryHeader, RawPacket};
