//! Declarative packet layouts.
//!
//! A [Schema] is an ordered list of [Field]s describing the bits of a packet's user data,
//! i.e., everything after the primary header. Schemas are constructed with a
//! [SchemaBuilder] which validates the layout so a schema that exists can always be used
//! to decode packets.
mod builder;
mod registry;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decode::Layout;
use crate::spacepacket::PrimaryHeader;

pub use builder::SchemaBuilder;
pub use registry::*;

/// How a field's bits are converted to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Encoding {
    /// Unsigned big-endian integer
    Uint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Scalar,
    /// Fixed number of elements
    Array(usize),
    /// Array filling the remainder of the packet. Only valid as the last field of a
    /// [Framing::Variable] schema.
    Expand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub encoding: Encoding,
    /// Width of a single value, or of a single element for arrays.
    pub bits: u32,
    pub shape: Shape,
}

impl Field {
    pub fn scalar(name: impl Into<String>, bits: u32) -> Self {
        Field {
            name: name.into(),
            encoding: Encoding::Uint,
            bits,
            shape: Shape::Scalar,
        }
    }

    pub fn array(name: impl Into<String>, bits: u32, len: usize) -> Self {
        Field {
            name: name.into(),
            encoding: Encoding::Uint,
            bits,
            shape: Shape::Array(len),
        }
    }

    pub fn expand(name: impl Into<String>, bits: u32) -> Self {
        Field {
            name: name.into(),
            encoding: Encoding::Uint,
            bits,
            shape: Shape::Expand,
        }
    }

    /// Number of bits this field always occupies. Zero for expand fields. Saturates at
    /// `usize::MAX` for arrays too large to describe.
    #[must_use]
    pub fn fixed_bits(&self) -> usize {
        match self.shape {
            Shape::Scalar => self.bits as usize,
            Shape::Array(len) => (self.bits as usize).saturating_mul(len),
            Shape::Expand => 0,
        }
    }
}

/// Packet framing discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Framing {
    /// All packets have the same length.
    Fixed,
    /// Packets end with an expand field sized by the packet length.
    Variable,
}

impl Framing {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::Fixed => "fixed",
            Framing::Variable => "variable",
        }
    }
}

/// Largest number of user data bits a single packet can carry.
pub const MAX_DATA_BITS: usize = PrimaryHeader::MAX_DATA_LEN * 8;

/// Names of the primary header values prefixed to records when header inclusion is
/// requested.
pub const HEADER_FIELDS: [&str; 7] = [
    "CCSDS_VERSION_NUMBER",
    "CCSDS_PACKET_TYPE",
    "CCSDS_SECONDARY_FLAG",
    "CCSDS_APID",
    "CCSDS_SEQUENCE_FLAG",
    "CCSDS_SEQUENCE_COUNT",
    "CCSDS_PACKET_LENGTH",
];

/// A validated packet layout. See [SchemaBuilder].
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    framing: Framing,
    fields: Vec<Field>,
    fixed_bits: usize,
    layout: Arc<Layout>,
    header_layout: Arc<Layout>,
}

impl Schema {
    pub fn builder(name: impl Into<String>, framing: Framing) -> SchemaBuilder {
        SchemaBuilder::new(name, framing)
    }

    // Only called by the builder once the fields are validated
    fn new(name: String, framing: Framing, fields: Vec<Field>) -> Self {
        let fixed_bits = fields.iter().map(Field::fixed_bits).sum();
        let names = || fields.iter().map(|f| f.name.clone());
        let layout = Arc::new(Layout::new(names().collect()));
        let header_layout = Arc::new(Layout::new(
            HEADER_FIELDS
                .iter()
                .map(ToString::to_string)
                .chain(names())
                .collect(),
        ));
        Schema {
            name,
            framing,
            fields,
            fixed_bits,
            layout,
            header_layout,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn framing(&self) -> Framing {
        self.framing
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Bits of user data occupied by all fields except an expand field.
    #[must_use]
    pub fn fixed_bits(&self) -> usize {
        self.fixed_bits
    }

    /// Total packet bits, header included, for a [Framing::Fixed] schema.
    #[must_use]
    pub fn packet_bits(&self) -> Option<usize> {
        match self.framing {
            Framing::Fixed => Some(PrimaryHeader::LEN * 8 + self.fixed_bits),
            Framing::Variable => None,
        }
    }

    /// The trailing expand field, if any.
    #[must_use]
    pub fn expand(&self) -> Option<&Field> {
        self.fields.last().filter(|f| f.shape == Shape::Expand)
    }

    /// Field names of records decoded with this schema.
    #[must_use]
    pub fn layout(&self, include_headers: bool) -> &Arc<Layout> {
        if include_headers {
            &self.header_layout
        } else {
            &self.layout
        }
    }
}
