use std::collections::HashSet;

use crate::error::SchemaError;

use super::{Field, Framing, Schema, Shape, HEADER_FIELDS, MAX_DATA_BITS};

/// Builder for constructing a [Schema].
///
/// Fields are appended in packet order. Layout problems are reported by [build] rather
/// than when decoding.
///
/// # Examples
/// ```
/// use meddea::schema::{Framing, Schema};
///
/// let schema = Schema::builder("pixels", Framing::Fixed)
///     .field("START_TIME", 64)
///     .repeat(2, |b, i| {
///         b.field(format!("SYNC{i}"), 8)
///             .field(format!("DETNUM{i}"), 3)
///             .field(format!("PIXNUM{i}"), 5)
///     })
///     .total_bits(96)
///     .build()
///     .unwrap();
/// assert_eq!(schema.fields().len(), 7);
/// ```
///
/// [build]: SchemaBuilder::build
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    framing: Framing,
    fields: Vec<Field>,
    total_bits: Option<usize>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>, framing: Framing) -> Self {
        SchemaBuilder {
            name: name.into(),
            framing,
            fields: Vec::default(),
            total_bits: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a scalar field of `bits` width.
    #[must_use]
    pub fn field(self, name: impl Into<String>, bits: u32) -> Self {
        self.with_field(Field::scalar(name, bits))
    }

    /// Append an array of `len` elements, each `bits` wide.
    #[must_use]
    pub fn array(self, name: impl Into<String>, bits: u32, len: usize) -> Self {
        self.with_field(Field::array(name, bits, len))
    }

    /// Append the trailing expand field with elements `bits` wide.
    #[must_use]
    pub fn expand(self, name: impl Into<String>, bits: u32) -> Self {
        self.with_field(Field::expand(name, bits))
    }

    /// Append a group of fields `count` times. `group` receives the builder and the
    /// repetition index, which is typically used as a field name suffix.
    #[must_use]
    pub fn repeat<F>(self, count: usize, group: F) -> Self
    where
        F: Fn(Self, usize) -> Self,
    {
        (0..count).fold(self, group)
    }

    /// Declare the total user data bits of a fixed length schema. [build] fails if the
    /// fields do not add up to exactly this many bits.
    ///
    /// [build]: SchemaBuilder::build
    #[must_use]
    pub fn total_bits(mut self, bits: usize) -> Self {
        self.total_bits = Some(bits);
        self
    }

    /// Validate and construct the [Schema].
    ///
    /// # Errors
    /// [SchemaError] describing the first layout problem found.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::Empty(self.name));
        }

        let mut seen = HashSet::new();
        for (idx, field) in self.fields.iter().enumerate() {
            // header values share the record namespace when headers are included
            if HEADER_FIELDS.contains(&field.name.as_str()) || !seen.insert(field.name.as_str())
            {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if field.bits == 0 || field.bits > 64 {
                return Err(SchemaError::BitWidth {
                    name: field.name.clone(),
                    bits: field.bits,
                });
            }
            match field.shape {
                Shape::Array(0) => return Err(SchemaError::EmptyArray(field.name.clone())),
                Shape::Expand if self.framing == Framing::Fixed => {
                    return Err(SchemaError::ExpandInFixed(self.name.clone()))
                }
                Shape::Expand if idx != self.fields.len() - 1 => {
                    return Err(SchemaError::ExpandNotLast(field.name.clone()))
                }
                _ => {}
            }
        }

        let has_expand = self
            .fields
            .last()
            .is_some_and(|f| f.shape == Shape::Expand);
        if self.framing == Framing::Variable && !has_expand {
            return Err(SchemaError::MissingExpand(self.name));
        }

        let actual = self
            .fields
            .iter()
            .try_fold(0usize, |acc, f| acc.checked_add(f.fixed_bits()))
            .filter(|bits| *bits <= MAX_DATA_BITS)
            .ok_or_else(|| SchemaError::PacketTooLarge {
                schema: self.name.clone(),
                max: MAX_DATA_BITS,
            })?;

        if let Some(expected) = self.total_bits {
            if actual != expected {
                return Err(SchemaError::TotalBits {
                    schema: self.name,
                    expected,
                    actual,
                });
            }
        }

        Ok(Schema::new(self.name, self.framing, self.fields))
    }
}
