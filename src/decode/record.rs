use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Ordered field names shared by all records decoded with the same schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Layout {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Layout { names, index }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(u64),
    Array(Vec<u64>),
}

impl Value {
    #[must_use]
    pub fn as_scalar(&self) -> Option<u64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Array(_) => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[u64]> {
        match self {
            Value::Scalar(_) => None,
            Value::Array(v) => Some(v),
        }
    }
}

/// Field values of a single decoded packet, looked up by field name.
///
/// Values are owned by the record and are independent of the buffer the packet was
/// decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    layout: Arc<Layout>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn new(layout: Arc<Layout>, values: Vec<Value>) -> Self {
        debug_assert_eq!(layout.len(), values.len());
        Record { layout, values }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.layout.index_of(name).map(|i| &self.values[i])
    }

    /// Value of a scalar field.
    ///
    /// # Errors
    /// [Error::MissingField] if there is no such field, [Error::FieldShape] if it is an
    /// array.
    pub fn scalar(&self, name: &str) -> Result<u64> {
        self.get(name)
            .ok_or_else(|| Error::MissingField(name.to_string()))?
            .as_scalar()
            .ok_or_else(|| Error::FieldShape {
                name: name.to_string(),
            })
    }

    /// Values of an array or expand field.
    ///
    /// # Errors
    /// [Error::MissingField] if there is no such field, [Error::FieldShape] if it is a
    /// scalar.
    pub fn array(&self, name: &str) -> Result<&[u64]> {
        self.get(name)
            .ok_or_else(|| Error::MissingField(name.to_string()))?
            .as_array()
            .ok_or_else(|| Error::FieldShape {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layout.names().iter().map(String::as_str)
    }

    /// Field names and values in packet order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names().zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
