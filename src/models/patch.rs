//! Partial update support
//!
//! Update payloads are plain structs of optional fields. Nullable columns use
//! `Option<Option<T>>`: the outer `None` means the key was absent, `Some(None)`
//! means an explicit `null` that clears the column. Every payload lists the
//! columns it may touch in a fixed whitelist, and only those are ever written.

use serde::{Deserialize, Deserializer};

/// Deserialize a present key (even `null`) as `Some(..)`.
///
/// Use together with `#[serde(default)]` so an absent key stays `None`.
pub fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A bindable column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    BigInt(Option<i64>),
}

/// Column assignments collected from a payload, in whitelist order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: FieldValue) {
        self.fields.push((column, value));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(column, _)| *column).collect()
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn into_fields(self) -> Vec<(&'static str, FieldValue)> {
        self.fields
    }
}

/// A column an update payload is allowed to write
pub trait Field: Copy {
    fn column(self) -> &'static str;
}

/// An update payload with a fixed set of writable fields
pub trait Patch {
    type Field: Field + 'static;

    /// Whitelist of writable fields
    const FIELDS: &'static [Self::Field];

    /// Value for `field` if the payload carries it
    fn value(&self, field: Self::Field) -> Option<FieldValue>;

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        for field in Self::FIELDS {
            if let Some(value) = self.value(*field) {
                changes.set(field.column(), value);
            }
        }
        changes
    }
}
