//! A single generated row.

use crate::fields::FieldValue;

/// One generated row: a value per field, in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    index: u64,
    values: Vec<FieldValue>,
}

impl Record {
    pub(crate) fn new(index: u64, values: Vec<FieldValue>) -> Self {
        Self { index, values }
    }

    /// 1-based row index this record was generated for.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a value by field name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.iter().find(|v| v.field_name() == field)
    }

    /// Formatted values in field order; suppressed values render as `""`.
    pub fn formatted_values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.formatted().unwrap_or_default())
    }
}

impl IntoIterator for Record {
    type Item = FieldValue;
    type IntoIter = std::vec::IntoIter<FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
