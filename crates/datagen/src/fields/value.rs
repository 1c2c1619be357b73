//! Values produced by a single field invocation.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use time::PrimitiveDateTime;
use uuid::Uuid;

/// Typed value as produced by a source, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Integer(i64),
    DateTime(PrimitiveDateTime),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
}

/// A raw value and the text it renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    raw: RawValue,
    formatted: String,
}

impl Value {
    pub fn new(raw: RawValue, formatted: String) -> Self {
        Self { raw, formatted }
    }

    pub fn text(text: String) -> Self {
        Self {
            formatted: text.clone(),
            raw: RawValue::Text(text),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            raw: RawValue::Integer(value),
            formatted: value.to_string(),
        }
    }

    pub fn raw(&self) -> &RawValue {
        &self.raw
    }

    pub fn formatted(&self) -> &str {
        &self.formatted
    }
}

/// Output of one field for one row. `value` is `None` when the field was suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    field: Arc<str>,
    value: Option<Value>,
}

impl FieldValue {
    pub(crate) fn new(field: Arc<str>, value: Option<Value>) -> Self {
        Self { field, value }
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn raw(&self) -> Option<&RawValue> {
        self.value.as_ref().map(Value::raw)
    }

    pub fn formatted(&self) -> Option<&str> {
        self.value.as_ref().map(Value::formatted)
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.formatted().unwrap_or_default())
    }
}
