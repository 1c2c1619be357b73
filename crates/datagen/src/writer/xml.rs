//! XML output: one line per record, wrapped in a declaration and a root element.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{DataGenError, Result};
use crate::fields::Field;
use crate::record::Record;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Renders each field value as a child element named after the field:
/// `<record><name>value</name>...</record>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlElementsWriter {
    pub namespace: Option<String>,
    pub root_element_name: String,
    pub record_element_name: String,
}

impl Default for XmlElementsWriter {
    fn default() -> Self {
        Self {
            namespace: None,
            root_element_name: "records".to_string(),
            record_element_name: "record".to_string(),
        }
    }
}

impl XmlElementsWriter {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn root_element_name(mut self, name: impl Into<String>) -> Self {
        self.root_element_name = name.into();
        self
    }

    pub fn record_element_name(mut self, name: impl Into<String>) -> Self {
        self.record_element_name = name.into();
        self
    }

    /// Field names become element names here, so they are checked as well.
    pub(crate) fn validate(&self, fields: &[Field]) -> Result<()> {
        validate_name("root element", &self.root_element_name)?;
        validate_name("record element", &self.record_element_name)?;
        fields
            .iter()
            .try_for_each(|field| validate_name("field", field.name()))
    }

    pub fn root_open(&self) -> String {
        root_open(&self.root_element_name, self.namespace.as_deref())
    }

    pub fn root_close(&self) -> String {
        format!("</{}>", self.root_element_name)
    }

    /// Suppressed values are left out of the record.
    pub fn line(&self, record: &Record) -> String {
        let mut line = format!("<{}>", self.record_element_name);
        for value in record.values() {
            if let Some(text) = value.formatted() {
                let name = value.field_name();
                line.push_str(&format!("<{name}>{}</{name}>", escape_xml(text)));
            }
        }
        line.push_str(&format!("</{}>", self.record_element_name));
        line
    }
}

/// Renders each field value as an element carrying `name` and `value` attributes:
/// `<record><data name="field" value="value"/>...</record>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlAttributesWriter {
    pub namespace: Option<String>,
    pub root_element_name: String,
    pub record_element_name: String,
    pub field_value_element_name: String,
}

impl Default for XmlAttributesWriter {
    fn default() -> Self {
        Self {
            namespace: None,
            root_element_name: "records".to_string(),
            record_element_name: "record".to_string(),
            field_value_element_name: "data".to_string(),
        }
    }
}

impl XmlAttributesWriter {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn root_element_name(mut self, name: impl Into<String>) -> Self {
        self.root_element_name = name.into();
        self
    }

    pub fn record_element_name(mut self, name: impl Into<String>) -> Self {
        self.record_element_name = name.into();
        self
    }

    pub fn field_value_element_name(mut self, name: impl Into<String>) -> Self {
        self.field_value_element_name = name.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_name("root element", &self.root_element_name)?;
        validate_name("record element", &self.record_element_name)?;
        validate_name("field value element", &self.field_value_element_name)
    }

    pub fn root_open(&self) -> String {
        root_open(&self.root_element_name, self.namespace.as_deref())
    }

    pub fn root_close(&self) -> String {
        format!("</{}>", self.root_element_name)
    }

    /// Suppressed values are left out of the record.
    pub fn line(&self, record: &Record) -> String {
        let mut line = format!("<{}>", self.record_element_name);
        for value in record.values() {
            if let Some(text) = value.formatted() {
                line.push_str(&format!(
                    r#"<{} name="{}" value="{}"/>"#,
                    self.field_value_element_name,
                    escape_xml(value.field_name()),
                    escape_xml(text)
                ));
            }
        }
        line.push_str(&format!("</{}>", self.record_element_name));
        line
    }
}

fn root_open(root: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!(r#"<{root} xmlns="{}">"#, escape_xml(ns)),
        None => format!("<{root}>"),
    }
}

/// Element names must start with a letter or `_` and contain no markup characters.
fn validate_name(what: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(DataGenError::config(format!(
            "{what} name [{name}] is not a valid XML name"
        )))
    }
}

/// Escapes XML special characters in text and attribute content.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
