//! Writers turn a stream of records into a stream of output lines.
//!
//! - [`FlatWriter`]: delimited text with an optional header line
//! - [`XmlElementsWriter`]: one child element per field
//! - [`XmlAttributesWriter`]: one attribute-carrying element per field
//!
//! Both XML writers wrap the records in a declaration line and a root element,
//! so `n` records always produce `n + 3` lines.

pub mod flat;
pub mod xml;

use std::iter;

use serde::{Deserialize, Serialize};

pub use flat::FlatWriter;
pub use xml::{XML_DECLARATION, XmlAttributesWriter, XmlElementsWriter, escape_xml};

use crate::error::Result;
use crate::fields::Field;
use crate::record::Record;

/// Lazy, single-pass stream of output lines. Ends after the first error.
pub type LineStream<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Output encoding for generated records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Writer {
    Flat(FlatWriter),
    XmlElements(XmlElementsWriter),
    XmlAttributes(XmlAttributesWriter),
}

impl Default for Writer {
    fn default() -> Self {
        Self::csv()
    }
}

impl Writer {
    pub fn csv() -> Self {
        Self::Flat(FlatWriter::csv())
    }

    pub fn tsv() -> Self {
        Self::Flat(FlatWriter::tsv())
    }

    pub fn xml_elements() -> Self {
        Self::XmlElements(XmlElementsWriter::default())
    }

    pub fn xml_attributes() -> Self {
        Self::XmlAttributes(XmlAttributesWriter::default())
    }

    /// Checks the writer's settings against the fields it will be given.
    pub fn validate(&self, fields: &[Field]) -> Result<()> {
        match self {
            Self::Flat(flat) => flat.validate(),
            Self::XmlElements(xml) => xml.validate(fields),
            Self::XmlAttributes(xml) => xml.validate(),
        }
    }

    /// Maps records to lines, adding any header, declaration or wrapping lines.
    pub fn map_records<'a, I>(&'a self, fields: &'a [Field], records: I) -> LineStream<'a>
    where
        I: Iterator<Item = Result<Record>> + 'a,
    {
        match self {
            Self::Flat(flat) => {
                let header = flat.include_header.then(|| flat.header(fields));
                let lines = records.map(move |r| r.and_then(|record| flat.line(&record)));
                until_error(header.into_iter().chain(lines))
            }
            Self::XmlElements(xml) => {
                let lines = records.map(move |r| r.map(|record| xml.line(&record)));
                until_error(wrap_xml(xml.root_open(), lines, xml.root_close()))
            }
            Self::XmlAttributes(xml) => {
                let lines = records.map(move |r| r.map(|record| xml.line(&record)));
                until_error(wrap_xml(xml.root_open(), lines, xml.root_close()))
            }
        }
    }
}

impl From<FlatWriter> for Writer {
    fn from(writer: FlatWriter) -> Self {
        Self::Flat(writer)
    }
}

impl From<XmlElementsWriter> for Writer {
    fn from(writer: XmlElementsWriter) -> Self {
        Self::XmlElements(writer)
    }
}

impl From<XmlAttributesWriter> for Writer {
    fn from(writer: XmlAttributesWriter) -> Self {
        Self::XmlAttributes(writer)
    }
}

fn wrap_xml<'a>(
    root_open: String,
    lines: impl Iterator<Item = Result<String>> + 'a,
    root_close: String,
) -> impl Iterator<Item = Result<String>> + 'a {
    iter::once(Ok(XML_DECLARATION.to_string()))
        .chain(iter::once(Ok(root_open)))
        .chain(lines)
        .chain(iter::once(Ok(root_close)))
}

/// Stops the stream after yielding its first error, so no footer follows a failure.
fn until_error<'a>(lines: impl Iterator<Item = Result<String>> + 'a) -> LineStream<'a> {
    let mut failed = false;
    Box::new(lines.map_while(move |line| {
        if failed {
            return None;
        }
        failed = line.is_err();
        Some(line)
    }))
}
