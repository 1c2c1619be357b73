//! Delimited text output (CSV, TSV, pipe-separated, ...).

use std::borrow::Cow;
use std::io;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{DataGenError, Result};
use crate::fields::Field;
use crate::record::Record;

/// Writes one delimited line per record, optionally preceded by a header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatWriter {
    /// Separator placed between values.
    pub delimiter: String,
    /// Quote used to enclose values that need it. `None` writes values verbatim.
    pub quote: Option<String>,
    /// Whether to emit the field names as the first line.
    pub include_header: bool,
    /// Quote every value, not just those that need it.
    pub always_quote: bool,
}

impl Default for FlatWriter {
    fn default() -> Self {
        Self::csv()
    }
}

impl FlatWriter {
    /// Comma separated, `"` quoted, with a header line.
    pub fn csv() -> Self {
        Self {
            delimiter: ",".to_string(),
            quote: Some("\"".to_string()),
            include_header: true,
            always_quote: false,
        }
    }

    /// Tab separated, `"` quoted, with a header line.
    pub fn tsv() -> Self {
        Self {
            delimiter: "\t".to_string(),
            ..Self::csv()
        }
    }

    pub fn delimited_by(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn enclosed_by(mut self, quote: Option<&str>) -> Self {
        self.quote = quote.map(str::to_string);
        self
    }

    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    pub fn always_quote(mut self, always_quote: bool) -> Self {
        self.always_quote = always_quote;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(DataGenError::config("delimiter must not be empty"));
        }
        if let Some(quote) = self.quote.as_deref() {
            if quote.is_empty() {
                return Err(DataGenError::config(
                    "quote must not be empty; use no quote instead",
                ));
            }
            if quote.contains(self.delimiter.as_str()) || self.delimiter.contains(quote) {
                return Err(DataGenError::config(format!(
                    "delimiter [{}] and quote [{quote}] must not overlap",
                    self.delimiter
                )));
            }
        }
        Ok(())
    }

    pub fn header(&self, fields: &[Field]) -> Result<String> {
        self.join(fields.iter().map(Field::name))
    }

    pub fn line(&self, record: &Record) -> Result<String> {
        self.join(record.formatted_values())
    }

    /// Single-byte settings go through the `csv` encoder; longer delimiters or
    /// quotes fall back to [`FlatWriter::escape`].
    fn join<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Result<String> {
        let values: Vec<&str> = values.into_iter().collect();

        // A lone empty value is an empty line, not `""`.
        if let [only] = values.as_slice() {
            if only.is_empty() && !self.always_quote {
                return Ok(String::new());
            }
        }

        match self.single_byte_settings() {
            Some((delimiter, quote)) => self.encode(delimiter, quote, &values),
            None => Ok(values
                .iter()
                .map(|v| self.escape(v))
                .collect::<Vec<_>>()
                .join(self.delimiter.as_str())),
        }
    }

    fn encode(&self, delimiter: u8, quote: Option<u8>, values: &[&str]) -> Result<String> {
        let style = match (quote, self.always_quote) {
            (None, _) => QuoteStyle::Never,
            (Some(_), true) => QuoteStyle::Always,
            (Some(_), false) => QuoteStyle::Necessary,
        };

        let mut out = WriterBuilder::new()
            .delimiter(delimiter)
            .quote(quote.unwrap_or(b'"'))
            .quote_style(style)
            .double_quote(true)
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());
        out.write_record(values)?;

        let mut bytes = out.into_inner().map_err(|e| e.into_error())?;
        if bytes.ends_with(b"\r\n") {
            bytes.truncate(bytes.len() - 2);
        }
        String::from_utf8(bytes).map_err(|e| DataGenError::Sink(io::Error::other(e)))
    }

    fn single_byte_settings(&self) -> Option<(u8, Option<u8>)> {
        let delimiter = single_byte(&self.delimiter)?;
        match self.quote.as_deref() {
            None => Some((delimiter, None)),
            Some(quote) => Some((delimiter, Some(single_byte(quote)?))),
        }
    }

    /// Encloses the value in quotes (doubling embedded quotes) when it contains the
    /// delimiter, the quote or a line break, or when quoting is forced.
    pub fn escape<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let Some(quote) = self.quote.as_deref() else {
            return Cow::Borrowed(value);
        };

        let needs_quoting = self.always_quote
            || value.contains(self.delimiter.as_str())
            || value.contains(quote)
            || value.contains(['\n', '\r']);

        if needs_quoting {
            let doubled = format!("{quote}{quote}");
            Cow::Owned(format!("{quote}{}{quote}", value.replace(quote, &doubled)))
        } else {
            Cow::Borrowed(value)
        }
    }
}

fn single_byte(s: &str) -> Option<u8> {
    match s.as_bytes() {
        [b] => Some(*b),
        _ => None,
    }
}
