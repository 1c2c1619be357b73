//! Formatters used by the built-in value sources.

use time::PrimitiveDateTime;
use time::format_description::{BorrowedFormatItem, OwnedFormatItem};
use time::macros::format_description;

use crate::error::{BoxError, DataGenError, Result};

/// Default date-time layout, e.g. `2016-01-01T00:00:00`.
pub const ISO_LOCAL_DATE_TIME: &str = "[year]-[month]-[day]T[hour]:[minute]:[second]";

const ISO_LOCAL_ITEMS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Template that substitutes a number for its `{}` placeholder, e.g. `user-{}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberTemplate {
    template: String,
}

impl NumberTemplate {
    pub const PLACEHOLDER: &'static str = "{}";

    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(Self::PLACEHOLDER) {
            return Err(DataGenError::config(format!(
                "template [{template}] has no {} placeholder",
                Self::PLACEHOLDER
            )));
        }
        Ok(Self { template })
    }

    pub fn render(&self, number: i64) -> String {
        self.template
            .replacen(Self::PLACEHOLDER, &number.to_string(), 1)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// Date-time layout written in `time`'s format description syntax.
#[derive(Debug, Clone)]
pub struct DateTimeFormat {
    pattern: String,
    items: OwnedFormatItem,
}

impl DateTimeFormat {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let items = time::format_description::parse_owned::<2>(&pattern).map_err(|e| {
            DataGenError::config(format!("invalid date-time format [{pattern}]: {e}"))
        })?;
        Ok(Self { pattern, items })
    }

    /// ISO-8601 local date-time without offset.
    pub fn iso_local() -> Self {
        Self {
            pattern: ISO_LOCAL_DATE_TIME.to_string(),
            items: OwnedFormatItem::from(ISO_LOCAL_ITEMS),
        }
    }

    pub fn format(&self, value: PrimitiveDateTime) -> Result<String, BoxError> {
        Ok(value.format(&self.items)?)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for DateTimeFormat {
    fn default() -> Self {
        Self::iso_local()
    }
}

impl TryFrom<&str> for DateTimeFormat {
    type Error = DataGenError;

    fn try_from(pattern: &str) -> Result<Self> {
        Self::new(pattern)
    }
}
