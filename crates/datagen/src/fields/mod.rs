//! Field definitions and the value sources behind them.
//!
//! A [`Field`] pairs a name with a [`ValueSource`] and a [`NullPolicy`]. Each call
//! to [`Field::next`] first decides whether the value is suppressed, then asks the
//! source for the next value:
//! - stateful sources (sequences, stepped date-times) advance an atomic cursor
//! - stateless sources draw only from the RNG handed in for the row

pub mod format;
pub mod source;
pub mod value;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use fake::{Dummy, Fake};
use rand::{Rng, RngCore};
use time::{Duration, PrimitiveDateTime};

pub use format::{DateTimeFormat, ISO_LOCAL_DATE_TIME, NumberTemplate};
pub use source::{ValueSource, ValueSupplier};
pub use value::{FieldValue, RawValue, Value};

use crate::error::{BoxError, DataGenError, Result};

/// Decision function for custom null policies.
pub type NullDecision = dyn Fn(&mut dyn RngCore) -> bool + Send + Sync;

/// Decides whether a field produces a value or is suppressed for a row.
#[derive(Clone, Default)]
pub enum NullPolicy {
    /// Always produce a value.
    #[default]
    Never,
    /// Suppress when a uniform draw from the row's RNG falls below the probability.
    Probability(f64),
    Custom(Arc<NullDecision>),
}

impl NullPolicy {
    /// Builds a probability policy, collapsing `0.0` to [`NullPolicy::Never`].
    pub fn probability(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(DataGenError::config(format!(
                "null probability ({probability}) must be between 0 and 1"
            )));
        }
        if probability == 0.0 {
            Ok(Self::Never)
        } else {
            Ok(Self::Probability(probability))
        }
    }

    pub fn custom(decision: impl Fn(&mut dyn RngCore) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(decision))
    }

    fn validate(self) -> Result<Self> {
        match self {
            Self::Probability(p) => Self::probability(p),
            other => Ok(other),
        }
    }

    pub fn is_null(&self, rng: &mut dyn RngCore) -> bool {
        match self {
            Self::Never => false,
            Self::Probability(p) => rng.gen_bool(*p),
            Self::Custom(decision) => decision(rng),
        }
    }
}

impl fmt::Debug for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Probability(p) => f.debug_tuple("Probability").field(p).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A named column of generated data.
#[derive(Debug)]
pub struct Field {
    name: Arc<str>,
    source: ValueSource,
    nulls: NullPolicy,
}

impl Field {
    pub fn new(name: impl Into<String>, source: ValueSource) -> Self {
        Self {
            name: Arc::from(name.into()),
            source,
            nulls: NullPolicy::Never,
        }
    }

    /// Suppresses the value with the given probability (`0.0..=1.0`).
    pub fn with_null_probability(self, probability: f64) -> Result<Self> {
        self.with_null_policy(NullPolicy::probability(probability)?)
    }

    pub fn with_null_policy(mut self, policy: NullPolicy) -> Result<Self> {
        self.nulls = policy.validate()?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    pub fn null_policy(&self) -> &NullPolicy {
        &self.nulls
    }

    /// Produces this field's value for one row.
    ///
    /// A suppressed value does not consume a position from a stateful source. A
    /// panicking generator or null policy is reported as a field error.
    pub fn next(&self, rng: &mut dyn RngCore) -> Result<FieldValue> {
        let produced = panic::catch_unwind(AssertUnwindSafe(|| {
            if self.nulls.is_null(rng) {
                return Ok(None);
            }
            self.source.next_value(rng).map(Some)
        }))
        .unwrap_or_else(|payload| Err(panic_error(&*payload)));

        let value = produced.map_err(|e| DataGenError::field(&self.name, e))?;
        Ok(FieldValue::new(Arc::clone(&self.name), value))
    }

    /// Loops through `values` in order.
    pub fn sequential_value<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let values = values.into_iter().map(Into::into).collect();
        Ok(Self::new(name, ValueSource::sequential_value(values)?))
    }

    /// Picks a random entry from `values` for every row.
    pub fn random_value<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let values = values.into_iter().map(Into::into).collect();
        Ok(Self::new(name, ValueSource::random_value(values)?))
    }

    /// Random number below `max_exclusive` rendered through `template`, e.g. `user-{}`.
    pub fn random_numbered_value(
        name: impl Into<String>,
        template: &str,
        max_exclusive: i64,
    ) -> Result<Self> {
        Ok(Self::new(
            name,
            ValueSource::random_numbered_value(template, max_exclusive)?,
        ))
    }

    pub fn sequentially_numbered_value(
        name: impl Into<String>,
        template: &str,
        start: i64,
        end: i64,
    ) -> Result<Self> {
        Ok(Self::new(
            name,
            ValueSource::sequentially_numbered_value(template, start, end)?,
        ))
    }

    pub fn sequential_number(name: impl Into<String>, start: i64, end: i64) -> Result<Self> {
        Ok(Self::new(name, ValueSource::sequential_number(start, end)?))
    }

    pub fn random_number(name: impl Into<String>, start: i64, end: i64) -> Result<Self> {
        Ok(Self::new(name, ValueSource::random_number(start, end)?))
    }

    pub fn random_ipv4(name: impl Into<String>) -> Self {
        Self::new(name, ValueSource::RandomIpv4)
    }

    pub fn random_date_time(
        name: impl Into<String>,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
        format: DateTimeFormat,
    ) -> Result<Self> {
        Ok(Self::new(
            name,
            ValueSource::random_date_time(start, end, format)?,
        ))
    }

    pub fn sequential_date_time(
        name: impl Into<String>,
        start: PrimitiveDateTime,
        step: Duration,
        format: DateTimeFormat,
    ) -> Self {
        Self::new(name, ValueSource::sequential_date_time(start, step, format))
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, ValueSource::Uuid)
    }

    /// Between `min_count` and `max_count` random words from `words`, space separated.
    pub fn random_words<S: Into<String>>(
        name: impl Into<String>,
        min_count: usize,
        max_count: usize,
        words: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let words = words.into_iter().map(Into::into).collect();
        Ok(Self::new(
            name,
            ValueSource::random_words(min_count, max_count, words)?,
        ))
    }

    /// Field backed by any `fake` faker that yields a `String`.
    ///
    /// ```rust,ignore
    /// use fake::faker::name::en::Name;
    ///
    /// let field = Field::fake("name", Name());
    /// ```
    pub fn fake<F>(name: impl Into<String>, faker: F) -> Self
    where
        F: Send + Sync + 'static,
        String: Dummy<F>,
    {
        Self::custom(name, move |rng: &mut dyn RngCore| -> Result<String, BoxError> {
            let mut rng = rng;
            Ok(faker.fake_with_rng::<String, _>(&mut rng))
        })
    }

    pub fn custom(name: impl Into<String>, supplier: impl ValueSupplier + 'static) -> Self {
        Self::new(name, ValueSource::custom(supplier))
    }
}

fn panic_error(payload: &(dyn Any + Send)) -> BoxError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|m| m.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("generator panicked: {message}").into()
}
