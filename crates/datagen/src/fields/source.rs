//! Value sources: the strategies a field uses to produce its next value.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use rand::{Rng, RngCore};
use time::{Duration, PrimitiveDateTime};

use super::format::{DateTimeFormat, NumberTemplate};
use super::value::{RawValue, Value};
use crate::error::{BoxError, DataGenError, Result};
use crate::sequence::CyclicSequence;

/// Open extension point for generators the built-in sources do not cover.
///
/// Implementations must be safe to call from several rows at once.
pub trait ValueSupplier: Send + Sync {
    fn supply(&self, rng: &mut dyn RngCore) -> Result<String, BoxError>;
}

impl<F> ValueSupplier for F
where
    F: Fn(&mut dyn RngCore) -> Result<String, BoxError> + Send + Sync,
{
    fn supply(&self, rng: &mut dyn RngCore) -> Result<String, BoxError> {
        self(rng)
    }
}

/// Strategy for producing a field's values.
///
/// Sequential variants own an atomic cursor and continue from where they left off,
/// random variants draw everything from the RNG they are handed.
pub enum ValueSource {
    /// Loops through `values` in order.
    SequentialValue {
        values: Vec<String>,
        cursor: CyclicSequence,
    },
    /// Picks uniformly from `values`.
    RandomValue { values: Vec<String> },
    /// Random number in `[0, max_exclusive)` rendered through a template.
    RandomNumberedValue {
        template: NumberTemplate,
        max_exclusive: i64,
    },
    /// Looping number rendered through a template.
    SequentiallyNumberedValue {
        template: NumberTemplate,
        cursor: CyclicSequence,
    },
    SequentialNumber { cursor: CyclicSequence },
    /// Random number in `[start, end)`.
    RandomNumber { start: i64, end: i64 },
    RandomIpv4,
    /// Random date-time in `[start, end)` at whole-second resolution.
    RandomDateTime {
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
        format: DateTimeFormat,
    },
    /// `start`, `start + step`, `start + 2 * step`, ...
    SequentialDateTime {
        start: PrimitiveDateTime,
        step: Duration,
        steps: AtomicI64,
        format: DateTimeFormat,
    },
    Uuid,
    /// Between `min_count` and `max_count` (inclusive) words joined by spaces.
    RandomWords {
        min_count: usize,
        max_count: usize,
        words: Vec<String>,
    },
    Custom(Arc<dyn ValueSupplier>),
}

impl ValueSource {
    pub fn sequential_value(values: Vec<String>) -> Result<Self> {
        let cursor = CyclicSequence::with_end(non_empty_len(&values, "value list")?)?;
        Ok(Self::SequentialValue { values, cursor })
    }

    pub fn random_value(values: Vec<String>) -> Result<Self> {
        non_empty_len(&values, "value list")?;
        Ok(Self::RandomValue { values })
    }

    pub fn random_numbered_value(template: &str, max_exclusive: i64) -> Result<Self> {
        if max_exclusive <= 0 {
            return Err(DataGenError::config(format!(
                "max_exclusive ({max_exclusive}) must be greater than zero"
            )));
        }
        Ok(Self::RandomNumberedValue {
            template: NumberTemplate::new(template)?,
            max_exclusive,
        })
    }

    pub fn sequentially_numbered_value(template: &str, start: i64, end: i64) -> Result<Self> {
        Ok(Self::SequentiallyNumberedValue {
            template: NumberTemplate::new(template)?,
            cursor: CyclicSequence::new(start, end)?,
        })
    }

    pub fn sequential_number(start: i64, end: i64) -> Result<Self> {
        Ok(Self::SequentialNumber {
            cursor: CyclicSequence::new(start, end)?,
        })
    }

    pub fn random_number(start: i64, end: i64) -> Result<Self> {
        if end <= start {
            return Err(DataGenError::config(format!(
                "random number end ({end}) must be greater than start ({start})"
            )));
        }
        Ok(Self::RandomNumber { start, end })
    }

    pub fn random_date_time(
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
        format: DateTimeFormat,
    ) -> Result<Self> {
        if (end - start).whole_seconds() <= 0 {
            return Err(DataGenError::config(format!(
                "date-time end ({end}) must be at least one second after start ({start})"
            )));
        }
        Ok(Self::RandomDateTime { start, end, format })
    }

    pub fn sequential_date_time(
        start: PrimitiveDateTime,
        step: Duration,
        format: DateTimeFormat,
    ) -> Self {
        Self::SequentialDateTime {
            start,
            step,
            steps: AtomicI64::new(0),
            format,
        }
    }

    pub fn random_words(min_count: usize, max_count: usize, words: Vec<String>) -> Result<Self> {
        if words.is_empty() {
            return Err(DataGenError::config("word list must not be empty"));
        }
        if min_count > max_count {
            return Err(DataGenError::config(format!(
                "min word count ({min_count}) must not exceed max word count ({max_count})"
            )));
        }
        Ok(Self::RandomWords {
            min_count,
            max_count,
            words,
        })
    }

    pub fn custom(supplier: impl ValueSupplier + 'static) -> Self {
        Self::Custom(Arc::new(supplier))
    }

    /// True for sources whose next value depends on the values before it.
    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            Self::SequentialValue { .. }
                | Self::SequentiallyNumberedValue { .. }
                | Self::SequentialNumber { .. }
                | Self::SequentialDateTime { .. }
        )
    }

    /// Produces the next raw value together with its formatted text.
    pub fn next_value(&self, rng: &mut dyn RngCore) -> Result<Value, BoxError> {
        let value = match self {
            Self::SequentialValue { values, cursor } => {
                Value::text(pick(values, cursor.next())?.to_string())
            }
            Self::RandomValue { values } => {
                Value::text(values[random_index(rng, values.len())?].clone())
            }
            Self::RandomNumberedValue {
                template,
                max_exclusive,
            } => {
                let number = random_in(rng, 0, *max_exclusive)?;
                Value::new(RawValue::Integer(number), template.render(number))
            }
            Self::SequentiallyNumberedValue { template, cursor } => {
                let number = cursor.next();
                Value::new(RawValue::Integer(number), template.render(number))
            }
            Self::SequentialNumber { cursor } => Value::integer(cursor.next()),
            Self::RandomNumber { start, end } => Value::integer(random_in(rng, *start, *end)?),
            Self::RandomIpv4 => {
                let addr = Ipv4Addr::from(rng.r#gen::<[u8; 4]>());
                Value::new(RawValue::Ipv4(addr), addr.to_string())
            }
            Self::RandomDateTime { start, end, format } => {
                let offset = random_in(rng, 0, (*end - *start).whole_seconds())?;
                let value = *start + Duration::seconds(offset);
                Value::new(RawValue::DateTime(value), format.format(value)?)
            }
            Self::SequentialDateTime {
                start,
                step,
                steps,
                format,
            } => {
                let n = steps.fetch_add(1, Ordering::AcqRel);
                let value = advance(*start, *step, n)?;
                Value::new(RawValue::DateTime(value), format.format(value)?)
            }
            Self::Uuid => {
                let bytes = rng.r#gen::<[u8; 16]>();
                let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
                Value::new(RawValue::Uuid(id), id.to_string())
            }
            Self::RandomWords {
                min_count,
                max_count,
                words,
            } => {
                if min_count > max_count {
                    return Err(format!(
                        "min word count ({min_count}) exceeds max word count ({max_count})"
                    )
                    .into());
                }
                let count = rng.gen_range(*min_count..=*max_count);
                let text = (0..count)
                    .map(|_| random_index(rng, words.len()).map(|i| words[i].as_str()))
                    .collect::<Result<Vec<_>, BoxError>>()?
                    .join(" ");
                Value::text(text)
            }
            Self::Custom(supplier) => Value::text(supplier.supply(rng)?),
        };

        Ok(value)
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequentialValue { values, .. } => {
                f.debug_struct("SequentialValue").field("values", values).finish()
            }
            Self::RandomValue { values } => {
                f.debug_struct("RandomValue").field("values", values).finish()
            }
            Self::RandomNumberedValue {
                template,
                max_exclusive,
            } => f
                .debug_struct("RandomNumberedValue")
                .field("template", &template.as_str())
                .field("max_exclusive", max_exclusive)
                .finish(),
            Self::SequentiallyNumberedValue { template, cursor } => f
                .debug_struct("SequentiallyNumberedValue")
                .field("template", &template.as_str())
                .field("cursor", cursor)
                .finish(),
            Self::SequentialNumber { cursor } => f
                .debug_struct("SequentialNumber")
                .field("cursor", cursor)
                .finish(),
            Self::RandomNumber { start, end } => f
                .debug_struct("RandomNumber")
                .field("start", start)
                .field("end", end)
                .finish(),
            Self::RandomIpv4 => f.write_str("RandomIpv4"),
            Self::RandomDateTime { start, end, format } => f
                .debug_struct("RandomDateTime")
                .field("start", start)
                .field("end", end)
                .field("format", &format.pattern())
                .finish(),
            Self::SequentialDateTime {
                start,
                step,
                format,
                ..
            } => f
                .debug_struct("SequentialDateTime")
                .field("start", start)
                .field("step", step)
                .field("format", &format.pattern())
                .finish(),
            Self::Uuid => f.write_str("Uuid"),
            Self::RandomWords {
                min_count,
                max_count,
                words,
            } => f
                .debug_struct("RandomWords")
                .field("min_count", min_count)
                .field("max_count", max_count)
                .field("words", &words.len())
                .finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn non_empty_len(values: &[String], what: &str) -> Result<i64> {
    if values.is_empty() {
        return Err(DataGenError::config(format!("{what} must not be empty")));
    }
    i64::try_from(values.len())
        .map_err(|_| DataGenError::config(format!("{what} has too many entries")))
}

fn pick(values: &[String], cursor: i64) -> Result<&str, BoxError> {
    usize::try_from(cursor)
        .ok()
        .and_then(|i| values.get(i))
        .map(String::as_str)
        .ok_or_else(|| format!("position {cursor} is outside a list of {}", values.len()).into())
}

fn random_index(rng: &mut dyn RngCore, len: usize) -> Result<usize, BoxError> {
    if len == 0 {
        return Err("cannot pick from an empty list".into());
    }
    Ok(rng.gen_range(0..len))
}

/// Uniform draw from `[start, end)`.
fn random_in(rng: &mut dyn RngCore, start: i64, end: i64) -> Result<i64, BoxError> {
    if end <= start {
        return Err(format!("cannot draw from empty range [{start}, {end})").into());
    }
    Ok(rng.gen_range(start..end))
}

fn advance(start: PrimitiveDateTime, step: Duration, n: i64) -> Result<PrimitiveDateTime, BoxError> {
    const NANOS_PER_SECOND: i128 = 1_000_000_000;

    let total = step
        .whole_nanoseconds()
        .checked_mul(i128::from(n))
        .ok_or("date-time step overflowed")?;
    let seconds = i64::try_from(total / NANOS_PER_SECOND)?;
    let nanos = i32::try_from(total % NANOS_PER_SECOND)?;

    start
        .checked_add(Duration::new(seconds, nanos))
        .ok_or_else(|| format!("date-time out of range after {n} steps").into())
}
