//! Definitions: the assembled generation settings and their `generate` entry point.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::{DEFAULT_ROW_COUNT, GenerationConfig};
use crate::error::{DataGenError, Result};
use crate::fields::Field;
use crate::rows::{Mode, RowGenerator};
use crate::sink::Sink;
use crate::writer::{LineStream, Writer};

/// Figures from a completed generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Records handed to the writer.
    pub rows: u64,
    /// Lines handed to the sink, including headers and wrapping lines.
    pub lines: u64,
    /// Wall-clock time of the run (milliseconds).
    pub elapsed_ms: u64,
}

/// Validated set of fields, row count, writer and sink.
///
/// Calling [`Definition::generate`] again continues stateful sources from where the
/// previous run left them.
pub struct Definition {
    fields: Arc<[Field]>,
    row_count: u64,
    writer: Writer,
    mode: Mode,
    seed: Option<u64>,
    sink: Box<dyn Sink>,
}

impl Definition {
    pub fn builder() -> DefinitionBuilder {
        DefinitionBuilder::new()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.mode, Mode::Parallel { .. })
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Generates every row and streams the formatted lines into the sink.
    ///
    /// The sink is called exactly once. A field or sink failure aborts the run and
    /// is returned here, whether or not the sink passed it on; lines already written
    /// by the sink stay written.
    pub fn generate(&mut self) -> Result<GenerationSummary> {
        let started = Instant::now();
        info!(
            rows = self.row_count,
            fields = self.fields.len(),
            parallel = self.is_parallel(),
            "Generating test data"
        );

        let records = RowGenerator::new(Arc::clone(&self.fields), self.row_count)
            .with_mode(self.mode)
            .with_seed(self.seed)
            .generate()?;

        let rows = Cell::new(0u64);
        let lines = Cell::new(0u64);
        let failure: Cell<Option<DataGenError>> = Cell::new(None);
        let counted_records = records.inspect(|r| {
            if r.is_ok() {
                rows.set(rows.get() + 1);
            }
        });
        let stream: LineStream<'_> = Box::new(
            self.writer
                .map_records(&self.fields, counted_records)
                .map(|line| match line {
                    Ok(line) => {
                        lines.set(lines.get() + 1);
                        Ok(line)
                    }
                    Err(e) => {
                        let seen_by_sink = e.replicate();
                        failure.set(Some(e));
                        Err(seen_by_sink)
                    }
                }),
        );

        let consumed = self.sink.consume(stream);
        // The pipeline failure wins even when the sink skipped over it.
        if let Some(e) = failure.take() {
            return Err(e);
        }
        consumed?;

        let summary = GenerationSummary {
            rows: rows.get(),
            lines: lines.get(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            rows = summary.rows,
            lines = summary.lines,
            elapsed_ms = summary.elapsed_ms,
            "Test data generated"
        );
        Ok(summary)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("fields", &self.fields)
            .field("row_count", &self.row_count)
            .field("writer", &self.writer)
            .field("mode", &self.mode)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Definition`].
///
/// Duplicate field names are rejected by [`DefinitionBuilder::add_field`] itself;
/// everything else is checked by [`DefinitionBuilder::build`], before any row is
/// generated.
///
/// # Example
///
/// ```rust,ignore
/// let sink = MemorySink::new();
/// Definition::builder()
///     .add_field(Field::sequential_value("letter", ["A", "B", "C"])?)?
///     .add_field(Field::uuid("id"))?
///     .row_count(5)
///     .writer(Writer::csv())
///     .sink(sink.clone())
///     .generate()?;
/// ```
pub struct DefinitionBuilder {
    fields: Vec<Field>,
    row_count: u64,
    writer: Option<Writer>,
    parallel: bool,
    worker_threads: Option<usize>,
    seed: Option<u64>,
    sink: Option<Box<dyn Sink>>,
}

impl Default for DefinitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            row_count: DEFAULT_ROW_COUNT,
            writer: None,
            parallel: false,
            worker_threads: None,
            seed: None,
            sink: None,
        }
    }

    /// Appends a field, failing immediately if its name is already taken.
    pub fn add_field(mut self, field: Field) -> Result<Self> {
        if self.fields.iter().any(|f| f.name() == field.name()) {
            return Err(DataGenError::config(format!(
                "Name [{}] is already in use",
                field.name()
            )));
        }
        self.fields.push(field);
        Ok(self)
    }

    /// Appends several fields in order.
    pub fn add_fields(self, fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        fields.into_iter().try_fold(self, Self::add_field)
    }

    /// Sets the number of rows; must be greater than zero.
    pub fn row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    /// Sets the output encoding. Defaults to [`Writer::csv`].
    pub fn writer(mut self, writer: impl Into<Writer>) -> Self {
        self.writer = Some(writer.into());
        self
    }

    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Uses a closure as the sink.
    pub fn consumed_by<F>(self, consumer: F) -> Self
    where
        F: FnMut(LineStream<'_>) -> Result<()> + Send + 'static,
    {
        self.sink(consumer)
    }

    /// Generates rows on a worker pool. Row order in the output is then unspecified.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Sets the worker pool size and enables parallel generation.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.parallel = true;
        self.worker_threads = Some(threads);
        self
    }

    /// Seeds the random sources so runs can be repeated.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Applies run settings loaded from configuration.
    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.row_count = config.row_count;
        self.parallel = config.parallel;
        self.worker_threads = config.worker_threads;
        self.seed = config.seed;
        self.writer = Some(config.writer);
        self
    }

    pub fn build(self) -> Result<Definition> {
        if self.fields.is_empty() {
            return Err(DataGenError::config("No field definitions defined"));
        }
        if self.row_count == 0 {
            return Err(DataGenError::config("row count must be greater than zero"));
        }
        if self.worker_threads == Some(0) {
            return Err(DataGenError::config(
                "worker thread count must be greater than zero",
            ));
        }
        let Some(sink) = self.sink else {
            return Err(DataGenError::config("No sink defined"));
        };

        let writer = self.writer.unwrap_or_default();
        writer.validate(&self.fields)?;

        let mode = if self.parallel {
            Mode::Parallel {
                threads: self.worker_threads,
            }
        } else {
            Mode::Sequential
        };

        Ok(Definition {
            fields: Arc::from(self.fields),
            row_count: self.row_count,
            writer,
            mode,
            seed: self.seed,
            sink,
        })
    }

    /// Builds the definition and runs it once.
    pub fn generate(self) -> Result<GenerationSummary> {
        self.build()?.generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::sink::MemorySink;
    use rand::RngCore;
    use crate::writer::FlatWriter;

    fn letters() -> Field {
        Field::sequential_value("letter", ["A", "B", "C"]).unwrap()
    }

    #[test]
    fn test_duplicate_name_rejected_at_add() {
        let builder = Definition::builder().add_field(letters()).unwrap();
        let err = builder
            .add_field(Field::uuid("letter"))
            .err()
            .expect("duplicate name accepted");

        assert!(err.is_configuration());
        assert!(err.to_string().contains("letter"));
    }

    #[test]
    fn test_build_requires_fields() {
        let err = Definition::builder()
            .sink(MemorySink::new())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_requires_sink() {
        let err = Definition::builder()
            .add_field(letters())
            .unwrap()
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("sink"));
    }

    #[test]
    fn test_build_rejects_zero_rows() {
        let err = Definition::builder()
            .add_field(letters())
            .unwrap()
            .row_count(0)
            .sink(MemorySink::new())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_rejects_zero_workers() {
        let err = Definition::builder()
            .add_field(letters())
            .unwrap()
            .worker_threads(0)
            .sink(MemorySink::new())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_validates_writer() {
        let err = Definition::builder()
            .add_field(letters())
            .unwrap()
            .writer(FlatWriter::csv().delimited_by(""))
            .sink(MemorySink::new())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_defaults() {
        let definition = Definition::builder()
            .add_field(letters())
            .unwrap()
            .sink(MemorySink::new())
            .build()
            .unwrap();

        assert_eq!(definition.row_count(), DEFAULT_ROW_COUNT);
        assert_eq!(definition.writer(), &Writer::csv());
        assert!(!definition.is_parallel());
        assert_eq!(definition.seed(), None);
    }

    #[test]
    fn test_generate_summary() {
        let sink = MemorySink::new();
        let summary = Definition::builder()
            .add_field(letters())
            .unwrap()
            .row_count(4)
            .sink(sink.clone())
            .generate()
            .unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.lines, 5);
        assert_eq!(sink.lines(), vec!["letter", "A", "B", "C", "A"]);
    }

    #[test]
    fn test_second_run_continues_sequences() {
        let sink = MemorySink::new();
        let mut definition = Definition::builder()
            .add_field(letters())
            .unwrap()
            .row_count(2)
            .writer(FlatWriter::csv().with_header(false))
            .sink(sink.clone())
            .build()
            .unwrap();

        definition.generate().unwrap();
        definition.generate().unwrap();

        assert_eq!(sink.lines(), vec!["A", "B", "C", "A"]);
    }

    fn broken() -> Field {
        Field::custom("broken", |_: &mut dyn RngCore| -> Result<String, BoxError> {
            Err("boom".into())
        })
    }

    #[test]
    fn test_field_error_returned_when_sink_skips_it() {
        let err = Definition::builder()
            .add_field(broken())
            .unwrap()
            .row_count(3)
            .consumed_by(|lines| {
                lines.filter_map(|l| l.ok()).for_each(drop);
                Ok(())
            })
            .generate()
            .unwrap_err();

        match err {
            DataGenError::FieldGeneration { field, source } => {
                assert_eq!(field, "broken");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_field_error_wins_over_sink_error() {
        let err = Definition::builder()
            .add_field(broken())
            .unwrap()
            .consumed_by(|lines| {
                let seen = lines.filter_map(|l| l.err()).count();
                Err(DataGenError::WorkerPool(format!("sink saw {seen} errors")))
            })
            .generate()
            .unwrap_err();

        assert!(matches!(err, DataGenError::FieldGeneration { .. }));
    }

    #[test]
    fn test_sink_error_returned() {
        let err = Definition::builder()
            .add_field(letters())
            .unwrap()
            .consumed_by(|_| Err(DataGenError::Sink(std::io::Error::other("disk full"))))
            .generate()
            .unwrap_err();

        assert!(matches!(err, DataGenError::Sink(_)));
    }

    #[test]
    fn test_config_applied() {
        let config = GenerationConfig {
            row_count: 7,
            parallel: true,
            worker_threads: Some(2),
            seed: Some(9),
            writer: Writer::xml_attributes(),
        };
        let definition = Definition::builder()
            .add_field(letters())
            .unwrap()
            .config(config)
            .sink(MemorySink::new())
            .build()
            .unwrap();

        assert_eq!(definition.row_count(), 7);
        assert!(definition.is_parallel());
        assert_eq!(definition.seed(), Some(9));
        assert_eq!(definition.writer(), &Writer::xml_attributes());
    }
}
