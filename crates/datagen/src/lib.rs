//! Tabular test data generation.
//!
//! Rows are assembled from independently configured [`Field`]s, rendered by a
//! [`Writer`] (delimited text or XML) and streamed into a [`Sink`] without holding
//! the whole dataset in memory.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datagen::prelude::*;
//!
//! let sink = MemorySink::new();
//! let summary = Definition::builder()
//!     .add_field(Field::sequential_value("colour", ["Red", "Green", "Blue"])?)?
//!     .add_field(Field::random_numbered_value("user", "user-{}", 1000)?)?
//!     .add_field(Field::uuid("id").with_null_probability(0.1)?)?
//!     .row_count(100)
//!     .writer(FlatWriter::csv().delimited_by("|"))
//!     .sink(sink.clone())
//!     .parallel()
//!     .generate()?;
//!
//! assert_eq!(summary.rows, 100);
//! ```

pub mod config;
pub mod definition;
pub mod error;
pub mod fields;
pub mod record;
pub mod rows;
pub mod sequence;
pub mod sink;
pub mod writer;

pub use config::GenerationConfig;
pub use definition::{Definition, DefinitionBuilder, GenerationSummary};
pub use error::{DataGenError, Result};
pub use fields::{Field, NullPolicy};
pub use sink::Sink;
pub use writer::Writer;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::GenerationConfig;
    pub use crate::definition::{Definition, DefinitionBuilder, GenerationSummary};
    pub use crate::error::{BoxError, DataGenError, Result};
    pub use crate::fields::{
        DateTimeFormat, Field, FieldValue, NullPolicy, RawValue, Value, ValueSource,
        ValueSupplier,
    };
    pub use crate::record::Record;
    pub use crate::rows::{Mode, RowGenerator};
    pub use crate::sequence::CyclicSequence;
    pub use crate::sink::{FileSink, MemorySink, Sink, StdoutSink, WriteSink};
    pub use crate::writer::{
        FlatWriter, LineStream, Writer, XmlAttributesWriter, XmlElementsWriter,
    };
}
