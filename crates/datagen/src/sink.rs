//! Sinks consume the final stream of output lines.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::{DataGenError, Result};
use crate::writer::LineStream;

/// Consumer of the line stream, called once per generation run.
///
/// Implementations should stop at the first `Err` in the stream and return it, so
/// the failure reaches the caller of `generate`.
pub trait Sink: Send {
    fn consume(&mut self, lines: LineStream<'_>) -> Result<()>;
}

impl<F> Sink for F
where
    F: FnMut(LineStream<'_>) -> Result<()> + Send,
{
    fn consume(&mut self, lines: LineStream<'_>) -> Result<()> {
        self(lines)
    }
}

/// Writes each line to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn consume(&mut self, lines: LineStream<'_>) -> Result<()> {
        let stdout = io::stdout();
        write_lines(&mut BufWriter::new(stdout.lock()), lines)?;
        Ok(())
    }
}

/// Writes each line to any [`Write`] implementation.
#[derive(Debug)]
pub struct WriteSink<W> {
    out: W,
}

impl<W: Write + Send> WriteSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Sink for WriteSink<W> {
    fn consume(&mut self, lines: LineStream<'_>) -> Result<()> {
        write_lines(&mut self.out, lines)?;
        Ok(())
    }
}

/// Writes the lines to a file, replacing any existing content.
///
/// By default each line is terminated by a newline as it arrives. With a custom
/// separator the lines are joined and written in one operation, which buffers the
/// whole output.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    separator: Option<String>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: None,
        }
    }

    pub fn with_separator(path: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            separator: Some(separator.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> DataGenError {
        DataGenError::SinkPath {
            path: self.path.clone(),
            source,
        }
    }
}

impl Sink for FileSink {
    fn consume(&mut self, lines: LineStream<'_>) -> Result<()> {
        debug!(path = %self.path.display(), "Writing generated lines to file");

        match &self.separator {
            Some(separator) => {
                let content = lines.collect::<Result<Vec<_>>>()?.join(separator.as_str());
                fs::write(&self.path, content).map_err(|e| self.io_error(e))
            }
            None => {
                let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
                let mut out = BufWriter::new(file);
                for line in lines {
                    writeln!(out, "{}", line?).map_err(|e| self.io_error(e))?;
                }
                out.flush().map_err(|e| self.io_error(e))
            }
        }
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines collected so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn consume(&mut self, lines: LineStream<'_>) -> Result<()> {
        for line in lines {
            let line = line?;
            self.lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(line);
        }
        Ok(())
    }
}

fn write_lines(out: &mut impl Write, lines: LineStream<'_>) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line?)?;
    }
    out.flush()?;
    Ok(())
}
