//! Row generation: turns field definitions into a lazy stream of records.
//!
//! Sequential mode builds rows one at a time on the caller's thread, in index order.
//! Parallel mode runs workers on a `rayon` pool. Workers claim row indices from a
//! shared counter and hand finished records back through a bounded channel, so only
//! a handful of rows are ever in flight and no ordering between rows is promised.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, warn};

use crate::error::{DataGenError, Result};
use crate::fields::Field;
use crate::record::Record;

/// How rows are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sequential,
    /// `None` sizes the pool to the number of available cores.
    Parallel { threads: Option<usize> },
}

/// Drives production of `row_count` records from a set of fields.
#[derive(Debug, Clone)]
pub struct RowGenerator {
    fields: Arc<[Field]>,
    row_count: u64,
    mode: Mode,
    seed: Option<u64>,
}

impl RowGenerator {
    pub fn new(fields: Arc<[Field]>, row_count: u64) -> Self {
        Self {
            fields,
            row_count,
            mode: Mode::Sequential,
            seed: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Seeds the per-row RNGs so random sources repeat across runs.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Starts generation. Only building the worker pool can fail here; field
    /// failures arrive as `Err` items on the returned stream.
    pub fn generate(&self) -> Result<Records> {
        match self.mode {
            Mode::Sequential => Ok(Records::Sequential(SequentialRows {
                fields: Arc::clone(&self.fields),
                next_index: Some(1),
                row_count: self.row_count,
                seed: self.seed,
                failed: false,
            })),
            Mode::Parallel { threads } => {
                ParallelRows::start(Arc::clone(&self.fields), self.row_count, self.seed, threads)
                    .map(Records::Parallel)
            }
        }
    }
}

/// Builds the record for one row by asking every field, in order, for its next value.
pub fn build_record(fields: &[Field], index: u64, rng: &mut dyn RngCore) -> Result<Record> {
    let values = fields
        .iter()
        .map(|field| field.next(rng))
        .collect::<Result<Vec<_>>>()?;
    Ok(Record::new(index, values))
}

/// Per-row RNG. Seeded runs derive it from the row index, so a row's random values
/// do not depend on which worker built it.
fn row_rng(seed: Option<u64>, index: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::seed_from_u64(rand::thread_rng().r#gen()),
    }
}

/// Lazy, single-pass stream of generated records.
pub enum Records {
    Sequential(SequentialRows),
    Parallel(ParallelRows),
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Sequential(rows) => rows.next(),
            Self::Parallel(rows) => rows.next(),
        }
    }
}

pub struct SequentialRows {
    fields: Arc<[Field]>,
    /// `None` once the last possible index has been produced.
    next_index: Option<u64>,
    row_count: u64,
    seed: Option<u64>,
    failed: bool,
}

impl Iterator for SequentialRows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let index = self.next_index.filter(|&i| i <= self.row_count)?;
        self.next_index = index.checked_add(1);

        let mut rng = row_rng(self.seed, index);
        let result = build_record(&self.fields, index, &mut rng);
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next_index {
            Some(i) if !self.failed => self.row_count.saturating_sub(i - 1),
            _ => 0,
        };
        (0, usize::try_from(remaining).ok())
    }
}

pub struct ParallelRows {
    rx: Receiver<Result<Record>>,
    stop: Arc<AtomicBool>,
    row_count: u64,
    received: u64,
    done: bool,
    // Kept alive for as long as the stream is read.
    _pool: rayon::ThreadPool,
}

impl ParallelRows {
    fn start(
        fields: Arc<[Field]>,
        row_count: u64,
        seed: Option<u64>,
        threads: Option<usize>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("datagen-worker-{i}"))
            .build()
            .map_err(|e| DataGenError::WorkerPool(e.to_string()))?;

        let workers = pool.current_num_threads().max(1);
        let (tx, rx) = sync_channel(workers * 2);
        let claimed = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        debug!(workers, row_count, "Starting parallel row generation");

        for _ in 0..workers {
            let worker = Worker {
                fields: Arc::clone(&fields),
                claimed: Arc::clone(&claimed),
                stop: Arc::clone(&stop),
                tx: tx.clone(),
                row_count,
                seed,
            };
            pool.spawn(move || worker.run());
        }

        Ok(Self {
            rx,
            stop,
            row_count,
            received: 0,
            done: false,
            _pool: pool,
        })
    }
}

impl Iterator for ParallelRows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.rx.recv() {
            Ok(Ok(record)) => {
                self.received += 1;
                Some(Ok(record))
            }
            Ok(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            Err(_) => {
                self.done = true;
                if self.received < self.row_count {
                    warn!(
                        received = self.received,
                        expected = self.row_count,
                        "Workers stopped before producing every row"
                    );
                    return Some(Err(DataGenError::WorkerPool(format!(
                        "workers stopped after {} of {} rows",
                        self.received, self.row_count
                    ))));
                }
                None
            }
        }
    }
}

impl Drop for ParallelRows {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

struct Worker {
    fields: Arc<[Field]>,
    /// Rows handed out so far; a worker building row `n` claimed `n - 1`.
    claimed: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    tx: SyncSender<Result<Record>>,
    row_count: u64,
    seed: Option<u64>,
}

impl Worker {
    fn run(self) {
        while !self.stop.load(Ordering::Acquire) {
            let row_count = self.row_count;
            let claim = self
                .claimed
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n < row_count).then(|| n + 1)
                });
            let Ok(claimed) = claim else {
                break;
            };
            let index = claimed + 1;

            let mut rng = row_rng(self.seed, index);
            let result = build_record(&self.fields, index, &mut rng);
            let failed = result.is_err();
            if failed {
                self.stop.store(true, Ordering::Release);
            }

            // A closed channel means the reader has gone away.
            if self.tx.send(result).is_err() || failed {
                break;
            }
        }
    }
}
