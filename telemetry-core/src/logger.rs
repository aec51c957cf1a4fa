//! Buffered, append-only CSV logging.
//!
//! Rows are held in RAM and written in batches: one append per flush, after
//! which the buffer is cleared. The header goes out once when the logger is
//! created. A failed write is returned to the caller and stops the logger:
//! the file may already hold part of the batch, so it is never written again.

use crate::error::StorageError;
use crate::health_types::LinkHealth;
use crate::log::{LogEntry, TimeSource};
use csv::WriterBuilder;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Rows buffered before an automatic flush.
pub const FLUSH_THRESHOLD: usize = 50;

/// File-name timestamp format, e.g. `log_20260517_120001.csv`.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Highest numbered suffix tried before giving up on a unique name.
const MAX_NAME_SUFFIX: u32 = 999;

/// Persistent sink for log rows.
pub trait LogStorage {
    /// Starts a fresh log containing only `header`.
    fn write_header(&mut self, header: &[String]) -> Result<(), StorageError>;

    /// Appends `records` in a single write.
    fn append_records(&mut self, records: &[Vec<String>]) -> Result<(), StorageError>;
}

/// CSV file on the local filesystem.
#[derive(Debug)]
pub struct CsvFileStorage {
    path: PathBuf,
}

impl CsvFileStorage {
    /// Uses `path` as the log file. It is truncated by `write_header`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates `dir` if needed and picks a name that does not exist yet:
    /// `<prefix>_<timestamp>.csv`, then `<prefix>_<timestamp>_1.csv`, ...
    pub fn create_in(
        dir: &Path,
        prefix: &str,
        clock: &impl TimeSource,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        let stamp = clock.now().format(FILE_TIMESTAMP_FORMAT).to_string();
        let path = find_next_log_file(dir, prefix, &stamp)?;
        log::info!("Created new log file: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, file: File, records: &[Vec<String>]) -> Result<(), StorageError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        for record in records {
            writer
                .write_record(record)
                .map_err(|source| StorageError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }
        writer.flush().map_err(|source| StorageError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

impl LogStorage for CsvFileStorage {
    fn write_header(&mut self, header: &[String]) -> Result<(), StorageError> {
        let file = File::create(&self.path).map_err(|source| StorageError::OpenFile {
            path: self.path.clone(),
            source,
        })?;
        self.write_all(file, &[header.to_vec()])
    }

    fn append_records(&mut self, records: &[Vec<String>]) -> Result<(), StorageError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| StorageError::OpenFile {
                path: self.path.clone(),
                source,
            })?;
        self.write_all(file, records)
    }
}

/// First `<prefix>_<stamp>[_N].csv` in `dir` that is not taken.
pub fn find_next_log_file(dir: &Path, prefix: &str, stamp: &str) -> Result<PathBuf, StorageError> {
    let first = dir.join(format!("{}_{}.csv", prefix, stamp));
    if !first.exists() {
        return Ok(first);
    }
    for n in 1..=MAX_NAME_SUFFIX {
        let candidate = dir.join(format!("{}_{}_{}.csv", prefix, stamp, n));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    log::error!("Too many log files named {}_{}", prefix, stamp);
    Err(StorageError::NamesExhausted {
        prefix: prefix.to_string(),
        stamp: stamp.to_string(),
    })
}

/// Buffers [`LogEntry`] rows and flushes them to a [`LogStorage`].
///
/// Single writer: the owning thread is the only one that appends.
pub struct BufferedLogger<S: LogStorage> {
    storage: S,
    buffer: Vec<LogEntry>,
    threshold: usize,
    closed: bool,
    failed: bool,
    health: Option<Arc<LinkHealth>>,
}

impl<S: LogStorage> BufferedLogger<S> {
    /// Writes `header` to `storage` and returns an empty logger.
    pub fn initialize(
        mut storage: S,
        header: &[String],
        threshold: usize,
    ) -> Result<Self, StorageError> {
        storage.write_header(header)?;
        Ok(Self {
            storage,
            buffer: Vec::with_capacity(threshold),
            threshold: threshold.max(1),
            closed: false,
            failed: false,
            health: None,
        })
    }

    /// Counts flushed rows into `health`.
    pub fn with_health(mut self, health: Arc<LinkHealth>) -> Self {
        self.health = Some(health);
        self
    }

    /// Buffers `entry`, flushing once the threshold is reached.
    pub fn append(&mut self, entry: LogEntry) -> Result<(), StorageError> {
        if self.failed {
            return Err(StorageError::Failed);
        }
        if self.closed {
            return Err(StorageError::Closed);
        }
        self.buffer.push(entry);
        if self.buffer.len() >= self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes every buffered row in one append, then clears the buffer.
    ///
    /// On error the batch is dropped and the logger refuses any further
    /// write, so no row can reach the file twice.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if self.failed {
            return Err(StorageError::Failed);
        }
        if self.buffer.is_empty() {
            return Ok(());
        }
        let records: Vec<Vec<String>> = self.buffer.iter().map(LogEntry::to_record).collect();
        if let Err(e) = self.storage.append_records(&records) {
            log::error!("Write failed, dropping {} buffered entries: {}", records.len(), e);
            self.buffer.clear();
            self.failed = true;
            return Err(e);
        }
        log::info!("Flushed {} entries to CSV", records.len());
        if let Some(health) = &self.health {
            health.record_flush(records.len());
        }
        self.buffer.clear();
        Ok(())
    }

    /// Drains the buffer and refuses further appends.
    ///
    /// After a failed write there is nothing left to drain; the logger is
    /// marked closed and the earlier error stands.
    pub fn close(&mut self) -> Result<(), StorageError> {
        if self.closed {
            return Ok(());
        }
        if !self.failed {
            self.flush()?;
        }
        self.closed = true;
        Ok(())
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: LogStorage> Drop for BufferedLogger<S> {
    fn drop(&mut self) {
        if !self.closed && !self.failed && !self.buffer.is_empty() {
            log::warn!("Logger dropped without close, draining {} rows", self.buffer.len());
            if let Err(e) = self.flush() {
                log::error!("Final drain failed: {}", e);
            }
        }
    }
}
