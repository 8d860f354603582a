//! Rolling Logger
//!
//! File logger for the catalog admin shell.
//!
//! - Lines go to `<dir>/<app_name>.log`, which is rotated to a timestamped
//!   file once it grows past a size limit. Only the newest rotated files are kept.
//! - The most recent lines are also held in a circular buffer so the UI can
//!   show them without touching the filesystem.
//! - `log` records are bridged into the tracing subscriber, so library code can
//!   keep using `log::info!` and friends.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use thiserror::Error;

/// Default size at which the active log file is rotated
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;
/// Default number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 5;
/// Default number of lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
    #[error("log io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

/// Rotation and buffer limits
#[derive(Debug, Clone, Copy)]
pub struct LoggerLimits {
    pub max_bytes: u64,
    pub max_files: usize,
    pub buffer_lines: usize,
}

impl Default for LoggerLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ========================
// Circular buffer
// ========================

struct RingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

// ========================
// Rolling file
// ========================

/// Size-rotated log file
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    file: File,
    size: u64,
    limits: LoggerLimits,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, limits: LoggerLimits) -> Result<Self, LoggerError> {
        fs::create_dir_all(dir)?;
        let path = active_path(dir, app_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            file,
            size,
            limits,
        })
    }

    pub fn active_path(&self) -> PathBuf {
        active_path(&self.dir, &self.app_name)
    }

    /// Rotated files, oldest first
    pub fn rotated_files(&self) -> io::Result<Vec<PathBuf>> {
        let prefix = format!("{}-", self.app_name);
        let mut rotated: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix) && n.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();
        // Timestamp suffixes sort lexically in chronological order
        rotated.sort();
        Ok(rotated)
    }

    fn rotated_path(&self, stamp: &str, seq: u32) -> PathBuf {
        self.dir
            .join(format!("{}-{}-{:04}.log", self.app_name, stamp, seq))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        // Fixed-width sequence keeps same-millisecond rotations in order
        let mut seq = 0u32;
        let mut target = self.rotated_path(&stamp, seq);
        while target.exists() {
            seq += 1;
            target = self.rotated_path(&stamp, seq);
        }
        fs::rename(self.active_path(), &target)?;

        let rotated = self.rotated_files()?;
        if rotated.len() > self.limits.max_files {
            let excess = rotated.len() - self.limits.max_files;
            for old in rotated.into_iter().take(excess) {
                let _ = fs::remove_file(old);
            }
        }

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        self.size = 0;
        Ok(())
    }
}

fn active_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.log", app_name))
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.size > 0 && self.size + buf.len() as u64 > self.limits.max_bytes {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

// ========================
// Writer handed to tracing
// ========================

#[derive(Clone)]
struct LogSink {
    file: Arc<Mutex<RollingFile>>,
    buffer: Arc<Mutex<RingBuffer>>,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.file).write_all(buf)?;
        let text = String::from_utf8_lossy(buf);
        let mut buffer = lock(&self.buffer);
        for line in text.lines().filter(|l| !l.is_empty()) {
            buffer.push(line.to_string());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.file).flush()
    }
}

struct Logger {
    sink: LogSink,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Initialize the global logger with default limits
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, LoggerLimits::default())
}

/// Initialize the global logger
pub fn init_logger_with(
    log_dir: PathBuf,
    app_name: &str,
    limits: LoggerLimits,
) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let file = RollingFile::open(&log_dir, app_name, limits)?;
    let sink = LogSink {
        file: Arc::new(Mutex::new(file)),
        buffer: Arc::new(Mutex::new(RingBuffer::new(limits.buffer_lines))),
    };

    let writer = sink.clone();
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    LOGGER
        .set(Logger { sink })
        .map_err(|_| LoggerError::AlreadyInitialized)
}

/// Whether `init_logger` has completed
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

/// Lines currently held in the circular buffer, oldest first
pub fn recent_logs() -> Vec<String> {
    LOGGER
        .get()
        .map(|logger| lock(&logger.sink.buffer).snapshot())
        .unwrap_or_default()
}

/// Log a message at the given level
pub fn log(level: log::Level, message: &str) -> Result<(), LoggerError> {
    if LOGGER.get().is_none() {
        return Err(LoggerError::NotInitialized);
    }
    match level {
        log::Level::Error => tracing::error!("{}", message),
        log::Level::Warn => tracing::warn!("{}", message),
        log::Level::Info => tracing::info!("{}", message),
        log::Level::Debug => tracing::debug!("{}", message),
        log::Level::Trace => tracing::trace!("{}", message),
    }
    Ok(())
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    log(log::Level::Info, message)
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    log(log::Level::Warn, message)
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    log(log::Level::Error, message)
}
