/*!
 * Console and rotating-file logger.
 *
 * Records go to stderr as coloured `HH:MM:SS.mmm LEVEL message` lines and,
 * when a log file is configured, to an append-only file as
 * `YYYY-mm-dd HH:MM:SS,mmm - LEVEL - message`. The file is rotated by size
 * into `.1`, `.2`, ... backups. Write or rotation failures never reach the
 * caller.
 */

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app_config::LogConfig;

/// Resolved logger settings
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    /// Console threshold
    pub console_level: LevelFilter,
    /// Log file, `None` for console only
    pub file: Option<PathBuf>,
    /// File threshold
    pub file_level: LevelFilter,
    /// Size that triggers a rotation; 0 disables rotation
    pub max_bytes: u64,
    /// Rotated files kept
    pub backup_count: u32,
}

impl From<&LogConfig> for LogSettings {
    fn from(config: &LogConfig) -> Self {
        let file = config.file.trim();
        Self {
            console_level: config.level.to_level_filter(),
            file: (!file.is_empty()).then(|| PathBuf::from(file)),
            file_level: config.file_level.to_level_filter(),
            max_bytes: config.max_bytes,
            backup_count: config.backup_count,
        }
    }
}

/// Append-only file rotated by size
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: u32,
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: u32) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file: Some(file),
            size,
        })
    }

    /// Path of the `index`-th backup
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Active file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `line` and a newline, rotating first when it would overflow
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.max_bytes > 0 && self.size > 0 && self.size + len > self.max_bytes {
            self.rotate()?;
        }

        if self.file.is_none() {
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            self.size = file.metadata()?.len();
            self.file = Some(file);
        }
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("log file is not open"));
        };
        writeln!(file, "{}", line)?;
        self.size += len;
        Ok(())
    }

    /// Shift backups up by one and start an empty active file
    pub fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        if self.backup_count > 0 {
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    let to = self.backup_path(index + 1);
                    let _ = fs::remove_file(&to);
                    fs::rename(&from, &to)?;
                }
            }
            let first = self.backup_path(1);
            let _ = fs::remove_file(&first);
            fs::rename(&self.path, &first)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = Some(file);
        self.size = 0;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

// @struct: Console and file logger
pub struct ConverterLogger {
    console_level: LevelFilter,
    file_level: LevelFilter,
    file: Option<Mutex<RotatingFile>>,
    file_error_reported: AtomicBool,
}

impl ConverterLogger {
    // @creates: Logger for `settings`; an unopenable log file leaves console logging only
    pub fn new(settings: &LogSettings) -> Self {
        let file = settings.file.as_ref().and_then(|path| {
            match RotatingFile::open(path, settings.max_bytes, settings.backup_count) {
                Ok(file) => Some(Mutex::new(file)),
                Err(e) => {
                    let _ = writeln!(
                        io::stderr(),
                        "Failed to open log file {}: {}",
                        path.display(),
                        e
                    );
                    None
                }
            }
        });

        Self {
            console_level: settings.console_level,
            file_level: settings.file_level,
            file,
            file_error_reported: AtomicBool::new(false),
        }
    }

    // @initializes: Global logger
    pub fn init(settings: &LogSettings) -> Result<(), SetLoggerError> {
        let logger = Self::new(settings);
        let max_level = logger.max_level();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Most verbose level any sink accepts
    pub fn max_level(&self) -> LevelFilter {
        if self.file.is_some() {
            self.console_level.max(self.file_level)
        } else {
            self.console_level
        }
    }

    // @returns: ANSI colour for level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }

    /// Format a record for the log file
    pub fn file_line(record: &Record) -> String {
        format!(
            "{} - {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            record.level(),
            record.args()
        )
    }

    fn accepts_target(metadata: &Metadata) -> bool {
        // Dependencies only get through at info and above
        metadata.target().starts_with(env!("CARGO_CRATE_NAME")) || metadata.level() <= Level::Info
    }
}

impl Log for ConverterLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level() && Self::accepts_target(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if record.level() <= self.console_level {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }

        if let Some(file) = &self.file {
            if record.level() <= self.file_level {
                let line = Self::file_line(record);
                if let Err(e) = file.lock().write_line(&line) {
                    if !self.file_error_reported.swap(true, Ordering::Relaxed) {
                        let _ = writeln!(io::stderr(), "Failed to write log file: {}", e);
                    }
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}
