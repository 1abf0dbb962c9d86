//! Process logger
//!
//! Library code logs through the `log` macros; this module installs the
//! sink those records end up in. Records are written as `[LEVEL] message`
//! lines to stderr, or to a log file once one is configured.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

/// Verbosity levels, ordered from silent to everything
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer; unknown values mean Info
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Parse a level name (`nothing`, `user`, `error`, `warning`, `info`,
    /// `debug`, `all`) or its number
    pub fn parse(s: &str) -> Option<Self> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "nothing" | "off" | "none" => LogLevel::Nothing,
            "user" => LogLevel::User,
            "error" => LogLevel::Error,
            "warning" | "warn" => LogLevel::Warning,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "all" | "trace" => LogLevel::All,
            other => {
                let n: i32 = other.parse().ok()?;
                if !(0..=6).contains(&n) {
                    return None;
                }
                LogLevel::from_i32(n)
            }
        };
        Some(level)
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

struct Logger {
    /// Log file; stderr when unset
    sink: Mutex<Option<File>>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}", record.level(), record.args());

        let mut sink = self.sink.lock();
        match sink.as_mut() {
            Some(file) => {
                // A failing log file must not take the process down.
                let _ = writeln!(file, "{line}");
            }
            None => eprintln!("{line}"),
        }
    }

    fn flush(&self) {
        if let Some(file) = self.sink.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static LOGGER: Logger = Logger {
    sink: parking_lot::const_mutex(None),
};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the process logger
///
/// Safe to call more than once: later calls only change the level and the
/// sink. Fails if the log file cannot be created or if some other logger
/// was installed first.
pub fn init(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let file = log_file
        .map(|path| {
            File::create(path).with_context(|| format!("Cannot create log file {}", path.display()))
        })
        .transpose()?;
    *LOGGER.sink.lock() = file;

    if !INSTALLED.swap(true, Ordering::SeqCst) {
        if let Err(err) = log::set_logger(&LOGGER) {
            INSTALLED.store(false, Ordering::SeqCst);
            anyhow::bail!("Another logger is already installed: {}", err);
        }
    }
    log::set_max_level(level.to_level_filter());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_i32() {
        assert_eq!(LogLevel::from_i32(0), LogLevel::Nothing);
        assert_eq!(LogLevel::from_i32(3), LogLevel::Warning);
        assert_eq!(LogLevel::from_i32(6), LogLevel::All);
        assert_eq!(LogLevel::from_i32(100), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(-1), LogLevel::Info);
    }

    #[test]
    fn test_log_level_as_i32() {
        assert_eq!(LogLevel::Nothing.as_i32(), 0);
        assert_eq!(LogLevel::Debug.as_i32(), 5);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse(" WARN "), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("2"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("7"), None);
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(LogLevel::Nothing.to_level_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::User.to_level_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::All.to_level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn test_init_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redmap.log");

        init(LogLevel::Info, Some(&path)).unwrap();
        log::info!("logged to file");
        log::debug!("filtered out");
        log::logger().flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[INFO] logged to file"));
        assert!(!contents.contains("filtered out"));

        // Reinstalling is allowed and switches back to stderr
        init(LogLevel::Info, None).unwrap();
    }
}
