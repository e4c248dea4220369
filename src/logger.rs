//! Per-run log file, kept next to the settings file as `imgmerge.log`.
//!
//! Each `imgmerge` invocation truncates it. Library callers and tests never
//! call [`init`], so the `log_*!` macros write nothing for them.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::config::MergeSettings;

struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

static RUN_LOG: OnceLock<RunLog> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        })
    }
}

/// Where this run is being logged, if logging was initialised.
pub fn log_path() -> Option<&'static Path> {
    RUN_LOG.get().map(|log| log.path.as_path())
}

fn format_line(level: Level, clock: impl fmt::Display, msg: &str) -> String {
    format!("{} {:<5} {}", clock, level, msg)
}

/// Append one entry. I/O errors are dropped; a merge never fails on logging.
pub fn write(level: Level, msg: &str) {
    let Some(log) = RUN_LOG.get() else {
        return;
    };
    let line = format_line(level, chrono::Local::now().format("%H:%M:%S%.3f"), msg);
    if let Ok(mut file) = log.file.lock() {
        let _ = writeln!(file, "{}", line);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*))
    };
}

fn default_log_path() -> PathBuf {
    MergeSettings::settings_path()
        .map(|p| p.with_file_name("imgmerge.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("imgmerge.log"))
}

/// Open (and truncate) the run log, then route panics through it.
///
/// Failing to open the file only costs the log; the command still runs.
pub fn init() {
    let path = default_log_path();
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("warning: cannot open log file {}: {}", path.display(), e);
            return;
        }
    };
    if RUN_LOG
        .set(RunLog {
            path,
            file: Mutex::new(file),
        })
        .is_err()
    {
        return;
    }

    log_info!(
        "imgmerge {} started {}",
        env!("CARGO_PKG_VERSION"),
        chrono::Local::now().format("%Y-%m-%d")
    );

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write(Level::Panic, &info.to_string());
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialised_logger_is_silent() {
        // No init() in tests: nothing to open, nothing to panic on.
        log_info!("ignored {}", 1);
        log_err!("ignored");
        assert!(log_path().is_none());
    }

    #[test]
    fn macros_work_as_match_arms() {
        let outcome: std::result::Result<u8, &str> = Err("boom");
        match outcome {
            Ok(v) => log_info!("value {}", v),
            Err(e) => log_warn!("failed: {}", e),
        }
    }

    #[test]
    fn lines_pad_the_level_column() {
        assert_eq!(format_line(Level::Info, "12:00:00.000", "hi"), "12:00:00.000 INFO  hi");
        assert_eq!(format_line(Level::Error, "t", "x"), "t ERROR x");
    }

    #[test]
    fn log_lives_next_to_the_settings() {
        if let Some(settings) = MergeSettings::settings_path() {
            assert_eq!(default_log_path().parent(), settings.parent());
        }
    }
}
