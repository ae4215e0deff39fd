use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{Result as IoResult, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

static LOG_FILE: OnceLock<Arc<Mutex<File>>> = OnceLock::new();
thread_local! {
    static LOG_PREFIX: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

fn current_prefix() -> Option<String> {
    LOG_PREFIX.with(|prefix| prefix.borrow().clone())
}

fn emit(level: Level, message: &str) {
    let line = match current_prefix() {
        Some(prefix) => format!("{prefix}: {message}"),
        None => message.to_owned(),
    };
    eprintln!("{level}: {line}");
    if let Some(writer) = LOG_FILE.get()
        && let Ok(mut file) = writer.lock()
    {
        let _ = writeln!(file, "{level}: {line}");
    }
}

/// Mirrors warnings and errors into a log file in addition to stderr.
///
/// Only the first configured file is kept for the lifetime of the process.
///
/// # Errors
///
/// Returns an error if the log file or its parent directory cannot be
/// created.
pub fn set_log_file(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let _ = LOG_FILE.set(Arc::new(Mutex::new(file)));
    Ok(())
}

/// Prefixes this thread's log lines with `prefix` until the guard drops.
pub fn set_log_prefix(prefix: impl Into<String>) -> LogPrefixGuard {
    let previous = LOG_PREFIX.with(|slot| slot.borrow_mut().replace(prefix.into()));
    LogPrefixGuard { previous }
}

pub struct LogPrefixGuard {
    previous: Option<String>,
}

impl Drop for LogPrefixGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        LOG_PREFIX.with(|slot| *slot.borrow_mut() = previous);
    }
}

pub fn log_warn(message: &str) {
    emit(Level::Warning, message);
}

pub fn log_error(message: &str) {
    emit(Level::Error, message);
}
