//! Logging: a `tracing` subscriber writing to a daily log file and to a
//! ring buffer the console overlay drains every frame.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::field::{Field, Visit};
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Overrides the log directory.
pub const LOG_DIR_ENV: &str = "TWEAK_LOG_DIR";
/// Filter directives, checked before `RUST_LOG`.
pub const LOG_FILTER_ENV: &str = "TWEAK_LOG";

const LOG_FILE_PREFIX: &str = "tweak.log";
const LOG_RETENTION_DAYS: u64 = 7;

/// Severity of a console line, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad so `{:5}` lines levels up in the overlay
        f.pad(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// One line of the console log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

/// Entries written by the tracing layer and not yet shown by the console.
pub type LogBuffer = Arc<Mutex<VecDeque<LogEntry>>>;

pub fn new_log_buffer(capacity: usize) -> LogBuffer {
    Arc::new(Mutex::new(VecDeque::with_capacity(capacity)))
}

/// Append to the buffer, dropping the oldest entry once `capacity` is reached.
fn push_bounded(buffer: &LogBuffer, entry: LogEntry, capacity: usize) {
    if let Ok(mut buf) = buffer.lock() {
        while !buf.is_empty() && buf.len() >= capacity {
            buf.pop_front();
        }
        buf.push_back(entry);
    }
}

/// Take every pending entry, oldest first.
pub fn drain(buffer: &LogBuffer) -> Vec<LogEntry> {
    match buffer.lock() {
        Ok(mut buf) => buf.drain(..).collect(),
        Err(_) => Vec::new(),
    }
}

/// Directory holding the rolling log files.
///
/// `TWEAK_LOG_DIR` wins; otherwise `~/Library/Logs/tweak` on macOS and
/// `<data dir>/tweak/logs` elsewhere.
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    let platform = dirs::home_dir().map(|home| home.join("Library").join("Logs").join("tweak"));
    #[cfg(not(target_os = "macos"))]
    let platform = dirs::data_dir().map(|data| data.join("tweak").join("logs"));

    platform.unwrap_or_else(|| PathBuf::from("logs"))
}

/// Delete rolled log files last modified more than `max_age_days` ago.
/// Returns how many were removed. Other files in the directory are left alone.
fn cleanup_old_logs(log_path: &Path, max_age_days: u64) -> usize {
    let max_age = Duration::from_secs(max_age_days * 86_400);
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };
    let Ok(entries) = std::fs::read_dir(log_path) else {
        return 0;
    };

    entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
        .filter(|entry| {
            entry
                .metadata()
                .and_then(|meta| meta.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false)
        })
        .filter(|entry| std::fs::remove_file(entry.path()).is_ok())
        .count()
}

/// Collects an event's message and extra fields into one line of text.
#[derive(Default)]
struct EventText {
    message: Option<String>,
    fields: Vec<String>,
}

impl EventText {
    fn into_line(self) -> String {
        let mut parts: Vec<String> = self.message.into_iter().collect();
        parts.extend(self.fields);
        parts.join(" ")
    }
}

impl Visit for EventText {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

/// Tracing layer feeding the console overlay.
struct ConsoleLayer {
    buffer: LogBuffer,
    capacity: usize,
}

impl<S: tracing::Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let mut text = EventText::default();
        event.record(&mut text);

        let entry = LogEntry {
            level: LogLevel::from(metadata.level()),
            target: metadata.target().to_string(),
            message: text.into_line(),
        };
        push_bounded(&self.buffer, entry, self.capacity);
    }
}

/// Install the global subscriber and return the buffer the console drains.
///
/// The filter comes from `TWEAK_LOG`, then `RUST_LOG`, defaulting to `info`.
/// Files roll daily in [`log_dir`] and are kept for a week.
pub fn init(capacity: usize) -> LogBuffer {
    let buffer = new_log_buffer(capacity);

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_path = log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_path) {
        eprintln!("warning: failed to create log directory {:?}: {}", log_path, e);
    }
    let removed = cleanup_old_logs(&log_path, LOG_RETENTION_DAYS);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(rolling::daily(&log_path, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true);

    let console_layer = ConsoleLayer {
        buffer: buffer.clone(),
        capacity,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(dir = %log_path.display(), removed, "logging initialized");
    buffer
}
