//! Logging Abstractions
//!
//! Structured log entries and the sink trait every host logger implements.
//! The core never writes diagnostics anywhere else: recovered task failures,
//! mirrored `tracing` events and host messages all arrive as [`LogEntry`]
//! values at a [`LoggerSink`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use crate::error::Result;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
        f.write_str(self.as_str())
    }
}

/// Structured log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Target module/component
    pub target: String,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: HashMap<String, String>,
    /// Span/trace ID for distributed tracing
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Human-readable single record. Multi-line messages (failure reports
    /// with backtraces) keep their line breaks.
    pub fn to_text(&self) -> String {
        let mut line = format!(
            "[{}] {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.target,
            self.message
        );

        if !self.fields.is_empty() {
            let mut fields: Vec<_> = self.fields.iter().collect();
            fields.sort();
            let rendered: Vec<String> = fields
                .into_iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            line.push_str(&format!(" {{{}}}", rendered.join(", ")));
        }

        line
    }
}

/// Logger sink trait
///
/// Forwards structured logs from the core to a host logging pipeline
/// (stdout, a file, syslog, an in-app console...).
///
/// Implementations are shared between the event loop thread and any
/// foreground thread, and several failed tasks may report at once, so
/// `log` must never interleave partial records.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::logging::{LoggerSink, LogEntry, LogLevel};
///
/// async fn log_error(logger: &dyn LoggerSink, error: &str) {
///     let entry = LogEntry::new(LogLevel::Error, "client", error)
///         .with_field("room", "indie");
///     logger.log(entry).await.ok();
/// }
/// ```
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    /// Forward a log entry to the host logging system
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Flush any buffered logs
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Get the minimum log level that will be processed
    ///
    /// Logs below this level can be filtered out at the source for performance.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Output layout for [`ConsoleLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logger writing to standard output; the process-wide default.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
    pub format: ConsoleFormat,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            format: ConsoleFormat::Text,
        }
    }
}

impl ConsoleLogger {
    pub fn json() -> Self {
        Self {
            format: ConsoleFormat::Json,
            ..Self::default()
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn render(&self, entry: &LogEntry) -> Result<String> {
        match self.format {
            ConsoleFormat::Text => Ok(entry.to_text()),
            ConsoleFormat::Json => serde_json::to_string(entry).map_err(|e| {
                crate::BridgeError::OperationFailed(format!("Failed to encode log entry: {}", e))
            }),
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level < self.min_level {
            return Ok(());
        }

        let record = self.render(&entry)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", record)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

/// Logger that keeps every entry in memory.
///
/// Useful for tests and for hosts that render recent diagnostics themselves.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Entries at exactly `level`.
    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[async_trait::async_trait]
impl LoggerSink for MemoryLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        self.entries.lock().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Test message")
            .with_field("user_id", "123")
            .with_span_id("trace-456");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "test");
        assert_eq!(entry.message, "Test message");
        assert_eq!(entry.fields.get("user_id"), Some(&"123".to_string()));
        assert_eq!(entry.span_id, Some("trace-456".to_string()));
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Warn > LogLevel::Info);
        assert!(LogLevel::Debug > LogLevel::Trace);
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_text_rendering_keeps_multiline_message() {
        let entry = LogEntry::new(LogLevel::Error, "runner", "boom\n  at task.rs:10")
            .with_field("task_id", "abc");
        let text = entry.to_text();

        assert!(text.contains("ERROR runner: boom\n  at task.rs:10"));
        assert!(text.ends_with("{task_id=abc}"));
    }

    #[test]
    fn test_json_rendering() {
        let logger = ConsoleLogger::json();
        let entry = LogEntry::new(LogLevel::Warn, "reactor", "slow tick");
        let rendered = logger.render(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["level"], "Warn");
        assert_eq!(value["message"], "slow tick");
    }

    #[core_async::test]
    async fn test_console_logger() {
        let logger = ConsoleLogger::default();
        let entry = LogEntry::new(LogLevel::Info, "test", "Test log");

        logger.log(entry).await.unwrap();
        logger.flush().await.unwrap();
    }

    #[core_async::test]
    async fn test_memory_logger_collects_entries() {
        let logger = MemoryLogger::new();
        logger
            .log(LogEntry::new(LogLevel::Info, "test", "first"))
            .await
            .unwrap();
        logger
            .log(LogEntry::new(LogLevel::Error, "test", "second"))
            .await
            .unwrap();

        assert_eq!(logger.len(), 2);
        let errors = logger.entries_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "second");

        logger.clear();
        assert!(logger.is_empty());
    }
}
