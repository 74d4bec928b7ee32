//! Logging configuration and utilities for casematrix.

pub mod debug;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use debug::{
    DebugItems, Difference, DifferenceGroup, MockMetrics, assertion_log, find_differences,
    horizontal_log, panic_message,
};

/// Log level for filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
            LogLevel::Trace => 4,
        }
    }

    /// Check if this level should log messages at the given level
    pub fn should_log(&self, level: LogLevel) -> bool {
        self.rank() >= level.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level to output
    #[serde(default)]
    pub level: LogLevel,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
    /// Enable timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Component-specific log levels (`engine`, `runner`, `sim`, `mocks`)
    #[serde(default)]
    pub component_levels: HashMap<String, LogLevel>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            component_levels: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Create a new logging config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Set a component-specific log level
    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    /// Get the effective log level for a component
    pub fn effective_level(&self, component: Option<&str>) -> LogLevel {
        component
            .and_then(|comp| self.component_levels.get(comp).copied())
            .unwrap_or(self.level)
    }

    /// Check if a message at the given level should be logged
    pub fn should_log(&self, level: LogLevel, component: Option<&str>) -> bool {
        self.effective_level(component).should_log(level)
    }
}

/// A log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub component: Option<String>,
    pub message: String,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            component: None,
            message: message.into(),
        }
    }

    /// Create a log entry with a component
    pub fn with_component(
        level: LogLevel,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            component: Some(component.into()),
            ..Self::new(level, message)
        }
    }

    /// Render one line (or block, for multi-line messages) in `format`.
    pub fn render(&self, format: LogFormat, timestamps: bool) -> String {
        match format {
            LogFormat::Json => serde_json::to_string(self).unwrap_or_else(|_| self.message.clone()),
            LogFormat::Compact => format!("{} {}", self.level.as_str(), self.message),
            LogFormat::Plain => {
                let mut line = String::new();
                if timestamps {
                    line.push_str(&format!("[{}] ", self.timestamp));
                }
                line.push_str(&format!("{:<5}", self.level.as_str()));
                if let Some(component) = &self.component {
                    line.push_str(&format!(" {component}"));
                }
                line.push_str(": ");
                line.push_str(&self.message);
                line
            }
        }
    }
}

/// Log collector for capturing log entries
#[derive(Debug, Default)]
pub struct LogCollector {
    entries: Vec<LogEntry>,
}

impl LogCollector {
    /// Create a new log collector
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a log entry
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Get all collected entries
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Get entries matching a level
    pub fn filter_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Where a [`Logger`] writes accepted entries, besides its collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Memory,
}

/// Cloneable, thread-safe logger. Clones share one collector.
#[derive(Debug, Clone)]
pub struct Logger {
    config: Arc<LoggingConfig>,
    target: LogTarget,
    collector: Arc<Mutex<LogCollector>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl Logger {
    /// Logger writing to stderr.
    pub fn new(config: LoggingConfig) -> Self {
        Self::with_target(config, LogTarget::Stderr)
    }

    /// Logger that only collects.
    pub fn in_memory(config: LoggingConfig) -> Self {
        Self::with_target(config, LogTarget::Memory)
    }

    pub fn with_target(config: LoggingConfig, target: LogTarget) -> Self {
        Self {
            config: Arc::new(config),
            target,
            collector: Arc::new(Mutex::new(LogCollector::new())),
        }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn enabled(&self, level: LogLevel, component: &str) -> bool {
        self.config.should_log(level, Some(component))
    }

    pub fn log(&self, level: LogLevel, component: &str, message: impl Into<String>) {
        if !self.enabled(level, component) {
            return;
        }
        let entry = LogEntry::with_component(level, component, message);
        if self.target == LogTarget::Stderr {
            eprintln!("{}", entry.render(self.config.format, self.config.timestamps));
        }
        self.collector().push(entry);
    }

    pub fn error(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Error, component, message);
    }

    pub fn warn(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Warn, component, message);
    }

    pub fn info(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Info, component, message);
    }

    pub fn debug(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Debug, component, message);
    }

    pub fn trace(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Trace, component, message);
    }

    /// Snapshot of everything accepted so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.collector().entries().to_vec()
    }

    /// Messages accepted so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.collector()
            .entries()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.collector().clear();
    }

    fn collector(&self) -> MutexGuard<'_, LogCollector> {
        self.collector.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
