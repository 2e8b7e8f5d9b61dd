//! Transient trace sinks used by debug loggers.

use std::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::logging::LogLevel;

/// Destination for ephemeral, non-persisted log lines
pub trait TraceSink: Send + Sync {
    fn emit(&self, level: LogLevel, text: &str);
}

/// Forwards lines to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, level: LogLevel, text: &str) {
        match level {
            LogLevel::Error => error!(target: "logwarden::debug", "{}", text),
            LogLevel::Warn => warn!(target: "logwarden::debug", "{}", text),
            LogLevel::Info => info!(target: "logwarden::debug", "{}", text),
            LogLevel::Debug => debug!(target: "logwarden::debug", "{}", text),
            LogLevel::Trace => trace!(target: "logwarden::debug", "{}", text),
        }
    }
}

/// Keeps every emitted line in memory, mostly useful for assertions
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, level: LogLevel, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, text.to_string()));
    }
}
