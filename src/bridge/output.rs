//! Destinations for the solver's console output.

use std::sync::{Arc, Mutex};

/// Receives the solver's console output one line at a time, as it arrives.
///
/// Lines from stdout and stderr are delivered from two reader threads into
/// the same sink, so implementations must be `Send + Sync`.
pub trait OutputSink: Send + Sync {
    fn process_line(&self, line: &str);

    /// Called once after both streams are drained.
    fn finish(&self) {}
}

/// Prints every line as is. The default sink.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn process_line(&self, line: &str) {
        println!("{}", line);
    }
}

/// Forwards every line to the `log` facade at `info` level.
#[derive(Debug, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn process_line(&self, line: &str) {
        log::info!(target: "kwave::solver", "{}", line);
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn process_line(&self, _line: &str) {}
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OutputSink for CaptureSink {
    fn process_line(&self, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}
