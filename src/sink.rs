//! Report sinks.
//!
//! The engine writes its human-readable progress report one line at a time
//! to a `LogSink`. Callers decide where lines go: stdout, a buffer, tracing,
//! or any closure taking `&str`.

use tracing::info;

use crate::output;

/// Receives report lines in call order.
pub trait LogSink {
    fn emit(&mut self, line: &str);
}

impl<F> LogSink for F
where
    F: FnMut(&str),
{
    fn emit(&mut self, line: &str) {
        self(line)
    }
}

/// Default line emitter: one line per call on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        output::print_user(line);
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl LogSink for BufferSink {
    fn emit(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Tracing target carrying report lines.
pub const REPORT_TARGET: &str = "tree_rename::report";

/// Forwards each line as an INFO event under `REPORT_TARGET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, line: &str) {
        info!(target: REPORT_TARGET, "{}", line);
    }
}

/// Sends every line to both sinks.
#[derive(Debug, Clone, Default)]
pub struct TeeSink<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> TeeSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: LogSink, B: LogSink> LogSink for TeeSink<A, B> {
    fn emit(&mut self, line: &str) {
        self.first.emit(line);
        self.second.emit(line);
    }
}
