//! Output sinks: where process output ends up on screen.

use std::collections::VecDeque;

/// Lines of history kept by every sink.
pub const HISTORY_LINES: usize = 10;

/// Log of triggered-command output. Each line is tagged with the label of
/// the button that produced it and only the newest [`HISTORY_LINES`] are
/// kept. stdout and stderr share the buffer in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollingLogSink {
    lines: VecDeque<String>,
}

impl RollingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw output. Blank lines are dropped.
    pub fn push_chunk(&mut self, label: &str, chunk: &[u8]) {
        let text = String::from_utf8_lossy(chunk);
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.lines.push_back(format!("[{label}] {line}"));
        }
        while self.lines.len() > HISTORY_LINES {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Display text that is replaced wholesale by every chunk, for processes
/// that print a fresh snapshot each time (clocks, pollers, `tail -f`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceSink {
    lines: Vec<String>,
}

impl ReplaceSink {
    /// A sink showing `initial` until the first chunk arrives.
    pub fn new(initial: &str) -> Self {
        Self {
            lines: initial.lines().map(str::to_string).collect(),
        }
    }

    /// Replace the display with the last [`HISTORY_LINES`] lines of `chunk`.
    pub fn apply_chunk(&mut self, chunk: &[u8]) {
        let text = String::from_utf8_lossy(chunk);
        let mut lines: Vec<String> = text
            .lines()
            .rev()
            .take(HISTORY_LINES)
            .map(str::to_string)
            .collect();
        lines.reverse();
        self.lines = lines;
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
