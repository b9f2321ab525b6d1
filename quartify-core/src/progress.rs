//! Progress reporting sinks.
//!
//! The export pipeline reports human-readable status lines through
//! [`Notifier`] and never cares which sink is attached.

use std::io::Write;
use std::sync::Mutex;

/// A sink for one line of progress text
pub trait Notifier {
    fn notify(&self, line: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str),
{
    fn notify(&self, line: &str) {
        self(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Prints each line to a console stream
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    stream: Stream,
}

impl ConsoleNotifier {
    pub fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    pub fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, line: &str) {
        // A closed pipe must not abort the export
        let _ = match self.stream {
            Stream::Stdout => writeln!(std::io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(std::io::stderr().lock(), "{line}"),
        };
    }
}

/// Appends every line to an in-memory display buffer
#[derive(Debug, Default)]
pub struct BufferNotifier {
    lines: Mutex<Vec<String>>,
}

impl BufferNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines received so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// All lines joined the way a text area would show them
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

impl Notifier for BufferNotifier {
    fn notify(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _line: &str) {}
}
