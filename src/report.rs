use std::cell::RefCell;
use std::fmt::Display;
use std::io::Write;

use colored::Colorize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Success => f.write_str("success"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Sink for the human-readable status lines every component emits.
pub trait Report {
    fn report(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(Severity::Success, message);
    }

    fn warning(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

// -----------------------------------------------------------------------------
// ConsoleReporter

/// Writes one colored line per report.
pub struct ConsoleReporter<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Report for ConsoleReporter<W> {
    fn report(&self, severity: Severity, message: &str) {
        let line = match severity {
            Severity::Info => message.normal(),
            Severity::Success => message.green(),
            Severity::Warning => message.yellow(),
            Severity::Error => message.red(),
        };
        if let Err(err) = writeln!(self.out.borrow_mut(), "{}", line) {
            warn!(%err, %severity, message, "failed to write report");
        }
    }
}

// -----------------------------------------------------------------------------
// MemoryReporter

/// Keeps every report in memory, for tests and for callers that render later.
#[derive(Default)]
pub struct MemoryReporter {
    entries: RefCell<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.borrow().clone()
    }

    /// All reports rendered as `severity: message`, one per line.
    pub fn lines(&self) -> String {
        self.entries
            .borrow()
            .iter()
            .map(|(severity, message)| format!("{severity}: {message}\n"))
            .collect()
    }

    pub fn has(&self, severity: Severity) -> bool {
        self.entries.borrow().iter().any(|(s, _)| *s == severity)
    }
}

impl Report for MemoryReporter {
    fn report(&self, severity: Severity, message: &str) {
        self.entries
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_reporter_writes_lines() {
        let reporter = ConsoleReporter::new(Vec::new());
        reporter.info("Fetching branches");
        reporter.error("Error fetching branches");
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "Fetching branches\nError fetching branches\n");
    }

    #[test]
    fn test_memory_reporter_lines() {
        let reporter = MemoryReporter::new();
        reporter.warning("Normal push failed");
        reporter.success("Pushed");
        assert_eq!(reporter.lines(), "warning: Normal push failed\nsuccess: Pushed\n");
        assert!(reporter.has(Severity::Warning));
        assert!(!reporter.has(Severity::Error));
    }
}
