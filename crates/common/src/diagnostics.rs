//! Non-fatal diagnostics collected during a scan.
//!
//! Every recoverable failure (an unresolvable reference, a marker definition
//! that cannot be loaded, a file that cannot be parsed) is logged through
//! `tracing` and kept here so the caller can report it next to the results.

use serde::Serialize;
use std::fmt;

/// Category of a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum DiagnosticKind {
    /// A type or marker reference resolved by neither strategy.
    Resolution = 0,
    /// A marker definition could not be loaded from source or artifacts.
    Introspection = 1,
    /// A source file could not be read or parsed.
    Parse = 2,
    /// A dependency artifact could not be opened or decoded.
    Artifact = 3,
    /// A configured target looks like an unqualified name.
    Configuration = 4,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Resolution => "resolution",
            DiagnosticKind::Introspection => "introspection",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Artifact => "artifact",
            DiagnosticKind::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// What the diagnostic is about: a reference, an identity, or a path.
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

/// Append-only diagnostic log owned by one scan.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs at `warn` level and records the diagnostic.
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        tracing::warn!(kind = %diagnostic.kind, subject = %diagnostic.subject, "{}", diagnostic.message);
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics of one category.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
