//! Shared value types for the entry-point scanner.
//!
//! Everything here is plain data: the trigger model produced by a scan, the
//! result accumulator, the diagnostics log, the type universe, and the target
//! configuration consumed by the classifier.

pub mod diagnostics;
pub mod registry;
pub mod targets;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use registry::TypeUniverse;
pub use targets::TargetConfig;

use serde::Serialize;
use std::collections::BTreeMap;

/// Where in a declaration a target condition was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TriggerKind {
    /// The declaration's `implements` clause names a target interface.
    Implements = 0,
    /// A class-level marker (directly or transitively) is a target marker.
    Annotated = 1,
    /// A method-level marker (directly or transitively) is a target marker.
    MethodAnnotated = 2,
}

impl TriggerKind {
    /// Label prefix used when grouping triggers in the result accumulator.
    pub fn prefix(self) -> &'static str {
        match self {
            TriggerKind::Implements => "Implements",
            TriggerKind::Annotated => "Annotated with",
            TriggerKind::MethodAnnotated => "Method annotated with",
        }
    }
}

/// Source position a trigger is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// Simple name of the declaring type (e.g. `"Task"`).
    pub title: String,
    /// Absolute, forward-slash file path.
    pub file_path: String,
    /// 1-indexed line of the declaration or method.
    pub line: u32,
}

impl SourceLocation {
    /// Renders `"<Title> file:///<absolute-path>:<line>"`.
    ///
    /// A leading `/` on the path is folded into the URI scheme so Unix and
    /// Windows paths both yield a three-slash `file:` URI.
    ///
    /// # Example
    /// ```
    /// # use common::SourceLocation;
    /// let loc = SourceLocation {
    ///     title: "Job".into(),
    ///     file_path: "/src/app/Job.java".into(),
    ///     line: 7,
    /// };
    /// assert_eq!(loc.render(), "Job file:///src/app/Job.java:7");
    /// ```
    pub fn render(&self) -> String {
        let path = self.file_path.strip_prefix('/').unwrap_or(&self.file_path);
        format!("{} file:///{}:{}", self.title, path, self.line)
    }
}

/// One matched (condition, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Canonical identity of the matched interface or marker.
    pub identity: String,
    pub location: SourceLocation,
}

impl Trigger {
    /// Condition label, e.g. `"Implements org.springframework.boot.CommandLineRunner"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind.prefix(), self.identity)
    }
}

/// Result accumulator: condition label → rendered locations in insertion order.
///
/// Owned by a single scan invocation. A (label, location) pair is stored at
/// most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TriggerMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl TriggerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a trigger under its label. Returns `false` if the same
    /// location was already recorded for that label.
    pub fn add(&mut self, trigger: &Trigger) -> bool {
        let rendered = trigger.location.render();
        let locations = self.entries.entry(trigger.label()).or_default();
        if locations.contains(&rendered) {
            return false;
        }
        locations.push(rendered);
        true
    }

    /// Locations recorded for `label`, if any.
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.entries.get(label).map(Vec::as_slice)
    }

    /// Iterates `(label, locations)` in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(label, locs)| (label.as_str(), locs.as_slice()))
    }

    /// Number of distinct condition labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of recorded locations across all labels.
    pub fn trigger_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
