//! Misconfiguration guard for target sets.
//!
//! Target sets hold canonical identities. A user who writes `Controller`
//! instead of `org.springframework.stereotype.Controller` gets a suggestion,
//! never a match.

use common::registry::split_qualified;
use common::{DiagnosticKind, Diagnostics};
use std::collections::{BTreeSet, HashSet};

/// Matches identities against a target set, warning once per suspicious entry.
#[derive(Debug, Default)]
pub struct Guard {
    warned: HashSet<String>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only if `identity` itself is in `targets`.
    ///
    /// If the target set instead holds the bare terminal segment of
    /// `identity`, a [`DiagnosticKind::Configuration`] diagnostic suggesting
    /// the canonical form is recorded (once per identity) and the result is
    /// still `false`.
    pub fn check(
        &mut self,
        identity: &str,
        targets: &BTreeSet<String>,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        if targets.contains(identity) {
            return true;
        }

        if let (Some(_), terminal) = split_qualified(identity) {
            if targets.contains(terminal) && self.warned.insert(identity.to_string()) {
                diagnostics.record(
                    DiagnosticKind::Configuration,
                    terminal,
                    format!("unqualified target never matches; did you mean `{identity}`?"),
                );
            }
        }
        false
    }
}
