//! # Trigger Classification
//!
//! For each classified declaration:
//! - every `implements` reference is resolved and matched against the
//!   interface targets (`Implements X`);
//! - every class-level marker is resolved, expanded through the marker
//!   implication graph, and each member of the closure is matched against
//!   the marker targets (`Annotated with Y`);
//! - the same is done for each method's markers (`Method annotated with Y`).
//!
//! Every failure is local to one reference: it is diagnosed and the next
//! reference is processed.

use crate::guard::Guard;
use crate::resolve::IdentityResolver;
use crate::{CompilationUnit, TypeDeclaration};
use common::{
    DiagnosticKind, Diagnostics, SourceLocation, TargetConfig, Trigger, TriggerKind, TriggerMap,
};
use oracle::{Introspector, MarkerGraph};
use std::collections::{BTreeSet, HashSet};

/// Markers from this namespace (`@Override`, `@Deprecated`, ...) are matched
/// directly but never expanded.
const PLATFORM_NAMESPACE: &str = "java.lang.";

/// Scan-scoped classifier. Owns the marker graph, so closures computed for one
/// declaration are reused by every later one.
pub struct Classifier<'a> {
    resolver: IdentityResolver<'a>,
    introspector: &'a dyn Introspector,
    targets: &'a TargetConfig,
    graph: MarkerGraph,
    guard: Guard,
}

impl<'a> Classifier<'a> {
    pub fn new(
        resolver: IdentityResolver<'a>,
        introspector: &'a dyn Introspector,
        targets: &'a TargetConfig,
    ) -> Self {
        Self {
            resolver,
            introspector,
            targets,
            graph: MarkerGraph::new(),
            guard: Guard::new(),
        }
    }

    /// The marker graph as populated so far.
    pub fn graph(&self) -> &MarkerGraph {
        &self.graph
    }

    /// Classifies every classified declaration of `unit` into `triggers`.
    /// Returns the number of new (label, location) pairs recorded.
    pub fn classify_unit(
        &mut self,
        unit: &CompilationUnit,
        triggers: &mut TriggerMap,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        let mut added = 0;
        for decl in unit.declarations.iter().filter(|d| d.kind.is_classified()) {
            for trigger in self.classify(unit, decl, diagnostics) {
                if triggers.add(&trigger) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Triggers for one declaration. Each (kind, identity, line) appears once.
    pub fn classify(
        &mut self,
        unit: &CompilationUnit,
        decl: &TypeDeclaration,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Trigger> {
        let owner = unit.canonical_name(decl);
        let location = |line| SourceLocation {
            title: decl.name.clone(),
            file_path: unit.file_path.clone(),
            line,
        };
        let mut triggers = Vec::new();

        let mut seen = HashSet::new();
        for written in &decl.interfaces {
            let Some(identity) = self.resolve(written, unit, &owner, diagnostics) else {
                continue;
            };
            if seen.insert(identity.clone())
                && self
                    .guard
                    .check(&identity, &self.targets.interfaces, diagnostics)
            {
                triggers.push(Trigger {
                    kind: TriggerKind::Implements,
                    identity,
                    location: location(decl.line),
                });
            }
        }

        for identity in self.matched_markers(unit, &owner, &decl.markers, diagnostics) {
            triggers.push(Trigger {
                kind: TriggerKind::Annotated,
                identity,
                location: location(decl.line),
            });
        }

        for method in &decl.methods {
            let method_owner = format!("{}#{}", owner, method.name);
            for identity in self.matched_markers(unit, &method_owner, &method.markers, diagnostics) {
                triggers.push(Trigger {
                    kind: TriggerKind::MethodAnnotated,
                    identity,
                    location: location(method.line),
                });
            }
        }

        triggers
    }

    /// Target markers implied by `written`, in discovery order, each once.
    fn matched_markers(
        &mut self,
        unit: &CompilationUnit,
        owner: &str,
        written: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        let mut implied: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        for reference in written {
            let Some(identity) = self.resolve(reference, unit, owner, diagnostics) else {
                continue;
            };
            let closure = if identity.starts_with(PLATFORM_NAMESPACE) {
                vec![identity]
            } else {
                self.graph
                    .transitive_closure(&identity, self.introspector, diagnostics)
            };
            for marker in closure {
                if seen.insert(marker.clone()) {
                    implied.push(marker);
                }
            }
        }

        let targets: &BTreeSet<String> = &self.targets.annotations;
        let guard = &mut self.guard;
        implied
            .into_iter()
            .filter(|m| guard.check(m, targets, diagnostics))
            .collect()
    }

    fn resolve(
        &self,
        reference: &str,
        unit: &CompilationUnit,
        owner: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        match self.resolver.resolve(reference, unit) {
            Ok(identity) => Some(identity),
            Err(e) => {
                diagnostics.record(DiagnosticKind::Resolution, owner, e.to_string());
                None
            }
        }
    }
}
