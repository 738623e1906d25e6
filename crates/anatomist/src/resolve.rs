//! # Canonical Identity Resolution
//!
//! Two strategies, tried in order:
//! 1. **Semantic**: a [`SymbolResolver`] applying Java name lookup against the
//!    full [`TypeUniverse`] (source tree, library sources, dependency
//!    artifacts, platform built-ins).
//! 2. **Lexical**: a dotted name is taken verbatim; a simple name is matched
//!    against the terminal segment of the file's single-type imports.
//!
//! A reference neither strategy can place is a [`ResolveError`]. Callers record
//! it and move on to the next reference.

use crate::imports::find_single_type_import;
use crate::CompilationUnit;
use common::TypeUniverse;

/// Failure of the semantic strategy. Both variants trigger the lexical fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("unresolved symbol `{0}`")]
    Unresolved(String),

    #[error("symbol resolver not configured")]
    NotConfigured,
}

/// Neither strategy produced a canonical identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot resolve `{reference}` in {file}")]
pub struct ResolveError {
    pub reference: String,
    pub file: String,
}

/// Resolves a written type name in the context of a compilation unit.
pub trait SymbolResolver {
    fn resolve(&self, reference: &str, unit: &CompilationUnit) -> Result<String, SemanticError>;
}

/// Java scoping over a fixed set of known canonical names.
///
/// Lookup order for a simple name: types declared in the same file,
/// single-type imports, the unit's own package, on-demand imports, `java.lang`.
/// Only names present in the universe are accepted, except same-file
/// declarations which are authoritative.
pub struct UniverseResolver<'u> {
    universe: &'u TypeUniverse,
}

impl<'u> UniverseResolver<'u> {
    pub fn new(universe: &'u TypeUniverse) -> Self {
        Self { universe }
    }

    fn resolve_simple(&self, name: &str, unit: &CompilationUnit) -> Option<String> {
        if let Some(local) = unit.find_declared(name) {
            return Some(local);
        }

        // A single-type import shadows everything below, known or not.
        if let Some(path) = find_single_type_import(&unit.imports, name) {
            return self.universe.contains(path).then(|| path.to_string());
        }

        let same_package = match &unit.package {
            Some(pkg) => format!("{}.{}", pkg, name),
            None => name.to_string(),
        };
        if self.universe.contains(&same_package) {
            return Some(same_package);
        }

        for import in unit.imports.iter().filter(|i| i.is_wildcard && !i.is_static) {
            let candidate = format!("{}.{}", import.path, name);
            if self.universe.contains(&candidate) {
                return Some(candidate);
            }
        }

        let platform = format!("java.lang.{}", name);
        self.universe.contains(&platform).then_some(platform)
    }
}

impl SymbolResolver for UniverseResolver<'_> {
    fn resolve(&self, reference: &str, unit: &CompilationUnit) -> Result<String, SemanticError> {
        let Some((head, rest)) = reference.split_once('.') else {
            return self
                .resolve_simple(reference, unit)
                .ok_or_else(|| SemanticError::Unresolved(reference.to_string()));
        };

        // `Outer.Inner` where `Outer` is in scope.
        if let Some(outer) = self.resolve_simple(head, unit) {
            let candidate = format!("{}.{}", outer, rest);
            if self.universe.contains(&candidate) {
                return Ok(candidate);
            }
        }

        if self.universe.contains(reference) {
            return Ok(reference.to_string());
        }
        Err(SemanticError::Unresolved(reference.to_string()))
    }
}

/// Semantic resolution with lexical fallback.
#[derive(Clone, Copy)]
pub struct IdentityResolver<'r> {
    semantic: Option<&'r dyn SymbolResolver>,
}

impl<'r> IdentityResolver<'r> {
    pub fn new(semantic: &'r dyn SymbolResolver) -> Self {
        Self {
            semantic: Some(semantic),
        }
    }

    /// A resolver with no semantic strategy; every lookup goes lexical.
    pub fn lexical_only() -> Self {
        Self { semantic: None }
    }

    /// Resolves `reference` as written in `unit`.
    pub fn resolve(&self, reference: &str, unit: &CompilationUnit) -> Result<String, ResolveError> {
        let semantic = match self.semantic {
            Some(resolver) => resolver.resolve(reference, unit),
            None => Err(SemanticError::NotConfigured),
        };

        match semantic {
            Ok(identity) => return Ok(identity),
            Err(e) => {
                tracing::trace!(reference, file = %unit.file_path, "{e}; trying imports");
            }
        }

        lexical_resolve(reference, unit).ok_or_else(|| ResolveError {
            reference: reference.to_string(),
            file: unit.file_path.clone(),
        })
    }
}

/// Import-table fallback: dotted names are already canonical; simple names
/// need a single-type import with a matching terminal segment.
pub fn lexical_resolve(reference: &str, unit: &CompilationUnit) -> Option<String> {
    if reference.contains('.') {
        return Some(reference.to_string());
    }
    find_single_type_import(&unit.imports, reference).map(str::to_string)
}
