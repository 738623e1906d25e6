//! # Type Universe
//!
//! The set of canonical type names visible to a scan: the analysed source
//! tree, library sources, every class found in the dependency artifacts, and
//! the platform built-ins below. The semantic resolver only accepts a
//! candidate identity that is a member of this set.

use std::collections::HashSet;

/// Platform types resolvable without any artifact on the classpath.
///
/// Covers `java.lang` (implicitly imported) and the `java.lang.annotation`
/// meta-markers used to annotate annotation declarations.
pub const BUILTIN_TYPES: &[&str] = &[
    "java.lang.Object",
    "java.lang.String",
    "java.lang.Runnable",
    "java.lang.AutoCloseable",
    "java.lang.Comparable",
    "java.lang.Iterable",
    "java.lang.Cloneable",
    "java.lang.Thread",
    "java.lang.Enum",
    "java.lang.Record",
    "java.lang.Exception",
    "java.lang.RuntimeException",
    "java.lang.Override",
    "java.lang.Deprecated",
    "java.lang.SuppressWarnings",
    "java.lang.FunctionalInterface",
    "java.lang.SafeVarargs",
    "java.lang.annotation.Annotation",
    "java.lang.annotation.Retention",
    "java.lang.annotation.RetentionPolicy",
    "java.lang.annotation.Target",
    "java.lang.annotation.ElementType",
    "java.lang.annotation.Documented",
    "java.lang.annotation.Inherited",
    "java.lang.annotation.Repeatable",
    "java.lang.annotation.Native",
    "java.io.Closeable",
    "java.io.Serializable",
    "java.util.concurrent.Callable",
];

/// Splits `a.b.C` into `(Some("a.b"), "C")`; a bare name yields `(None, name)`.
///
/// # Examples
/// ```
/// # use common::registry::split_qualified;
/// assert_eq!(split_qualified("com.x.Foo"), (Some("com.x"), "Foo"));
/// assert_eq!(split_qualified("Foo"), (None, "Foo"));
/// ```
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(idx) => (Some(&name[..idx]), &name[idx + 1..]),
        None => (None, name),
    }
}

/// Canonical names of every known type.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    names: HashSet<String>,
}

impl TypeUniverse {
    /// Creates an empty universe (no built-ins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a universe seeded with [`BUILTIN_TYPES`].
    pub fn with_builtins() -> Self {
        let mut universe = Self::new();
        universe.extend(BUILTIN_TYPES.iter().copied());
        universe
    }

    /// Registers a canonical type name. Returns `false` if already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let universe = TypeUniverse::with_builtins();
        assert!(universe.contains("java.lang.Override"));
        assert!(universe.contains("java.lang.annotation.Retention"));
        assert!(!universe.contains("org.springframework.stereotype.Component"));
    }

    #[test]
    fn test_insert_dedupes() {
        let mut universe = TypeUniverse::new();
        assert!(universe.insert("a.B"));
        assert!(!universe.insert("a.B"));
        assert_eq!(universe.len(), 1);
    }

    #[test]
    fn test_split_nested() {
        assert_eq!(split_qualified("a.Outer.Inner"), (Some("a.Outer"), "Inner"));
    }

    #[test]
    fn test_empty_universe() {
        let universe = TypeUniverse::new();
        assert!(universe.is_empty());
        assert_eq!(universe.len(), 0);
    }
}
