//! # The Anatomist: Java Source Dissection & Entry-Point Classification
//!
//! **Role**: Turns Java source trees into declaration facts and classifies
//! them against the configured entry-point targets.
//!
//! **Core Types**:
//! - `CompilationUnit`: one parsed `.java` file (package, imports, declarations).
//! - `TypeDeclaration`: a class, interface, enum, record or annotation type with
//!   its `implements` references, class-level markers and methods.
//! - `IdentityResolver`: syntactic reference → canonical identity.
//! - `Classifier`: declaration → `Trigger`s, via the marker implication graph.
//!
//! **Design**:
//! - References are kept exactly as written (`Foo`, `a.b.Foo`, `Outer.Inner`);
//!   resolution happens later, against the whole type universe.
//! - Line numbers are 1-indexed and point at the first token of the
//!   declaration, including its leading markers.

pub mod classify;
pub mod guard;
pub mod imports;
pub mod introspect;
pub mod parser;
pub mod path_util;
pub mod pipeline;
pub mod resolve;
pub mod scan;

pub use classify::Classifier;
pub use imports::ImportEntry;
pub use introspect::DefinitionIntrospector;
pub use parser::ParserHost;
pub use pipeline::{ParseFailurePolicy, ScanOptions, ScanResult};
pub use resolve::{IdentityResolver, ResolveError, SemanticError, SymbolResolver, UniverseResolver};

use std::path::PathBuf;

/// Java type declaration forms recognized by the Anatomist.
///
/// Maps to tree-sitter-java node kinds: `class_declaration`,
/// `interface_declaration`, `enum_declaration`, `record_declaration`,
/// `annotation_type_declaration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeclarationKind {
    Class = 0,
    Interface = 1,
    Enum = 2,
    Record = 3,
    /// `@interface Name { ... }`: a marker definition.
    Annotation = 4,
}

impl DeclarationKind {
    pub(crate) fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "class_declaration" => Some(Self::Class),
            "interface_declaration" => Some(Self::Interface),
            "enum_declaration" => Some(Self::Enum),
            "record_declaration" => Some(Self::Record),
            "annotation_type_declaration" => Some(Self::Annotation),
            _ => None,
        }
    }

    /// Annotation types define markers; they are indexed but never classified.
    pub fn is_classified(self) -> bool {
        self != Self::Annotation
    }
}

/// A method (not a constructor) and the markers written on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    pub name: String,
    /// Line of the first token of the method, including leading markers.
    pub line: u32,
    /// Marker names as written, e.g. `["Scheduled", "a.b.Audited"]`.
    pub markers: Vec<String>,
}

/// One type declaration from a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    /// Simple name (e.g. `"Inner"`).
    pub name: String,

    /// Name qualified by enclosing types only (e.g. `"Outer.Inner"`).
    pub qualified_name: String,

    pub kind: DeclarationKind,

    /// Line number of the first line of the declaration (1-indexed).
    pub line: u32,

    /// `implements` clause references as written, generic arguments stripped.
    pub interfaces: Vec<String>,

    /// Class-level marker names as written.
    pub markers: Vec<String>,

    pub methods: Vec<MethodDeclaration>,
}

/// A parsed `.java` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Normalized absolute path (UTF-8, forward slashes).
    pub file_path: String,
    /// `package` clause, `None` for the default package.
    pub package: Option<String>,
    /// Import table in source order.
    pub imports: Vec<ImportEntry>,
    /// Declarations in pre-order (enclosing type before its members).
    pub declarations: Vec<TypeDeclaration>,
}

impl CompilationUnit {
    /// Canonical identity of a declaration in this unit.
    ///
    /// # Example
    /// ```
    /// # use anatomist::{CompilationUnit, DeclarationKind, TypeDeclaration};
    /// let decl = TypeDeclaration {
    ///     name: "Inner".into(),
    ///     qualified_name: "Outer.Inner".into(),
    ///     kind: DeclarationKind::Class,
    ///     line: 4,
    ///     interfaces: vec![],
    ///     markers: vec![],
    ///     methods: vec![],
    /// };
    /// let unit = CompilationUnit {
    ///     package: Some("com.acme".into()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(unit.canonical_name(&decl), "com.acme.Outer.Inner");
    /// ```
    pub fn canonical_name(&self, decl: &TypeDeclaration) -> String {
        match &self.package {
            Some(pkg) => format!("{}.{}", pkg, decl.qualified_name),
            None => decl.qualified_name.clone(),
        }
    }

    /// Canonical identities of every declaration in this unit.
    pub fn declared_types(&self) -> impl Iterator<Item = String> + '_ {
        self.declarations.iter().map(|d| self.canonical_name(d))
    }

    /// Canonical identity of the first declaration named `simple`, if any.
    pub fn find_declared(&self, simple: &str) -> Option<String> {
        self.declarations
            .iter()
            .find(|d| d.name == simple)
            .map(|d| self.canonical_name(d))
    }
}

/// Errors produced by the Anatomist crate.
#[derive(Debug, thiserror::Error)]
pub enum AnatomistError {
    /// Tree-sitter parsing failed.
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Byte range exceeds u32::MAX (file too large).
    #[error("Byte range overflow: file size exceeds 4GB limit")]
    ByteRangeOverflow,

    /// A configured source root does not exist.
    #[error("Source root does not exist: {}", .0.display())]
    MissingSourceRoot(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, qualified: &str) -> TypeDeclaration {
        TypeDeclaration {
            name: name.into(),
            qualified_name: qualified.into(),
            kind: DeclarationKind::Class,
            line: 1,
            interfaces: vec![],
            markers: vec![],
            methods: vec![],
        }
    }

    #[test]
    fn test_canonical_name_default_package() {
        let unit = CompilationUnit::default();
        assert_eq!(unit.canonical_name(&decl("App", "App")), "App");
    }

    #[test]
    fn test_find_declared_nested() {
        let unit = CompilationUnit {
            package: Some("a.b".into()),
            declarations: vec![decl("Outer", "Outer"), decl("Inner", "Outer.Inner")],
            ..Default::default()
        };
        assert_eq!(unit.find_declared("Inner").as_deref(), Some("a.b.Outer.Inner"));
        assert_eq!(unit.find_declared("Missing"), None);
        assert_eq!(
            unit.declared_types().collect::<Vec<_>>(),
            vec!["a.b.Outer", "a.b.Outer.Inner"]
        );
    }

    #[test]
    fn test_annotation_kind_not_classified() {
        assert!(!DeclarationKind::Annotation.is_classified());
        assert!(DeclarationKind::Record.is_classified());
        assert_eq!(
            DeclarationKind::from_node_kind("annotation_type_declaration"),
            Some(DeclarationKind::Annotation)
        );
        assert_eq!(DeclarationKind::from_node_kind("method_declaration"), None);
    }

    #[test]
    fn test_declaration_kind_enum_size() {
        assert_eq!(std::mem::size_of::<DeclarationKind>(), 1);
    }
}
