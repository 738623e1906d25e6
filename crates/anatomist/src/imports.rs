//! # Import Table Extraction
//!
//! Reads the `package` clause and `import` declarations of a Java compilation
//! unit. The resulting table is the only context the lexical fallback of the
//! identity resolver has: a simple name is matched against the terminal
//! segment of each single-type import.

use tree_sitter::Node;

/// One `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    /// Imported name without `import`/`static`/`.*` (e.g. `"com.x.Foo"`).
    pub path: String,
    /// `import static ...`
    pub is_static: bool,
    /// `import a.b.*` (on-demand).
    pub is_wildcard: bool,
    /// Line number (1-indexed).
    pub line: u32,
}

impl ImportEntry {
    /// Last segment of the imported name (`"Foo"` for `com.x.Foo`).
    pub fn terminal(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// `true` for a plain `import a.b.C;`, the only form that names one type.
    pub fn is_single_type(&self) -> bool {
        !self.is_static && !self.is_wildcard
    }
}

/// Finds the single-type import whose terminal segment is `simple`.
///
/// # Examples
/// ```
/// # use anatomist::imports::{find_single_type_import, ImportEntry};
/// let imports = vec![ImportEntry {
///     path: "com.x.Foo".into(),
///     is_static: false,
///     is_wildcard: false,
///     line: 3,
/// }];
/// assert_eq!(find_single_type_import(&imports, "Foo"), Some("com.x.Foo"));
/// assert_eq!(find_single_type_import(&imports, "Bar"), None);
/// ```
pub fn find_single_type_import<'a>(imports: &'a [ImportEntry], simple: &str) -> Option<&'a str> {
    imports
        .iter()
        .find(|i| i.is_single_type() && i.terminal() == simple)
        .map(|i| i.path.as_str())
}

/// Extracts the `package` name of a compilation unit, if declared.
pub fn extract_package(source: &[u8], root: Node) -> Option<String> {
    let mut cursor = root.walk();
    let pkg = root
        .children(&mut cursor)
        .find(|c| c.kind() == "package_declaration")?;

    let mut inner = pkg.walk();
    let name = pkg
        .named_children(&mut inner)
        .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))?;
    Some(compact(name.utf8_text(source).ok()?))
}

/// Extracts every `import` declaration in source order.
pub fn extract_imports(source: &[u8], root: Node) -> Vec<ImportEntry> {
    let mut imports = Vec::new();
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        if child.kind() != "import_declaration" {
            continue;
        }
        if let Some(entry) = extract_import(source, child) {
            imports.push(entry);
        }
    }

    imports
}

fn extract_import(source: &[u8], node: Node) -> Option<ImportEntry> {
    let mut path = None;
    let mut is_static = false;
    let mut is_wildcard = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "asterisk" => is_wildcard = true,
            "identifier" | "scoped_identifier" => {
                path = child.utf8_text(source).ok().map(compact);
            }
            _ => {}
        }
    }

    Some(ImportEntry {
        path: path?,
        is_static,
        is_wildcard,
        line: node.start_position().row as u32 + 1,
    })
}

/// Drops whitespace inside a dotted name (`a . b` → `a.b`).
pub(crate) fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_extract_imports() {
        let source = "package com.acme.jobs;\n\
                      import com.x.Foo;\n\
                      import static org.junit.Assert.assertEquals;\n\
                      import java.util.*;\n\
                      class A {}\n";
        let tree = parse(source);
        let imports = extract_imports(source.as_bytes(), tree.root_node());

        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].path, "com.x.Foo");
        assert!(imports[0].is_single_type());
        assert_eq!(imports[0].line, 2);

        assert_eq!(imports[1].path, "org.junit.Assert.assertEquals");
        assert!(imports[1].is_static);

        assert_eq!(imports[2].path, "java.util");
        assert!(imports[2].is_wildcard);
        assert!(!imports[2].is_single_type());
    }

    #[test]
    fn test_extract_package() {
        let source = "package com.acme.jobs;\nclass A {}\n";
        let tree = parse(source);
        assert_eq!(
            extract_package(source.as_bytes(), tree.root_node()).as_deref(),
            Some("com.acme.jobs")
        );
    }

    #[test]
    fn test_default_package() {
        let source = "class A {}\n";
        let tree = parse(source);
        assert_eq!(extract_package(source.as_bytes(), tree.root_node()), None);
    }

    #[test]
    fn test_static_and_wildcard_imports_ignored_by_lookup() {
        let imports = vec![
            ImportEntry {
                path: "a.Util.Foo".into(),
                is_static: true,
                is_wildcard: false,
                line: 1,
            },
            ImportEntry {
                path: "b".into(),
                is_static: false,
                is_wildcard: true,
                line: 2,
            },
        ];
        assert_eq!(find_single_type_import(&imports, "Foo"), None);
        assert_eq!(find_single_type_import(&imports, "b"), None);
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("a . b\n.C"), "a.b.C");
    }
}
