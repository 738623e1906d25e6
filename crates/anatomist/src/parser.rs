//! Tree-sitter based Java parser producing the per-file declaration stream.
//!
//! Declarations are found by walking type bodies directly rather than by
//! query, so that every method and nested type is attributed to the type
//! whose body contains it.

use std::fs::File;
use std::path::Path;

use memmap2::MmapOptions;
use tree_sitter::{Node, Parser};

use crate::imports::{compact, extract_imports, extract_package};
use crate::path_util::normalize_path;
use crate::{AnatomistError, CompilationUnit, DeclarationKind, MethodDeclaration, TypeDeclaration};

/// The parser host for extracting declarations from Java source files.
///
/// # Example
/// ```no_run
/// use anatomist::ParserHost;
/// use std::path::Path;
///
/// let mut host = ParserHost::new().unwrap();
/// let unit = host.dissect(Path::new("src/main/java/com/acme/Job.java")).unwrap();
/// for decl in &unit.declarations {
///     println!("{} implements {:?}", decl.qualified_name, decl.interfaces);
/// }
/// ```
pub struct ParserHost {
    parser: Parser,
}

impl ParserHost {
    /// Creates a new parser host with the Java grammar loaded.
    ///
    /// # Errors
    /// Returns `AnatomistError::ParseFailure` if the tree-sitter parser
    /// fails to initialize with the Java language.
    pub fn new() -> Result<Self, AnatomistError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| {
                AnatomistError::ParseFailure(format!("Failed to load Java grammar: {}", e))
            })?;

        Ok(Self { parser })
    }

    /// Parses a source file using memory-mapped I/O.
    ///
    /// # Errors
    /// - `IoError`: File not found, permission denied, mmap failure
    /// - `ByteRangeOverflow`: File larger than 4GB (tree-sitter u32 limit)
    /// - `ParseFailure`: the file contains syntax errors
    pub fn dissect(&mut self, path: &Path) -> Result<CompilationUnit, AnatomistError> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        if file_len > u32::MAX as u64 {
            return Err(AnatomistError::ByteRangeOverflow);
        }
        let normalized_path = normalize_path(path)?;
        if file_len == 0 {
            return Ok(CompilationUnit {
                file_path: normalized_path,
                ..Default::default()
            });
        }

        // SAFETY: The file handle is held for the duration of the mmap lifetime.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        self.dissect_source(&mmap[..], &normalized_path)
    }

    /// Parses an in-memory buffer as if it were the file at `file_path`.
    pub fn dissect_source(
        &mut self,
        source: &[u8],
        file_path: &str,
    ) -> Result<CompilationUnit, AnatomistError> {
        let tree = self.parser.parse(source, None).ok_or_else(|| {
            AnatomistError::ParseFailure("Tree-sitter parse returned None".to_string())
        })?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(AnatomistError::ParseFailure(format!(
                "syntax error at {}:{}",
                file_path, line
            )));
        }

        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if DeclarationKind::from_node_kind(child.kind()).is_some() {
                collect_declaration(source, child, None, &mut declarations);
            }
        }

        Ok(CompilationUnit {
            file_path: file_path.to_string(),
            package: extract_package(source, root),
            imports: extract_imports(source, root),
            declarations,
        })
    }
}

/// Appends `node` and then, depth-first, every type nested in its body.
fn collect_declaration(
    source: &[u8],
    node: Node,
    enclosing: Option<&str>,
    out: &mut Vec<TypeDeclaration>,
) {
    let Some(kind) = DeclarationKind::from_node_kind(node.kind()) else {
        return;
    };
    let Some(name) = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok())
    else {
        return;
    };
    let qualified_name = match enclosing {
        Some(outer) => format!("{}.{}", outer, name),
        None => name.to_string(),
    };

    let interfaces = match kind {
        DeclarationKind::Class | DeclarationKind::Enum | DeclarationKind::Record => {
            implemented_interfaces(source, node)
        }
        _ => Vec::new(),
    };

    let mut methods = Vec::new();
    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        for member in body_members(body) {
            match member.kind() {
                "method_declaration" => {
                    if let Some(method) = method_declaration(source, member) {
                        methods.push(method);
                    }
                    local_declarations(member, &mut nested);
                }
                "constructor_declaration"
                | "compact_constructor_declaration"
                | "static_initializer"
                | "block" => local_declarations(member, &mut nested),
                k if DeclarationKind::from_node_kind(k).is_some() => nested.push(member),
                _ => {}
            }
        }
    }

    out.push(TypeDeclaration {
        name: name.to_string(),
        qualified_name: qualified_name.clone(),
        kind,
        line: line_of(node),
        interfaces,
        markers: markers_of(source, node),
        methods,
    });

    for member in nested {
        collect_declaration(source, member, Some(&qualified_name), out);
    }
}

/// Members of a class, interface, enum, record or annotation body.
///
/// Enum members after the constant list live in `enum_body_declarations`.
fn body_members(body: Node) -> Vec<Node> {
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "enum_body_declarations" {
            let mut inner = child.walk();
            members.extend(child.named_children(&mut inner));
        } else {
            members.push(child);
        }
    }
    members
}

/// Type declarations local to a method, constructor or initializer body.
///
/// They are named after the enclosing type. Anonymous class bodies are not
/// entered.
fn local_declarations<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if DeclarationKind::from_node_kind(child.kind()).is_some() {
            out.push(child);
        } else if child.kind() != "class_body" {
            local_declarations(child, out);
        }
    }
}

fn method_declaration(source: &[u8], node: Node) -> Option<MethodDeclaration> {
    let name = node.child_by_field_name("name")?.utf8_text(source).ok()?;
    Some(MethodDeclaration {
        name: name.to_string(),
        line: line_of(node),
        markers: markers_of(source, node),
    })
}

/// Names of the markers in the `modifiers` child of a declaration.
fn markers_of(source: &[u8], node: Node) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(modifiers) = node
        .children(&mut cursor)
        .find(|c| c.kind() == "modifiers")
    else {
        return Vec::new();
    };

    let mut markers = Vec::new();
    let mut inner = modifiers.walk();
    for child in modifiers.named_children(&mut inner) {
        if !matches!(child.kind(), "marker_annotation" | "annotation") {
            continue;
        }
        if let Some(name) = child
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
        {
            markers.push(compact(name));
        }
    }
    markers
}

/// Types listed in the `implements` clause, generic arguments stripped.
fn implemented_interfaces(source: &[u8], node: Node) -> Vec<String> {
    let Some(clause) = node.child_by_field_name("interfaces") else {
        return Vec::new();
    };
    let mut cursor = clause.walk();
    let Some(list) = clause
        .named_children(&mut cursor)
        .find(|c| c.kind() == "type_list")
    else {
        return Vec::new();
    };

    let mut inner = list.walk();
    list.named_children(&mut inner)
        .filter_map(|t| type_name(source, t))
        .collect()
}

/// Written name of a type node: `Foo`, `a.b.Foo`, `Outer.Inner` (no `<...>`).
fn type_name(source: &[u8], node: Node) -> Option<String> {
    match node.kind() {
        "type_identifier" => node.utf8_text(source).ok().map(compact),
        "generic_type" => {
            let mut cursor = node.walk();
            let base = node.named_children(&mut cursor).next()?;
            type_name(source, base)
        }
        "annotated_type" => {
            let mut cursor = node.walk();
            let base = node.named_children(&mut cursor).last()?;
            type_name(source, base)
        }
        "scoped_type_identifier" => {
            let mut cursor = node.walk();
            let parts: Vec<Node> = node
                .named_children(&mut cursor)
                .filter(|c| !matches!(c.kind(), "marker_annotation" | "annotation"))
                .collect();
            let (last, init) = parts.split_last()?;
            let head = type_name(source, *init.first()?)?;
            let tail = last.utf8_text(source).ok()?;
            Some(format!("{}.{}", head, tail))
        }
        _ => None,
    }
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn first_error_line(node: Node) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(line_of(node));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}
