//! # The Forge: Compiled-Artifact Index
//!
//! Builds an in-memory index over the resolved dependency artifacts so that
//! "which markers are attached to this compiled definition?" can be answered
//! by name, without a runtime capable of dynamic class loading.
//!
//! ## Artifact kinds
//! - `.jar` / `.zip` archives: every `*.class` entry outside `META-INF/`.
//! - Directories (compiled output such as `target/classes`): every `*.class`
//!   file below the directory.
//!
//! Artifacts are indexed in classpath order; the first definition of a name
//! wins, as with a parent-first class loader.

pub mod classfile;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use classfile::{is_synthetic_name, parse_class, ClassSummary};
use common::{DiagnosticKind, Diagnostics};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Upper bound on the buffer reserved up front for one archive entry.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Errors produced by the Forge crate.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The archive is not a readable zip file.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A structure ran past the end of the class file.
    #[error("Truncated class file at byte {0}")]
    Truncated(usize),

    /// The buffer does not start with `0xCAFEBABE`.
    #[error("Not a class file (magic {0:#010x})")]
    BadMagic(u32),

    /// Structurally invalid class file.
    #[error("Malformed class file: {0}")]
    Malformed(String),

    /// The artifact path does not exist or is neither a directory nor an archive.
    #[error("Unsupported artifact: {0}")]
    UnsupportedArtifact(String),
}

/// What the index knows about one compiled type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledType {
    pub is_annotation: bool,
    /// Canonical identities of the directly attached runtime-visible markers.
    pub markers: Vec<String>,
    /// Artifact the definition was read from.
    pub origin: PathBuf,
}

/// Canonical type name → compiled definition, over all loaded artifacts.
#[derive(Debug, Default)]
pub struct ArtifactIndex {
    types: HashMap<String, CompiledType>,
    artifacts: Vec<PathBuf>,
}

impl ArtifactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every artifact in order. Failures are recorded as
    /// [`DiagnosticKind::Artifact`] diagnostics and the artifact is skipped.
    pub fn load(artifacts: &[PathBuf], diagnostics: &mut Diagnostics) -> Self {
        let mut index = Self::new();
        for path in artifacts {
            match index.add_artifact(path, diagnostics) {
                Ok(count) => {
                    tracing::debug!(artifact = %path.display(), classes = count, "indexed artifact");
                }
                Err(e) => {
                    diagnostics.record(
                        DiagnosticKind::Artifact,
                        path.display().to_string(),
                        format!("skipping artifact: {e}"),
                    );
                }
            }
        }
        index
    }

    /// Indexes one archive or class directory. Returns the number of classes
    /// added. Individual undecodable class files are diagnosed and skipped.
    pub fn add_artifact(
        &mut self,
        path: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, ForgeError> {
        let count = if path.is_dir() {
            self.add_directory(path, diagnostics)?
        } else if path.is_file() && is_archive(path) {
            self.add_archive(path, diagnostics)?
        } else {
            return Err(ForgeError::UnsupportedArtifact(path.display().to_string()));
        };
        self.artifacts.push(path.to_path_buf());
        Ok(count)
    }

    fn add_archive(
        &mut self,
        path: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, ForgeError> {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut added = 0;

        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(e) => e,
                Err(e) => {
                    diagnostics.record(
                        DiagnosticKind::Artifact,
                        format!("{}!/#{}", path.display(), i),
                        format!("cannot open archive entry: {e}"),
                    );
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if !is_indexable_class(&name) || name.starts_with("META-INF/") {
                continue;
            }
            let origin = format!("{}!/{}", path.display(), name);

            // The header size is untrusted.
            let mut bytes = Vec::with_capacity(entry.size().min(MAX_PREALLOCATION) as usize);
            if let Err(e) = entry.read_to_end(&mut bytes) {
                diagnostics.record(
                    DiagnosticKind::Artifact,
                    origin,
                    format!("cannot read class file: {e}"),
                );
                continue;
            }
            if self.insert_class_bytes(&bytes, path, &origin, diagnostics) {
                added += 1;
            }
        }

        Ok(added)
    }

    fn add_directory(
        &mut self,
        root: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, ForgeError> {
        let mut added = 0;
        for entry in WalkDir::new(root).follow_links(false).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_indexable_class(file_name) {
                continue;
            }

            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(e) => {
                    diagnostics.record(
                        DiagnosticKind::Artifact,
                        path.display().to_string(),
                        format!("cannot read class file: {e}"),
                    );
                    continue;
                }
            };
            let origin = path.display().to_string();
            if self.insert_class_bytes(&bytes, root, &origin, diagnostics) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Decodes and indexes one class file. Returns `true` if it was added.
    fn insert_class_bytes(
        &mut self,
        bytes: &[u8],
        artifact: &Path,
        origin: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        match parse_class(bytes) {
            Ok(summary) => self.insert(summary, artifact),
            Err(e) => {
                diagnostics.record(DiagnosticKind::Artifact, origin, e.to_string());
                false
            }
        }
    }

    /// Adds a decoded class. An already-indexed name is kept (first wins).
    pub fn insert(&mut self, summary: ClassSummary, artifact: &Path) -> bool {
        if self.types.contains_key(&summary.name) {
            return false;
        }
        let is_annotation = summary.is_annotation();
        self.types.insert(
            summary.name,
            CompiledType {
                is_annotation,
                markers: summary.annotations,
                origin: artifact.to_path_buf(),
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&CompiledType> {
        self.types.get(name)
    }

    /// Canonical names of every indexed type.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Artifacts that were indexed successfully, in classpath order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn is_archive(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jar") | Some("zip")
    )
}

/// `*.class` entries that can define a nameable type.
fn is_indexable_class(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".class") else {
        return false;
    };
    let file_stem = stem.rsplit('/').next().unwrap_or(stem);
    file_stem != "module-info" && file_stem != "package-info" && !is_synthetic_name(stem)
}
