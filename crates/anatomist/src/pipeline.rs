//! Two-pass entry-point scan.
//!
//! - **Index pass**: parse every source root and library-source root, index
//!   the classpath artifacts, and assemble the type universe.
//! - **Classify pass**: walk each declaration of the source roots through the
//!   [`Classifier`], accumulating triggers and diagnostics.
//!
//! Library sources and artifacts contribute definitions only; their own
//! declarations are never reported.

use crate::classify::Classifier;
use crate::introspect::DefinitionIntrospector;
use crate::parser::ParserHost;
use crate::resolve::{IdentityResolver, UniverseResolver};
use crate::{scan, CompilationUnit};
use anyhow::Context;
use common::{DiagnosticKind, Diagnostics, TargetConfig, TriggerMap, TypeUniverse};
use forge::ArtifactIndex;
use std::path::PathBuf;

/// What to do with a source file that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Record a [`DiagnosticKind::Parse`] diagnostic and continue.
    #[default]
    Skip,
    /// Abort the whole scan with the parse error.
    Abort,
}

/// Inputs of one scan invocation.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Roots whose declarations are classified and reported.
    pub source_roots: Vec<PathBuf>,
    /// Roots parsed for marker definitions only.
    pub library_sources: Vec<PathBuf>,
    /// Jars and class directories, in lookup order.
    pub classpath: Vec<PathBuf>,
    pub targets: TargetConfig,
    pub parse_failures: ParseFailurePolicy,
}

/// Results of a full scan.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Condition label → rendered locations.
    pub triggers: TriggerMap,
    /// Everything that could not be resolved, loaded, or parsed.
    pub diagnostics: Diagnostics,
    /// Source files parsed successfully (library sources excluded).
    pub files: usize,
    /// Declarations classified.
    pub declarations: usize,
    /// Marker identities settled in the implication graph.
    pub markers: usize,
    /// Definition lookups performed while settling them.
    pub introspections: usize,
}

/// Runs a scan.
///
/// # Errors
/// - A source or library root that does not exist.
/// - A parse failure under [`ParseFailurePolicy::Abort`].
///
/// Everything else is recorded in [`ScanResult::diagnostics`].
pub fn run(options: &ScanOptions) -> anyhow::Result<ScanResult> {
    let mut diagnostics = Diagnostics::new();
    let mut host = ParserHost::new()?;

    // Pass 1: index.
    let units = parse_roots(
        &mut host,
        &options.source_roots,
        options.parse_failures,
        &mut diagnostics,
    )?;
    let library_units = parse_roots(
        &mut host,
        &options.library_sources,
        options.parse_failures,
        &mut diagnostics,
    )?;
    let artifacts = ArtifactIndex::load(&options.classpath, &mut diagnostics);

    let mut universe = TypeUniverse::with_builtins();
    for unit in units.iter().chain(&library_units) {
        universe.extend(unit.declared_types());
    }
    universe.extend(artifacts.type_names());
    tracing::info!(
        types = universe.len(),
        artifacts = artifacts.artifacts().len(),
        "type universe assembled"
    );

    let semantic = UniverseResolver::new(&universe);
    let resolver = IdentityResolver::new(&semantic);
    let mut introspector = DefinitionIntrospector::new(resolver, &artifacts);
    introspector.add_units(&units);
    introspector.add_units(&library_units);

    // Pass 2: classify.
    let mut classifier = Classifier::new(resolver, &introspector, &options.targets);
    let mut triggers = TriggerMap::new();
    let mut declarations = 0;
    for unit in &units {
        declarations += unit
            .declarations
            .iter()
            .filter(|d| d.kind.is_classified())
            .count();
        classifier.classify_unit(unit, &mut triggers, &mut diagnostics);
    }

    tracing::info!(
        conditions = triggers.len(),
        triggers = triggers.trigger_count(),
        diagnostics = diagnostics.len(),
        "scan complete"
    );

    Ok(ScanResult {
        triggers,
        diagnostics,
        files: units.len(),
        declarations,
        markers: classifier.graph().populated_count(),
        introspections: classifier.graph().introspection_count(),
    })
}

fn parse_roots(
    host: &mut ParserHost,
    roots: &[PathBuf],
    policy: ParseFailurePolicy,
    diagnostics: &mut Diagnostics,
) -> anyhow::Result<Vec<CompilationUnit>> {
    let mut units = Vec::new();

    for root in roots {
        let files = scan::java_sources(root)?;
        tracing::info!(root = %root.display(), files = files.len(), "parsing source root");

        for file in files {
            match host.dissect(&file) {
                Ok(unit) => units.push(unit),
                Err(e) if policy == ParseFailurePolicy::Abort => {
                    return Err(e).with_context(|| format!("failed to parse {}", file.display()));
                }
                Err(e) => {
                    diagnostics.record(DiagnosticKind::Parse, file.display().to_string(), e.to_string());
                }
            }
        }
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_util::normalize_path;
    use crate::AnatomistError;
    use common::SourceLocation;
    use forge::classfile::{ACC_ANNOTATION, ACC_INTERFACE};
    use forge::testing::{class_bytes, write_jar};
    use std::fs;
    use std::path::Path;

    const INITIALIZING_BEAN: &str = "org.springframework.beans.factory.InitializingBean";
    const SCHEDULED: &str = "org.springframework.scheduling.annotation.Scheduled";

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(path, contents).ok();
    }

    fn rendered(title: &str, file: &Path, line: u32) -> String {
        SourceLocation {
            title: title.into(),
            file_path: normalize_path(file).unwrap(),
            line,
        }
        .render()
    }

    /// Job implements InitializingBean; Audited is marked @Scheduled; Task has
    /// an @Audited method. Scheduled itself comes from library sources.
    fn write_project(tmp: &Path) -> (PathBuf, PathBuf) {
        let src = tmp.join("src");
        let lib = tmp.join("lib");
        write(
            &src.join("com/acme/Job.java"),
            "package com.acme;\n\
             \n\
             import org.springframework.beans.factory.InitializingBean;\n\
             \n\
             public class Job implements InitializingBean {\n\
             \x20   public void afterPropertiesSet() {}\n\
             }\n",
        );
        write(
            &src.join("com/acme/Audited.java"),
            "package com.acme;\n\
             \n\
             import java.lang.annotation.Retention;\n\
             import java.lang.annotation.RetentionPolicy;\n\
             import org.springframework.scheduling.annotation.Scheduled;\n\
             \n\
             @Retention(RetentionPolicy.RUNTIME)\n\
             @Scheduled\n\
             public @interface Audited {}\n\
             \n\
             class Task {\n\
             \x20   @Audited\n\
             \x20   void run() {}\n\
             }\n",
        );
        write(
            &lib.join("org/springframework/scheduling/annotation/Scheduled.java"),
            "package org.springframework.scheduling.annotation;\n\
             import java.lang.annotation.*;\n\
             @Target({ElementType.METHOD, ElementType.ANNOTATION_TYPE})\n\
             @Retention(RetentionPolicy.RUNTIME)\n\
             @Documented\n\
             public @interface Scheduled {\n\
             \x20   String cron() default \"\";\n\
             }\n",
        );
        (src, lib)
    }

    #[test]
    fn test_end_to_end_scan() {
        let tmp = std::env::temp_dir().join("test_pipeline_end_to_end");
        fs::remove_dir_all(&tmp).ok();
        let (src, lib) = write_project(&tmp);

        let options = ScanOptions {
            source_roots: vec![src.clone()],
            library_sources: vec![lib],
            targets: TargetConfig::baseline(),
            ..Default::default()
        };
        let result = run(&options).unwrap();

        assert_eq!(result.files, 2);
        assert_eq!(result.declarations, 2);
        assert_eq!(result.triggers.len(), 2);
        assert_eq!(
            result
                .triggers
                .get(&format!("Implements {INITIALIZING_BEAN}"))
                .unwrap(),
            &[rendered("Job", &src.join("com/acme/Job.java"), 5)]
        );
        assert_eq!(
            result
                .triggers
                .get(&format!("Method annotated with {SCHEDULED}"))
                .unwrap(),
            &[rendered("Task", &src.join("com/acme/Audited.java"), 12)]
        );
        // InitializingBean is resolved through the import table alone.
        assert!(result.diagnostics.of_kind(DiagnosticKind::Resolution).next().is_none());

        fs::remove_dir_all(tmp).ok();
    }

    #[test]
    fn test_compiled_marker_definitions() {
        let tmp = std::env::temp_dir().join("test_pipeline_compiled");
        fs::remove_dir_all(&tmp).ok();
        let (_, lib) = write_project(&tmp);
        let src = tmp.join("app");
        write(
            &src.join("app/Task.java"),
            "package app;\n\
             \n\
             import com.lib.Audited;\n\
             \n\
             class Task {\n\
             \x20   @Audited\n\
             \x20   void run() {}\n\
             }\n",
        );

        // Audited exists only compiled. Scheduled is also in library sources,
        // which take precedence over the stale compiled copy marked @Legacy.
        let jar = tmp.join("lib.jar");
        write_jar(
            &jar,
            &[
                (
                    "com/lib/Audited.class",
                    class_bytes(
                        "com/lib/Audited",
                        ACC_ANNOTATION | ACC_INTERFACE,
                        &[
                            "java/lang/annotation/Retention",
                            "org/springframework/scheduling/annotation/Scheduled",
                        ],
                        true,
                    ),
                ),
                (
                    "org/springframework/scheduling/annotation/Scheduled.class",
                    class_bytes(
                        "org/springframework/scheduling/annotation/Scheduled",
                        ACC_ANNOTATION | ACC_INTERFACE,
                        &["com/lib/Legacy"],
                        false,
                    ),
                ),
            ],
        )
        .unwrap();

        let options = ScanOptions {
            source_roots: vec![src.clone()],
            library_sources: vec![lib],
            classpath: vec![jar],
            targets: TargetConfig::baseline(),
            ..Default::default()
        };
        let result = run(&options).unwrap();

        assert_eq!(
            result
                .triggers
                .get(&format!("Method annotated with {SCHEDULED}"))
                .unwrap(),
            &[rendered("Task", &src.join("app/Task.java"), 6)]
        );
        assert_eq!(result.triggers.trigger_count(), 1);
        // Audited and Scheduled, each looked up once; Legacy never reached.
        assert_eq!(result.markers, 2);
        assert_eq!(result.introspections, 2);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        fs::remove_dir_all(tmp).ok();
    }

    #[test]
    fn test_partial_classpath_degrades() {
        let tmp = std::env::temp_dir().join("test_pipeline_partial");
        fs::remove_dir_all(&tmp).ok();
        let (src, _lib) = write_project(&tmp);

        let options = ScanOptions {
            source_roots: vec![src],
            targets: TargetConfig::baseline(),
            ..Default::default()
        };
        let result = run(&options).unwrap();

        // Scheduled's definition is not visible: Audited implies nothing known.
        assert_eq!(result.triggers.len(), 1);
        assert!(result
            .triggers
            .get(&format!("Implements {INITIALIZING_BEAN}"))
            .is_some());
        assert_eq!(
            result
                .diagnostics
                .of_kind(DiagnosticKind::Introspection)
                .count(),
            1
        );

        fs::remove_dir_all(tmp).ok();
    }

    #[test]
    fn test_parse_failure_policy() {
        let tmp = std::env::temp_dir().join("test_pipeline_parse_policy");
        fs::remove_dir_all(&tmp).ok();
        write(&tmp.join("Good.java"), "class Good implements Runnable { public void run() {} }\n");
        write(&tmp.join("Bad.java"), "class Bad { void ( }\n");

        let mut options = ScanOptions {
            source_roots: vec![tmp.clone()],
            ..Default::default()
        };
        options.targets.add_interface("java.lang.Runnable");

        let result = run(&options).unwrap();
        assert_eq!(result.files, 1);
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::Parse).count(), 1);
        assert!(result.triggers.get("Implements java.lang.Runnable").is_some());

        options.parse_failures = ParseFailurePolicy::Abort;
        let err = run(&options).unwrap_err();
        assert!(err.to_string().contains("Bad.java"));

        fs::remove_dir_all(tmp).ok();
    }

    #[test]
    fn test_missing_source_root() {
        let options = ScanOptions {
            source_roots: vec![PathBuf::from("/this/does/not/exist/src")],
            ..Default::default()
        };
        let err = run(&options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnatomistError>(),
            Some(AnatomistError::MissingSourceRoot(_))
        ));
    }

    #[test]
    fn test_missing_artifact_is_not_fatal() {
        let tmp = std::env::temp_dir().join("test_pipeline_missing_jar");
        fs::remove_dir_all(&tmp).ok();
        write(&tmp.join("A.java"), "class A {}\n");

        let options = ScanOptions {
            source_roots: vec![tmp.clone()],
            classpath: vec![tmp.join("missing.jar")],
            ..Default::default()
        };
        let result = run(&options).unwrap();
        assert!(result.triggers.is_empty());
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::Artifact).count(), 1);

        fs::remove_dir_all(tmp).ok();
    }
}
