//! Marker definition lookup across source and compiled artifacts.
//!
//! Source annotation declarations take precedence over compiled ones so that
//! a marker defined in the scanned tree is read as written, even when an older
//! build of it also sits on the classpath. Platform types are answered as
//! leaves without a lookup.

use crate::resolve::IdentityResolver;
use crate::{CompilationUnit, DeclarationKind, TypeDeclaration};
use common::registry::BUILTIN_TYPES;
use common::{DiagnosticKind, Diagnostics};
use forge::ArtifactIndex;
use oracle::{IntrospectError, Introspector};
use std::collections::HashMap;

/// Types under this prefix are always loadable and carry no framework markers.
const PLATFORM_NAMESPACE: &str = "java.lang.";

fn is_platform_type(identity: &str) -> bool {
    identity.starts_with(PLATFORM_NAMESPACE) || BUILTIN_TYPES.contains(&identity)
}

/// [`Introspector`] over parsed `@interface` declarations and an [`ArtifactIndex`].
pub struct DefinitionIntrospector<'a> {
    resolver: IdentityResolver<'a>,
    sources: HashMap<String, (&'a CompilationUnit, &'a TypeDeclaration)>,
    artifacts: &'a ArtifactIndex,
}

impl<'a> DefinitionIntrospector<'a> {
    pub fn new(resolver: IdentityResolver<'a>, artifacts: &'a ArtifactIndex) -> Self {
        Self {
            resolver,
            sources: HashMap::new(),
            artifacts,
        }
    }

    /// Registers every annotation type declared in `units`. The first
    /// declaration of a name wins.
    pub fn add_units(&mut self, units: &'a [CompilationUnit]) {
        for unit in units {
            for decl in &unit.declarations {
                if decl.kind != DeclarationKind::Annotation {
                    continue;
                }
                self.sources
                    .entry(unit.canonical_name(decl))
                    .or_insert((unit, decl));
            }
        }
    }

    /// Number of marker definitions found in source.
    pub fn source_definitions(&self) -> usize {
        self.sources.len()
    }
}

impl Introspector for DefinitionIntrospector<'_> {
    fn direct_markers(
        &self,
        identity: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<String>, IntrospectError> {
        if let Some((unit, decl)) = self.sources.get(identity) {
            let mut markers = Vec::with_capacity(decl.markers.len());
            for written in &decl.markers {
                match self.resolver.resolve(written, unit) {
                    Ok(id) => markers.push(id),
                    Err(e) => diagnostics.record(DiagnosticKind::Resolution, identity, e.to_string()),
                }
            }
            return Ok(markers);
        }

        if let Some(compiled) = self.artifacts.get(identity) {
            tracing::trace!(identity, origin = %compiled.origin.display(), "compiled definition");
            return Ok(compiled.markers.clone());
        }

        if is_platform_type(identity) {
            return Ok(Vec::new());
        }
        Err(IntrospectError::NotFound(identity.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserHost;
    use forge::classfile::{ClassSummary, ACC_ANNOTATION, ACC_INTERFACE};
    use std::path::Path;

    fn units(files: &[(&str, &str)]) -> Vec<CompilationUnit> {
        let mut host = ParserHost::new().unwrap();
        files
            .iter()
            .map(|(path, src)| host.dissect_source(src.as_bytes(), path).unwrap())
            .collect()
    }

    #[test]
    fn test_source_definition_markers_resolved() {
        let units = units(&[(
            "/work/a/Audited.java",
            r#"package a;
import java.lang.annotation.Retention;
import org.springframework.scheduling.annotation.Scheduled;
@Retention(RetentionPolicy.RUNTIME)
@Scheduled
@Unknown
public @interface Audited {}
"#,
        )]);
        let artifacts = ArtifactIndex::new();
        let mut intro = DefinitionIntrospector::new(IdentityResolver::lexical_only(), &artifacts);
        intro.add_units(&units);
        assert_eq!(intro.source_definitions(), 1);

        let mut diags = Diagnostics::new();
        let markers = intro.direct_markers("a.Audited", &mut diags).unwrap();
        assert_eq!(
            markers,
            vec![
                "java.lang.annotation.Retention",
                "org.springframework.scheduling.annotation.Scheduled"
            ]
        );
        // `@Unknown` has no import: diagnosed, not fatal.
        assert_eq!(diags.of_kind(DiagnosticKind::Resolution).count(), 1);
    }

    #[test]
    fn test_classes_are_not_marker_definitions() {
        let units = units(&[("/work/a/Job.java", "package a;\n@Component class Job {}\n")]);
        let artifacts = ArtifactIndex::new();
        let mut intro = DefinitionIntrospector::new(IdentityResolver::lexical_only(), &artifacts);
        intro.add_units(&units);

        let mut diags = Diagnostics::new();
        assert!(matches!(
            intro.direct_markers("a.Job", &mut diags),
            Err(IntrospectError::NotFound(_))
        ));
    }

    #[test]
    fn test_platform_markers_are_leaves() {
        let artifacts = ArtifactIndex::new();
        let intro = DefinitionIntrospector::new(IdentityResolver::lexical_only(), &artifacts);
        let mut diags = Diagnostics::new();
        for identity in [
            "java.lang.Deprecated",
            "java.lang.FunctionalInterface",
            "java.io.Serializable",
        ] {
            assert!(intro.direct_markers(identity, &mut diags).unwrap().is_empty());
        }
        assert!(diags.is_empty());
        assert!(intro.direct_markers("java.util.Gone", &mut diags).is_err());
    }

    #[test]
    fn test_compiled_definition() {
        let mut artifacts = ArtifactIndex::new();
        artifacts.insert(
            ClassSummary {
                name: "com.lib.Audited".into(),
                access_flags: ACC_ANNOTATION | ACC_INTERFACE,
                annotations: vec!["org.springframework.scheduling.annotation.Scheduled".into()],
            },
            Path::new("lib.jar"),
        );
        let intro = DefinitionIntrospector::new(IdentityResolver::lexical_only(), &artifacts);

        let mut diags = Diagnostics::new();
        assert_eq!(
            intro.direct_markers("com.lib.Audited", &mut diags).unwrap(),
            vec!["org.springframework.scheduling.annotation.Scheduled"]
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unknown_identity() {
        let artifacts = ArtifactIndex::new();
        let intro = DefinitionIntrospector::new(IdentityResolver::lexical_only(), &artifacts);
        let mut diags = Diagnostics::new();
        let err = intro.direct_markers("x.Gone", &mut diags).unwrap_err();
        assert_eq!(err.to_string(), "no definition found for x.Gone");
    }
}
