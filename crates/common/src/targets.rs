//! Target configuration: which interfaces and markers count as entry points.
//!
//! Targets are canonical identities. The baseline covers the common Spring
//! lifecycle interfaces and request/scheduling/lifecycle markers; user targets
//! (CLI flags or a JSON file) are unioned on top of it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Lifecycle interfaces whose implementors the container invokes.
pub const BASELINE_INTERFACES: &[&str] = &[
    "org.springframework.boot.ApplicationRunner",
    "org.springframework.boot.CommandLineRunner",
    "org.springframework.beans.factory.InitializingBean",
    "org.springframework.beans.factory.DisposableBean",
    "org.springframework.context.SmartLifecycle",
];

/// Markers that make the container call into the annotated declaration.
pub const BASELINE_ANNOTATIONS: &[&str] = &[
    "org.springframework.stereotype.Controller",
    "org.springframework.context.annotation.Configuration",
    "jakarta.annotation.PostConstruct",
    "jakarta.annotation.PreDestroy",
    "javax.annotation.PostConstruct",
    "javax.annotation.PreDestroy",
    "org.springframework.scheduling.annotation.Scheduled",
    "org.springframework.context.event.EventListener",
];

/// Errors loading a target configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid target configuration {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Interesting interface identities and interesting marker identities.
///
/// Class-level and method-level markers are matched against the same
/// `annotations` set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub interfaces: BTreeSet<String>,
    #[serde(default)]
    pub annotations: BTreeSet<String>,
}

impl TargetConfig {
    /// An empty configuration (matches nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in baseline target sets.
    pub fn baseline() -> Self {
        Self {
            interfaces: BASELINE_INTERFACES.iter().map(|s| s.to_string()).collect(),
            annotations: BASELINE_ANNOTATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Reads `{ "interfaces": [...], "annotations": [...] }` from a JSON file.
    /// Either key may be omitted.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Unions `other` into `self`.
    pub fn merge(&mut self, other: TargetConfig) {
        self.interfaces.extend(other.interfaces);
        self.annotations.extend(other.annotations);
    }

    pub fn add_interface(&mut self, identity: impl Into<String>) {
        self.interfaces.insert(identity.into());
    }

    pub fn add_annotation(&mut self, identity: impl Into<String>) {
        self.annotations.insert(identity.into());
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.annotations.is_empty()
    }
}
