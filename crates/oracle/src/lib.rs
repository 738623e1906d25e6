//! # The Oracle: Marker Implication Engine
//!
//! Answers "which markers does this marker imply?" for canonical identities.
//!
//! - [`MarkerGraph`]: lazily populated, memoized, cycle-tolerant graph from a
//!   marker to the markers attached to its own declaration, with a
//!   breadth-first transitive-closure query.
//! - [`Introspector`]: the single capability the graph uses to discover the
//!   direct markers of an identity it has not seen yet.

pub mod graph;

pub use graph::{MarkerGraph, NodeState, EXCLUDED_NAMESPACES};

use common::Diagnostics;

/// Why the direct markers of an identity could not be determined.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// No visible source or compiled definition carries this name.
    #[error("no definition found for {0}")]
    NotFound(String),

    /// A definition exists but its markers could not be read.
    #[error("definition of {identity} could not be loaded: {reason}")]
    Unloadable { identity: String, reason: String },
}

/// Reports the markers directly attached to a definition, by canonical identity.
///
/// Called by [`MarkerGraph`] only on a cache miss. Implementations may record
/// secondary problems (e.g. an unresolvable meta-marker reference) in
/// `diagnostics`; a returned error means "no known implications" and is
/// recorded by the graph.
pub trait Introspector {
    fn direct_markers(
        &self,
        identity: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<String>, IntrospectError>;
}

impl<T: Introspector + ?Sized> Introspector for &T {
    fn direct_markers(
        &self,
        identity: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<String>, IntrospectError> {
        (**self).direct_markers(identity, diagnostics)
    }
}
