//! Marker Implication Graph.
//!
//! An arena of nodes keyed by canonical identity. Each node carries a state
//! flag separating "never queried" from "known" (possibly with no edges) and
//! "unknowable" (introspection failed). Outgoing edges are the markers
//! attached to that marker's declaration, in discovery order.
//!
//! Nodes are created on first mention, either as a query start or as an edge
//! target, and populated through an [`Introspector`] the first time a query
//! reaches them. Entries are never removed.

use crate::Introspector;
use common::{DiagnosticKind, Diagnostics};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Platform reflection-metadata namespaces. Markers from these namespaces
/// annotate the annotator (`@Retention`, `@Target`, ...) and are dropped when
/// edges are discovered.
pub const EXCLUDED_NAMESPACES: &[&str] = &["java.lang.annotation."];

/// Population state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Mentioned but never introspected. Equivalent to an absent key.
    Unqueried,
    /// Direct markers recorded (possibly none).
    Known,
    /// Introspection failed; treated as having no implications.
    Unknowable,
}

#[derive(Debug, Clone)]
struct MarkerNode {
    identity: String,
    state: NodeState,
}

/// Lazily built mapping from a marker to its directly attached markers.
#[derive(Debug)]
pub struct MarkerGraph {
    graph: DiGraph<MarkerNode, ()>,
    index: HashMap<String, NodeIndex>,
    excluded: Vec<String>,
    introspections: usize,
}

impl Default for MarkerGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerGraph {
    /// Creates an empty graph excluding [`EXCLUDED_NAMESPACES`].
    pub fn new() -> Self {
        Self::with_excluded_namespaces(EXCLUDED_NAMESPACES.iter().copied())
    }

    /// Creates an empty graph excluding the given identity prefixes.
    pub fn with_excluded_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            excluded: namespaces.into_iter().map(Into::into).collect(),
            introspections: 0,
        }
    }

    /// Returns `true` if `identity` lives in an excluded namespace.
    pub fn is_excluded(&self, identity: &str) -> bool {
        self.excluded.iter().any(|ns| identity.starts_with(ns.as_str()))
    }

    /// Population state of `identity` (`Unqueried` if never mentioned).
    pub fn state(&self, identity: &str) -> NodeState {
        self.index
            .get(identity)
            .map(|&idx| self.graph[idx].state)
            .unwrap_or(NodeState::Unqueried)
    }

    /// Returns `true` if the direct markers of `identity` are known.
    pub fn contains_key(&self, identity: &str) -> bool {
        self.state(identity) == NodeState::Known
    }

    /// Direct markers of a known identity, in discovery order.
    pub fn direct_markers(&self, identity: &str) -> Option<Vec<&str>> {
        let &idx = self.index.get(identity)?;
        if self.graph[idx].state != NodeState::Known {
            return None;
        }
        Some(
            self.ordered_targets(idx)
                .into_iter()
                .map(|t| self.graph[t].identity.as_str())
                .collect(),
        )
    }

    /// Records the direct markers of `identity` and marks it known.
    ///
    /// Excluded-namespace markers and repeated edges are dropped. Self and
    /// cyclic edges are kept. Returns `false` (and changes nothing) if the
    /// identity was already populated.
    pub fn record<I, S>(&mut self, identity: &str, markers: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let idx = self.node(identity);
        if self.graph[idx].state != NodeState::Unqueried {
            return false;
        }
        self.graph[idx].state = NodeState::Known;

        for marker in markers {
            let marker = marker.as_ref();
            if self.is_excluded(marker) {
                continue;
            }
            let target = self.node(marker);
            if self.graph.find_edge(idx, target).is_none() {
                self.graph.add_edge(idx, target, ());
            }
        }
        true
    }

    /// Number of introspector calls made so far.
    pub fn introspection_count(&self) -> usize {
        self.introspections
    }

    /// Number of identities whose state is settled (known or unknowable).
    pub fn populated_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| n.state != NodeState::Unqueried)
            .count()
    }

    /// All markers reachable from `start` by following "is itself marked
    /// with" edges, each exactly once, in breadth-first order.
    ///
    /// `start` is always the first element, even when it has no known
    /// markers, so a directly attached marker always matches itself. Other
    /// nodes are included only once their direct markers are known.
    /// Unqueried nodes are populated through `introspector` on first visit;
    /// failures are recorded in `diagnostics` and memoized as
    /// [`NodeState::Unknowable`].
    pub fn transitive_closure(
        &mut self,
        start: &str,
        introspector: &dyn Introspector,
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        let start_idx = self.node(start);
        let mut visited: HashSet<NodeIndex> = HashSet::from([start_idx]);
        let mut queue = VecDeque::from([start_idx]);
        let mut closure = Vec::new();

        while let Some(idx) = queue.pop_front() {
            self.populate(idx, introspector, diagnostics);

            let node = &self.graph[idx];
            if idx == start_idx || node.state == NodeState::Known {
                closure.push(node.identity.clone());
            }

            for target in self.ordered_targets(idx) {
                if visited.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        closure
    }

    fn populate(
        &mut self,
        idx: NodeIndex,
        introspector: &dyn Introspector,
        diagnostics: &mut Diagnostics,
    ) {
        if self.graph[idx].state != NodeState::Unqueried {
            return;
        }
        let identity = self.graph[idx].identity.clone();
        self.introspections += 1;

        match introspector.direct_markers(&identity, diagnostics) {
            Ok(markers) => {
                tracing::debug!(marker = %identity, direct = ?markers, "populated marker");
                self.record(&identity, markers);
            }
            Err(e) => {
                self.graph[idx].state = NodeState::Unknowable;
                diagnostics.record(
                    DiagnosticKind::Introspection,
                    identity,
                    format!("{e}; treating as having no further implications"),
                );
            }
        }
    }

    /// Returns the node for `identity`, creating an unqueried one if needed.
    fn node(&mut self, identity: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(identity) {
            return idx;
        }
        let idx = self.graph.add_node(MarkerNode {
            identity: identity.to_string(),
            state: NodeState::Unqueried,
        });
        self.index.insert(identity.to_string(), idx);
        idx
    }

    /// Edge targets of `idx` in insertion order.
    fn ordered_targets(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges(idx)
            .map(|e| (e.id().index(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IntrospectError;
    use std::cell::Cell;

    /// Introspector over a fixed table that counts its calls.
    struct TableIntrospector {
        table: HashMap<&'static str, Vec<&'static str>>,
        calls: Cell<usize>,
    }

    impl TableIntrospector {
        fn new(entries: &[(&'static str, &[&'static str])]) -> Self {
            Self {
                table: entries.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl Introspector for TableIntrospector {
        fn direct_markers(
            &self,
            identity: &str,
            _diagnostics: &mut Diagnostics,
        ) -> Result<Vec<String>, IntrospectError> {
            self.calls.set(self.calls.get() + 1);
            self.table
                .get(identity)
                .map(|v| v.iter().map(|s| s.to_string()).collect())
                .ok_or_else(|| IntrospectError::NotFound(identity.to_string()))
        }
    }

    #[test]
    fn test_cycle_terminates_with_each_node_once() {
        let intro = TableIntrospector::new(&[("a.A", &["a.B"]), ("a.B", &["a.A"])]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        assert_eq!(
            graph.transitive_closure("a.A", &intro, &mut diags),
            vec!["a.A", "a.B"]
        );
        assert_eq!(
            graph.transitive_closure("a.B", &intro, &mut diags),
            vec!["a.B", "a.A"]
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_self_reference() {
        let intro = TableIntrospector::new(&[("a.A", &["a.A"])]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        assert_eq!(graph.transitive_closure("a.A", &intro, &mut diags), vec!["a.A"]);
        assert_eq!(graph.direct_markers("a.A"), Some(vec!["a.A"]));
    }

    #[test]
    fn test_diamond_visits_shared_node_once() {
        let intro = TableIntrospector::new(&[
            ("a.A", &["a.B", "a.C"]),
            ("a.B", &["a.D"]),
            ("a.C", &["a.D"]),
            ("a.D", &[]),
        ]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        assert_eq!(
            graph.transitive_closure("a.A", &intro, &mut diags),
            vec!["a.A", "a.B", "a.C", "a.D"]
        );
        assert_eq!(intro.calls.get(), 4);
    }

    #[test]
    fn test_memoized_second_query() {
        let intro = TableIntrospector::new(&[
            ("a.Audited", &["o.Scheduled"]),
            ("o.Scheduled", &["java.lang.annotation.Retention"]),
        ]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        let first = graph.transitive_closure("a.Audited", &intro, &mut diags);
        let calls = intro.calls.get();
        let second = graph.transitive_closure("a.Audited", &intro, &mut diags);

        assert_eq!(first, second);
        assert_eq!(intro.calls.get(), calls);
        assert_eq!(graph.introspection_count(), calls);
    }

    #[test]
    fn test_leaf_start_is_included() {
        let intro = TableIntrospector::new(&[("o.Scheduled", &[])]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        assert!(!graph.contains_key("o.Scheduled"));
        assert_eq!(
            graph.transitive_closure("o.Scheduled", &intro, &mut diags),
            vec!["o.Scheduled"]
        );
        // Known leaf, distinct from absent.
        assert!(graph.contains_key("o.Scheduled"));
        assert_eq!(graph.direct_markers("o.Scheduled"), Some(vec![]));
    }

    #[test]
    fn test_unknowable_start_still_matches_itself() {
        let intro = TableIntrospector::new(&[]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        assert_eq!(graph.transitive_closure("x.Gone", &intro, &mut diags), vec!["x.Gone"]);
        assert_eq!(graph.state("x.Gone"), NodeState::Unknowable);
        assert_eq!(diags.of_kind(DiagnosticKind::Introspection).count(), 1);

        // Failure is memoized: no second attempt, no second diagnostic.
        graph.transitive_closure("x.Gone", &intro, &mut diags);
        assert_eq!(intro.calls.get(), 1);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_unknowable_intermediate_is_omitted() {
        let intro = TableIntrospector::new(&[("a.A", &["x.Gone", "a.B"]), ("a.B", &[])]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        assert_eq!(
            graph.transitive_closure("a.A", &intro, &mut diags),
            vec!["a.A", "a.B"]
        );
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_excluded_namespace_dropped_at_discovery() {
        let intro = TableIntrospector::new(&[(
            "a.A",
            &[
                "java.lang.annotation.Retention",
                "java.lang.annotation.Target",
                "a.B",
            ],
        ), ("a.B", &[])]);
        let mut graph = MarkerGraph::new();
        let mut diags = Diagnostics::new();

        graph.transitive_closure("a.A", &intro, &mut diags);
        assert_eq!(graph.direct_markers("a.A"), Some(vec!["a.B"]));
        assert_eq!(graph.state("java.lang.annotation.Retention"), NodeState::Unqueried);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_record_is_compute_once() {
        let mut graph = MarkerGraph::new();
        assert!(graph.record("a.A", ["a.B", "a.B"]));
        assert!(!graph.record("a.A", ["a.C"]));
        assert_eq!(graph.direct_markers("a.A"), Some(vec!["a.B"]));
        assert_eq!(graph.populated_count(), 1);
    }

    #[test]
    fn test_edge_order_is_discovery_order() {
        let mut graph = MarkerGraph::new();
        graph.record("a.A", ["a.Z", "a.M", "a.B"]);
        assert_eq!(graph.direct_markers("a.A"), Some(vec!["a.Z", "a.M", "a.B"]));
    }
}
