//! Dependency search over directed graphs of tables
//!
//! [`DepthFirstSearch`] expands a set of seed nodes into every node reachable
//! from them, returned in post-order. The graph is discovered lazily through
//! a [`SearchCallback`], which also decides which nodes may be visited.
//!
//! Each round runs two passes:
//!
//! 1. a reverse pass that walks incoming edges, pulling into the seed set
//!    every node that points at a seed;
//! 2. a forward pass that walks outgoing edges from every seed, recording a
//!    node only after all its targets are recorded.
//!
//! Rounds repeat, with the previous result as the new seeds, until neither
//! the seed set nor the result grows. Cycles are not an error: a node already
//! being visited is simply skipped, so every node of a cycle ends up in the
//! result exactly once.

mod cycle;
mod dependency;

use std::collections::{BTreeSet, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::config::FixtureConfig;
use crate::error::{Error, Result};

pub use cycle::check_acyclic;
pub use dependency::{
    ForeignKey, ForeignKeyProvider, ForeignKeySearchCallback, KeyDirection, TablesDependencyHelper,
};

/// A directed edge, annotated with the key columns that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge<N> {
    /// Node holding the reference
    pub from: N,
    /// Node being referenced
    pub to: N,
    /// Referencing column in `from`
    pub fk_column: String,
    /// Referenced column in `to`
    pub pk_column: String,
}

impl<N> Edge<N> {
    /// Create an edge
    pub fn new(from: N, to: N, fk_column: impl Into<String>, pk_column: impl Into<String>) -> Self {
        Self {
            from,
            to,
            fk_column: fk_column.into(),
            pk_column: pk_column.into(),
        }
    }
}

impl<N: Ord> Ord for Edge<N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.from
            .cmp(&other.from)
            .then_with(|| self.to.cmp(&other.to))
            .then_with(|| self.pk_column.cmp(&other.pk_column))
            .then_with(|| self.fk_column.cmp(&other.fk_column))
    }
}

impl<N: Ord> PartialOrd for Edge<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Graph access used by [`DepthFirstSearch`]
pub trait SearchCallback<N> {
    /// Whether `node` may be visited at all
    fn search_node(&mut self, node: &N) -> Result<bool>;

    /// Edges touching `node`, incoming and outgoing
    fn edges(&mut self, node: &N) -> Result<BTreeSet<Edge<N>>>;

    /// Called once for every node added to the result
    fn node_added(&mut self, _node: &N) -> Result<()> {
        Ok(())
    }
}

/// Two-phase depth-first search with fixed-point iteration
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirstSearch {
    max_depth: Option<usize>,
}

impl DepthFirstSearch {
    /// Unbounded search
    pub fn new() -> Self {
        Self::default()
    }

    /// Search that stops expanding nodes at `max_depth` hops from a seed
    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self { max_depth }
    }

    /// Search bounded by the configured depth
    pub fn from_config(config: &FixtureConfig) -> Self {
        Self::with_max_depth(config.search_depth)
    }

    /// Expand `seeds` into every reachable node, in post-order
    ///
    /// A callback failure aborts the search and is returned wrapped in
    /// [`Error::Search`]; no partial result is produced.
    pub fn search<N, C>(
        &self,
        seeds: impl IntoIterator<Item = N>,
        callback: &mut C,
    ) -> Result<IndexSet<N>>
    where
        N: Clone + Eq + Hash + Ord + Debug,
        C: SearchCallback<N> + ?Sized,
    {
        let mut state = SearchState {
            callback,
            max_depth: self.max_depth,
            scanned: HashSet::new(),
            reverse_scanned: HashSet::new(),
            seeds: seeds.into_iter().collect(),
            result: IndexSet::new(),
        };

        let mut sizes = (0, 0);
        let mut round = 0usize;
        loop {
            round += 1;
            state.scanned.clear();
            state.reverse_scanned.clear();

            let current: Vec<N> = state.seeds.iter().cloned().collect();
            for node in current {
                state.walk(node, Direction::Reverse)?;
            }
            let current: Vec<N> = state.seeds.iter().cloned().collect();
            for node in current {
                state.walk(node, Direction::Forward)?;
            }

            let now = (state.seeds.len(), state.result.len());
            debug!(round, seeds = now.0, result = now.1, "search round complete");
            if now == sizes {
                break;
            }
            sizes = now;
            state.seeds = state.result.clone();
        }

        Ok(state.result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

struct Frame<N> {
    node: N,
    targets: Vec<N>,
    next: usize,
    depth: usize,
}

struct SearchState<'c, N, C: ?Sized> {
    callback: &'c mut C,
    max_depth: Option<usize>,
    scanned: HashSet<N>,
    reverse_scanned: HashSet<N>,
    seeds: IndexSet<N>,
    result: IndexSet<N>,
}

fn wrap(err: Error) -> Error {
    match err {
        Error::Search(_) => err,
        other => Error::Search(Box::new(other)),
    }
}

impl<N, C> SearchState<'_, N, C>
where
    N: Clone + Eq + Hash + Ord + Debug,
    C: SearchCallback<N> + ?Sized,
{
    /// Iterative depth-first walk from `start`
    fn walk(&mut self, start: N, direction: Direction) -> Result<()> {
        let Some(first) = self.enter(start, 0, direction)? else {
            return Ok(());
        };
        let mut stack = vec![first];

        loop {
            let step = match stack.last_mut() {
                None => break,
                Some(frame) if frame.next < frame.targets.len() => {
                    frame.next += 1;
                    Some((frame.targets[frame.next - 1].clone(), frame.depth + 1))
                }
                Some(_) => None,
            };

            match step {
                Some((target, depth)) => {
                    if let Some(frame) = self.enter(target, depth, direction)? {
                        stack.push(frame);
                    }
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        self.finish(frame.node, direction)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Mark `node` as visited and collect its targets, `None` if it is skipped
    fn enter(&mut self, node: N, depth: usize, direction: Direction) -> Result<Option<Frame<N>>> {
        let visited = match direction {
            Direction::Forward => &self.scanned,
            Direction::Reverse => &self.reverse_scanned,
        };
        if visited.contains(&node) {
            return Ok(None);
        }
        if !self.callback.search_node(&node).map_err(wrap)? {
            trace!(node = ?node, "node pruned");
            return Ok(None);
        }

        // a node reached at the depth bound stays unscanned so a shallower
        // visit, in this round or the next, still expands it
        let expand = self.max_depth.map_or(true, |max| depth < max);
        let targets = if expand {
            match direction {
                Direction::Forward => self.scanned.insert(node.clone()),
                Direction::Reverse => self.reverse_scanned.insert(node.clone()),
            };
            let edges = self.callback.edges(&node).map_err(wrap)?;
            match direction {
                Direction::Forward => edges
                    .into_iter()
                    .filter(|e| e.from == node)
                    .map(|e| e.to)
                    .collect(),
                Direction::Reverse => edges
                    .into_iter()
                    .filter(|e| e.to == node)
                    .map(|e| e.from)
                    .collect(),
            }
        } else {
            Vec::new()
        };

        Ok(Some(Frame {
            node,
            targets,
            next: 0,
            depth,
        }))
    }

    fn finish(&mut self, node: N, direction: Direction) -> Result<()> {
        match direction {
            Direction::Reverse => {
                self.seeds.insert(node);
            }
            Direction::Forward => {
                if self.result.insert(node.clone()) {
                    trace!(node = ?node, "node added");
                    self.callback.node_added(&node).map_err(wrap)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Graph over string nodes given as `from -> to` pairs
    #[derive(Default)]
    pub(crate) struct Graph {
        edges: Vec<(&'static str, &'static str)>,
        pruned: Vec<&'static str>,
        pub(crate) added: Vec<&'static str>,
        pub(crate) edge_calls: BTreeMap<&'static str, usize>,
        fail_on: Option<&'static str>,
    }

    impl Graph {
        pub(crate) fn new(edges: &[(&'static str, &'static str)]) -> Self {
            Self {
                edges: edges.to_vec(),
                ..Self::default()
            }
        }

        pub(crate) fn reversed(&self) -> Self {
            let edges: Vec<_> = self.edges.iter().map(|(a, b)| (*b, *a)).collect();
            Self::new(&edges)
        }
    }

    impl SearchCallback<&'static str> for Graph {
        fn search_node(&mut self, node: &&'static str) -> Result<bool> {
            Ok(!self.pruned.contains(node))
        }

        fn edges(&mut self, node: &&'static str) -> Result<BTreeSet<Edge<&'static str>>> {
            if self.fail_on == Some(*node) {
                return Err(Error::NoSuchTable((*node).to_string()));
            }
            *self.edge_calls.entry(*node).or_default() += 1;
            Ok(self
                .edges
                .iter()
                .filter(|(a, b)| a == node || b == node)
                .map(|(a, b)| Edge::new(*a, *b, "fk", "pk"))
                .collect())
        }

        fn node_added(&mut self, node: &&'static str) -> Result<()> {
            self.added.push(*node);
            Ok(())
        }
    }

    fn run(graph: &mut Graph, seeds: &[&'static str]) -> Vec<&'static str> {
        DepthFirstSearch::new()
            .search(seeds.iter().copied(), graph)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_chain_in_post_order() {
        let mut graph = Graph::new(&[("a", "b"), ("b", "c")]);
        assert_eq!(run(&mut graph, &["a"]), vec!["c", "b", "a"]);
        assert_eq!(graph.added, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_reversed_edges_give_dependents_first() {
        let mut graph = Graph::new(&[("a", "b"), ("b", "c")]).reversed();
        let result = run(&mut graph, &["a"]);
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reverse_pass_pulls_in_referencing_nodes() {
        // "x" points at the seed and must be discovered through the reverse pass
        let mut graph = Graph::new(&[("x", "a"), ("a", "b")]);
        let result = run(&mut graph, &["a"]);
        assert_eq!(result.len(), 3);
        let pos = |n| result.iter().position(|r| *r == n).unwrap();
        assert!(pos("b") < pos("a"));
        assert!(pos("a") < pos("x"));
    }

    #[test]
    fn test_cycle_visits_each_node_once() {
        let mut graph = Graph::new(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(run(&mut graph, &["a"]), vec!["c", "b", "a"]);
        assert_eq!(graph.added.len(), 3);

        for seed in ["b", "c"] {
            let mut graph = Graph::new(&[("a", "b"), ("b", "c"), ("c", "a")]);
            let mut result = run(&mut graph, &[seed]);
            result.sort_unstable();
            assert_eq!(result, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_pruned_nodes_are_skipped() {
        let mut graph = Graph::new(&[("a", "b"), ("b", "c")]);
        graph.pruned = vec!["b"];
        assert_eq!(run(&mut graph, &["a"]), vec!["a"]);
    }

    #[test]
    fn test_empty_seeds() {
        let mut graph = Graph::new(&[("a", "b")]);
        assert!(run(&mut graph, &[]).is_empty());
        assert!(graph.edge_calls.is_empty());
    }

    #[test]
    fn test_depth_bound() {
        let mut graph = Graph::new(&[("a", "b"), ("b", "c"), ("c", "d")]);
        let result: Vec<_> = DepthFirstSearch::with_max_depth(Some(1))
            .search(["a"], &mut graph)
            .unwrap()
            .into_iter()
            .collect();
        // later rounds restart from the result, so the bound applies per round
        assert_eq!(result, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_depth_bound_expands_node_seen_at_bound_earlier() {
        // "b" is first reached at the bound from "a", then as a seed
        let mut graph = Graph::new(&[("a", "b"), ("b", "c")]);
        let result: Vec<_> = DepthFirstSearch::with_max_depth(Some(1))
            .search(["a", "b"], &mut graph)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(result, vec!["b", "a", "c"]);
        assert!(graph.edge_calls.contains_key("b"));
    }

    #[test]
    fn test_depth_zero_keeps_seeds_only() {
        let mut graph = Graph::new(&[("a", "b")]);
        let result: Vec<_> = DepthFirstSearch::with_max_depth(Some(0))
            .search(["a"], &mut graph)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(result, vec!["a"]);
        assert!(graph.edge_calls.is_empty());
    }

    #[test]
    fn test_search_is_deterministic() {
        let edges = [("x", "a"), ("a", "b"), ("a", "c"), ("c", "d"), ("y", "d")];
        let first = run(&mut Graph::new(&edges), &["a", "d"]);
        let second = run(&mut Graph::new(&edges), &["a", "d"]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_callback_error_is_wrapped() {
        let mut graph = Graph::new(&[("a", "b")]);
        graph.fail_on = Some("b");
        let err = DepthFirstSearch::new().search(["a"], &mut graph).unwrap_err();
        match err {
            Error::Search(inner) => assert!(matches!(*inner, Error::NoSuchTable(_))),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
