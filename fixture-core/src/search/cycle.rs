use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use super::Edge;
use crate::error::{Error, Result};

/// Fail with [`Error::CyclicDependency`] if `edges` contain a cycle
///
/// Self-referencing edges are ignored: a table pointing at itself can still
/// be loaded row by row. Uses an explicit stack, so deep graphs do not
/// recurse.
pub fn check_acyclic<N>(nodes: &[N], edges: &BTreeSet<Edge<N>>) -> Result<()>
where
    N: Clone + Eq + Hash + Ord + Display,
{
    let mut adjacency: BTreeMap<&N, Vec<&N>> = BTreeMap::new();
    for edge in edges.iter().filter(|e| e.from != e.to) {
        adjacency.entry(&edge.from).or_default().push(&edge.to);
    }

    let mut visited: HashSet<&N> = HashSet::new();
    let mut on_path: HashSet<&N> = HashSet::new();

    for start in nodes.iter().chain(adjacency.keys().copied()) {
        if visited.contains(start) {
            continue;
        }

        // (node, index of the next target to visit)
        let mut stack: Vec<(&N, usize)> = vec![(start, 0)];
        visited.insert(start);
        on_path.insert(start);

        while let Some((node, next)) = stack.last_mut() {
            let targets = adjacency.get(*node).map_or(&[][..], Vec::as_slice);
            if let Some(&target) = targets.get(*next) {
                *next += 1;
                if on_path.contains(target) {
                    let begin = stack
                        .iter()
                        .position(|(n, _)| *n == target)
                        .unwrap_or(0);
                    let mut tables: Vec<String> =
                        stack[begin..].iter().map(|(n, _)| n.to_string()).collect();
                    tables.push(target.to_string());
                    return Err(Error::CyclicDependency { tables });
                }
                if visited.insert(target) {
                    on_path.insert(target);
                    stack.push((target, 0));
                }
            } else {
                on_path.remove(*node);
                stack.pop();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&'static str, &'static str)]) -> BTreeSet<Edge<&'static str>> {
        pairs
            .iter()
            .map(|(a, b)| Edge::new(*a, *b, "fk", "pk"))
            .collect()
    }

    #[test]
    fn test_dag_passes() {
        let graph = edges(&[("a", "b"), ("b", "c"), ("a", "c")]);
        check_acyclic(&["a", "b", "c"], &graph).unwrap();
    }

    #[test]
    fn test_self_reference_ignored() {
        let graph = edges(&[("a", "a"), ("a", "b")]);
        check_acyclic(&["a", "b"], &graph).unwrap();
    }

    #[test]
    fn test_cycle_reported() {
        let graph = edges(&[("a", "b"), ("b", "c"), ("c", "a")]);
        match check_acyclic(&["a"], &graph) {
            Err(Error::CyclicDependency { tables }) => {
                assert_eq!(tables, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_deep_chain() {
        let names: Vec<String> = (0..10_000).map(|i| format!("t{i}")).collect();
        let graph: BTreeSet<Edge<String>> = names
            .windows(2)
            .map(|w| Edge::new(w[0].clone(), w[1].clone(), "fk", "pk"))
            .collect();
        check_acyclic(&names, &graph).unwrap();
    }
}
