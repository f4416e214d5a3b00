//! Deterministic topological ordering
//!
//! Kahn's algorithm with a min-heap of ready nodes, so that nodes without an
//! ordering constraint between them always come out in lexicographic order.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// Order `nodes` so that every edge `(from, to)` has `from` first.
///
/// On failure returns one concrete cycle, starting and ending at its
/// lexicographically smallest member (`a -> b -> a`).
pub(crate) fn topological_order<'a>(
    nodes: &BTreeSet<&'a str>,
    edges: &BTreeSet<(&'a str, &'a str)>,
) -> Result<Vec<&'a str>, Vec<&'a str>> {
    let mut indegree: BTreeMap<&str, usize> = nodes.iter().map(|n| (*n, 0)).collect();
    let mut successors: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for &(from, to) in edges {
        successors.entry(from).or_default().push(to);
        *indegree.entry(to).or_insert(0) += 1;
    }

    let mut ready: BinaryHeap<Reverse<&str>> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| Reverse(*n))
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for next in successors.get(node).into_iter().flatten() {
            if let Some(d) = indegree.get_mut(next) {
                *d -= 1;
                if *d == 0 {
                    ready.push(Reverse(*next));
                }
            }
        }
    }

    if order.len() == indegree.len() {
        return Ok(order);
    }

    let emitted: BTreeSet<&str> = order.into_iter().collect();
    Err(find_cycle(&indegree, edges, &emitted))
}

/// Every node left after Kahn's pass has a predecessor that was also left,
/// so walking predecessors must eventually revisit a node.
fn find_cycle<'a>(
    indegree: &BTreeMap<&'a str, usize>,
    edges: &BTreeSet<(&'a str, &'a str)>,
    emitted: &BTreeSet<&'a str>,
) -> Vec<&'a str> {
    let remaining: BTreeSet<&str> = indegree
        .keys()
        .copied()
        .filter(|n| !emitted.contains(n))
        .collect();

    let mut predecessors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for &(from, to) in edges {
        if remaining.contains(from) && remaining.contains(to) {
            predecessors.entry(to).or_default().insert(from);
        }
    }

    let Some(&start) = remaining.iter().next() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut seen: BTreeMap<&str, usize> = BTreeMap::from([(start, 0)]);
    let mut current = start;

    loop {
        let Some(&prev) = predecessors.get(current).and_then(|p| p.iter().next()) else {
            return path;
        };
        if let Some(&at) = seen.get(prev) {
            // path[at..] walks backwards along edges; flip it to follow them
            let mut cycle: Vec<&str> = path[at..].to_vec();
            cycle.reverse();
            return close_cycle(cycle);
        }
        seen.insert(prev, path.len());
        path.push(prev);
        current = prev;
    }
}

/// Rotate so the smallest member leads, then repeat it at the end
fn close_cycle(mut cycle: Vec<&str>) -> Vec<&str> {
    if let Some(min_at) = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| **n)
        .map(|(i, _)| i)
    {
        cycle.rotate_left(min_at);
    }
    if let Some(&first) = cycle.first() {
        cycle.push(first);
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes<'a>(names: &[&'a str]) -> BTreeSet<&'a str> {
        names.iter().copied().collect()
    }

    fn edges<'a>(pairs: &[(&'a str, &'a str)]) -> BTreeSet<(&'a str, &'a str)> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_lexicographic_without_edges() {
        let order = topological_order(&nodes(&["c", "a", "b"]), &BTreeSet::new()).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_edges_are_respected() {
        let order = topological_order(
            &nodes(&["a", "b", "c", "d"]),
            &edges(&[("d", "a"), ("c", "b")]),
        )
        .unwrap();
        assert_eq!(order, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_diamond() {
        let order = topological_order(
            &nodes(&["top", "left", "right", "bottom"]),
            &edges(&[
                ("top", "left"),
                ("top", "right"),
                ("left", "bottom"),
                ("right", "bottom"),
            ]),
        )
        .unwrap();
        assert_eq!(order, vec!["top", "left", "right", "bottom"]);
    }

    #[test]
    fn test_two_node_cycle() {
        let cycle = topological_order(&nodes(&["a", "b"]), &edges(&[("a", "b"), ("b", "a")]))
            .unwrap_err();
        assert_eq!(cycle, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        let cycle = topological_order(
            &nodes(&["root", "x", "y", "z", "tail"]),
            &edges(&[
                ("root", "x"),
                ("x", "y"),
                ("y", "z"),
                ("z", "x"),
                ("z", "tail"),
            ]),
        )
        .unwrap_err();
        assert_eq!(cycle, vec!["x", "y", "z", "x"]);
    }

    #[test]
    fn test_self_loop() {
        let cycle = topological_order(&nodes(&["solo"]), &edges(&[("solo", "solo")])).unwrap_err();
        assert_eq!(cycle, vec!["solo", "solo"]);
    }
}
