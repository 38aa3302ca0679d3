//! Generic A* search over implicit graphs.
//!
//! The graph is a capability: a node type plus [`SearchGraph::outgoing_edges`].
//! Goal and heuristic are closures over nodes, so the search knows nothing
//! about the blocks world. The open queue admits stale entries instead of
//! supporting decrease-key; freshness is checked at pop time against the
//! best known cost, and closed nodes are never reopened. With an admissible
//! heuristic the first goal popped is optimal.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
    hash::Hash,
    time::{Duration, Instant},
};

use log::debug;
use thiserror::Error;

/// The capability the search needs from a graph.
pub trait SearchGraph {
    type Node: Clone + Eq + Hash;

    fn outgoing_edges(&self, node: &Self::Node) -> Vec<Edge<Self::Node>>;
}

#[derive(Clone, Debug)]
pub struct Edge<N> {
    pub to: N,
    pub cost: usize,
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SearchError {
    /// The wall-clock budget ran out before a goal was popped.
    #[error("the search timed out after {0:?}")]
    Timeout(Duration),
    /// Every reachable state was expanded without finding a goal.
    #[error("no sequence of actions reaches the goal")]
    NoPath,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchResult<N> {
    /// Nodes from the start to a goal, inclusive.
    pub path: Vec<N>,
    pub cost: usize,
}

/// Open-queue entry ordered by lowest `f`; ties are broken arbitrarily.
struct OpenEntry<N> {
    f: usize,
    g: usize,
    node: N,
}

impl<N> Ord for OpenEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.cmp(&self.f)
    }
}

impl<N> PartialOrd for OpenEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> PartialEq for OpenEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl<N> Eq for OpenEntry<N> {}

/// A* from `start` to any node satisfying `is_goal`.
///
/// `heuristic` must never overestimate the remaining cost if the result is
/// to be optimal. The timeout is checked at the top of every pop iteration.
pub fn a_star<G, IsGoal, H>(
    graph: &G,
    start: G::Node,
    is_goal: IsGoal,
    heuristic: H,
    timeout: Duration,
) -> Result<SearchResult<G::Node>, SearchError>
where
    G: SearchGraph,
    IsGoal: Fn(&G::Node) -> bool,
    H: Fn(&G::Node) -> usize,
{
    let started = Instant::now();

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<G::Node, usize> = HashMap::new();
    let mut parents: HashMap<G::Node, G::Node> = HashMap::new();
    let mut closed: HashSet<G::Node> = HashSet::new();

    best_g.insert(start.clone(), 0);
    open.push(OpenEntry { f: heuristic(&start), g: 0, node: start });

    let mut expanded = 0usize;
    loop {
        if started.elapsed() > timeout {
            debug!(target: "search", "timed out after expanding {expanded} nodes");
            return Err(SearchError::Timeout(timeout));
        }
        let Some(OpenEntry { node, g, .. }) = open.pop() else {
            debug!(target: "search", "frontier exhausted after expanding {expanded} nodes");
            return Err(SearchError::NoPath);
        };

        // Stale entry: a cheaper route to this node was queued later, or the
        // node was already expanded.
        if closed.contains(&node) || best_g.get(&node).is_none_or(|&best| g > best) {
            continue;
        }

        if is_goal(&node) {
            debug!(target: "search", "goal at cost {g} after expanding {expanded} nodes");
            return Ok(SearchResult { path: reconstruct(&parents, node), cost: g });
        }

        closed.insert(node.clone());
        expanded += 1;

        for Edge { to, cost } in graph.outgoing_edges(&node) {
            if closed.contains(&to) {
                continue;
            }
            let tentative = g + cost;
            if best_g.get(&to).is_none_or(|&best| tentative < best) {
                best_g.insert(to.clone(), tentative);
                parents.insert(to.clone(), node.clone());
                open.push(OpenEntry { f: tentative + heuristic(&to), g: tentative, node: to });
            }
        }
    }
}

fn reconstruct<N: Clone + Eq + Hash>(parents: &HashMap<N, N>, goal: N) -> Vec<N> {
    let mut path = vec![goal];
    while let Some(parent) = parents.get(path.last().expect("path starts non-empty")) {
        path.push(parent.clone());
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integers 0..=bound; each node steps to `n+1` (cost 1) and `n+3`
    /// (cost 5). Cheapest route to a multiple of three mixes both.
    struct CountingGraph {
        bound: usize,
    }

    impl SearchGraph for CountingGraph {
        type Node = usize;

        fn outgoing_edges(&self, node: &usize) -> Vec<Edge<usize>> {
            [(node + 1, 1), (node + 3, 5)]
                .into_iter()
                .filter(|(to, _)| *to <= self.bound)
                .map(|(to, cost)| Edge { to, cost })
                .collect()
        }
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn finds_the_cheapest_path() {
        let graph = CountingGraph { bound: 100 };
        let result = a_star(&graph, 0, |&n| n == 7, |&n| 7usize.saturating_sub(n), MINUTE).unwrap();

        assert_eq!(result.cost, 7);
        assert_eq!(result.path, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn start_can_be_the_goal() {
        let graph = CountingGraph { bound: 10 };
        let result = a_star(&graph, 4, |&n| n == 4, |_| 0, MINUTE).unwrap();

        assert_eq!(result.cost, 0);
        assert_eq!(result.path, vec![4]);
    }

    #[test]
    fn unreachable_goals_report_no_path() {
        let graph = CountingGraph { bound: 5 };
        let result = a_star(&graph, 0, |&n| n == 50, |_| 0, MINUTE);
        assert_eq!(result, Err(SearchError::NoPath));
    }

    #[test]
    fn a_zero_budget_times_out() {
        let graph = CountingGraph { bound: 1_000_000 };
        let result = a_star(&graph, 0, |&n| n == 999_999, |_| 0, Duration::ZERO);
        assert_eq!(result, Err(SearchError::Timeout(Duration::ZERO)));
    }

    #[test]
    fn the_heuristic_prunes_without_losing_optimality() {
        let graph = CountingGraph { bound: 1_000 };
        let blind = a_star(&graph, 0, |&n| n == 30, |_| 0, MINUTE).unwrap();
        let informed =
            a_star(&graph, 0, |&n| n == 30, |&n| 30usize.saturating_sub(n), MINUTE).unwrap();

        assert_eq!(blind.cost, informed.cost);
    }
}
