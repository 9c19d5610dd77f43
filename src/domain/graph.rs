//! Directed graph over ordered node identifiers
//!
//! Provides the structural analyses used by the consistency checks and the
//! milestone timeline: reachability, minimal/maximal nodes, simple cycle
//! enumeration (Johnson), weakly connected components and a deterministic
//! topological sort (Kahn).
//!
//! Edges may name nodes that are not in the node set. Such endpoints are
//! left out of every adjacency view; they never cause an error.
//!
//! All output orders follow `N`'s `Ord`, so results are reproducible for a
//! given graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A directed graph with value-semantics nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedGraph<N: Ord> {
    nodes: BTreeSet<N>,
    edges: BTreeSet<(N, N)>,
}

impl<N: Ord> Default for DirectedGraph<N> {
    fn default() -> Self {
        Self {
            nodes: BTreeSet::new(),
            edges: BTreeSet::new(),
        }
    }
}

type Adjacency<'a, N> = BTreeMap<&'a N, BTreeSet<&'a N>>;

impl<N: Ord + Clone> DirectedGraph<N> {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a node set and an edge set
    pub fn from_parts(
        nodes: impl IntoIterator<Item = N>,
        edges: impl IntoIterator<Item = (N, N)>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            edges: edges.into_iter().collect(),
        }
    }

    /// Adds a node
    pub fn add_node(&mut self, node: N) {
        self.nodes.insert(node);
    }

    /// Adds an edge `from -> to`. Endpoints are not added to the node set.
    pub fn add_edge(&mut self, from: N, to: N) {
        self.edges.insert((from, to));
    }

    pub fn nodes(&self) -> &BTreeSet<N> {
        &self.nodes
    }

    pub fn edges(&self) -> &BTreeSet<(N, N)> {
        &self.edges
    }

    /// Returns true if the graph contains the node
    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    /// Returns the number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outgoing adjacency restricted to edges whose endpoints are both nodes
    fn adjacency(&self) -> Adjacency<'_, N> {
        let mut adj: Adjacency<'_, N> = self.nodes.iter().map(|n| (n, BTreeSet::new())).collect();
        for (from, to) in &self.edges {
            if self.nodes.contains(to) {
                if let Some(out) = adj.get_mut(from) {
                    out.insert(to);
                }
            }
        }
        adj
    }

    /// Returns the direct successors of a node
    pub fn successors(&self, node: &N) -> Vec<N> {
        if !self.nodes.contains(node) {
            return vec![];
        }
        self.edges
            .iter()
            .filter(|(from, to)| from == node && self.nodes.contains(to))
            .map(|(_, to)| to.clone())
            .collect()
    }

    /// Returns every node reachable from `node` through one or more edges
    ///
    /// `node` itself is only included when it lies on a cycle.
    pub fn descendants(&self, node: &N) -> BTreeSet<N> {
        let adj = self.adjacency();
        let mut seen: BTreeSet<&N> = BTreeSet::new();
        let mut stack: Vec<&N> = match adj.get(node) {
            Some(out) => out.iter().copied().collect(),
            None => return BTreeSet::new(),
        };

        while let Some(current) = stack.pop() {
            if seen.insert(current) {
                if let Some(out) = adj.get(current) {
                    stack.extend(out.iter().copied().filter(|n| !seen.contains(*n)));
                }
            }
        }

        seen.into_iter().cloned().collect()
    }

    /// Returns the subgraph induced by the given nodes
    ///
    /// Library API for callers that slice a model; the `pfd` commands work
    /// on whole graphs.
    pub fn induced(&self, keep: &BTreeSet<N>) -> Self {
        Self {
            nodes: self.nodes.intersection(keep).cloned().collect(),
            edges: self
                .edges
                .iter()
                .filter(|(from, to)| keep.contains(from) && keep.contains(to))
                .cloned()
                .collect(),
        }
    }

    /// Returns true if `dst` can be reached from `src`
    ///
    /// A member node always reaches itself. Nodes outside the node set
    /// reach nothing and are reached by nothing.
    pub fn is_reachable(&self, src: &N, dst: &N) -> bool {
        if !self.nodes.contains(src) || !self.nodes.contains(dst) {
            return false;
        }
        if src == dst {
            return true;
        }

        let adj = self.adjacency();
        let mut visited: BTreeSet<&N> = BTreeSet::new();
        let mut stack = vec![src];

        while let Some(current) = stack.pop() {
            if current == dst {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(out) = adj.get(current) {
                stack.extend(out.iter().copied().filter(|n| !visited.contains(*n)));
            }
        }

        false
    }

    /// Nodes with no incoming edges
    pub fn minimals(&self) -> BTreeSet<N> {
        let mut eligible: BTreeMap<&N, bool> = self.nodes.iter().map(|n| (n, true)).collect();
        for (_, to) in &self.edges {
            if let Some(flag) = eligible.get_mut(to) {
                *flag = false;
            }
        }
        collect_flagged(eligible)
    }

    /// Nodes with no outgoing edges
    pub fn maximals(&self) -> BTreeSet<N> {
        let mut eligible: BTreeMap<&N, bool> = self.nodes.iter().map(|n| (n, true)).collect();
        for (from, _) in &self.edges {
            if let Some(flag) = eligible.get_mut(from) {
                *flag = false;
            }
        }
        collect_flagged(eligible)
    }

    /// Enumerates every simple cycle (Johnson's algorithm)
    ///
    /// Each cycle starts at its smallest node. Cycles are sorted by length,
    /// then by node sequence. A self loop is a cycle of length one.
    pub fn cycles(&self) -> Vec<Vec<N>> {
        let adj = self.adjacency();
        let mut cycles = Vec::new();

        for start in &self.nodes {
            let mut search = CircuitSearch::new(&adj, start);
            search.circuit(start);
            cycles.append(&mut search.found);
        }

        cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        log::debug!("found {} simple cycle(s) in {} node(s)", cycles.len(), self.nodes.len());
        cycles
    }

    /// Partitions the nodes into weakly connected components
    ///
    /// Components are returned in order of their smallest node.
    pub fn weakly_connected_components(&self) -> Vec<BTreeSet<N>> {
        let mut undirected: Adjacency<'_, N> =
            self.nodes.iter().map(|n| (n, BTreeSet::new())).collect();
        for (from, to) in &self.edges {
            if self.nodes.contains(from) && self.nodes.contains(to) {
                undirected.entry(from).or_default().insert(to);
                undirected.entry(to).or_default().insert(from);
            }
        }

        let mut visited: BTreeSet<&N> = BTreeSet::new();
        let mut components = Vec::new();

        for root in &self.nodes {
            if visited.contains(root) {
                continue;
            }

            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([root]);
            visited.insert(root);

            while let Some(current) = queue.pop_front() {
                component.insert(current.clone());
                for next in &undirected[current] {
                    if visited.insert(*next) {
                        queue.push_back(*next);
                    }
                }
            }

            components.push(component);
        }

        components
    }

    /// Returns all nodes in topological order (Kahn's algorithm)
    ///
    /// Among nodes that become ready at the same time the smallest is
    /// emitted first, so the order is unique for a given graph. Returns
    /// `None` if the graph has a cycle.
    pub fn topological_sort(&self) -> Option<Vec<N>> {
        let adj = self.adjacency();

        let mut in_degree: BTreeMap<&N, usize> = self.nodes.iter().map(|n| (n, 0)).collect();
        for out in adj.values() {
            for to in out {
                if let Some(d) = in_degree.get_mut(to) {
                    *d += 1;
                }
            }
        }

        // Sorted ascending; the front is always the next node to emit.
        let mut ready: Vec<&N> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while !ready.is_empty() {
            let current = ready.remove(0);
            order.push(current.clone());

            for next in &adj[current] {
                if let Some(d) = in_degree.get_mut(next) {
                    *d -= 1;
                    if *d == 0 {
                        let pos = ready.binary_search(next).unwrap_or_else(|p| p);
                        ready.insert(pos, *next);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Some(order)
        } else {
            log::debug!(
                "topological sort stopped after {} of {} node(s): graph has a cycle",
                order.len(),
                self.nodes.len()
            );
            None
        }
    }
}

fn collect_flagged<N: Clone>(flags: BTreeMap<&N, bool>) -> BTreeSet<N>
where
    N: Ord,
{
    flags
        .into_iter()
        .filter(|(_, eligible)| *eligible)
        .map(|(n, _)| n.clone())
        .collect()
}

/// State of one Johnson circuit search rooted at `start`
///
/// Only nodes `>= start` are explored, so each cycle is discovered exactly
/// once: from its smallest node.
struct CircuitSearch<'a, N: Ord> {
    adj: &'a Adjacency<'a, N>,
    start: &'a N,
    blocked: BTreeSet<&'a N>,
    back: BTreeMap<&'a N, BTreeSet<&'a N>>,
    stack: Vec<&'a N>,
    found: Vec<Vec<N>>,
}

impl<'a, N: Ord + Clone> CircuitSearch<'a, N> {
    fn new(adj: &'a Adjacency<'a, N>, start: &'a N) -> Self {
        Self {
            adj,
            start,
            blocked: BTreeSet::new(),
            back: BTreeMap::new(),
            stack: Vec::new(),
            found: Vec::new(),
        }
    }

    fn circuit(&mut self, v: &'a N) -> bool {
        let mut closed = false;
        self.stack.push(v);
        self.blocked.insert(v);

        let adj = self.adj;
        let start = self.start;
        let next: Vec<&'a N> = adj
            .get(v)
            .into_iter()
            .flat_map(|out| out.iter().copied())
            .filter(|w| *w >= start)
            .collect();

        for &w in &next {
            if w == start {
                self.found.push(self.stack.iter().map(|n| (*n).clone()).collect());
                closed = true;
            } else if !self.blocked.contains(w) && self.circuit(w) {
                closed = true;
            }
        }

        if closed {
            self.unblock(v);
        } else {
            for w in next {
                self.back.entry(w).or_default().insert(v);
            }
        }

        self.stack.pop();
        closed
    }

    fn unblock(&mut self, u: &'a N) {
        self.blocked.remove(u);
        if let Some(waiting) = self.back.remove(u) {
            for w in waiting {
                if self.blocked.contains(w) {
                    self.unblock(w);
                }
            }
        }
    }
}
