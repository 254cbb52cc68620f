//! Provides a DFS visitor yielding nodes in evaluation order.
//!
//! See [`Dfs`] for details.
//!
//! [`Dfs`]: Dfs

use crate::{Aig, NodeId};

/// A post-order DFS visitor.
///
/// Nodes are yielded once all their fanins have been yielded, siblings being explored in
/// fanin order. A DFS created with [`from_outputs`] starts by the fanin cone of the first output,
/// then explore all non-previously-explored nodes from the cone of the second output,
/// and so on until all the outputs have been processed.
///
/// Undefined nodes are marked as visited but never yielded: they do not compute anything.
///
/// [`from_outputs`]: Dfs::from_outputs
///
/// Example:
///
/// ```rust
/// use fraigr::{Aig, AigEdge, dfs::Dfs};
/// let mut aig = Aig::new();
/// aig.add_input(1, 0).unwrap();
/// aig.add_output(2, AigEdge::new(1, true), 0).unwrap();
/// let mut dfs = Dfs::from_outputs(&aig);
/// assert_eq!(dfs.next(&aig), Some(1));
/// assert_eq!(dfs.next(&aig), Some(2));
/// assert_eq!(dfs.next(&aig), None);
/// ```
///
/// Inspired by [petgraph DFS](https://docs.rs/petgraph/latest/petgraph/visit/struct.Dfs.html).
pub struct Dfs {
    /// Must maintain the following invariant:
    /// - nodes on the stack are defined and have their `seen` flag set
    /// - the `usize` is the index of the next fanin to explore
    /// - the different outputs from which to start a DFS are in starts, in reverse order
    ///   (they might have been visited already by the time we start the DFS from them,
    ///   and will simply be discarded if that's the case).
    stack: Vec<(NodeId, usize)>,
    seen: Vec<bool>,
    starts: Vec<NodeId>,
}

impl Dfs {
    /// Create a DFS from the outputs of the given AIG.
    pub fn from_outputs(aig: &Aig) -> Self {
        Dfs {
            stack: Vec::new(),
            seen: vec![false; aig.id_bound()],
            starts: aig.get_outputs().iter().rev().copied().collect(),
        }
    }

    /// Marks `id` as seen, and pushes it on the stack if it computes something.
    fn discover(&mut self, aig: &Aig, id: NodeId) {
        self.seen[id] = true;
        if !aig.node(id).is_undefined() {
            self.stack.push((id, 0));
        }
    }

    /// Yield the next node of the DFS, or None if it is done.
    pub fn next(&mut self, aig: &Aig) -> Option<NodeId> {
        loop {
            if let Some(&(id, next_fanin)) = self.stack.last() {
                let fanins = aig.node(id).get_fanins();
                if next_fanin < fanins.len() {
                    let child = fanins[next_fanin].get_node_id();
                    if let Some(top) = self.stack.last_mut() {
                        top.1 += 1;
                    }
                    if !self.seen[child] {
                        self.discover(aig, child);
                    }
                } else {
                    self.stack.pop();
                    return Some(id);
                }
            } else {
                // Maybe we can start from a different output?
                let start = self.starts.pop()?;
                if !self.seen[start] {
                    self.discover(aig, start);
                }
            }
        }
    }
}

impl Aig {
    /// Recomputes the evaluation order from scratch, rooted at the primary outputs.
    pub fn rebuild_dfs(&mut self) {
        let mut dfs = Dfs::from_outputs(self);
        let mut order = Vec::with_capacity(self.dfs.len());
        while let Some(id) = dfs.next(self) {
            order.push(id);
        }
        self.dfs = order;
        self.in_dfs = dfs.seen;
    }
}
