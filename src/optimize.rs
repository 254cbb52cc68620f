//! Local rewrites (constant propagation, trivial gates) and dead logic removal.

use log::info;

use crate::{Aig, AigEdge, FaninId, NodeId};

impl Aig {
    /// What `id` (an AND gate) trivially simplifies to, if anything:
    /// - a constant fanin first: `1 & x = x` and `0 & x = 0`
    /// - then identical fanin nodes: `x & x = x` and `x & !x = 0`.
    fn simplified(&self, id: NodeId) -> Option<AigEdge> {
        let node = self.node(id);
        for fanin_id in [FaninId::Fanin0, FaninId::Fanin1] {
            let fanin = node.fanin(fanin_id);
            if fanin.is_cst_true() {
                return Some(node.fanin(fanin_id.other()));
            }
            if fanin.is_cst_false() {
                return Some(AigEdge::new(0, false));
            }
        }
        let (f0, f1) = (node.fanin(FaninId::Fanin0), node.fanin(FaninId::Fanin1));
        if f0 == f1 {
            return Some(f0);
        }
        if f0.is_complement_of(&f1) {
            return Some(AigEdge::new(0, false));
        }
        None
    }

    /// Collapses trivial AND gates in a single pass over the evaluation order.
    ///
    /// Consumers are examined with their current fanins, so a collapse propagates to the gates
    /// further in the order within the same pass. The order is rebuilt at the end.
    /// Returns the number of collapsed gates.
    pub fn optimize(&mut self) -> usize {
        let mut collapses = 0;
        for k in 0..self.dfs_list().len() {
            let id = self.dfs_list()[k];
            if !self.node(id).is_and() {
                continue;
            }
            if let Some(replacement) = self.simplified(id) {
                info!(
                    "Simplifying: {} merging {}{}...",
                    replacement.get_node_id(),
                    if replacement.get_complement() { "!" } else { "" },
                    id
                );
                self.change(id, Some(replacement));
                collapses += 1;
            }
        }
        self.rebuild_dfs();
        collapses
    }

    /// Deletes the AND gates and undefined nodes that are not reachable from any output.
    ///
    /// Reachability is the one of the last [`Aig::rebuild_dfs`], which is left untouched.
    /// Returns the number of deleted nodes.
    pub fn sweep(&mut self) -> usize {
        let mut removed = 0;
        for id in 1..self.id_bound() {
            let Some(node) = self.get_node(id) else {
                continue;
            };
            if self.in_dfs(id) || !(node.is_and() || node.is_undefined()) {
                continue;
            }
            info!("Sweeping: {}({}) removed...", node.kind().as_str(), id);
            self.delete_node(id);
            removed += 1;
        }
        removed
    }
}
