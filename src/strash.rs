//! Structural hashing: merges AND gates computing the same function of the same fanins.

use std::collections::HashMap;

use log::info;

use crate::{Aig, AigEdge, FaninId, NodeId};

impl Aig {
    /// Merges every AND gate into the first gate of the evaluation order with the same
    /// `(fanin0, fanin1)` edges (inversions included).
    ///
    /// The evaluation order is walked fanins first, so a gate is hashed once its fanins have
    /// already been merged. The order is rebuilt at the end. Returns the number of merges.
    pub fn strash(&mut self) -> usize {
        let mut table: HashMap<(AigEdge, AigEdge), NodeId> = HashMap::with_capacity(self.num_ands());
        let mut merges = 0;
        for k in 0..self.dfs_list().len() {
            let id = self.dfs_list()[k];
            let node = self.node(id);
            if !node.is_and() {
                continue;
            }
            let key = (node.fanin(FaninId::Fanin0), node.fanin(FaninId::Fanin1));
            match table.get(&key) {
                Some(&rep) => {
                    info!("Strashing: {} merging {}...", rep, id);
                    self.replace_node(id, rep, false);
                    merges += 1;
                }
                None => {
                    table.insert(key, id);
                }
            }
        }
        self.rebuild_dfs();
        merges
    }
}
