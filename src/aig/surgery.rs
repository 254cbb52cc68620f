use super::{Aig, AigEdge, NodeId, NodeKind};

impl Aig {
    /// Deletes `del`, rewiring all of its consumers to `replacement` (if any).
    ///
    /// - `del` is detached from the fanouts of each of its fanins
    /// - with a replacement, the consumers of `del` are appended to the fanouts of the
    ///   replacement node, and their fanin slot pointing at `del` now points at the replacement,
    ///   its inversion being XOR-ed with the replacement edge complement
    /// - without a replacement, the consumers simply lose that fanin slot
    ///   (only meant to delete dead logic, see [`Aig::sweep`])
    /// - `del` is deallocated.
    ///
    /// This is the only operation rewiring an existing graph: the fanin/fanout consistency is
    /// broken and re-established within this call only.
    ///
    /// Panics if `del` is the constant node, does not exist, or if the replacement is `del`
    /// itself or one of its consumers (which would create a cycle).
    ///
    /// Note that the DFS list is not updated, call [`Aig::rebuild_dfs`] when needed.
    ///
    /// [`Aig::sweep`]: crate::Aig::sweep
    pub fn change(&mut self, del: NodeId, replacement: Option<AigEdge>) {
        assert!(del != 0, "the constant node cannot be deleted");
        let (kind, fanins, fanouts) = {
            let node = self.node(del);
            (node.kind(), node.fanins.clone(), node.fanouts.clone())
        };
        if let Some(r) = replacement {
            assert!(r.node != del, "node {} cannot replace itself", del);
            assert!(
                !fanouts.contains(&r.node),
                "node {} cannot be replaced by its consumer {}",
                del,
                r.node
            );
            // Making sure the replacement exists before touching anything.
            self.node(r.node);
        }

        // Clearing del's fanins' fanouts
        for edge in &fanins {
            let driver = self.node_mut(edge.node);
            match driver.fanout_index(del) {
                Some(index) => {
                    driver.fanouts.remove(index);
                }
                None => panic!(
                    "node {} does not list its consumer {} as a fanout",
                    edge.node, del
                ),
            }
        }

        // Adding replacement's fanouts
        if let Some(r) = replacement {
            self.node_mut(r.node).fanouts.extend_from_slice(&fanouts);
        }

        // Maintaining del's fanouts' fanins.
        // A consumer using del on both fanins is listed twice, each pass fixes one slot.
        for &consumer in &fanouts {
            let node = self.node_mut(consumer);
            let index = match node.fanin_index(del) {
                Some(index) => index,
                None => panic!("node {} does not use {} as a fanin", consumer, del),
            };
            match replacement {
                Some(r) => {
                    node.fanins[index] = r.xor(node.fanins[index].complement);
                }
                None => {
                    node.fanins.remove(index);
                }
            }
        }

        match kind {
            NodeKind::And => self.num_ands -= 1,
            NodeKind::Input => self.inputs.retain(|&id| id != del),
            NodeKind::Output => self.outputs.retain(|&id| id != del),
            _ => (),
        }
        self.nodes[del] = None;
    }

    /// Replace node `old_id` by node `id` (complemented or not) in all of its consumers,
    /// deleting `old_id`.
    pub fn replace_node(&mut self, old_id: NodeId, id: NodeId, complement: bool) {
        self.change(old_id, Some(AigEdge::new(id, complement)));
    }

    /// Deletes a node which is not used by any live logic.
    pub fn delete_node(&mut self, id: NodeId) {
        self.change(id, None);
    }
}
