use std::collections::HashMap;

use crate::{Aig, AigError, AigNode, NodeId, NodeKind, Result};

impl Aig {
    /// Checking if the AIG structure is correct.
    /// This function was written for debug purposes, as the library is supposed to maintain
    /// integrity of the AIG at any moment:
    /// - node ids match their arena slot, and only slot 0 holds (and always holds) `False`
    /// - outputs have one fanin, and gates two
    /// - fanins refer to live nodes, and every fanin is mirrored by exactly one fanout entry
    /// - the input and output lists only refer to live nodes of the right kind
    /// - the gate counter is accurate
    /// - the graph is acyclic.
    pub fn check_integrity(&self) -> Result<()> {
        match self.get_node(0) {
            Some(node) if node.is_false() => (),
            _ => return Err(AigError::IdZeroButNotFalse),
        }

        let mut num_ands = 0;
        for (id, slot) in self.nodes.iter().enumerate() {
            if let Some(node) = slot {
                if node.get_id() != id {
                    return Err(AigError::InvalidState(format!(
                        "incoherent node id: {} stored in slot {}",
                        node.get_id(),
                        id
                    )));
                }
                if node.is_false() && id != 0 {
                    return Err(AigError::InvalidState(format!(
                        "node {} is a second constant node",
                        id
                    )));
                }
                if node.is_and() {
                    num_ands += 1;
                }
                self.check_node_integrity(node)?;
            }
        }

        if num_ands != self.num_ands {
            return Err(AigError::InvalidState(format!(
                "{} gates are counted but {} are live",
                self.num_ands, num_ands
            )));
        }

        for (list, kind) in [(&self.inputs, NodeKind::Input), (&self.outputs, NodeKind::Output)] {
            for &id in list {
                match self.get_node(id) {
                    Some(node) if node.kind() == kind => (),
                    _ => {
                        return Err(AigError::InvalidState(format!(
                            "{} list refers to node {} which is not a live {}",
                            kind.as_str(),
                            id,
                            kind.as_str()
                        )));
                    }
                }
            }
        }

        self.check_acyclic()
    }

    /// Check the integrity for an individual node, that is:
    /// - its number of fanins matches its kind
    /// - its fanins are live nodes, listing it as a fanout as many times as it uses them
    /// - its fanouts are live nodes, using it as many times as it lists them.
    fn check_node_integrity(&self, node: &AigNode) -> Result<()> {
        let id = node.get_id();
        if node.fanins.len() != node.kind().arity() {
            return Err(AigError::InvalidState(format!(
                "{} node {} has {} fanins",
                node.kind().as_str(),
                id,
                node.fanins.len()
            )));
        }

        for edge in &node.fanins {
            let driver = self.get_node(edge.node).ok_or(AigError::InvalidState(format!(
                "node {} has a fanin pointing at node {} which is not in the AIG anymore",
                id, edge.node
            )))?;
            let used = node.fanins.iter().filter(|e| e.node == edge.node).count();
            let listed = driver.fanouts.iter().filter(|&&f| f == id).count();
            if used != listed {
                return Err(AigError::InvalidState(format!(
                    "node {} uses {} {} time(s) but is listed {} time(s) as its fanout",
                    id, edge.node, used, listed
                )));
            }
        }

        for &consumer in &node.fanouts {
            if self.get_node(consumer).is_none() {
                return Err(AigError::InvalidState(format!(
                    "fanout {} of node {} is no longer in the AIG",
                    consumer, id
                )));
            }
            // Multiplicities are checked from the consumer side.
            if self.node(consumer).fanin_index(id).is_none() {
                return Err(AigError::InvalidState(format!(
                    "node {} lists {} as a fanout but it is not one of its fanins",
                    id, consumer
                )));
            }
        }
        Ok(())
    }

    /// Kahn's algorithm over the whole arena.
    fn check_acyclic(&self) -> Result<()> {
        let mut pending: HashMap<NodeId, usize> = HashMap::new();
        let mut ready = Vec::new();
        for node in self.iter_nodes() {
            if node.fanins.is_empty() {
                ready.push(node.get_id());
            } else {
                pending.insert(node.get_id(), node.fanins.len());
            }
        }

        while let Some(id) = ready.pop() {
            for &consumer in &self.node(id).fanouts {
                if let Some(count) = pending.get_mut(&consumer) {
                    *count -= 1;
                    if *count == 0 {
                        pending.remove(&consumer);
                        ready.push(consumer);
                    }
                }
            }
        }

        match pending.keys().min() {
            None => Ok(()),
            Some(id) => Err(AigError::InvalidState(format!(
                "node {} is part of a combinational loop",
                id
            ))),
        }
    }

    /// Checks that the evaluation order is usable:
    /// - it only lists live, defined nodes, once each
    /// - every node appears after all of its defined fanins.
    pub fn check_dfs(&self) -> Result<()> {
        let mut position = vec![None; self.id_bound()];
        for (k, &id) in self.dfs.iter().enumerate() {
            match self.get_node(id) {
                Some(node) if !node.is_undefined() => (),
                _ => {
                    return Err(AigError::InvalidState(format!(
                        "evaluation order lists node {} which is not a defined node",
                        id
                    )));
                }
            }
            if position[id].is_some() {
                return Err(AigError::InvalidState(format!(
                    "evaluation order lists node {} twice",
                    id
                )));
            }
            position[id] = Some(k);
        }

        for (k, &id) in self.dfs.iter().enumerate() {
            for edge in &self.node(id).fanins {
                if self.node(edge.node).is_undefined() {
                    continue;
                }
                match position[edge.node] {
                    Some(p) if p < k => (),
                    _ => {
                        return Err(AigError::InvalidState(format!(
                            "node {} is evaluated before its fanin {}",
                            id, edge.node
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{Aig, AigEdge, AigError};

    #[test]
    fn valid_graph() {
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_input(2, 2).unwrap();
        aig.add_and(3, AigEdge::new(1, false), AigEdge::new(2, true), 3)
            .unwrap();
        aig.add_output(4, AigEdge::new(3, false), 4).unwrap();
        aig.rebuild_dfs();
        assert!(aig.check_integrity().is_ok());
        assert!(aig.check_dfs().is_ok());
    }

    #[test]
    fn cycle_is_detected() {
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_and(2, AigEdge::new(3, false), AigEdge::new(1, false), 2)
            .unwrap();
        aig.add_and(3, AigEdge::new(2, false), AigEdge::new(1, true), 3)
            .unwrap();
        assert!(matches!(
            aig.check_integrity(),
            Err(AigError::InvalidState(_))
        ));
    }

    #[test]
    fn broken_fanout_is_detected() {
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_and(2, AigEdge::new(1, false), AigEdge::new(1, true), 2)
            .unwrap();
        aig.node_mut(1).fanouts.pop();
        assert!(matches!(
            aig.check_integrity(),
            Err(AigError::InvalidState(_))
        ));
    }

    #[test]
    fn stale_dfs_is_detected() {
        let mut aig = Aig::new();
        aig.add_input(1, 1).unwrap();
        aig.add_and(2, AigEdge::new(1, false), AigEdge::new(1, true), 2)
            .unwrap();
        aig.add_output(3, AigEdge::new(2, false), 3).unwrap();
        aig.rebuild_dfs();
        aig.replace_node(2, 0, false);
        assert!(aig.check_integrity().is_ok());
        assert!(aig.check_dfs().is_err());
        aig.rebuild_dfs();
        assert!(aig.check_dfs().is_ok());
        assert_eq!(aig.dfs_list(), &[0, 3]);
    }
}
