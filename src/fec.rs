//! Functionally equivalent candidate (FEC) groups.
//!
//! A FEC group gathers nodes whose simulation signatures have agreed on every pattern so far.
//! Groups are refined after each simulated word, and shrink as the FRAIG loop proves or refutes
//! their members. [`FecGroups`] owns the groups; each member node only keeps a [`FecSlot`]
//! back-reference `(group, index)`, rewritten by [`FecGroups::relink`].
//!
//! Ordering is part of the contract: members of a group are sorted by id (so the constant node,
//! when present, is the representative at position 0), and groups are sorted by their first
//! member. This makes reports and FRAIG proposals deterministic.

use std::collections::HashMap;

use log::info;

use crate::{Aig, FecSlot, NodeId};

#[derive(Debug, Clone, Default)]
pub struct FecGroups {
    groups: Vec<Vec<NodeId>>,
    /// Set once the universal group has been created.
    /// The partition must never be re-seeded after it dissolved entirely.
    seeded: bool,
}

impl FecGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[NodeId]> {
        self.groups.iter().map(Vec::as_slice)
    }

    /// The `index`-th group. Panics if there is no such group.
    pub fn group(&self, index: usize) -> &[NodeId] {
        &self.groups[index]
    }

    /// Has a partition been seeded since the last [`FecGroups::clear`]?
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Creates the universal candidate group: the constant node and every AND gate of the
    /// current evaluation order, sorted by id.
    ///
    /// Back-references are only set by the following refinement.
    pub fn seed(&mut self, aig: &Aig) {
        let mut universal = vec![0];
        universal.extend(
            aig.dfs_list()
                .iter()
                .copied()
                .filter(|&id| aig.node(id).is_and()),
        );
        universal.sort_unstable();
        universal.dedup();
        self.groups = vec![universal];
        self.seeded = true;
    }

    /// Splits every group by exact signature equality, using the values of the last simulation.
    ///
    /// Seeds the universal group first if needed. Resulting singletons are dissolved,
    /// groups are then sorted by their first member and back-references rewritten.
    /// Returns the new number of groups.
    pub fn refine(&mut self, aig: &mut Aig) -> usize {
        if !self.seeded {
            self.seed(aig);
        }

        let mut refined: Vec<Vec<NodeId>> = Vec::with_capacity(self.groups.len());
        for group in self.groups.drain(..) {
            let mut by_signature: HashMap<u64, usize> = HashMap::new();
            let mut parts: Vec<Vec<NodeId>> = Vec::new();
            for id in group {
                let node = aig.node_mut(id);
                node.fec = None;
                match by_signature.get(&node.sim) {
                    Some(&k) => parts[k].push(id),
                    None => {
                        by_signature.insert(node.sim, parts.len());
                        parts.push(vec![id]);
                    }
                }
            }
            refined.extend(parts.into_iter().filter(|part| part.len() >= 2));
        }

        refined.sort_by_key(|group| group[0]);
        self.groups = refined;
        self.relink(aig);
        self.groups.len()
    }

    /// Rewrites the back-reference of every member.
    pub fn relink(&self, aig: &mut Aig) {
        for (g, group) in self.groups.iter().enumerate() {
            for (index, &id) in group.iter().enumerate() {
                aig.node_mut(id).fec = Some(FecSlot { group: g, index });
            }
        }
    }

    /// Takes `id` out of its group (if any), shifting the indices of the following members.
    ///
    /// The group itself is kept even if it drops below two members, call
    /// [`FecGroups::drop_small`] once done so that group indices stay valid meanwhile.
    pub fn remove_member(&mut self, aig: &mut Aig, id: NodeId) {
        let Some(slot) = aig.node(id).fec else {
            return;
        };
        aig.node_mut(id).fec = None;
        let group = &mut self.groups[slot.group];
        assert_eq!(
            group.get(slot.index),
            Some(&id),
            "stale FEC back-reference for node {}",
            id
        );
        group.remove(slot.index);
        for (index, &member) in group.iter().enumerate().skip(slot.index) {
            aig.node_mut(member).fec = Some(FecSlot {
                group: slot.group,
                index,
            });
        }
    }

    /// Dissolves the groups with less than two members.
    pub fn drop_small(&mut self, aig: &mut Aig) {
        for group in self.groups.iter().filter(|group| group.len() < 2) {
            for &id in group {
                if aig.get_node(id).is_some() {
                    aig.node_mut(id).fec = None;
                }
            }
        }
        self.groups.retain(|group| group.len() >= 2);
        self.relink(aig);
    }

    /// Forgets the members deleted by a structural pass (strash, optimize, sweep, fraig) or no
    /// longer in the evaluation order, then dissolves the groups that became too small.
    /// The constant node is always kept.
    pub fn prune(&mut self, aig: &mut Aig) {
        let before = self.groups.len();
        for group in self.groups.iter_mut() {
            group.retain(|&id| id == 0 || (aig.get_node(id).is_some() && aig.in_dfs(id)));
        }
        for id in 1..aig.id_bound() {
            if aig.get_node(id).is_some_and(|node| node.fec_slot().is_some()) && !aig.in_dfs(id) {
                aig.node_mut(id).fec = None;
            }
        }
        self.drop_small(aig);
        if self.groups.len() != before {
            info!("Pruning deleted nodes... Total #FEC Group = {}", self.groups.len());
        }
    }

    /// Drops every group and back-reference. The next refinement seeds a new partition.
    pub fn clear(&mut self, aig: &mut Aig) {
        for group in self.groups.drain(..) {
            for id in group {
                if aig.get_node(id).is_some() {
                    aig.node_mut(id).fec = None;
                }
            }
        }
        self.seeded = false;
    }
}
