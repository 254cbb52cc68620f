//! Module defining the [`Aig`] struct, as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! The graph is an arena of nodes indexed by their id. Fanins are the owning, forward edges;
//! fanouts are plain id back-references kept consistent by [`Aig::change`], the only
//! operation allowed to rewire an existing graph.
//!
//! To start optimizing a circuit, check [`crate::circuit::Circuit`].

pub mod dfs;
pub mod edge;
pub mod error;
mod integrity;
pub mod node;
mod parser;
mod surgery;

pub use edge::{AigEdge, FaninId};
pub use error::{AigError, ParserError, PatternError, Result};
pub use node::{AigNode, FecSlot, NodeId, NodeKind};

/// A whole combinational AIG.
///
/// Nodes live in an arena indexed by [`NodeId`]; slot 0 always holds the constant node.
/// Nodes are only ever created through the construction methods ([`add_input`], [`add_and`],
/// [`add_output`]) and only ever destroyed through [`change`].
///
/// Fanins may reference ids that are not defined yet: a placeholder [`NodeKind::Undefined`] node
/// is created, and upgraded in place if the id gets defined later on. Placeholders that are still
/// there once construction is over represent dangling references.
///
/// [`add_input`]: Aig::add_input
/// [`add_and`]: Aig::add_and
/// [`add_output`]: Aig::add_output
/// [`change`]: Aig::change
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<Option<AigNode>>,
    /// Primary inputs in declaration order.
    inputs: Vec<NodeId>,
    /// Primary outputs in declaration order.
    outputs: Vec<NodeId>,
    /// The evaluation order, see [`Aig::rebuild_dfs`].
    dfs: Vec<NodeId>,
    /// `in_dfs[id]` is set if `id` was reached by the last DFS (undefined nodes included).
    in_dfs: Vec<bool>,
    num_ands: usize,
    /// Maximum variable index as declared by the source (`M` in an AIGER header).
    max_var: usize,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Create a brand new AIG (constant node [`NodeKind::False`] included).
    pub fn new() -> Self {
        Aig {
            nodes: vec![Some(AigNode::new(0, NodeKind::False, 0))],
            inputs: Vec::new(),
            outputs: Vec::new(),
            dfs: Vec::new(),
            in_dfs: Vec::new(),
            num_ands: 0,
            max_var: 0,
        }
    }

    /// Retrieves a node from its id.
    pub fn get_node(&self, id: NodeId) -> Option<&AigNode> {
        self.nodes.get(id)?.as_ref()
    }

    /// Retrieves a node which is known to exist.
    ///
    /// Panics otherwise: referencing a deleted node is a programming error.
    pub fn node(&self, id: NodeId) -> &AigNode {
        match self.get_node(id) {
            Some(node) => node,
            None => panic!("node {} is not part of the AIG", id),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut AigNode {
        match self.nodes.get_mut(id).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("node {} is not part of the AIG", id),
        }
    }

    /// Iterates over all live nodes, by increasing id.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &AigNode> {
        self.nodes.iter().flatten()
    }

    /// One more than the largest id ever allocated. Handy to size per-node side tables.
    pub fn id_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Primary inputs ids, in declaration order.
    pub fn get_inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Primary outputs ids, in declaration order.
    pub fn get_outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of live AND gates (reachable or not).
    pub fn num_ands(&self) -> usize {
        self.num_ands
    }

    pub fn max_var(&self) -> usize {
        self.max_var
    }

    pub fn set_max_var(&mut self, max_var: usize) {
        self.max_var = max_var;
    }

    /// The current evaluation order. It is only refreshed by [`Aig::rebuild_dfs`].
    pub fn dfs_list(&self) -> &[NodeId] {
        &self.dfs
    }

    /// Was `id` reached by the last DFS?
    pub fn in_dfs(&self, id: NodeId) -> bool {
        self.in_dfs.get(id).copied().unwrap_or(false)
    }

    /// Position of `b` in the fanouts of `a`, if `b` consumes `a`.
    pub fn fanout_index(&self, a: NodeId, b: NodeId) -> Option<usize> {
        self.get_node(a)?.fanout_index(b)
    }

    /// Position of `b` in the fanins of `a`, if `a` consumes `b`.
    pub fn fanin_index(&self, a: NodeId, b: NodeId) -> Option<usize> {
        self.get_node(a)?.fanin_index(b)
    }

    /// Value of an edge under the last simulation (the node signature, complemented if needed).
    pub fn edge_value(&self, edge: AigEdge) -> u64 {
        let value = self.node(edge.node).sim;
        if edge.complement { !value } else { value }
    }

    pub fn set_symbol(&mut self, id: NodeId, symbol: impl Into<String>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(AigError::NodeDoesNotExist(id))?;
        node.symbol = Some(symbol.into());
        Ok(())
    }

    /// Reserve the slot `id` for a node of the given kind.
    ///
    /// An existing [`NodeKind::Undefined`] placeholder is upgraded in place, keeping its fanouts.
    fn define(&mut self, id: NodeId, kind: NodeKind, line: usize) -> Result<()> {
        if id == 0 {
            return Err(AigError::IdZeroButNotFalse);
        }
        if id >= self.nodes.len() {
            self.nodes.resize_with(id + 1, || None);
        }
        let slot = &mut self.nodes[id];
        match slot {
            None => {
                *slot = Some(AigNode::new(id, kind, line));
            }
            Some(node) if node.is_undefined() => {
                let fanouts = std::mem::take(&mut node.fanouts);
                let mut defined = AigNode::new(id, kind, line);
                defined.fanouts = fanouts;
                *node = defined;
            }
            Some(_) => return Err(AigError::DuplicateId(id)),
        }
        self.max_var = self.max_var.max(id);
        Ok(())
    }

    /// Attach a fanin to `id`, registering `id` as a fanout of the driver.
    /// Drivers that do not exist yet get an undefined placeholder.
    fn connect(&mut self, id: NodeId, fanin: AigEdge) {
        let driver = fanin.node;
        if driver >= self.nodes.len() {
            self.nodes.resize_with(driver + 1, || None);
        }
        if self.nodes[driver].is_none() {
            self.nodes[driver] = Some(AigNode::new(driver, NodeKind::Undefined, 0));
        }
        self.node_mut(driver).fanouts.push(id);
        self.node_mut(id).fanins.push(fanin);
    }

    /// Declare a primary input.
    pub fn add_input(&mut self, id: NodeId, line: usize) -> Result<()> {
        self.define(id, NodeKind::Input, line)?;
        self.inputs.push(id);
        Ok(())
    }

    /// Declare an AND gate. Fanins may refer to nodes declared later on.
    pub fn add_and(
        &mut self,
        id: NodeId,
        fanin0: AigEdge,
        fanin1: AigEdge,
        line: usize,
    ) -> Result<()> {
        self.define(id, NodeKind::And, line)?;
        self.connect(id, fanin0);
        self.connect(id, fanin1);
        self.num_ands += 1;
        Ok(())
    }

    /// Declare a primary output node driven by `fanin`.
    pub fn add_output(&mut self, id: NodeId, fanin: AigEdge, line: usize) -> Result<()> {
        self.define(id, NodeKind::Output, line)?;
        self.connect(id, fanin);
        self.outputs.push(id);
        Ok(())
    }
}

impl PartialEq for Aig {
    /// Compares the two AIGs. They are equal iff:
    /// - their inputs are equal (same ids, same order)
    /// - their outputs are equal
    /// - their live nodes are equal (same ids, kinds and fanins).
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.iter_nodes().eq(other.iter_nodes())
    }
}
