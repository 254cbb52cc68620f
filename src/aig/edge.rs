//! An [`AigEdge`] points at an [`AigNode`] and can be complemented (indicates the presence of a NOT gate).
//!
//! [`AigNode`]: crate::AigNode

use std::ops::Not;

use super::NodeId;

/// Unambiguous fanin selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaninId {
    Fanin0,
    Fanin1,
}

impl FaninId {
    pub fn index(self) -> usize {
        match self {
            FaninId::Fanin0 => 0,
            FaninId::Fanin1 => 1,
        }
    }

    /// The other fanin of a 2-input gate.
    pub fn other(self) -> Self {
        match self {
            FaninId::Fanin0 => FaninId::Fanin1,
            FaninId::Fanin1 => FaninId::Fanin0,
        }
    }
}

/// A directed edge representing a fanin for AIG nodes.
///
/// The edge can carry an inverter according to the value of `complement`.
///
/// For example:
///
/// ```rust
/// use fraigr::AigEdge;
/// let fanin_false = AigEdge::new(0, false);
/// let fanin_true = AigEdge::new(0, true);
/// assert_eq!(fanin_false, !fanin_true);
/// assert!(fanin_true.is_cst_true());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AigEdge {
    /// The node the edge is refering to.
    pub(crate) node: NodeId,
    /// Set to true if signal should be inverted.
    pub(crate) complement: bool,
}

impl Not for AigEdge {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

impl AigEdge {
    pub fn new(node: NodeId, complement: bool) -> Self {
        AigEdge { node, complement }
    }

    /// Builds an edge from an AIGER literal (`2 * id + complement`).
    pub fn from_literal(lit: u64) -> Self {
        AigEdge {
            node: (lit >> 1) as NodeId,
            complement: lit & 1 != 0,
        }
    }

    /// The AIGER literal of this edge.
    pub fn to_literal(&self) -> u64 {
        ((self.node as u64) << 1) | self.complement as u64
    }

    pub fn get_node_id(&self) -> NodeId {
        self.node
    }

    pub fn get_complement(&self) -> bool {
        self.complement
    }

    /// Same edge with the inversion XOR-ed with `inv`.
    pub fn xor(self, inv: bool) -> Self {
        AigEdge {
            node: self.node,
            complement: self.complement ^ inv,
        }
    }

    pub fn is_cst_false(&self) -> bool {
        self.node == 0 && !self.complement
    }

    pub fn is_cst_true(&self) -> bool {
        self.node == 0 && self.complement
    }

    pub fn is_complement_of(&self, other: &AigEdge) -> bool {
        self.node == other.node && self.complement ^ other.complement
    }
}
