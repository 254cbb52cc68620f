use super::{AigEdge, FaninId};

/// A node id.
///
/// The constant node [`NodeKind::False`] has id 0 by convention. Also, id must be unique.
pub type NodeId = usize;

/// The closed set of node variants of an AIG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The constant low/false signal.
    False,
    /// A primary input.
    Input,
    /// A primary output, with a single fanin.
    Output,
    /// An AND gate with two fanins.
    And,
    /// A node referenced as a fanin but never defined.
    Undefined,
}

impl NodeKind {
    /// Number of fanins a live node of this kind carries.
    pub fn arity(self) -> usize {
        match self {
            NodeKind::False | NodeKind::Input | NodeKind::Undefined => 0,
            NodeKind::Output => 1,
            NodeKind::And => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::False => "CONST",
            NodeKind::Input => "PI",
            NodeKind::Output => "PO",
            NodeKind::And => "AIG",
            NodeKind::Undefined => "UNDEF",
        }
    }
}

/// Back-reference from a node to the FEC group it currently belongs to.
///
/// This is not owning anything: the group itself lives in [`FecGroups`].
///
/// [`FecGroups`]: crate::fec::FecGroups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecSlot {
    pub group: usize,
    pub index: usize,
}

/// An AIG node.
///
/// Internal note: nodes carry their fanouts with them. Only [`Aig::change`] and the
/// construction methods of [`Aig`] are allowed to touch fanins or fanouts.
///
/// [`Aig`]: super::Aig
/// [`Aig::change`]: super::Aig::change
#[derive(Debug, Clone)]
pub struct AigNode {
    id: NodeId,
    kind: NodeKind,
    line: usize,
    pub(super) fanins: Vec<AigEdge>,
    pub(super) fanouts: Vec<NodeId>,
    pub(crate) sim: u64,
    pub(crate) fec: Option<FecSlot>,
    pub(super) symbol: Option<String>,
}

impl PartialEq for AigNode {
    /// Compares identity and fanins, the same way a derived equality would if the
    /// transient fields (fanouts, simulation value, FEC slot) did not exist.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind && self.fanins == other.fanins
    }
}

impl Eq for AigNode {}

impl AigNode {
    pub(super) fn new(id: NodeId, kind: NodeKind, line: usize) -> Self {
        if id == 0 && kind != NodeKind::False {
            panic!(
                "Hey, you are trying to create a {} node with id=0. \
                Id=0 is reserved for the constant node.",
                kind.as_str()
            )
        }
        AigNode {
            id,
            kind,
            line,
            fanins: Vec::with_capacity(kind.arity()),
            fanouts: Vec::new(),
            sim: 0,
            fec: None,
            symbol: None,
        }
    }

    pub fn get_id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Line of the source file this node was declared on (0 when unknown).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_false(&self) -> bool {
        self.kind == NodeKind::False
    }

    pub fn is_input(&self) -> bool {
        self.kind == NodeKind::Input
    }

    pub fn is_output(&self) -> bool {
        self.kind == NodeKind::Output
    }

    pub fn is_and(&self) -> bool {
        self.kind == NodeKind::And
    }

    pub fn is_undefined(&self) -> bool {
        self.kind == NodeKind::Undefined
    }

    pub fn get_fanins(&self) -> &[AigEdge] {
        &self.fanins
    }

    /// Returns the requested fanin.
    ///
    /// Panics if the node has no such fanin: asking for it is a programming error.
    pub fn fanin(&self, fanin_id: FaninId) -> AigEdge {
        match self.fanins.get(fanin_id.index()) {
            Some(edge) => *edge,
            None => panic!(
                "{} node {} has no fanin {:?}",
                self.kind.as_str(),
                self.id,
                fanin_id
            ),
        }
    }

    /// Consumers of this node. A consumer using this node on both of its fanins is listed twice.
    pub fn get_fanouts(&self) -> &[NodeId] {
        &self.fanouts
    }

    /// The 64-bit simulation signature computed by the last simulation.
    pub fn sim_value(&self) -> u64 {
        self.sim
    }

    pub fn fec_slot(&self) -> Option<FecSlot> {
        self.fec
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Index of the first fanin slot pointing at `child`, if any.
    pub fn fanin_index(&self, child: NodeId) -> Option<usize> {
        self.fanins.iter().position(|edge| edge.node == child)
    }

    /// Index of the first fanout entry equal to `parent`, if any.
    pub fn fanout_index(&self, parent: NodeId) -> Option<usize> {
        self.fanouts.iter().position(|&id| id == parent)
    }
}
