pub mod aig;
pub mod circuit;
pub mod cnf;
pub mod config;
pub mod fec;
pub mod fraig;
pub mod optimize;
pub mod sim;
pub mod strash;

// Re-exporting symbols and modules.
pub use aig::dfs;
pub use aig::{
    Aig, AigEdge, AigError, AigNode, FaninId, FecSlot, NodeId, NodeKind, ParserError,
    PatternError, Result,
};
