use thiserror::Error;

use super::NodeId;

/// The result of an AIG operation.
pub type Result<T> = std::result::Result<T, AigError>;

/// Error returned when an AIG operation failed.
#[derive(Debug, Error)]
pub enum AigError {
    /// A different node with the given id already exists.
    #[error("a different node with id={0} already exists")]
    DuplicateId(NodeId),

    /// The id 0 is reserved for the `False` constant node only.
    #[error("id=0 is for node False only")]
    IdZeroButNotFalse,

    /// The node with given id does not exist.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// The AIG has reached an invalid state. This should never happen.
    /// For example, node `a` lists `b` as a fanout but `b` does not use `a` as a fanin.
    #[error("the AIG has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),

    /// The SAT oracle failed to give a verdict.
    #[error("SAT oracle failure: {0}")]
    Oracle(String),

    /// Writing a netlist or a simulation log failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Just forwarding a [`ParserError`].
    #[error("{0}")]
    ParserError(#[from] ParserError),

    /// Just forwarding a [`PatternError`].
    #[error("{0}")]
    PatternError(#[from] PatternError),
}

/// Error returned when parsing from file failed.
///
/// It is defined here because the `parser` module is private.
#[derive(Debug, Error)]
pub enum ParserError {
    /// All features are not supported (only the basics in fact).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Invalid token, something else was expected.
    #[error("line {line}: invalid token: {msg}")]
    InvalidToken { line: usize, msg: String },

    /// An IO error occured (file doesn't exist, or doesn't have the right extension, ...).
    #[error("io error: {0}")]
    IoError(String),
}

/// Error returned when user supplied simulation patterns are malformed.
///
/// The patterns simulated before the offending one are kept: `simulated` tells how many.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error(
        "pattern ({pattern}) length ({len}) does not match the number of inputs ({expected}) in the circuit ({simulated} patterns simulated)"
    )]
    WidthMismatch {
        pattern: String,
        len: usize,
        expected: usize,
        simulated: usize,
    },

    #[error("pattern ({pattern}) contains a non-0/1 character ('{ch}') ({simulated} patterns simulated)")]
    IllegalCharacter {
        pattern: String,
        ch: char,
        simulated: usize,
    },
}

impl PatternError {
    /// Number of patterns that were fully simulated before the error.
    pub fn simulated(&self) -> usize {
        match self {
            PatternError::WidthMismatch { simulated, .. } => *simulated,
            PatternError::IllegalCharacter { simulated, .. } => *simulated,
        }
    }
}
