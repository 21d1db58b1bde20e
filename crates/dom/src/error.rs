use crate::node::NodeKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{path}: non matching close tag </{name}>")]
    MismatchedEnd { path: String, name: String },

    #[error("unclosed element <{name}> at end of input")]
    Unclosed { name: String },

    #[error("malformed markup at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("invalid UTF-8 at byte {position}")]
    Utf8 { position: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("{operation} is not supported on {kind:?} nodes")]
    InvalidNodeKind {
        operation: &'static str,
        kind: NodeKind,
    },

    /// The handle was issued by another store, or its node has been removed.
    #[error("stale node handle")]
    StaleHandle,
}
