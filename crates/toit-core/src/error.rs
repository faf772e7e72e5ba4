//! Error types for scene graph and transform operations

use thiserror::Error;

use crate::node::NodeId;

/// Errors produced by math, scene node and scene graph operations.
///
/// All variants are recoverable: the same call with the same inputs fails the
/// same way, so callers typically log and skip (e.g. drop a pick for a frame).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// Degenerate geometric input or a rejected argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A matrix that must be inverted is singular
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),

    /// Attaching `child` under `parent` would make a node its own ancestor
    #[error("Attaching {child} under {parent} would create a cycle")]
    CycleError { parent: NodeId, child: NodeId },

    /// No node with this id is in the graph
    #[error("Node not found: {0}")]
    NotFound(NodeId),
}

impl SceneError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result alias used throughout the crate
pub type SceneResult<T> = Result<T, SceneError>;
