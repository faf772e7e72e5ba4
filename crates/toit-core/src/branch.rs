//! Branch (undirected edge) between two scene nodes

use crate::node::NodeId;

/// A semantic link between exactly two nodes.
///
/// Endpoints are handles into the owning graph, not owning references; the
/// graph prunes a branch as soon as either endpoint is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Branch {
    pub start: NodeId,
    pub end: NodeId,
}

impl Branch {
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }

    /// True if `node` is either endpoint.
    pub fn is_connected_to(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }

    /// True if this branch joins `a` and `b` in either direction.
    pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.start == node {
            Some(self.end)
        } else if self.end == node {
            Some(self.start)
        } else {
            None
        }
    }
}
