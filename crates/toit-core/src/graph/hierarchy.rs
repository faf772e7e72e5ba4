//! Parent/child hierarchy and world transform propagation

use glam::Vec3;

use super::SceneGraph;
use crate::error::{SceneError, SceneResult};
use crate::node::NodeId;

impl SceneGraph {
    /// Replace a node's local transform.
    ///
    /// Recomputes the local matrix, then the world matrix of the node and all
    /// of its descendants before returning.
    pub fn set_local_transform(
        &mut self,
        id: NodeId,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    ) -> SceneResult<()> {
        if !(position.is_finite() && rotation.is_finite() && scale.is_finite()) {
            return Err(SceneError::InvalidArgument(format!(
                "non-finite transform for node {id}"
            )));
        }
        self.node_mut(id)?.set_components(position, rotation, scale);
        self.propagate_from(id);
        Ok(())
    }

    /// Move a node, keeping its rotation and scale.
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> SceneResult<()> {
        let node = self.node(id)?;
        let (rotation, scale) = (node.rotation(), node.scale());
        self.set_local_transform(id, position, rotation, scale)
    }

    /// Make `child` a child of `parent`.
    ///
    /// A child that already hangs under another parent is moved. Fails with
    /// [`SceneError::CycleError`] when `child` is `parent` itself or one of its
    /// ancestors.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node(parent)?;
        let current_parent = self.node(child)?.parent;

        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::CycleError { parent, child });
        }
        if current_parent == Some(parent) {
            return Ok(());
        }

        if let Some(old) = current_parent {
            self.node_mut(old)?.children.retain(|c| *c != child);
        }
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.propagate_from(child);

        tracing::debug!("Attached {} under {}", child, parent);
        Ok(())
    }

    /// Detach `child` from `parent`, making it a root.
    ///
    /// Returns `false` if `child` was not a child of `parent`. Afterwards the
    /// detached node's world matrix equals its local matrix.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<bool> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Ok(false);
        }

        self.node_mut(parent)?.children.retain(|c| *c != child);
        self.node_mut(child)?.parent = None;
        self.propagate_from(child);

        tracing::debug!("Detached {} from {}", child, parent);
        Ok(true)
    }

    /// Nodes without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().filter(|n| n.parent().is_none()).map(|n| n.id())
    }

    /// Ancestor chain of `id`, nearest parent first.
    pub fn ancestors(&self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.node(id)?.parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.nodes.get(&p).and_then(|n| n.parent);
        }
        Ok(chain)
    }

    /// True if `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Recompute world matrices of `root` and its whole subtree.
    ///
    /// Uses an explicit stack; a parent is always refreshed before its children
    /// are visited.
    pub(crate) fn propagate_from(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let parent_world = self
                .nodes
                .get(&id)
                .and_then(|n| n.parent)
                .and_then(|p| self.nodes.get(&p))
                .map(|p| p.world_matrix());

            if let Some(node) = self.nodes.get_mut(&id) {
                node.set_world_matrix(parent_world);
                stack.extend(node.children.iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::node::SceneNode;

    fn chain(graph: &mut SceneGraph, depth: usize) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for i in 0..=depth {
            let node = SceneNode::new(Vec3::new(i as f32, 0.5 * i as f32, -(i as f32)));
            let id = node.id();
            graph.add_node(node);
            graph
                .set_local_transform(
                    id,
                    Vec3::new(1.0 + i as f32, -0.5, 0.25 * i as f32),
                    Vec3::new(0.1 * i as f32, 0.2, -0.3),
                    Vec3::splat(1.0 + 0.1 * i as f32),
                )
                .unwrap();
            if let Some(&parent) = ids.last() {
                graph.attach_child(parent, id).unwrap();
            }
            ids.push(id);
        }
        ids
    }

    fn expected_world(graph: &SceneGraph, ids: &[NodeId]) -> Mat4 {
        ids.iter()
            .fold(Mat4::IDENTITY, |acc, id| acc * graph.node(*id).unwrap().local_matrix())
    }

    #[test]
    fn test_world_matrix_matches_chain_for_depths_0_to_5() {
        for depth in 0..=5 {
            let mut graph = SceneGraph::new();
            let ids = chain(&mut graph, depth);
            let leaf = graph.node(*ids.last().unwrap()).unwrap();
            assert!(
                leaf.world_matrix().abs_diff_eq(expected_world(&graph, &ids), 1e-4),
                "depth {depth}"
            );
        }
    }

    #[test]
    fn test_parent_mutation_propagates_to_descendants() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 4);
        let leaf_local = graph.node(ids[4]).unwrap().local_matrix();

        let position = Vec3::new(10.0, 0.0, 0.0);
        let rotation = Vec3::new(0.0, 1.0, 0.0);
        graph
            .set_local_transform(ids[0], position, rotation, Vec3::ONE)
            .unwrap();

        for depth in 1..ids.len() {
            let node = graph.node(ids[depth]).unwrap();
            assert!(
                node.world_matrix()
                    .abs_diff_eq(expected_world(&graph, &ids[..=depth]), 1e-4)
            );
        }
        assert_eq!(graph.node(ids[4]).unwrap().local_matrix(), leaf_local);
    }

    #[test]
    fn test_parent_translation() {
        let mut graph = SceneGraph::new();
        let parent = SceneNode::new(Vec3::new(10.0, 0.0, 0.0));
        let child = SceneNode::new(Vec3::new(0.0, 5.0, 0.0));
        let (p, c) = (parent.id(), child.id());
        graph.add_node(parent);
        graph.add_node(child);
        graph.attach_child(p, c).unwrap();

        let world = graph.node(c).unwrap().world_position();
        assert!((world - Vec3::new(10.0, 5.0, 0.0)).length() < 1e-5);
        assert_eq!(graph.node(p).unwrap().children(), &[c]);
        assert_eq!(graph.node(c).unwrap().parent(), Some(p));
    }

    #[test]
    fn test_detach_restores_local() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 2);

        assert!(graph.detach_child(ids[0], ids[1]).unwrap());
        let node = graph.node(ids[1]).unwrap();
        assert_eq!(node.world_matrix(), node.local_matrix());
        assert!(node.parent().is_none());
        assert!(graph.node(ids[0]).unwrap().children().is_empty());

        // Grandchild now follows the detached node only
        let leaf = graph.node(ids[2]).unwrap();
        assert!(
            leaf.world_matrix()
                .abs_diff_eq(expected_world(&graph, &ids[1..]), 1e-5)
        );

        assert!(!graph.detach_child(ids[0], ids[1]).unwrap());
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 2);

        assert_eq!(
            graph.attach_child(ids[2], ids[0]).unwrap_err(),
            SceneError::CycleError { parent: ids[2], child: ids[0] }
        );
        assert!(matches!(
            graph.attach_child(ids[1], ids[1]),
            Err(SceneError::CycleError { .. })
        ));
        // Hierarchy untouched
        assert_eq!(graph.ancestors(ids[2]).unwrap(), vec![ids[1], ids[0]]);
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        let c = graph.create_node("c");
        graph.attach_child(a, c).unwrap();
        graph.attach_child(b, c).unwrap();

        assert!(graph.node(a).unwrap().children().is_empty());
        assert_eq!(graph.node(b).unwrap().children(), &[c]);
        assert_eq!(graph.roots().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_remove_parent_orphans_children() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 2);
        graph.remove_node(ids[0]);

        let child = graph.node(ids[1]).unwrap();
        assert!(child.parent().is_none());
        assert_eq!(child.world_matrix(), child.local_matrix());
    }

    #[test]
    fn test_non_finite_transform_rejected() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node("n");
        assert!(matches!(
            graph.set_position(id, Vec3::new(f32::NAN, 0.0, 0.0)),
            Err(SceneError::InvalidArgument(_))
        ));
    }
}
