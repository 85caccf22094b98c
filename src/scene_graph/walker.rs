use glam::Mat4;
use thiserror::Error;

use crate::loader::manifest::Node;
use crate::scene_graph::transform::NodeTransform;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalkError {
    #[error("Node {node} does not exist")]
    MissingNode { node: usize },

    #[error("Node {node} is its own ancestor")]
    Cycle { node: usize },

    #[error("Node {node} has more than one parent")]
    SharedNode { node: usize },

    #[error("Node {node} is nested deeper than {max_depth} levels")]
    DepthExceeded { node: usize, max_depth: usize },
}

/// A mesh reference found during the walk, with the composed transform of its node.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub node: usize,
    pub mesh: usize,
    pub world: Mat4,
}

/// Depth-first traversal of a node table. Children are visited in their listed order, so the
/// instance order is stable for a given file. Each node is visited at most once per walk: the
/// table must form disjoint trees.
pub struct SceneWalker<'a> {
    nodes: &'a [Node],
    max_depth: usize,
}

impl<'a> SceneWalker<'a> {
    pub fn new(nodes: &'a [Node], max_depth: usize) -> Self {
        Self { nodes, max_depth }
    }

    pub fn walk(&self, root: usize, parent: Mat4) -> Result<Vec<MeshInstance>, WalkError> {
        let mut walk = Walk::new(self.nodes.len());
        self.visit(root, parent, &mut walk)?;
        Ok(walk.instances)
    }

    /// Walks every root with an identity parent. Roots share one visited set, so two roots
    /// cannot reach the same node either.
    pub fn walk_roots(&self, roots: &[usize]) -> Result<Vec<MeshInstance>, WalkError> {
        let mut walk = Walk::new(self.nodes.len());
        for &root in roots {
            self.visit(root, Mat4::IDENTITY, &mut walk)?;
        }
        Ok(walk.instances)
    }

    fn visit(&self, node_index: usize, parent: Mat4, walk: &mut Walk) -> Result<(), WalkError> {
        let node = self
            .nodes
            .get(node_index)
            .ok_or(WalkError::MissingNode { node: node_index })?;

        if walk.path.contains(&node_index) {
            return Err(WalkError::Cycle { node: node_index });
        }
        if walk.visited[node_index] {
            return Err(WalkError::SharedNode { node: node_index });
        }
        if walk.path.len() >= self.max_depth {
            return Err(WalkError::DepthExceeded {
                node: node_index,
                max_depth: self.max_depth,
            });
        }

        let transform = NodeTransform::from_node(node);
        if transform.has_matrix_and_trs() {
            log::warn!(
                "Node {} has both a matrix and a translation/rotation/scale; combining them",
                node_index
            );
        }

        let world = parent * transform.local_matrix();

        if let Some(mesh) = node.mesh {
            log::debug!(
                "Node {} ({}) places mesh {}",
                node_index,
                node.name.as_deref().unwrap_or("Unnamed"),
                mesh
            );
            walk.instances.push(MeshInstance {
                node: node_index,
                mesh,
                world,
            });
        }

        walk.visited[node_index] = true;
        walk.path.push(node_index);
        for &child in &node.children {
            self.visit(child, world, walk)?;
        }
        walk.path.pop();

        Ok(())
    }
}

/// Traversal state shared by every root of one walk.
struct Walk {
    path: Vec<usize>,
    visited: Vec<bool>,
    instances: Vec<MeshInstance>,
}

impl Walk {
    fn new(node_count: usize) -> Self {
        Self {
            path: Vec::new(),
            visited: vec![false; node_count],
            instances: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn node(mesh: Option<usize>, children: Vec<usize>) -> Node {
        Node {
            mesh,
            children,
            ..Node::default()
        }
    }

    #[test]
    fn children_inherit_and_keep_their_order() {
        let mut child_b = node(Some(1), Vec::new());
        child_b.translation = Some([5.0, 0.0, 0.0]);
        let nodes = vec![node(None, vec![1, 2]), node(Some(0), Vec::new()), child_b];

        let instances = SceneWalker::new(&nodes, 8)
            .walk(0, Mat4::IDENTITY)
            .unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].mesh, 0);
        assert_eq!(instances[0].world, Mat4::IDENTITY);
        assert_eq!(instances[1].mesh, 1);
        assert_eq!(instances[1].world.w_axis.truncate(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn transforms_accumulate_down_the_tree() {
        let mut root = node(None, vec![1]);
        root.translation = Some([1.0, 0.0, 0.0]);
        root.scale = Some([2.0, 2.0, 2.0]);
        let mut leaf = node(Some(0), Vec::new());
        leaf.translation = Some([0.0, 1.0, 0.0]);
        let nodes = vec![root, leaf];

        let instances = SceneWalker::new(&nodes, 8)
            .walk(0, Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)))
            .unwrap();

        let origin = instances[0].world.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 2.0, 10.0), 1e-6));
    }

    #[test]
    fn depth_first_order() {
        // 0 -> [1 -> [3], 2]
        let nodes = vec![
            node(Some(0), vec![1, 2]),
            node(Some(1), vec![3]),
            node(Some(2), Vec::new()),
            node(Some(3), Vec::new()),
        ];

        let meshes: Vec<usize> = SceneWalker::new(&nodes, 8)
            .walk(0, Mat4::IDENTITY)
            .unwrap()
            .into_iter()
            .map(|instance| instance.mesh)
            .collect();
        assert_eq!(meshes, vec![0, 1, 3, 2]);
    }

    #[test]
    fn cycles_are_reported() {
        let nodes = vec![node(None, vec![1]), node(None, vec![0])];
        assert_eq!(
            SceneWalker::new(&nodes, 8).walk(0, Mat4::IDENTITY),
            Err(WalkError::Cycle { node: 0 })
        );
    }

    #[test]
    fn nodes_with_two_parents_are_rejected() {
        let nodes = vec![node(None, vec![1, 2]), node(None, vec![2]), node(Some(0), Vec::new())];
        assert_eq!(
            SceneWalker::new(&nodes, 8).walk(0, Mat4::IDENTITY),
            Err(WalkError::SharedNode { node: 2 })
        );
    }

    #[test]
    fn doubled_child_chains_stop_at_the_first_repeat() {
        // Each node lists its successor twice
        let nodes: Vec<Node> = (0..64)
            .map(|i| {
                if i < 63 {
                    node(Some(0), vec![i + 1, i + 1])
                } else {
                    node(Some(0), Vec::new())
                }
            })
            .collect();

        assert_eq!(
            SceneWalker::new(&nodes, 128).walk(0, Mat4::IDENTITY),
            Err(WalkError::SharedNode { node: 63 })
        );
    }

    #[test]
    fn roots_cannot_share_nodes() {
        let nodes = vec![node(None, vec![2]), node(None, vec![2]), node(Some(0), Vec::new())];
        assert_eq!(
            SceneWalker::new(&nodes, 8).walk_roots(&[0, 1]),
            Err(WalkError::SharedNode { node: 2 })
        );
        assert_eq!(
            SceneWalker::new(&nodes, 8).walk_roots(&[0]).unwrap().len(),
            1
        );
    }

    #[test]
    fn depth_is_bounded() {
        let nodes = vec![node(None, vec![1]), node(None, vec![2]), node(Some(0), Vec::new())];
        assert_eq!(
            SceneWalker::new(&nodes, 2).walk(0, Mat4::IDENTITY),
            Err(WalkError::DepthExceeded {
                node: 2,
                max_depth: 2
            })
        );
        assert!(SceneWalker::new(&nodes, 3).walk(0, Mat4::IDENTITY).is_ok());
    }

    #[test]
    fn missing_children_are_reported() {
        let nodes = vec![node(None, vec![4])];
        assert_eq!(
            SceneWalker::new(&nodes, 8).walk(0, Mat4::IDENTITY),
            Err(WalkError::MissingNode { node: 4 })
        );
    }
}
