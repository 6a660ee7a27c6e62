//! Scene graph
//!
//! A slot-map arena of transform nodes. The engine core only needs a root
//! container, parent/child links, world-space transforms, and bounding
//! spheres for picking; anything heavier (meshes, materials, asset data)
//! belongs to the render backend behind its own interface.

mod camera;
mod node;
mod ray;

pub use camera::PerspectiveCamera;
pub use node::{Node, NodeKey, NodeKind, Tint, TINT_HIGHLIGHT, TINT_NONE};
pub use ray::{pick, Ray, RayHit};

use slotmap::SlotMap;

use crate::foundation::math::{Mat4, Point3};

/// Scene graph arena with a fixed root container
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,

    /// Background clear color handed to the render backend
    pub background: Tint,
}

impl Scene {
    /// Create an empty scene with the given background color
    pub fn new(background: Tint) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Group, "root"));
        Self {
            nodes,
            root,
            background,
        }
    }

    /// Key of the root container node
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Insert a node as a direct child of the root
    pub fn insert(&mut self, node: Node) -> NodeKey {
        self.insert_child(self.root, node)
    }

    /// Insert a node as a child of `parent`
    ///
    /// Falls back to the root when `parent` is stale; a node is never left
    /// dangling outside the graph.
    pub fn insert_child(&mut self, parent: NodeKey, node: Node) -> NodeKey {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::warn!("insert_child: stale parent key, attaching to root");
            self.root
        };
        let mut node = node;
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        key
    }

    /// Shared access to a node
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Exclusive access to a node
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Whether `key` refers to a live node
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Child keys of `key`, in insertion order
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map_or(&[], |node| node.children.as_slice())
    }

    /// Number of live nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene holds only the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// World-space transform of a node (root-to-node composition)
    pub fn world_transform(&self, key: NodeKey) -> Option<Mat4> {
        if !self.nodes.contains_key(key) {
            return None;
        }
        let mut chain = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            chain.push(k);
            current = self.nodes[k].parent;
        }
        let matrix = chain
            .iter()
            .rev()
            .fold(Mat4::identity(), |acc, k| acc * self.nodes[*k].transform.to_matrix());
        Some(matrix)
    }

    /// Transform a node-local point into world space
    pub fn world_point(&self, key: NodeKey, local: Point3) -> Option<Point3> {
        self.world_transform(key)
            .map(|matrix| matrix.transform_point(&local))
    }

    /// World-space position of a node's origin
    pub fn world_position(&self, key: NodeKey) -> Option<Point3> {
        self.world_point(key, Point3::origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_insert_preserves_child_order() {
        let mut scene = Scene::new(TINT_NONE);
        let a = scene.insert(Node::new(NodeKind::Mesh, "a"));
        let b = scene.insert(Node::new(NodeKind::Mesh, "b"));
        let c = scene.insert(Node::new(NodeKind::Mesh, "c"));
        assert_eq!(scene.children(scene.root()), &[a, b, c]);
    }

    #[test]
    fn test_world_position_composes_parent_chain() {
        let mut scene = Scene::new(TINT_NONE);
        let rig = scene.insert(
            Node::new(NodeKind::Group, "rig").with_position(Vec3::new(5.0, 0.0, 0.0)),
        );
        let child = scene.insert_child(
            rig,
            Node::new(NodeKind::Group, "child").with_position(Vec3::new(0.0, 1.0, 0.0)),
        );
        let p = scene.world_position(child).unwrap();
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 1.0);
        assert_relative_eq!(p.z, 0.0);
    }

    #[test]
    fn test_world_transform_applies_parent_rotation_to_child_offset() {
        let mut scene = Scene::new(TINT_NONE);
        let mut rig_node = Node::new(NodeKind::Group, "rig");
        rig_node.transform.rotation =
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let rig = scene.insert(rig_node);
        let child = scene.insert_child(
            rig,
            Node::new(NodeKind::Group, "child").with_position(Vec3::new(0.0, 0.0, -1.0)),
        );
        // Quarter turn about +Y carries the child's -Z offset onto -X
        let p = scene.world_position(child).unwrap();
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_stale_key_lookups_are_none() {
        let scene = Scene::new(TINT_NONE);
        assert!(scene.get(NodeKey::default()).is_none());
        assert!(scene.world_transform(NodeKey::default()).is_none());
        assert!(scene.world_position(NodeKey::default()).is_none());
    }
}
