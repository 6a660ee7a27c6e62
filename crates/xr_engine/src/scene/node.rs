//! Scene node definition
//!
//! Nodes carry a local transform, a picking sphere, and an emissive tint.
//! Identity is the slot-map key, which stays valid for the node's lifetime
//! and is what selection and interaction code passes around.

use slotmap::new_key_type;

use crate::foundation::math::{Transform, Vec3};

new_key_type! {
    /// Stable identity of a scene node
    pub struct NodeKey;
}

/// Role of a node in the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Plain transform container (rigs, controllers)
    Group,
    /// Renderable solid
    Mesh,
    /// Renderable line (laser pointers)
    Line,
    /// Camera attachment point
    Camera,
    /// Light source
    Light,
}

/// RGB tint applied to a node's emissive channel
pub type Tint = [f32; 3];

/// Neutral emissive value (highlight off)
pub const TINT_NONE: Tint = [0.0, 0.0, 0.0];

/// Emissive value for the currently intersected object
pub const TINT_HIGHLIGHT: Tint = [1.0, 1.0, 0.0];

/// A node in the scene graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Human-readable name, also usable by pick predicates
    pub name: String,

    /// Role of this node
    pub kind: NodeKind,

    /// Local transform relative to the parent
    pub transform: Transform,

    /// Radius of the picking bounding sphere; zero means not hittable
    pub bounding_radius: f32,

    /// Emissive tint, written by the highlight pass and diagnostic cues
    pub emissive: Tint,

    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    /// Create a node with an identity transform
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::identity(),
            bounding_radius: 0.0,
            emissive: TINT_NONE,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set the local position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the local scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    /// Set the picking sphere radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.bounding_radius = radius;
        self
    }

    /// Set the emissive tint
    pub fn with_emissive(mut self, tint: Tint) -> Self {
        self.emissive = tint;
        self
    }

    /// Key of the parent node, if any
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }
}
