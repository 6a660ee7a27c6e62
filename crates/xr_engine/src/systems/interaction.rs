//! Controller interaction system
//!
//! Every tick: sync the controller node's tracked pose, cast its forward
//! ray into the scene, and repaint the highlight tint on every candidate
//! object. Selection is event-driven on top of that: select-start and
//! select-end edges are detected from the session's select input and
//! delegated to the configured [`SelectionPolicy`], with grab and
//! position-restore side effects applied here.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::{Point3, Vec3};
use crate::render::RenderBackend;
use crate::scene::{pick, Node, NodeKey, NodeKind, Ray, Scene, Tint, TINT_HIGHLIGHT, TINT_NONE};
use crate::schedule::Updatable;
use crate::systems::selection::SelectionPolicy;
use crate::xr::Handedness;

/// Membership predicate choosing which scene children participate in
/// picking and highlighting
pub type NodeFilter = Box<dyn Fn(NodeKey, &Node) -> bool>;

/// Interaction tunables
pub struct InteractionConfig {
    /// Color of the laser pointer attached to the controller
    pub ray_color: Tint,

    /// Whether a selected object follows the controller while held
    pub grabbable: bool,

    /// Whether picking also tests descendants of matching children
    pub recursive_raycast: bool,

    /// Which scene children participate in picking and highlighting
    pub filter: NodeFilter,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            ray_color: [1.0, 1.0, 1.0],
            grabbable: false,
            recursive_raycast: false,
            filter: Box::new(|_key, node| {
                node.kind == NodeKind::Mesh && node.bounding_radius > 0.0
            }),
        }
    }
}

impl InteractionConfig {
    /// Replace the membership predicate
    pub fn with_filter(mut self, filter: NodeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Enable or disable grab-follow of the selected object
    pub fn with_grabbable(mut self, grabbable: bool) -> Self {
        self.grabbable = grabbable;
        self
    }

    /// Enable or disable recursive picking
    pub fn with_recursive_raycast(mut self, recursive: bool) -> Self {
        self.recursive_raycast = recursive;
        self
    }

    /// Set the laser pointer color
    pub fn with_ray_color(mut self, color: Tint) -> Self {
        self.ray_color = color;
        self
    }
}

/// Update target that picks, highlights, and applies selection effects
pub struct InteractionSystem {
    scene: Rc<RefCell<Scene>>,
    backend: Rc<RefCell<dyn RenderBackend>>,
    controller: NodeKey,
    controller_index: usize,
    hand: Handedness,
    policy: Box<dyn SelectionPolicy>,
    config: InteractionConfig,

    intersected: Option<NodeKey>,
    selected: Option<NodeKey>,
    grab_origin: Option<Vec3>,
    select_was_active: bool,
}

impl InteractionSystem {
    /// Create a system casting from the `controller` node
    pub fn new(
        scene: Rc<RefCell<Scene>>,
        backend: Rc<RefCell<dyn RenderBackend>>,
        controller: NodeKey,
        policy: Box<dyn SelectionPolicy>,
        config: InteractionConfig,
    ) -> Self {
        Self {
            scene,
            backend,
            controller,
            controller_index: 1,
            hand: Handedness::Right,
            policy,
            config,
            intersected: None,
            selected: None,
            grab_origin: None,
            select_was_active: false,
        }
    }

    /// Track a different backend controller slot
    pub fn with_controller_index(mut self, index: usize) -> Self {
        self.controller_index = index;
        self
    }

    /// Read the select input from a different hand
    pub fn with_hand(mut self, hand: Handedness) -> Self {
        self.hand = hand;
        self
    }

    /// Node currently under the controller ray, recomputed every tick
    pub fn intersected(&self) -> Option<NodeKey> {
        self.intersected
    }

    /// Node currently selected by the active policy
    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }

    /// A select gesture began
    ///
    /// Delegates to the policy with the node under the ray; captures the
    /// position snapshot when the policy asks for restore-on-release.
    pub fn select_started(&mut self) {
        let command = self.policy.on_select_start(self.intersected);
        self.selected = command.selected;
        self.grab_origin = if command.restore_original_position {
            let scene = self.scene.borrow();
            self.selected
                .and_then(|key| scene.get(key))
                .map(|node| node.transform.position)
        } else {
            None
        };
        log::debug!(
            "select start: intersected {:?} -> selected {:?}",
            self.intersected,
            self.selected
        );
    }

    /// The select gesture ended
    ///
    /// Restores the snapshot onto the held object when one is pending, then
    /// adopts the policy's verdict on what stays selected.
    pub fn select_ended(&mut self) {
        let command = self.policy.on_select_end(self.selected);
        if let (Some(selected), Some(origin)) = (self.selected, self.grab_origin) {
            if let Some(node) = self.scene.borrow_mut().get_mut(selected) {
                node.transform.position = origin;
            }
        }
        log::debug!(
            "select end: selected {:?} -> {:?}",
            self.selected,
            command.selected
        );
        self.selected = command.selected;
        self.grab_origin = None;
    }

    /// Cast the controller's forward ray and return the nearest candidate
    fn raycast_from_controller(&self, scene: &Scene) -> Option<NodeKey> {
        let start = scene.world_point(self.controller, Point3::origin())?;
        let end = scene.world_point(self.controller, Point3::new(0.0, 0.0, -1.0))?;
        let ray = Ray::new(start, end - start);
        pick(
            scene,
            &ray,
            self.config.filter.as_ref(),
            self.config.recursive_raycast,
        )
        .map(|hit| hit.node)
    }
}

impl Updatable for InteractionSystem {
    fn tick(&mut self, _delta: f32) {
        // Adopt the tracked controller pose before casting from it
        let pose = self.backend.borrow().controller_pose(self.controller_index);
        if let Some(pose) = pose {
            if let Some(node) = self.scene.borrow_mut().get_mut(self.controller) {
                node.transform = pose;
            }
        }

        self.intersected = {
            let scene = self.scene.borrow();
            self.raycast_from_controller(&scene)
        };

        // Highlight pass runs every tick, selection state notwithstanding
        {
            let mut scene = self.scene.borrow_mut();
            let children = scene.children(scene.root()).to_vec();
            for key in children {
                let matches = scene
                    .get(key)
                    .is_some_and(|node| (self.config.filter)(key, node));
                if !matches {
                    continue;
                }
                if let Some(node) = scene.get_mut(key) {
                    node.emissive = if self.intersected == Some(key) {
                        TINT_HIGHLIGHT
                    } else {
                        TINT_NONE
                    };
                }
            }
        }

        // Select gesture edges drive the discrete policy events
        let selecting = self
            .backend
            .borrow()
            .session()
            .and_then(|session| session.source(self.hand))
            .is_some_and(|source| source.selecting);
        if selecting && !self.select_was_active {
            self.select_started();
        } else if !selecting && self.select_was_active {
            self.select_ended();
        }
        self.select_was_active = selecting;

        // While held and grabbable, the selection rides the controller
        if self.config.grabbable {
            if let Some(selected) = self.selected {
                let target = self.scene.borrow().world_position(self.controller);
                if let Some(position) = target {
                    if let Some(node) = self.scene.borrow_mut().get_mut(selected) {
                        node.transform.position = position.coords;
                    }
                }
            }
        }
    }
}
