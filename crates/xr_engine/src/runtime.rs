//! Runtime composition root
//!
//! Wires a scene, a camera rig, the per-frame systems, and a render step
//! onto one frame loop. Construction is injectable: callers can hand in
//! their own scene, camera, scheduler, pick predicate, controls, or extra
//! systems, and sane defaults fill whatever is left out.
//!
//! The runtime is also where the render-last contract is upheld: the render
//! step is registered after every other target, and anything added later
//! through [`Runtime::frame_loop_mut`] is the caller's responsibility to
//! keep ahead of it.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::config::{ConfigError, RuntimeConfig};
use crate::foundation::math::Vec3;
use crate::render::RenderBackend;
use crate::scene::{Node, NodeKey, NodeKind, PerspectiveCamera, Scene};
use crate::schedule::{FrameLoop, Scheduler, SessionScheduler, SharedUpdatable, Updatable};
use crate::systems::{
    InteractionConfig, InteractionSystem, LocomotionConfig, LocomotionStatus, LocomotionSystem,
    NodeFilter,
};

/// Length of the laser pointer in scene units
const LASER_LENGTH: f32 = 5.0;

/// Runtime-level errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A node the runtime relies on is gone from the scene
    #[error("scene node missing: {0}")]
    MissingNode(&'static str),

    /// Configuration loading failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Pointer-driven camera controls (drag-to-orbit and friends)
///
/// Constructed outside the engine; the runtime only advances them once per
/// frame, before any other system runs.
pub trait CameraControls {
    /// Advance damping/inertia for this frame
    fn update(&mut self, scene: &mut Scene, camera: NodeKey, delta: f32);
}

/// Update target adapter for [`CameraControls`]
struct ControlsStep {
    controls: Box<dyn CameraControls>,
    scene: Rc<RefCell<Scene>>,
    camera: NodeKey,
}

impl Updatable for ControlsStep {
    fn tick(&mut self, delta: f32) {
        self.controls
            .update(&mut self.scene.borrow_mut(), self.camera, delta);
    }
}

/// Update target that paints the frame; registered last
struct RenderStep {
    scene: Rc<RefCell<Scene>>,
    backend: Rc<RefCell<dyn RenderBackend>>,
    camera: Rc<RefCell<PerspectiveCamera>>,
    camera_node: NodeKey,
}

impl Updatable for RenderStep {
    fn tick(&mut self, _delta: f32) {
        self.backend.borrow_mut().render(
            &self.scene.borrow(),
            &self.camera.borrow(),
            self.camera_node,
        );
    }
}

/// Builder for [`Runtime`]
///
/// Every collaborator is optional; defaults follow the configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    scene: Option<Scene>,
    camera: Option<PerspectiveCamera>,
    scheduler: Option<Box<dyn Scheduler>>,
    controls: Option<Box<dyn CameraControls>>,
    pick_filter: Option<NodeFilter>,
    systems: Vec<SharedUpdatable>,
}

impl RuntimeBuilder {
    /// Start a builder from runtime configuration
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            scene: None,
            camera: None,
            scheduler: None,
            controls: None,
            pick_filter: None,
            systems: Vec::new(),
        }
    }

    /// Use a pre-built scene instead of the default one
    ///
    /// The runtime still inserts its own rig, controller, laser, and status
    /// nodes into it.
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Use pre-built camera parameters
    pub fn with_camera(mut self, camera: PerspectiveCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Drive the loop from a custom scheduler instead of the session-driven
    /// default
    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Attach pointer-driven camera controls
    pub fn with_controls(mut self, controls: Box<dyn CameraControls>) -> Self {
        self.controls = Some(controls);
        self
    }

    /// Choose which scene children participate in picking and highlighting
    pub fn with_pick_filter(mut self, filter: NodeFilter) -> Self {
        self.pick_filter = Some(filter);
        self
    }

    /// Register an extra update target; it ticks before the built-in
    /// systems
    pub fn with_system(mut self, system: SharedUpdatable) -> Self {
        self.systems.push(system);
        self
    }

    /// Wire everything onto a frame loop
    pub fn build(self, backend: Rc<RefCell<dyn RenderBackend>>) -> Result<Runtime, RuntimeError> {
        let config = self.config;
        validate(&config)?;

        let mut scene = self
            .scene
            .unwrap_or_else(|| default_scene(config.background));
        let camera = self
            .camera
            .unwrap_or_else(|| PerspectiveCamera::new(config.camera_fov_y));

        // Camera rig parents the camera and the controller so locomotion
        // can move the viewpoint without touching either directly
        let rig = scene.insert(Node::new(NodeKind::Group, "camera-rig"));
        let camera_node = scene.insert_child(rig, Node::new(NodeKind::Camera, "camera"));
        let controller = scene.insert_child(rig, Node::new(NodeKind::Group, "controller"));
        scene.insert_child(
            controller,
            Node::new(NodeKind::Line, "laser")
                .with_scale(Vec3::new(1.0, 1.0, LASER_LENGTH))
                .with_emissive(config.ray_color),
        );
        let status_node = scene.insert(
            Node::new(NodeKind::Mesh, "status-cube").with_position(Vec3::new(0.0, 1.0, -2.0)),
        );

        backend.borrow_mut().set_immersive_enabled(true);

        let scene = Rc::new(RefCell::new(scene));
        let camera = Rc::new(RefCell::new(camera));

        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Box::new(SessionScheduler::new(Rc::clone(&backend))));
        let mut frame_loop = FrameLoop::new(scheduler);

        let locomotion = Rc::new(RefCell::new(
            LocomotionSystem::new(Rc::clone(&scene), Rc::clone(&backend), rig)
                .with_config(LocomotionConfig {
                    speed: config.speed,
                    rotation_rate: config.rotation_rate,
                    dead_zone: config.dead_zone,
                })
                .with_speed_multiplier(config.speed_multiplier)
                .with_status_node(status_node),
        ));

        let mut interaction_config = InteractionConfig::default()
            .with_ray_color(config.ray_color)
            .with_grabbable(config.grabbable)
            .with_recursive_raycast(config.recursive_raycast);
        if let Some(filter) = self.pick_filter {
            interaction_config = interaction_config.with_filter(filter);
        }
        let interaction = Rc::new(RefCell::new(InteractionSystem::new(
            Rc::clone(&scene),
            Rc::clone(&backend),
            controller,
            config.selection.policy(),
            interaction_config,
        )));

        // Registration order is the tick order; render goes last so the
        // painted frame reflects every update
        if let Some(controls) = self.controls {
            frame_loop.add(Rc::new(RefCell::new(ControlsStep {
                controls,
                scene: Rc::clone(&scene),
                camera: camera_node,
            })));
        }
        frame_loop.extend(self.systems);
        let locomotion_target: SharedUpdatable = locomotion.clone();
        frame_loop.add(locomotion_target);
        let interaction_target: SharedUpdatable = interaction.clone();
        frame_loop.add(interaction_target);
        frame_loop.add(Rc::new(RefCell::new(RenderStep {
            scene: Rc::clone(&scene),
            backend: Rc::clone(&backend),
            camera: Rc::clone(&camera),
            camera_node,
        })));

        Ok(Runtime {
            scene,
            backend,
            camera,
            camera_node,
            rig,
            controller,
            status_node,
            frame_loop,
            locomotion,
            interaction,
        })
    }
}

fn validate(config: &RuntimeConfig) -> Result<(), RuntimeError> {
    if !(config.camera_fov_y > 0.0 && config.camera_fov_y < 180.0) {
        return Err(RuntimeError::InvalidConfig(format!(
            "camera_fov_y must be in (0, 180), got {}",
            config.camera_fov_y
        )));
    }
    if config.dead_zone < 0.0 {
        return Err(RuntimeError::InvalidConfig(format!(
            "dead_zone must be non-negative, got {}",
            config.dead_zone
        )));
    }
    if config.speed <= 0.0 || config.speed_multiplier <= 0.0 {
        return Err(RuntimeError::InvalidConfig(format!(
            "speed and speed_multiplier must be positive, got {} and {}",
            config.speed, config.speed_multiplier
        )));
    }
    if config.rotation_rate < 0.0 {
        return Err(RuntimeError::InvalidConfig(format!(
            "rotation_rate must be non-negative, got {}",
            config.rotation_rate
        )));
    }
    Ok(())
}

/// Default scene: background color plus ambient and key lights
fn default_scene(background: [f32; 3]) -> Scene {
    let mut scene = Scene::new(background);
    scene.insert(Node::new(NodeKind::Light, "ambient-light"));
    scene.insert(
        Node::new(NodeKind::Light, "main-light").with_position(Vec3::new(10.0, 10.0, 10.0)),
    );
    scene
}

/// Composition root owning the frame loop and its systems
pub struct Runtime {
    scene: Rc<RefCell<Scene>>,
    backend: Rc<RefCell<dyn RenderBackend>>,
    camera: Rc<RefCell<PerspectiveCamera>>,
    camera_node: NodeKey,
    rig: NodeKey,
    controller: NodeKey,
    status_node: NodeKey,
    frame_loop: FrameLoop,
    locomotion: Rc<RefCell<LocomotionSystem>>,
    interaction: Rc<RefCell<InteractionSystem>>,
}

impl Runtime {
    /// Verify the wiring and report it
    ///
    /// The runtime's own nodes live in a scene the caller can also mutate;
    /// this confirms nothing required has been removed.
    pub fn init(&self) -> Result<(), RuntimeError> {
        let scene = self.scene.borrow();
        if !scene.contains(self.rig) {
            return Err(RuntimeError::MissingNode("camera-rig"));
        }
        if !scene.contains(self.camera_node) {
            return Err(RuntimeError::MissingNode("camera"));
        }
        if !scene.contains(self.controller) {
            return Err(RuntimeError::MissingNode("controller"));
        }
        log::info!(
            "runtime initialized: {} nodes, {} update targets",
            scene.len(),
            self.frame_loop.len()
        );
        Ok(())
    }

    /// Paint a single frame outside the loop
    pub fn render(&mut self) {
        self.backend.borrow_mut().render(
            &self.scene.borrow(),
            &self.camera.borrow(),
            self.camera_node,
        );
    }

    /// Start the frame loop
    pub fn start(&mut self) {
        log::info!("starting frame loop");
        self.frame_loop.start();
    }

    /// Stop the frame loop
    pub fn stop(&mut self) {
        log::info!("stopping frame loop");
        self.frame_loop.stop();
    }

    /// Keep the camera and backend in sync with a resized surface
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.camera.borrow_mut().set_aspect(width, height);
        self.backend.borrow_mut().set_extent(width, height);
    }

    /// Shared handle to the scene graph
    pub fn scene(&self) -> Rc<RefCell<Scene>> {
        Rc::clone(&self.scene)
    }

    /// Key of the camera rig node
    pub fn camera_rig(&self) -> NodeKey {
        self.rig
    }

    /// Key of the camera node
    pub fn camera_node(&self) -> NodeKey {
        self.camera_node
    }

    /// Key of the controller node
    pub fn controller(&self) -> NodeKey {
        self.controller
    }

    /// Key of the diagnostic status node
    pub fn status_node(&self) -> NodeKey {
        self.status_node
    }

    /// Locomotion diagnostic status from the most recent tick
    pub fn locomotion_status(&self) -> LocomotionStatus {
        self.locomotion.borrow().status()
    }

    /// Node currently under the controller ray
    pub fn intersected(&self) -> Option<NodeKey> {
        self.interaction.borrow().intersected()
    }

    /// Node currently selected
    pub fn selected(&self) -> Option<NodeKey> {
        self.interaction.borrow().selected()
    }

    /// Direct access to the frame loop
    ///
    /// Targets added here tick after the render step unless removed and
    /// re-registered; keeping render last is the caller's contract.
    pub fn frame_loop_mut(&mut self) -> &mut FrameLoop {
        &mut self.frame_loop
    }
}
