//! Headless render backend
//!
//! Implements [`RenderBackend`] without a graphics device. Paint calls are
//! counted and traced, immersive sessions are plain data owned by the
//! backend, and controller poses are set directly by the platform or test
//! driving the frames.

use super::backend::{FrameCallback, FrameCallbackSlot, FramePump, RenderBackend};
use crate::foundation::math::Transform;
use crate::scene::{NodeKey, PerspectiveCamera, Scene};
use crate::xr::XrSession;

/// Render backend with no device behind it
pub struct HeadlessBackend {
    extent: (u32, u32),
    immersive_enabled: bool,
    session: Option<XrSession>,
    controller_poses: Vec<Option<Transform>>,
    slot: FrameCallbackSlot,
    frames_rendered: u64,
}

impl HeadlessBackend {
    /// Create a backend with the given surface size in pixels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: (width, height),
            immersive_enabled: false,
            session: None,
            controller_poses: Vec::new(),
            slot: FrameCallbackSlot::new(),
            frames_rendered: 0,
        }
    }

    /// Handle for dispatching registered frame callbacks
    ///
    /// Grab this before wrapping the backend in `Rc<RefCell<...>>`; the
    /// pump stays valid and never borrows the backend.
    pub fn frame_pump(&self) -> FramePump {
        self.slot.pump()
    }

    /// Begin an immersive session
    ///
    /// Ignored (with a warning) while immersive presentation is disabled,
    /// matching real presenters that refuse sessions they cannot show.
    pub fn begin_session(&mut self, session: XrSession) {
        if !self.immersive_enabled {
            log::warn!("begin_session ignored: immersive presentation disabled");
            return;
        }
        log::info!(
            "immersive session started ({} input sources)",
            session.input_sources.len()
        );
        self.session = Some(session);
    }

    /// End the immersive session, returning it if one was active
    pub fn end_session(&mut self) -> Option<XrSession> {
        if self.session.is_some() {
            log::info!("immersive session ended");
        }
        self.session.take()
    }

    /// Set the tracked pose of the controller at `index`
    pub fn set_controller_pose(&mut self, index: usize, pose: Transform) {
        if self.controller_poses.len() <= index {
            self.controller_poses.resize(index + 1, None);
        }
        self.controller_poses[index] = Some(pose);
    }

    /// Number of frames painted so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Current surface size in pixels
    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }
}

impl RenderBackend for HeadlessBackend {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, view: NodeKey) {
        self.frames_rendered += 1;
        log::trace!(
            "frame {}: {} nodes, fov {:.1}, view {view:?}",
            self.frames_rendered,
            scene.len(),
            camera.fov_y,
        );
    }

    fn set_immersive_enabled(&mut self, enabled: bool) {
        self.immersive_enabled = enabled;
        if !enabled && self.session.take().is_some() {
            log::info!("immersive session dropped: presentation disabled");
        }
    }

    fn immersive_enabled(&self) -> bool {
        self.immersive_enabled
    }

    fn session(&self) -> Option<&XrSession> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Option<&mut XrSession> {
        self.session.as_mut()
    }

    fn controller_pose(&self, index: usize) -> Option<Transform> {
        self.controller_poses.get(index).and_then(Clone::clone)
    }

    fn set_frame_callback(&mut self, callback: Option<FrameCallback>) {
        self.slot.set(callback);
    }

    fn set_extent(&mut self, width: u32, height: u32) {
        self.extent = (width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TINT_NONE;

    #[test]
    fn test_render_counts_frames() {
        let mut backend = HeadlessBackend::new(800, 600);
        let scene = Scene::new(TINT_NONE);
        let camera = PerspectiveCamera::new(30.0);
        backend.render(&scene, &camera, scene.root());
        backend.render(&scene, &camera, scene.root());
        assert_eq!(backend.frames_rendered(), 2);
    }

    #[test]
    fn test_session_requires_immersive_enabled() {
        let mut backend = HeadlessBackend::new(800, 600);
        backend.begin_session(XrSession::new());
        assert!(backend.session().is_none());

        backend.set_immersive_enabled(true);
        backend.begin_session(XrSession::new());
        assert!(backend.session().is_some());

        // Disabling presentation tears the session down
        backend.set_immersive_enabled(false);
        assert!(backend.session().is_none());
    }

    #[test]
    fn test_controller_pose_roundtrip() {
        use crate::foundation::math::Vec3;

        let mut backend = HeadlessBackend::new(800, 600);
        assert!(backend.controller_pose(1).is_none());
        backend.set_controller_pose(1, Transform::from_position(Vec3::new(0.0, 1.5, 0.0)));
        let pose = backend.controller_pose(1).unwrap();
        assert!((pose.position.y - 1.5).abs() < 1e-6);
        assert!(backend.controller_pose(0).is_none());
    }
}
