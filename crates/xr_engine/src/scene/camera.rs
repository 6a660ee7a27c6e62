//! Perspective camera parameters
//!
//! The camera's pose lives on a scene node (usually parented to the camera
//! rig); this type only carries the projection parameters the render backend
//! needs.

use nalgebra::Perspective3;

use crate::foundation::math::Mat4;

/// Perspective projection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_y: f32,

    /// Viewport aspect ratio (width / height)
    pub aspect: f32,

    /// Near clip distance
    pub z_near: f32,

    /// Far clip distance
    pub z_far: f32,
}

impl PerspectiveCamera {
    /// Create a camera with the given vertical field of view in degrees
    pub fn new(fov_y: f32) -> Self {
        Self {
            fov_y,
            aspect: 1.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    /// Update the aspect ratio from a surface size in pixels
    ///
    /// Degenerate sizes are ignored so a collapsed window cannot poison the
    /// projection.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Projection matrix for the current parameters
    pub fn projection_matrix(&self) -> Mat4 {
        Perspective3::new(self.aspect, self.fov_y.to_radians(), self.z_near, self.z_far)
            .to_homogeneous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_aspect_tracks_surface_size() {
        let mut camera = PerspectiveCamera::new(30.0);
        camera.set_aspect(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_aspect_ignores_degenerate_sizes() {
        let mut camera = PerspectiveCamera::new(30.0);
        camera.set_aspect(800, 600);
        let before = camera.aspect;
        camera.set_aspect(0, 600);
        camera.set_aspect(800, 0);
        assert!((camera.aspect - before).abs() < 1e-6);
    }

    #[test]
    fn test_projection_changes_with_aspect() {
        let mut camera = PerspectiveCamera::new(30.0);
        let square = camera.projection_matrix();
        camera.set_aspect(1600, 900);
        let wide = camera.projection_matrix();
        assert_ne!(square, wide);
    }
}
