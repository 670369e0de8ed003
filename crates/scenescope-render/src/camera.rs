//! Camera and view management.

use glam::{Mat4, Vec3};

/// A turntable camera orbiting a target point.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Returns the camera's right direction.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Returns the screen-space up direction (orthogonal to forward and right).
    #[must_use]
    pub fn screen_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Orbits the camera around the target.
    ///
    /// Deltas are in window-normalized units; a full window width turns the
    /// camera by half a revolution.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta -= delta_x * std::f32::consts::PI;
        phi = (phi + delta_y * std::f32::consts::PI).clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }

    /// Pans the camera and target together.
    ///
    /// Deltas are in window-normalized units scaled by the view distance.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let distance = (self.position - self.target).length();
        let offset = (self.right() * -delta_x + self.screen_up() * -delta_y) * distance;
        self.position += offset;
        self.target += offset;
    }

    /// Moves toward (positive) or away from (negative) the target.
    pub fn zoom(&mut self, delta: f32) {
        let direction = self.forward();
        let distance = (self.position - self.target).length();
        let new_distance = (distance * (1.0 - delta * 0.1)).max(self.near * 2.0);
        self.position = self.target - direction * new_distance;
    }

    /// Frames the given bounding box, using `length_scale` for the clip planes.
    pub fn look_at_box(&mut self, min: Vec3, max: Vec3, length_scale: f32) {
        let center = (min + max) * 0.5;
        let size = (max - min).length().max(length_scale);

        self.target = center;
        self.position = center + Vec3::new(0.0, 0.0, size * 1.5);
        self.near = length_scale * 0.001;
        self.far = length_scale * 100.0 + size * 2.0;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}
