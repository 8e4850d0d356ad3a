use crate::constants::{DEFAULT_FAR, DEFAULT_NEAR};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Perspective camera with cached view and projection matrices.
///
/// The matrices are derived state: every setter recomputes them, so they
/// always match the current position, rotation and projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    position: Vec3,
    /// Euler angles in degrees around X, Y and Z.
    rotation: Vec3,
    fov: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,

    projection: Mat4,
    view: Mat4,
    projection_view: Mat4,
}

impl PerspectiveCamera {
    /// Create a camera at the origin. `fov` is the vertical field of view in degrees.
    pub fn new(fov: f32, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            fov,
            aspect_ratio,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection_view: Mat4::IDENTITY,
        };
        camera.recalculate_projection();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view();
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.recalculate_view();
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_projection(&mut self, fov: f32, aspect_ratio: f32) {
        self.fov = fov;
        self.aspect_ratio = aspect_ratio;
        self.recalculate_projection();
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.recalculate_projection();
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection_view_matrix(&self) -> &Mat4 {
        &self.projection_view
    }

    fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    fn recalculate_view(&mut self) {
        let transform = Mat4::from_rotation_translation(self.orientation(), self.position);
        self.view = transform.inverse();
        self.projection_view = self.projection * self.view;
    }

    fn recalculate_projection(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect_ratio, self.near, self.far);
        self.recalculate_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_position_round_trip() {
        let mut camera = PerspectiveCamera::new(45.0, 16.0 / 9.0);
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_view_is_inverse_of_camera_transform() {
        let mut camera = PerspectiveCamera::new(45.0, 1.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));

        // A point at the camera position maps to the view-space origin.
        let origin = camera.view_matrix().transform_point3(Vec3::new(0.0, 0.0, 5.0));
        assert!(origin.abs_diff_eq(Vec3::ZERO, EPSILON));

        // The world origin sits straight ahead (negative Z in view space).
        let ahead = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), EPSILON));
    }

    #[test]
    fn test_rotation_in_degrees() {
        let mut camera = PerspectiveCamera::new(45.0, 1.0);
        camera.set_rotation(Vec3::new(0.0, 90.0, 0.0));

        // Turning left by 90 degrees puts -X straight ahead.
        let ahead = camera.view_matrix().transform_point3(Vec3::new(-1.0, 0.0, 0.0));
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPSILON));
        assert_eq!(camera.rotation(), Vec3::new(0.0, 90.0, 0.0));
    }

    #[test]
    fn test_projection_view_follows_every_change() {
        let mut camera = PerspectiveCamera::new(60.0, 4.0 / 3.0);

        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        let expected = *camera.projection_matrix() * *camera.view_matrix();
        assert!(camera.projection_view_matrix().abs_diff_eq(expected, EPSILON));

        camera.set_rotation(Vec3::new(10.0, 20.0, 30.0));
        let expected = *camera.projection_matrix() * *camera.view_matrix();
        assert!(camera.projection_view_matrix().abs_diff_eq(expected, EPSILON));

        let before = *camera.projection_matrix();
        camera.set_projection(90.0, 1.0);
        assert_ne!(*camera.projection_matrix(), before);
        let expected = *camera.projection_matrix() * *camera.view_matrix();
        assert!(camera.projection_view_matrix().abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn test_projection_matches_parameters() {
        let mut camera = PerspectiveCamera::new(45.0, 2.0);
        camera.set_clip_planes(0.5, 50.0);
        let expected = Mat4::perspective_rh_gl(45f32.to_radians(), 2.0, 0.5, 50.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, EPSILON));
    }
}
