//! Implementation of the camera controls.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::geometry::Aabb;
use crate::render::settings::ViewMode;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};

const ONE_DEGREE: f64 = PI / 180.0;

/// An orbit camera, circling around a focus point.
///
/// The camera state is the focus point, the (log-scale) distance to it and a
/// two-component rotation: how much the camera looks down on the scene, and
/// the heading around the vertical axis. [Self::extrinsic] turns this into
/// the world-to-camera transform of the pinhole model, with the camera
/// looking along positive z and image y pointing down.
#[derive(Clone, Debug)]
pub struct OrbitNavigation {
    /// Point in world space, that the camera is looking at.
    focus: Point3<f64>,

    /// How close the camera is to the [Self::focus] point.
    log_camera_distance: f64,

    /// Rotation of the camera.
    ///  First component: how much the camera "looks down" on the scene.
    ///  Second component: heading around the world z axis.
    camera_rotation: Vector2<f64>,
}

impl Default for OrbitNavigation {
    fn default() -> Self {
        OrbitNavigation {
            focus: Point3::origin(),
            log_camera_distance: 1.0,
            camera_rotation: Vector2::new(FRAC_PI_4, FRAC_PI_2),
        }
    }
}

impl OrbitNavigation {
    pub fn new() -> Self {
        Default::default()
    }

    /// Rotates the camera by a mouse drag of the given amount of pixels.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        let new_pitch = self.camera_rotation.x + dy * 0.01;
        self.camera_rotation.x = new_pitch.clamp(
            -(FRAC_PI_2 - ONE_DEGREE),
            FRAC_PI_2 - ONE_DEGREE,
        );
        self.camera_rotation.y += dx * 0.01;
    }

    /// Scales the camera distance by the given factor. Factors above 1.0
    /// move the camera closer to the focus point.
    pub fn zoom(&mut self, factor: f64) {
        self.log_camera_distance -= factor.log2();
    }

    /// Moves the camera, such that the given aabb is in view.
    pub fn focus_on(&mut self, aabb: &Aabb) {
        self.focus = aabb.center();
        let distance = (aabb.diagonal() * 1.5).max(1.0);
        self.log_camera_distance = distance.log2();
    }

    /// Applies the camera preset of the given view mode.
    /// Arcball resets to the front view, model to the back view, fly leaves
    /// the pose unchanged.
    pub fn apply_view_mode(&mut self, mode: ViewMode) {
        match mode {
            ViewMode::Arcball => {
                self.camera_rotation = Vector2::new(0.0, FRAC_PI_2);
            }
            ViewMode::Model => {
                self.camera_rotation = Vector2::new(0.0, -FRAC_PI_2);
            }
            ViewMode::Fly => {}
        }
    }

    pub fn camera_distance(&self) -> f64 {
        2.0_f64.powf(self.log_camera_distance)
    }

    /// The direction the camera is looking into.
    fn view_direction(&self) -> Vector3<f64> {
        let pitch = self.camera_rotation.x;
        let yaw = self.camera_rotation.y;
        // heading in the xy plane, tilted down by the pitch angle
        Vector3::new(
            pitch.cos() * yaw.cos(),
            pitch.cos() * yaw.sin(),
            -pitch.sin(),
        )
    }

    pub fn camera_position(&self) -> Point3<f64> {
        self.focus - self.view_direction() * self.camera_distance()
    }

    /// The world-to-camera transform.
    ///
    /// Camera space is the computer-vision pinhole frame: x right, y down,
    /// z forward. The pitch clamp in [Self::rotate] keeps the view direction
    /// away from the world up axis, so the basis below is always well
    /// defined.
    pub fn extrinsic(&self) -> Matrix4<f64> {
        let z = self.view_direction();
        let up = Vector3::new(0.0, 0.0, 1.0);
        let x = z.cross(&up).normalize();
        let y = z.cross(&x);
        let position = self.camera_position();

        let mut m = Matrix4::identity();
        for (row, axis) in [x, y, z].iter().enumerate() {
            m[(row, 0)] = axis.x;
            m[(row, 1)] = axis.y;
            m[(row, 2)] = axis.z;
            m[(row, 3)] = -axis.dot(&position.coords);
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CameraPose;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_front_view_looks_along_positive_y() {
        let mut nav = OrbitNavigation::new();
        nav.apply_view_mode(ViewMode::Arcball);
        let dir = nav.view_direction();
        assert_close(dir.x, 0.0);
        assert_close(dir.y, 1.0);
        assert_close(dir.z, 0.0);
    }

    #[test]
    fn test_extrinsic_maps_focus_to_view_axis() {
        let mut nav = OrbitNavigation::new();
        nav.focus_on(&Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        });
        let extrinsic = nav.extrinsic();
        let focus_cam = extrinsic.transform_point(&nav.focus);
        // the focus point sits straight ahead of the camera
        assert_close(focus_cam.x, 0.0);
        assert_close(focus_cam.y, 0.0);
        assert_close(focus_cam.z, nav.camera_distance());
    }

    #[test]
    fn test_extrinsic_inverse_recovers_camera_position() {
        let nav = OrbitNavigation::new();
        let pose = CameraPose::from_extrinsic(&nav.extrinsic()).unwrap();
        let expected = nav.camera_position();
        assert_close(pose.position.x, expected.x);
        assert_close(pose.position.y, expected.y);
        assert_close(pose.position.z, expected.z);
    }

    #[test]
    fn test_zoom_moves_camera_closer() {
        let mut nav = OrbitNavigation::new();
        let before = nav.camera_distance();
        nav.zoom(2.0);
        assert_close(nav.camera_distance(), before / 2.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut nav = OrbitNavigation::new();
        nav.rotate(0.0, 1e6);
        assert!(nav.camera_rotation.x < FRAC_PI_2);
        nav.rotate(0.0, -2e6);
        assert!(nav.camera_rotation.x > -FRAC_PI_2);
    }
}
