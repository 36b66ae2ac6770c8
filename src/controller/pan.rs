//! Panning: translating the camera along the view plane.

use bevy_log::prelude::*;
use bevy_math::{DVec2, DVec3};

use super::{
    camera::ViewCamera, component::CameraController, config::CameraMode, gesture::GestureSession,
    scene::SceneQuery,
};

/// State of a pan gesture: the plane the grabbed point slides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    /// A point on the pan plane: the surface hit at press, or the camera target.
    pub plane_position: DVec3,
    /// Normal of the pan plane: the look direction at press.
    pub plane_normal: DVec3,
}

impl PanGesture {
    pub(crate) fn new(camera: &ViewCamera, nearest: Option<DVec3>) -> Self {
        Self {
            plane_position: nearest.unwrap_or_else(|| camera.target()),
            plane_normal: camera.look_direction,
        }
    }
}

impl CameraController {
    /// Translate the camera by `vector` without turning it. With `stop_other`, spin and zoom
    /// momentum are cancelled.
    ///
    /// Does nothing if panning is disabled or the camera is in [`CameraMode::FixedPosition`].
    pub fn pan(&mut self, camera: &mut ViewCamera, vector: DVec3, stop_other: bool) -> bool {
        if !self.config.enabled.pan || self.config.camera_mode == CameraMode::FixedPosition {
            return false;
        }
        if stop_other {
            self.stop_spin();
            self.stop_zooming();
        }
        camera.position += vector;
        true
    }

    /// Convert a screen space delta in pixels into a world space pan on the view plane, scaled by
    /// the target distance so the scene moves at a similar rate at any zoom level.
    pub fn find_pan_vector(&self, camera: &ViewCamera, delta: DVec2) -> DVec3 {
        let right = camera
            .look_direction
            .cross(camera.up_direction)
            .normalize_or_zero();
        let up = right.cross(camera.look_direction).normalize_or_zero();
        let scale = camera.target_distance() * 0.001 * self.config.sensitivity.pan;
        -right * scale * delta.x + up * scale * delta.y
    }

    pub(crate) fn pan_delta(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        session: &mut GestureSession,
        gesture: &PanGesture,
        point: DVec2,
    ) {
        let current = self.unproject(
            camera,
            scene,
            point,
            gesture.plane_position,
            gesture.plane_normal,
        );
        let (Some(last), Some(current)) = (session.last_point_3d, current) else {
            debug!("Pan skipped: pointer ray does not reach the pan plane");
            return;
        };
        self.pan(camera, last - current, true);
        session.last_point = point;
        session.last_point_3d = self.unproject(
            camera,
            scene,
            point,
            gesture.plane_position,
            gesture.plane_normal,
        );
    }

    pub(crate) fn pan_fling(
        &mut self,
        camera: &mut ViewCamera,
        session: &GestureSession,
        elapsed_ms: f64,
    ) {
        let velocity = (session.last_point - session.mouse_down_point) * (40.0 / elapsed_ms);
        self.add_pan_force(camera, velocity);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::controller::camera::ViewProjection;

    fn controller() -> CameraController {
        CameraController::default().with_viewport_size(DVec2::new(800.0, 600.0))
    }

    #[test]
    fn grabbed_point_follows_pointer() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        let start = DVec2::new(400.0, 300.0);
        controller.start_pan(&mut camera, &(), start, Duration::ZERO);
        let grabbed = controller.gesture().unwrap().session.mouse_down_point_3d.unwrap();

        let end = DVec2::new(460.0, 250.0);
        controller.mouse_move(&mut camera, &(), end);
        let under_pointer = controller
            .unproject(&camera, &(), end, camera.target(), camera.look_direction)
            .unwrap();
        assert!((under_pointer - grabbed).length() < 1e-9);
        assert_eq!(camera.look_direction, DVec3::new(0.0, 0.0, -10.0));
    }

    #[test]
    fn fixed_position_does_not_pan() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.camera_mode = CameraMode::FixedPosition;
        assert!(!controller.pan(&mut camera, DVec3::X, true));
        assert_eq!(camera.position, DVec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn pan_stops_spin_and_zoom() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.start_spin(DVec2::new(50.0, 0.0), DVec2::ZERO, DVec3::ZERO);
        controller.add_zoom_force(&mut camera, -1.0);
        controller.pan(&mut camera, DVec3::X, true);
        assert_eq!(controller.inertia().spin.velocity, DVec2::ZERO);
        assert_eq!(controller.inertia().zoom.velocity, 0.0);
    }

    #[test]
    fn pan_vector_scales_with_distance() {
        let controller = controller();
        let near = ViewCamera::default();
        let far = ViewCamera::new(DVec3::new(0.0, 0.0, 100.0), DVec3::ZERO, DVec3::Y);
        let delta = DVec2::new(10.0, -5.0);
        let v_near = controller.find_pan_vector(&near, delta);
        let v_far = controller.find_pan_vector(&far, delta);
        assert!((v_near - DVec3::new(-0.1, -0.05, 0.0)).length() < 1e-12);
        assert!((v_far - v_near * 10.0).length() < 1e-12);
    }

    #[test]
    fn edge_on_plane_skips_frame() {
        // An orthographic camera sliding along a plane that contains its view direction.
        let mut camera = ViewCamera::default()
            .with_projection(ViewProjection::Orthographic { width: 10.0 });
        let mut controller = controller();
        controller.start_pan(&mut camera, &(), DVec2::new(400.0, 300.0), Duration::ZERO);
        if let Some(gesture) = controller.gesture.as_mut() {
            if let crate::controller::gesture::ActiveGesture::Pan(pan) = &mut gesture.active {
                pan.plane_normal = DVec3::X;
            }
        }
        let before = camera;
        controller.mouse_move(&mut camera, &(), DVec2::new(300.0, 200.0));
        assert_eq!(camera, before);
    }
}
