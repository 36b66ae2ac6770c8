//! Rotating: orbiting the camera about a pivot.

use bevy_log::prelude::*;
use bevy_math::{DVec2, DVec3};

use super::{
    camera::ViewCamera,
    component::CameraController,
    config::{CameraMode, RotationAlgorithm},
    gesture::{ActiveGesture, Gesture, GestureSession},
};

/// State of a rotate gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateGesture {
    /// World position the camera orbits.
    pub pivot: DVec3,
    /// Screen position of the pivot when the gesture started.
    pub pivot_point: DVec2,
    /// Whether the camera was aimed at the pressed surface first.
    pub change_look_at: bool,
}

impl CameraController {
    /// Resolve the pivot for a rotate gesture starting with `session`.
    pub(crate) fn rotate_started(
        &mut self,
        camera: &mut ViewCamera,
        session: &mut GestureSession,
        change_look_at: bool,
    ) -> RotateGesture {
        let nearest = session.mouse_down_nearest_point_3d;
        let mut gesture = RotateGesture {
            pivot: camera.target(),
            pivot_point: self.viewport_center(),
            change_look_at,
        };

        if self.config.camera_mode == CameraMode::WalkAround {
            gesture.pivot = camera.position;
            gesture.pivot_point = session.mouse_down_point;
        } else if let Some(fixed) = self.config.fixed_rotation_point {
            gesture.pivot = fixed;
        } else if let (true, Some(hit)) = (change_look_at, nearest) {
            self.look_at(camera, hit);
            gesture.pivot = camera.target();
        } else if let (true, Some(hit)) = (self.config.rotate_around_mouse_down_point, nearest) {
            gesture.pivot = hit;
            gesture.pivot_point = session.mouse_down_point;
        }

        if self.config.rotation_algorithm == RotationAlgorithm::Turnball {
            let request = self.rotation_request(camera, gesture.pivot);
            self.turnball_axes = Some(
                self.rotation_math
                    .turnball_axes(&request, session.mouse_down_point),
            );
        }
        self.stop_spin();
        gesture
    }

    /// Rotate the camera about `pivot` as if the pointer moved from `p0` to `p1`. With
    /// `stop_other`, zoom and pan momentum are cancelled.
    ///
    /// Returns `true` if the camera moved.
    pub fn rotate(
        &mut self,
        camera: &mut ViewCamera,
        p0: DVec2,
        p1: DVec2,
        pivot: DVec3,
        stop_other: bool,
    ) -> bool {
        if !self.config.enabled.rotate {
            return false;
        }
        if stop_other {
            self.stop_zooming();
            self.stop_panning();
        }
        let mask = self.config.sensitivity.rotate_axis_mask;
        let (p0, p1) = (p0 * mask, p1 * mask);

        let request = self.rotation_request(camera, pivot);
        let pose = match self.config.rotation_algorithm {
            RotationAlgorithm::Trackball => self.rotation_math.trackball(&request, p0, p1),
            RotationAlgorithm::Turntable => self.rotation_math.turntable(&request, p1 - p0),
            RotationAlgorithm::Turnball => {
                let axes = self.turnball_axes.unwrap_or_else(|| {
                    self.rotation_math
                        .turnball_axes(&request, self.viewport_center())
                });
                self.rotation_math.turnball(&request, p0, p1, axes)
            }
        };
        let Some(mut pose) = pose.filter(|pose| {
            pose.position.is_finite()
                && pose.look_direction.is_finite()
                && pose.up_direction.is_finite()
        }) else {
            return false;
        };
        if (pose.up_direction.length() - 1.0).abs() > 1e-8 {
            pose.up_direction = pose.up_direction.normalize_or_zero();
        }
        camera.set_pose(pose);
        true
    }

    /// Aim the camera at `target` without moving it.
    pub fn look_at(&mut self, camera: &mut ViewCamera, target: DVec3) {
        camera.look_at(target);
    }

    /// The point the camera is orbiting, during a rotate gesture or a flick spin.
    pub fn rotation_pivot(&self) -> Option<DVec3> {
        match self.gesture {
            Some(Gesture {
                active: ActiveGesture::Rotate(rotate),
                ..
            }) => Some(rotate.pivot),
            _ if self.inertia.spin.active && self.inertia.spin.velocity != DVec2::ZERO => {
                Some(self.inertia.spin.pivot)
            }
            _ => None,
        }
    }

    pub(crate) fn rotate_delta(
        &mut self,
        camera: &mut ViewCamera,
        session: &mut GestureSession,
        gesture: &RotateGesture,
        point: DVec2,
    ) {
        self.rotate(camera, session.last_point, point, gesture.pivot, true);
        session.last_point = point;
    }

    pub(crate) fn rotate_fling(
        &mut self,
        session: &GestureSession,
        gesture: &RotateGesture,
        elapsed_ms: f64,
    ) {
        let release_ms = self.config.spin_release_time.as_secs_f64() * 1000.0;
        let velocity =
            4.0 * (session.last_point - session.mouse_down_point) * (release_ms / elapsed_ms);
        trace!("Flick spin at {velocity} px/s about {}", gesture.pivot);
        self.start_spin(velocity, session.mouse_down_point, gesture.pivot);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::controller::scene::{SceneHit, SceneQuery};

    struct Hit(DVec3);

    impl SceneQuery for Hit {
        fn find_nearest(&self, _: &ViewCamera, _: DVec2, _: DVec2) -> Option<SceneHit> {
            Some(SceneHit {
                position: self.0,
                normal: Some(DVec3::Z),
            })
        }
    }

    const HIT: DVec3 = DVec3::new(1.0, 1.0, 0.0);
    const PRESS: DVec2 = DVec2::new(500.0, 200.0);

    fn pivot_for(controller: &mut CameraController, camera: &mut ViewCamera, look_at: bool) -> DVec3 {
        if look_at {
            controller.start_change_look_at(camera, &Hit(HIT), PRESS, Duration::ZERO);
        } else {
            controller.start_rotate(camera, &Hit(HIT), PRESS, Duration::ZERO);
        }
        match controller.gesture().unwrap().active {
            ActiveGesture::Rotate(rotate) => rotate.pivot,
            _ => unreachable!(),
        }
    }

    fn controller() -> CameraController {
        CameraController::default().with_viewport_size(DVec2::new(800.0, 600.0))
    }

    #[test]
    fn default_pivot_is_target() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        assert_eq!(pivot_for(&mut controller, &mut camera, false), DVec3::ZERO);
    }

    #[test]
    fn walk_around_pivots_on_eye() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.camera_mode = CameraMode::WalkAround;
        controller.config.fixed_rotation_point = Some(DVec3::X);
        assert_eq!(pivot_for(&mut controller, &mut camera, false), camera.position);
    }

    #[test]
    fn fixed_point_beats_mouse_down_point() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.fixed_rotation_point = Some(DVec3::X);
        controller.config.rotate_around_mouse_down_point = true;
        assert_eq!(pivot_for(&mut controller, &mut camera, true), DVec3::X);
    }

    #[test]
    fn change_look_at_aims_before_rotating() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.rotate_around_mouse_down_point = true;
        let pivot = pivot_for(&mut controller, &mut camera, true);
        assert_eq!(pivot, HIT);
        assert_eq!(camera.target(), HIT);
        assert_eq!(camera.position, DVec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn rotate_around_mouse_down_point_uses_hit() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.rotate_around_mouse_down_point = true;
        assert_eq!(pivot_for(&mut controller, &mut camera, false), HIT);
        assert_eq!(camera.target(), DVec3::ZERO);
    }

    #[test]
    fn axis_mask_locks_vertical_rotation() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.sensitivity.rotate_axis_mask = DVec2::new(1.0, 0.0);
        controller.rotate(
            &mut camera,
            DVec2::new(400.0, 300.0),
            DVec2::new(450.0, 380.0),
            DVec3::ZERO,
            true,
        );
        assert!(camera.position.y.abs() < 1e-12);
        assert!(camera.position.x != 0.0);
    }

    #[test]
    fn rotate_stops_pan_and_zoom() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.add_pan_force(&mut camera, DVec2::new(10.0, 0.0));
        controller.add_zoom_force(&mut camera, -1.0);
        controller.rotate(&mut camera, DVec2::ZERO, DVec2::X, DVec3::ZERO, true);
        assert_eq!(controller.inertia().pan, DVec3::ZERO);
        assert_eq!(controller.inertia().zoom.velocity, 0.0);
    }

    #[test]
    fn turnball_drag_orbits_pivot() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.rotation_algorithm = RotationAlgorithm::Turnball;
        controller.start_rotate(&mut camera, &(), DVec2::new(600.0, 150.0), Duration::ZERO);
        assert!(controller.turnball_axes.is_some());
        controller.mouse_move(&mut camera, &(), DVec2::new(640.0, 170.0));
        assert!((camera.position.length() - 10.0).abs() < 1e-9);
        assert!((camera.target() - DVec3::ZERO).length() < 1e-9);
        assert_eq!(controller.rotation_pivot(), Some(DVec3::ZERO));
    }

    #[test]
    fn disabled_rotation_is_ignored() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.enabled.rotate = false;
        assert!(!controller.rotate(&mut camera, DVec2::ZERO, DVec2::ONE * 50.0, DVec3::ZERO, true));
        assert_eq!(camera, ViewCamera::default());
    }
}
