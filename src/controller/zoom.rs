//! Zooming and dollying, and the [`ZoomLimits`] settings that bound them.

use bevy_log::prelude::*;
use bevy_math::{DVec2, DVec3};
use bevy_reflect::Reflect;

use super::{
    camera::{ViewCamera, ViewProjection},
    component::CameraController,
    config::CameraMode,
    gesture::{ActiveGesture, Gesture, GestureSession},
    scene::SceneQuery,
};

/// Each unit of zoom delta scales the distance to the pivot by this factor.
pub const ZOOM_BASE: f64 = 2.5;

/// Bound zooming distance and field of view.
#[derive(Debug, Clone, Reflect)]
pub struct ZoomLimits {
    /// The closest the camera may zoom to its pivot.
    ///
    /// Zooming in stops here rather than passing through the pivot.
    pub near: f64,
    /// The farthest the camera may zoom away from its pivot.
    pub far: f64,
    /// Smallest field of view in degrees when zooming by field of view.
    pub min_field_of_view: f64,
    /// Largest field of view in degrees when zooming by field of view.
    pub max_field_of_view: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            near: 0.001,
            far: f64::INFINITY,
            min_field_of_view: 5.0,
            max_field_of_view: 160.0,
        }
    }
}

/// State of a zoom gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomGesture {
    /// World position zoomed toward.
    pub pivot: DVec3,
    /// Screen position of the pivot.
    pub pivot_point: DVec2,
    /// Change the field of view instead of the distance.
    pub field_of_view: bool,
}

impl CameraController {
    pub(crate) fn zoom_started(
        &self,
        camera: &ViewCamera,
        session: &GestureSession,
        field_of_view: bool,
    ) -> ZoomGesture {
        match (
            self.config.zoom_around_mouse_down_point,
            session.mouse_down_nearest_point_3d,
        ) {
            (true, Some(hit)) => ZoomGesture {
                pivot: hit,
                pivot_point: session.mouse_down_point,
                field_of_view,
            },
            _ => ZoomGesture {
                pivot: camera.target(),
                pivot_point: self.viewport_center(),
                field_of_view,
            },
        }
    }

    /// Is a field of view zoom gesture in progress?
    pub fn is_changing_field_of_view(&self) -> bool {
        matches!(
            self.gesture,
            Some(Gesture {
                active: ActiveGesture::Zoom(ZoomGesture {
                    field_of_view: true,
                    ..
                }),
                ..
            })
        )
    }

    /// Zoom by `delta` toward `pivot`. Negative deltas zoom in. With `stop_other`, spin and pan
    /// momentum are cancelled.
    ///
    /// - Perspective cameras move toward the pivot in [`CameraMode::Inspect`], walk along the view
    ///   direction in [`CameraMode::WalkAround`], and change the field of view in
    ///   [`CameraMode::FixedPosition`] or during a field of view gesture. Unless `is_touch`, a
    ///   single call zooms in by at most `-0.5`.
    /// - Orthographic cameras move toward the pivot and scale their width by the same factor.
    ///
    /// Returns `true` if the camera changed.
    pub fn zoom(
        &mut self,
        camera: &mut ViewCamera,
        delta: f64,
        pivot: DVec3,
        is_touch: bool,
        stop_other: bool,
    ) -> bool {
        if !self.config.enabled.zoom {
            return false;
        }
        if stop_other {
            self.stop_spin();
            self.stop_panning();
        }
        match camera.projection {
            ViewProjection::Perspective { .. } => {
                let delta = if is_touch { delta } else { delta.max(-0.5) };
                if self.config.camera_mode == CameraMode::FixedPosition
                    || self.is_changing_field_of_view()
                {
                    return self.zoom_by_changing_field_of_view(camera, delta);
                }
                match self.config.camera_mode {
                    CameraMode::Inspect => self.change_camera_distance(camera, delta, pivot).is_some(),
                    CameraMode::WalkAround => {
                        camera.position -= camera.look_direction * delta;
                        true
                    }
                    CameraMode::FixedPosition => false,
                }
            }
            ViewProjection::Orthographic { .. } => {
                let Some(delta) = self.change_camera_distance(camera, delta, pivot) else {
                    return false;
                };
                if let ViewProjection::Orthographic { width } = &mut camera.projection {
                    *width *= ZOOM_BASE.powf(delta);
                }
                true
            }
        }
    }

    /// Scale the camera's distance to `pivot` by `2.5^delta`, keeping it within the near and far
    /// limits.
    ///
    /// Returns the delta actually applied, which differs from `delta` when a limit was reached, or
    /// `None` if the camera is already at the pivot and `delta` would zoom in further.
    pub fn change_camera_distance(
        &self,
        camera: &mut ViewCamera,
        delta: f64,
        pivot: DVec3,
    ) -> Option<f64> {
        let limits = &self.config.zoom_limits;
        let relative_target = pivot - camera.target();
        let mut relative_position = pivot - camera.position;
        let old_distance = relative_position.length();

        if relative_position.length_squared() < 1e-5 {
            if delta <= 0.0 {
                debug!("Zoom rejected: camera is at the pivot");
                return None;
            }
            // Zooming out from the pivot: start from a small offset behind the eye.
            let direction = relative_position
                .try_normalize()
                .or_else(|| camera.look_direction.try_normalize())
                .unwrap_or(DVec3::NEG_Z);
            relative_position = direction * 0.1;
        }

        let mut delta = delta;
        let mut factor = ZOOM_BASE.powf(delta);
        let new_distance = relative_position.length() * factor;

        if new_distance > limits.far && (old_distance < limits.far || new_distance > old_distance) {
            let ratio = (new_distance - limits.far) / new_distance;
            factor *= 1.0 - ratio;
            delta = factor.ln() / ZOOM_BASE.ln();
        }
        if new_distance < limits.near && (old_distance > limits.near || new_distance < old_distance)
        {
            let ratio = (limits.near - new_distance) / new_distance;
            factor *= 1.0 + ratio;
            delta = factor.ln() / ZOOM_BASE.ln();
        }

        let new_position = pivot - relative_position * factor;
        let new_target = pivot - relative_target * factor;
        if !new_position.is_finite() || !new_target.is_finite() {
            return None;
        }
        camera.position = new_position;
        camera.look_direction = new_target - new_position;
        Some(delta)
    }

    /// Widen or narrow the field of view by `1 + delta / 2`, within the configured limits.
    ///
    /// Outside [`CameraMode::FixedPosition`] the camera also moves along its view direction so the
    /// area visible at the target stays the same size.
    pub fn zoom_by_changing_field_of_view(&mut self, camera: &mut ViewCamera, delta: f64) -> bool {
        if !self.config.enabled.field_of_view {
            return false;
        }
        let ViewProjection::Perspective { field_of_view } = camera.projection else {
            return false;
        };
        let limits = &self.config.zoom_limits;
        let half_width = camera.target_distance() * (field_of_view.to_radians() * 0.5).tan();
        let new_field_of_view = (field_of_view * (1.0 + delta * 0.5))
            .max(limits.min_field_of_view)
            .min(limits.max_field_of_view);
        camera.projection = ViewProjection::Perspective {
            field_of_view: new_field_of_view,
        };

        if self.config.camera_mode != CameraMode::FixedPosition {
            let distance = half_width / (new_field_of_view.to_radians() * 0.5).tan();
            if let Some(direction) = camera.look_direction.try_normalize() {
                let target = camera.target();
                camera.look_direction = direction * distance;
                camera.position = target - camera.look_direction;
            }
        }
        true
    }

    /// Translate the camera along its own axes: `x` right, `y` up, `z` forward. With `stop_other`,
    /// spin and pan momentum are cancelled.
    ///
    /// Only moves the camera in [`CameraMode::Inspect`] and [`CameraMode::WalkAround`], and only if
    /// moving is enabled.
    pub fn move_camera_position(
        &mut self,
        camera: &mut ViewCamera,
        delta: DVec3,
        stop_other: bool,
    ) -> bool {
        if !self.config.enabled.move_camera
            || !matches!(
                self.config.camera_mode,
                CameraMode::Inspect | CameraMode::WalkAround
            )
        {
            return false;
        }
        if stop_other {
            self.stop_spin();
            self.stop_panning();
        }
        let z = camera.look_direction.normalize_or_zero();
        let y = camera.up_direction.normalize_or_zero();
        let x = z.cross(y).normalize_or_zero();
        camera.position += x * delta.x + y * delta.y + z * delta.z;
        true
    }

    /// Zoom by mouse wheel `notches`; positive values scroll away from the user and zoom in. When
    /// zooming around the mouse down point, the surface under `point` is the pivot.
    pub fn mouse_wheel(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        notches: f64,
    ) -> bool {
        if !self.config.enabled.zoom || notches == 0.0 {
            return false;
        }
        let delta = -notches * 0.12 * self.config.sensitivity.zoom;
        let hit = if self.config.zoom_around_mouse_down_point {
            scene.find_nearest(camera, self.viewport_size, point)
        } else {
            None
        };
        match hit {
            Some(hit) => self.add_zoom_force_at(camera, delta, hit.position),
            None => self.add_zoom_force(camera, delta),
        }
    }

    pub(crate) fn zoom_delta(
        &mut self,
        camera: &mut ViewCamera,
        session: &mut GestureSession,
        gesture: &ZoomGesture,
        point: DVec2,
    ) {
        let delta = (point.y - session.last_point.y) * 0.01 * self.config.sensitivity.zoom;
        session.last_point = point;
        self.zoom(camera, delta, gesture.pivot, false, true);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn controller() -> CameraController {
        CameraController::default().with_viewport_size(DVec2::new(800.0, 600.0))
    }

    fn distance(camera: &ViewCamera) -> f64 {
        camera.position.length()
    }

    #[test]
    fn zoom_is_exponential() {
        let mut camera = ViewCamera::default();
        let controller = controller();
        let applied = controller
            .change_camera_distance(&mut camera, 1.0, DVec3::ZERO)
            .unwrap();
        assert_eq!(applied, 1.0);
        assert!((distance(&camera) - 25.0).abs() < 1e-9);
        assert!((camera.target() - DVec3::ZERO).length() < 1e-9);
    }

    #[test]
    fn zoom_toward_off_target_pivot_scales_target_too() {
        let mut camera = ViewCamera::default();
        let controller = controller();
        let pivot = DVec3::new(2.0, 0.0, 0.0);
        controller.change_camera_distance(&mut camera, -0.4, pivot);
        let f = ZOOM_BASE.powf(-0.4);
        assert!((camera.position - (pivot - (pivot - DVec3::new(0.0, 0.0, 10.0)) * f)).length() < 1e-9);
        assert!((camera.target() - (pivot - pivot * f)).length() < 1e-9);
    }

    #[test]
    fn far_limit_rescales_delta() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.zoom_limits.far = 20.0;
        let applied = controller
            .change_camera_distance(&mut camera, 1.0, DVec3::ZERO)
            .unwrap();
        assert!((distance(&camera) - 20.0).abs() < 1e-9);
        assert!((ZOOM_BASE.powf(applied) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn near_limit_stops_zoom_in() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.zoom_limits.near = 4.0;
        controller.change_camera_distance(&mut camera, -3.0, DVec3::ZERO);
        assert!((distance(&camera) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_at_pivot() {
        let mut camera = ViewCamera::default();
        let controller = controller();
        let eye = camera.position;
        assert_eq!(controller.change_camera_distance(&mut camera, -0.2, eye), None);
        assert_eq!(camera, ViewCamera::default());
        assert!(controller
            .change_camera_distance(&mut camera, 0.5, eye)
            .is_some());
        assert!(camera.position.z > 10.0);
    }

    #[test]
    fn single_step_zoom_in_is_bounded() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.zoom(&mut camera, -5.0, DVec3::ZERO, false, true);
        assert!((distance(&camera) - 10.0 * ZOOM_BASE.powf(-0.5)).abs() < 1e-9);

        let mut touched = ViewCamera::default();
        controller.zoom(&mut touched, -1.0, DVec3::ZERO, true, true);
        assert!((distance(&touched) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn orthographic_zoom_scales_width() {
        let mut camera =
            ViewCamera::default().with_projection(ViewProjection::Orthographic { width: 8.0 });
        let mut controller = controller();
        assert!(controller.zoom(&mut camera, 1.0, DVec3::ZERO, false, true));
        assert_eq!(
            camera.projection,
            ViewProjection::Orthographic { width: 20.0 }
        );
    }

    #[test]
    fn orthographic_zoom_in_is_not_bounded() {
        let mut camera =
            ViewCamera::default().with_projection(ViewProjection::Orthographic { width: 8.0 });
        let mut controller = controller();
        assert!(controller.zoom(&mut camera, -1.0, DVec3::ZERO, false, true));
        let ViewProjection::Orthographic { width } = camera.projection else {
            panic!("projection changed kind");
        };
        assert!((width - 8.0 * 0.4).abs() < 1e-12);
        assert!((distance(&camera) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn blocked_move_keeps_momentum() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.start_spin(DVec2::new(50.0, 0.0), DVec2::ZERO, DVec3::ZERO);
        controller.add_pan_force(&mut camera, DVec2::new(10.0, 0.0));

        controller.config.enabled.move_camera = false;
        assert!(!controller.move_camera_position(&mut camera, DVec3::Z, true));
        controller.config.enabled.move_camera = true;
        controller.config.camera_mode = CameraMode::FixedPosition;
        assert!(!controller.move_camera_position(&mut camera, DVec3::Z, true));

        assert_eq!(controller.inertia().spin.velocity, DVec2::new(50.0, 0.0));
        assert!(controller.inertia().pan != DVec3::ZERO);
        assert_eq!(camera, ViewCamera::default());
    }

    #[test]
    fn walk_around_dollies_along_view() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.camera_mode = CameraMode::WalkAround;
        controller.zoom(&mut camera, -0.1, DVec3::new(5.0, 5.0, 5.0), false, true);
        assert!((camera.position - DVec3::new(0.0, 0.0, 9.0)).length() < 1e-12);
        assert_eq!(camera.look_direction, DVec3::new(0.0, 0.0, -10.0));
    }

    #[test]
    fn fixed_position_changes_field_of_view() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.camera_mode = CameraMode::FixedPosition;
        controller.zoom(&mut camera, 0.4, DVec3::ZERO, false, true);
        assert_eq!(camera.position, DVec3::new(0.0, 0.0, 10.0));
        let ViewProjection::Perspective { field_of_view } = camera.projection else {
            panic!("projection changed kind");
        };
        assert!((field_of_view - 54.0).abs() < 1e-9);

        for _ in 0..20 {
            controller.zoom(&mut camera, 1.0, DVec3::ZERO, false, true);
        }
        assert_eq!(
            camera.projection,
            ViewProjection::Perspective {
                field_of_view: 160.0
            }
        );
    }

    #[test]
    fn field_of_view_gesture_keeps_visible_width() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        let half_width = 10.0 * (45.0f64.to_radians() * 0.5).tan();
        controller.start_field_of_view_zoom(&mut camera, &(), DVec2::new(400.0, 300.0), Duration::ZERO);
        controller.mouse_move(&mut camera, &(), DVec2::new(400.0, 340.0));
        let ViewProjection::Perspective { field_of_view } = camera.projection else {
            panic!("projection changed kind");
        };
        assert!((field_of_view - 54.0).abs() < 1e-9);
        let visible = camera.target_distance() * (field_of_view.to_radians() * 0.5).tan();
        assert!((visible - half_width).abs() < 1e-9);
        assert!((camera.target() - DVec3::ZERO).length() < 1e-9);
    }

    #[test]
    fn move_uses_camera_axes() {
        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.move_camera_position(&mut camera, DVec3::new(1.0, 2.0, 3.0), true);
        assert!((camera.position - DVec3::new(1.0, 2.0, 7.0)).length() < 1e-12);

        controller.config.camera_mode = CameraMode::FixedPosition;
        assert!(!controller.move_camera_position(&mut camera, DVec3::X, true));
    }

    #[test]
    fn wheel_zooms_toward_surface_under_pointer() {
        use crate::controller::scene::SceneHit;

        struct Floor;
        impl SceneQuery for Floor {
            fn find_nearest(&self, _: &ViewCamera, _: DVec2, _: DVec2) -> Option<SceneHit> {
                Some(SceneHit {
                    position: DVec3::new(3.0, 0.0, 0.0),
                    normal: None,
                })
            }
        }

        let mut camera = ViewCamera::default();
        let mut controller = controller();
        controller.config.zoom_around_mouse_down_point = true;
        controller.mouse_wheel(&mut camera, &Floor, DVec2::new(600.0, 300.0), 1.0);
        let zoom = controller.inertia().zoom;
        assert_eq!(zoom.pivot, DVec3::new(3.0, 0.0, 0.0));
        assert!((zoom.velocity + 0.96).abs() < 1e-12);
    }
}
