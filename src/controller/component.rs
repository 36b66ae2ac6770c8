//! The primary [`Component`] of the controller, [`CameraController`].

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::{DVec2, DVec3};
use bevy_time::{Real, Time};
use bevy_window::RequestRedraw;

use super::{
    camera::ViewCamera,
    config::ControllerConfig,
    gesture::{ActiveGesture, Gesture},
    inertia::{decay_factor, FrameClock, InertiaState, RotationInertia, SpinInertia},
    rotation::{RotationMath, RotationRequest, RotationStrategy, TurnballAxes},
};

/// Pan force to velocity multiplier.
pub const PAN_FORCE_SCALE: f64 = 40.0;
/// Rotate force to velocity multiplier.
pub const ROTATE_FORCE_SCALE: f64 = 40.0;
/// Zoom force to velocity multiplier.
pub const ZOOM_FORCE_SCALE: f64 = 8.0;
/// Move force to velocity multiplier.
pub const MOVE_FORCE_SCALE: f64 = 40.0;

/// Tracks all state of a camera's controller: its settings, the gesture in progress, and the
/// momentum left over from earlier gestures and forces.
///
/// # Moving the Camera
///
/// With the [`ViewportCamPlugin`](crate::ViewportCamPlugin) and the default input plugin, mouse
/// input is routed to the controller automatically, using [`bevy_picking`] hits to find the
/// surface under the pointer.
///
/// To move the camera manually:
///
/// 1. Start a gesture with [`CameraController::start_pan`], [`CameraController::start_rotate`] or
///    [`CameraController::start_zoom`]. A `true` result means the host should capture the
///    pointer.
/// 2. While the pointer moves, call [`CameraController::mouse_move`].
/// 3. When the pointer is released, call [`CameraController::end_gesture`] (or one of the
///    variant-specific `end_*` methods). A quick release leaves the camera coasting.
/// 4. Call [`CameraController::on_time_step`] once per frame to integrate momentum, and redraw
///    when it returns `true`.
///
/// Discrete inputs such as keyboard nudges go through the `add_*_force` methods.
#[derive(Debug, Clone, Component)]
#[require(ViewCamera)]
pub struct CameraController {
    /// Settings, freely editable at runtime.
    pub config: ControllerConfig,
    /// Logical size of the viewport. Kept in sync with the Bevy camera by the plugin.
    pub viewport_size: DVec2,
    /// Rotation algorithm implementation.
    pub rotation_math: RotationStrategy,
    pub(crate) gesture: Option<Gesture>,
    pub(crate) inertia: InertiaState,
    pub(crate) clock: FrameClock,
    pub(crate) turnball_axes: Option<TurnballAxes>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl CameraController {
    /// Create a controller with the given settings.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            viewport_size: DVec2::new(1280.0, 720.0),
            rotation_math: RotationStrategy::default(),
            gesture: None,
            inertia: InertiaState::default(),
            clock: FrameClock::default(),
            turnball_axes: None,
        }
    }

    /// Set the viewport size.
    #[must_use = "with_viewport_size returns a modified CameraController"]
    pub fn with_viewport_size(self, viewport_size: DVec2) -> Self {
        Self {
            viewport_size,
            ..self
        }
    }

    /// Replace the rotation algorithm implementation.
    #[must_use = "with_rotation_math returns a modified CameraController"]
    pub fn with_rotation_math(self, math: impl RotationMath) -> Self {
        Self {
            rotation_math: RotationStrategy::new(math),
            ..self
        }
    }

    /// The gesture in progress, if any.
    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    /// Is a pan gesture in progress?
    pub fn is_panning(&self) -> bool {
        matches!(
            self.gesture,
            Some(Gesture {
                active: ActiveGesture::Pan(_),
                ..
            })
        )
    }

    /// Is a rotate gesture in progress?
    pub fn is_rotating(&self) -> bool {
        matches!(
            self.gesture,
            Some(Gesture {
                active: ActiveGesture::Rotate(_),
                ..
            })
        )
    }

    /// Is a zoom gesture in progress?
    pub fn is_zooming(&self) -> bool {
        matches!(
            self.gesture,
            Some(Gesture {
                active: ActiveGesture::Zoom(_),
                ..
            })
        )
    }

    /// Current momentum.
    pub fn inertia(&self) -> &InertiaState {
        &self.inertia
    }

    /// Replace the momentum, e.g. to restore a saved state in a test or a replay.
    pub fn set_inertia(&mut self, inertia: InertiaState) {
        self.inertia = inertia;
    }

    /// Center of the viewport in logical pixels.
    pub fn viewport_center(&self) -> DVec2 {
        self.viewport_size / 2.0
    }

    pub(crate) fn rotation_request<'a>(
        &self,
        camera: &'a ViewCamera,
        pivot: DVec3,
    ) -> RotationRequest<'a> {
        RotationRequest {
            camera,
            mode: self.config.camera_mode,
            pivot,
            sensitivity: self.config.sensitivity.rotate,
            viewport: self.viewport_size,
            handedness: camera.handedness.sign(),
            model_up: self.config.model_up_direction,
        }
    }

    /// Push the camera along the view plane by a screen space `delta` in pixels.
    pub fn add_pan_force(&mut self, camera: &mut ViewCamera, delta: DVec2) -> bool {
        let pan = self.find_pan_vector(camera, delta);
        self.add_pan_force_world(camera, pan)
    }

    /// Push the camera by a world space vector.
    pub fn add_pan_force_world(&mut self, camera: &mut ViewCamera, pan: DVec3) -> bool {
        if !self.config.enabled.pan {
            return false;
        }
        if self.config.inertia.enabled {
            self.inertia.pan += pan * PAN_FORCE_SCALE;
            true
        } else {
            self.pan(camera, pan, true)
        }
    }

    /// Rotate the camera about its target by a screen space `delta` in pixels.
    pub fn add_rotate_force(&mut self, camera: &mut ViewCamera, delta: DVec2) -> bool {
        if !self.config.enabled.rotate {
            return false;
        }
        let center = self.viewport_center();
        let pivot = camera.target();
        if self.config.inertia.enabled {
            self.stop_spin();
            self.inertia.rotation = RotationInertia {
                velocity: self.inertia.rotation.velocity + delta * ROTATE_FORCE_SCALE,
                position: center,
                pivot,
            };
            true
        } else {
            self.rotate(camera, center, center + delta, pivot, true)
        }
    }

    /// Zoom toward the camera target.
    pub fn add_zoom_force(&mut self, camera: &mut ViewCamera, delta: f64) -> bool {
        let pivot = camera.target();
        self.add_zoom_force_at(camera, delta, pivot)
    }

    /// Zoom toward `pivot`. Negative deltas zoom in.
    pub fn add_zoom_force_at(&mut self, camera: &mut ViewCamera, delta: f64, pivot: DVec3) -> bool {
        if !self.config.enabled.zoom {
            return false;
        }
        if self.config.inertia.enabled {
            self.inertia.zoom.pivot = pivot;
            self.inertia.zoom.velocity += delta * ZOOM_FORCE_SCALE;
            true
        } else {
            self.zoom(camera, delta, pivot, false, true)
        }
    }

    /// Translate the camera along its own axes: `x` right, `y` up, `z` forward.
    pub fn add_move_force(&mut self, camera: &mut ViewCamera, delta: DVec3) -> bool {
        if !self.config.enabled.move_camera {
            return false;
        }
        if self.config.inertia.enabled {
            self.inertia.movement += delta * MOVE_FORCE_SCALE;
            true
        } else {
            self.move_camera_position(camera, delta, true)
        }
    }

    /// Spin freely about `pivot` until the spin decays or is stopped.
    pub fn start_spin(&mut self, velocity: DVec2, position: DVec2, pivot: DVec3) {
        self.inertia.rotation = RotationInertia::default();
        self.inertia.spin = SpinInertia {
            active: true,
            velocity,
            position,
            pivot,
        };
    }

    /// Zero all momentum.
    pub fn stop_animations(&mut self) {
        self.inertia = InertiaState::default();
    }

    /// Zero pan momentum.
    pub fn stop_panning(&mut self) {
        self.inertia.pan = DVec3::ZERO;
    }

    /// Zero zoom momentum.
    pub fn stop_zooming(&mut self) {
        self.inertia.zoom.velocity = 0.0;
    }

    /// End a flick spin.
    pub fn stop_spin(&mut self) {
        self.inertia.spin.active = false;
        self.inertia.spin.velocity = DVec2::ZERO;
    }

    /// Integrate momentum over `dt` seconds. Returns `true` if the camera moved or the host is
    /// animating it, i.e. the frame needs redrawing.
    pub fn step_inertia(&mut self, camera: &mut ViewCamera, dt: f64) -> bool {
        let factor = decay_factor(&self.config.inertia, dt);
        let (inertia, impulses) =
            self.inertia
                .advance(dt, factor, self.config.inertia.infinite_spin);
        self.inertia = inertia;

        if let Some(rotate) = impulses.rotate {
            self.rotate(camera, rotate.from, rotate.to, rotate.pivot, false);
        }
        if let Some(pan) = impulses.pan {
            self.pan(camera, pan, false);
        }
        if let Some(movement) = impulses.movement {
            self.move_camera_position(camera, movement, false);
        }
        if let Some((delta, pivot)) = impulses.zoom {
            self.zoom(camera, delta, pivot, false, false);
        }

        !impulses.is_empty() || camera.animating
    }

    /// The per-frame tick. `now` is the time since startup on a monotonic clock.
    ///
    /// Returns `true` if the frame needs redrawing. When nothing moved, the frame clock is reset so
    /// the next active frame does not integrate the idle time.
    pub fn on_time_step(&mut self, camera: &mut ViewCamera, now: Duration) -> bool {
        let dt = self.clock.delta(now);
        let needs_redraw = self.step_inertia(camera, dt);
        if !needs_redraw {
            self.clock.reset();
        }
        needs_redraw
    }

    /// Integrate momentum for all cameras. Called once per frame.
    pub fn update_cameras(
        mut cameras: Query<(&mut CameraController, &mut ViewCamera)>,
        mut redraw: EventWriter<RequestRedraw>,
        time: Res<Time<Real>>,
    ) {
        let now = time.elapsed();
        for (mut controller, mut camera) in cameras.iter_mut() {
            // Work on a copy so an idle camera is not flagged as changed.
            let mut view = *camera;
            if controller.on_time_step(&mut view, now) {
                trace!("Camera moved by inertia");
                camera.set_if_neq(view);
                redraw.write(RequestRedraw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forces_respect_enable_flags() {
        let mut camera = ViewCamera::default();
        let mut controller = CameraController::default();
        controller.config.enabled.pan = false;
        controller.config.enabled.zoom = false;
        controller.config.enabled.rotate = false;
        controller.config.enabled.move_camera = false;

        assert!(!controller.add_pan_force(&mut camera, DVec2::new(5.0, 0.0)));
        assert!(!controller.add_zoom_force(&mut camera, -1.0));
        assert!(!controller.add_rotate_force(&mut camera, DVec2::new(5.0, 0.0)));
        assert!(!controller.add_move_force(&mut camera, DVec3::Z));
        assert!(controller.inertia().is_idle());
    }

    #[test]
    fn forces_accumulate_scaled_velocity() {
        let mut camera = ViewCamera::default();
        let mut controller = CameraController::default();
        controller.add_zoom_force(&mut camera, -0.1);
        controller.add_zoom_force(&mut camera, -0.1);
        assert!((controller.inertia().zoom.velocity + 1.6).abs() < 1e-12);
        controller.add_move_force(&mut camera, DVec3::new(0.0, 0.0, 0.5));
        assert_eq!(controller.inertia().movement, DVec3::new(0.0, 0.0, 20.0));
        controller.add_rotate_force(&mut camera, DVec2::new(1.0, 0.0));
        assert_eq!(controller.inertia().rotation.velocity, DVec2::new(40.0, 0.0));
        assert_eq!(controller.inertia().rotation.position, controller.viewport_center());
        assert_eq!(camera, ViewCamera::default());
    }

    #[test]
    fn spin_and_directed_rotation_exclude_each_other() {
        let mut camera = ViewCamera::default();
        let mut controller = CameraController::default();
        controller.add_rotate_force(&mut camera, DVec2::new(1.0, 0.0));
        controller.start_spin(DVec2::new(30.0, 0.0), DVec2::ZERO, DVec3::ZERO);
        assert_eq!(controller.inertia().rotation.velocity, DVec2::ZERO);
        controller.add_rotate_force(&mut camera, DVec2::new(1.0, 0.0));
        assert_eq!(controller.inertia().spin.velocity, DVec2::ZERO);
        assert!(!controller.inertia().spin.active);
    }

    #[test]
    fn idle_tick_resets_clock() {
        let mut camera = ViewCamera::default();
        let mut controller = CameraController::default();
        assert!(!controller.on_time_step(&mut camera, Duration::from_secs(1)));
        assert_eq!(controller.clock.last_tick(), None);

        controller.add_move_force(&mut camera, DVec3::Z);
        assert!(controller.on_time_step(&mut camera, Duration::from_secs(2)));
        assert_eq!(controller.clock.last_tick(), Some(Duration::from_secs(2)));
        assert!(camera.position.z < 10.0);
    }

    #[test]
    fn host_animation_requests_redraw() {
        let mut camera = ViewCamera {
            animating: true,
            ..Default::default()
        };
        let mut controller = CameraController::default();
        assert!(controller.step_inertia(&mut camera, 0.016));
    }
}
