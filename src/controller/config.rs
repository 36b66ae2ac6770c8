//! Settings for the [`CameraController`](super::component::CameraController).

use std::time::Duration;

use bevy_math::{DVec2, DVec3};
use bevy_reflect::prelude::*;

use super::zoom::ZoomLimits;

/// All user-facing settings of a camera controller.
///
/// Fields are plain values and are not validated. Out of range values are clamped where they are
/// used.
#[derive(Debug, Clone, Reflect)]
pub struct ControllerConfig {
    /// Which manipulations are allowed.
    pub enabled: EnabledMotion,
    /// Input sensitivity of each manipulation.
    pub sensitivity: Sensitivity,
    /// Momentum after the pointer is released.
    pub inertia: InertiaSettings,
    /// Distance and field of view limits for zooming.
    pub zoom_limits: ZoomLimits,
    /// When set, rotations always pivot about this world position and the scene is not queried on
    /// press.
    pub fixed_rotation_point: Option<DVec3>,
    /// Rotate about the surface under the pointer at press, rather than the camera target.
    pub rotate_around_mouse_down_point: bool,
    /// Zoom toward the surface under the pointer, rather than the camera target.
    pub zoom_around_mouse_down_point: bool,
    /// A rotate or pan gesture released faster than this keeps moving.
    pub spin_release_time: Duration,
    /// How drag deltas are turned into orbit rotations.
    pub rotation_algorithm: RotationAlgorithm,
    /// How the camera relates to its target.
    pub camera_mode: CameraMode,
    /// World up, used as the yaw axis of [`RotationAlgorithm::Turntable`].
    pub model_up_direction: DVec3,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: Default::default(),
            sensitivity: Default::default(),
            inertia: Default::default(),
            zoom_limits: Default::default(),
            fixed_rotation_point: None,
            rotate_around_mouse_down_point: false,
            zoom_around_mouse_down_point: false,
            spin_release_time: Duration::from_millis(200),
            rotation_algorithm: Default::default(),
            camera_mode: Default::default(),
            model_up_direction: DVec3::Y,
        }
    }
}

/// Camera interaction modes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum CameraMode {
    /// Orbit about a target. Zooming changes the distance to the target.
    #[default]
    Inspect,
    /// Turn in place. Zooming walks along the view direction.
    WalkAround,
    /// The eye never moves. Zooming changes the field of view.
    FixedPosition,
}

/// Algorithms converting 2D drags into 3D orbit rotations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum RotationAlgorithm {
    /// Free rotation, as if rolling a ball under the pointer.
    Trackball,
    /// Yaw about the model up direction, pitch about the camera's right axis.
    #[default]
    Turntable,
    /// Yaw and pitch about axes tilted toward where the drag started.
    Turnball,
}

/// Controls which manipulations can start.
#[derive(Debug, Clone, Reflect)]
pub struct EnabledMotion {
    /// Should panning be enabled?
    pub pan: bool,
    /// Should zooming be enabled?
    pub zoom: bool,
    /// Should rotating be enabled?
    pub rotate: bool,
    /// Should move forces translate the camera?
    pub move_camera: bool,
    /// Should field of view zooming be enabled?
    pub field_of_view: bool,
}

impl Default for EnabledMotion {
    fn default() -> Self {
        Self {
            pan: true,
            zoom: true,
            rotate: true,
            move_camera: true,
            field_of_view: true,
        }
    }
}

/// The sensitivity of the camera controller to inputs.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct Sensitivity {
    /// Multiplies screen space pan forces.
    pub pan: f64,
    /// Passed to the rotation algorithm.
    pub rotate: f64,
    /// Multiplies zoom drags and wheel steps.
    pub zoom: f64,
    /// Multiplied component-wise into the screen points of every rotation. Set a component to zero
    /// to lock rotation to one screen axis.
    pub rotate_axis_mask: DVec2,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            pan: 1.0,
            rotate: 1.0,
            zoom: 1.0,
            rotate_axis_mask: DVec2::ONE,
        }
    }
}

/// Momentum settings.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct InertiaSettings {
    /// When false, every force acts immediately and once.
    pub enabled: bool,
    /// Fraction of velocity kept every 20 ms, in `0..1`.
    pub factor: f64,
    /// A flick spin never slows down until stopped.
    pub infinite_spin: bool,
}

impl Default for InertiaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: 0.9,
            infinite_spin: false,
        }
    }
}
