//! Rotation algorithms: the [`RotationMath`] strategy and its default, [`StandardRotation`].
//!
//! A strategy receives the pointer motion, the pivot and a snapshot of the camera, and returns the
//! new camera pose. The controller writes the pose back in one step.

use std::{f64::consts::PI, fmt, sync::Arc};

use bevy_math::{DQuat, DVec2, DVec3};
use bevy_reflect::prelude::*;

use super::{
    camera::{CameraPose, ViewCamera},
    config::CameraMode,
};

/// Everything a rotation algorithm may read.
#[derive(Debug, Clone, Copy)]
pub struct RotationRequest<'a> {
    /// Snapshot of the camera before rotating.
    pub camera: &'a ViewCamera,
    /// Interaction mode. Only [`CameraMode::Inspect`] moves the eye.
    pub mode: CameraMode,
    /// World position to orbit.
    pub pivot: DVec3,
    /// Rotation sensitivity.
    pub sensitivity: f64,
    /// Viewport size in logical pixels.
    pub viewport: DVec2,
    /// [`Handedness::sign`](super::camera::Handedness::sign) of the camera.
    pub handedness: f64,
    /// World up direction.
    pub model_up: DVec3,
}

/// The two axes a [`RotationAlgorithm::Turnball`](super::config::RotationAlgorithm::Turnball)
/// drag rotates about, fixed when the drag starts.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TurnballAxes {
    /// Axis for horizontal pointer motion.
    pub horizontal: DVec3,
    /// Axis for vertical pointer motion.
    pub vertical: DVec3,
}

/// Converts pointer motion into a new camera pose. Returning `None` leaves the camera untouched.
pub trait RotationMath: Send + Sync + 'static {
    /// Rotate as if the pointer dragged a ball from `p0` to `p1`.
    fn trackball(&self, request: &RotationRequest, p0: DVec2, p1: DVec2) -> Option<CameraPose>;

    /// Yaw and pitch by the screen space `delta`.
    fn turntable(&self, request: &RotationRequest, delta: DVec2) -> Option<CameraPose>;

    /// Yaw and pitch about precomputed `axes`.
    fn turnball(
        &self,
        request: &RotationRequest,
        p0: DVec2,
        p1: DVec2,
        axes: TurnballAxes,
    ) -> Option<CameraPose>;

    /// Axes for a turnball drag starting at `point`.
    fn turnball_axes(&self, request: &RotationRequest, point: DVec2) -> TurnballAxes;
}

/// Shared handle to the rotation strategy of a controller.
#[derive(Clone)]
pub struct RotationStrategy(pub Arc<dyn RotationMath>);

impl RotationStrategy {
    /// Wrap a custom strategy.
    pub fn new(math: impl RotationMath) -> Self {
        Self(Arc::new(math))
    }
}

impl Default for RotationStrategy {
    fn default() -> Self {
        Self::new(StandardRotation)
    }
}

impl fmt::Debug for RotationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RotationStrategy").field(&"<dyn RotationMath>").finish()
    }
}

impl std::ops::Deref for RotationStrategy {
    type Target = dyn RotationMath;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// The built-in trackball, turntable and turnball algorithms.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRotation;

/// How many radians the camera turns per radian the trackball surface moves.
const TRACKBALL_GAIN: f64 = 2.0;

impl RotationMath for StandardRotation {
    fn trackball(&self, request: &RotationRequest, p0: DVec2, p1: DVec2) -> Option<CameraPose> {
        let (right, up, forward) = request.camera.view_axes()?;
        let to_world = |v: DVec3| right * v.x + up * v.y - forward * v.z;
        let u1 = to_world(project_to_trackball(p0, request.viewport));
        let u2 = to_world(project_to_trackball(p1, request.viewport));

        let axis = u1.cross(u2);
        if axis.length_squared() < 1e-8 {
            return None;
        }
        let angle = u1.angle_between(u2) * request.sensitivity * TRACKBALL_GAIN * request.handedness;
        let rotation = DQuat::from_axis_angle(axis.normalize(), -angle);
        Some(rotate_pose(request, rotation))
    }

    fn turntable(&self, request: &RotationRequest, delta: DVec2) -> Option<CameraPose> {
        let camera = request.camera;
        let up = request.model_up.try_normalize()?;
        let right = camera
            .look_direction
            .cross(camera.up_direction)
            .normalize_or_zero();

        let mut degrees_per_pixel = -0.5;
        if request.mode != CameraMode::Inspect {
            degrees_per_pixel *= -0.2;
        }
        degrees_per_pixel *= request.sensitivity;

        let yaw = DQuat::from_axis_angle(
            up,
            (degrees_per_pixel * delta.x * request.handedness).to_radians(),
        );
        let pitch = if right == DVec3::ZERO {
            DQuat::IDENTITY
        } else {
            DQuat::from_axis_angle(right, (degrees_per_pixel * delta.y).to_radians())
        };
        Some(rotate_pose(request, yaw * pitch))
    }

    fn turnball(
        &self,
        request: &RotationRequest,
        p0: DVec2,
        p1: DVec2,
        axes: TurnballAxes,
    ) -> Option<CameraPose> {
        let viewport = request.viewport;
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let delta = p1 - p0;
        let mut scale = -1.0;
        if request.mode != CameraMode::Inspect {
            scale = 0.2;
        }
        scale *= request.sensitivity;

        let horizontal = scale * request.handedness * delta.x / viewport.x * PI;
        let vertical = scale * delta.y / viewport.y * PI;
        let rotation = DQuat::from_axis_angle(axes.horizontal, horizontal)
            * DQuat::from_axis_angle(axes.vertical, vertical);
        Some(rotate_pose(request, rotation))
    }

    fn turnball_axes(&self, request: &RotationRequest, point: DVec2) -> TurnballAxes {
        let Some((right, up, forward)) = request.camera.view_axes() else {
            return TurnballAxes {
                horizontal: request.model_up,
                vertical: DVec3::X,
            };
        };
        let ball = project_to_trackball(point, request.viewport);
        let surface = right * ball.x + up * ball.y - forward * ball.z;
        // The tangent frame of the ball where it was grabbed. At the viewport center this is the
        // camera's own up and right axes.
        TurnballAxes {
            horizontal: surface.cross(right).try_normalize().unwrap_or(up),
            vertical: up.cross(surface).try_normalize().unwrap_or(right),
        }
    }
}

/// Map a screen point onto a unit hemisphere facing the viewer, whose rim encloses the viewport.
pub fn project_to_trackball(point: DVec2, viewport: DVec2) -> DVec3 {
    let radius = viewport.length() / 2.0;
    if radius <= 0.0 {
        return DVec3::Z;
    }
    let x = (point.x - viewport.x / 2.0) / radius;
    let y = (viewport.y / 2.0 - point.y) / radius;
    let z2 = 1.0 - x * x - y * y;
    DVec3::new(x, y, if z2 > 0.0 { z2.sqrt() } else { 0.0 })
}

/// Rotate the camera about the request's pivot. The eye only moves in [`CameraMode::Inspect`].
pub fn rotate_pose(request: &RotationRequest, rotation: DQuat) -> CameraPose {
    let camera = request.camera;
    let pivot = request.pivot;
    let new_target = pivot - rotation * (pivot - camera.target());
    let new_position = pivot - rotation * (pivot - camera.position);
    CameraPose {
        position: if request.mode == CameraMode::Inspect {
            new_position
        } else {
            camera.position
        },
        look_direction: new_target - new_position,
        up_direction: rotation * camera.up_direction,
    }
}
