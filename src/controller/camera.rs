//! The camera state driven by the controller, [`ViewCamera`].

use bevy_ecs::prelude::*;
use bevy_math::{DVec2, DVec3};
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

/// Which way the camera's x axis points relative to `look × up`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum Handedness {
    /// `right = look × up`, the convention Bevy uses.
    #[default]
    RightHanded,
    /// `right = up × look`.
    LeftHanded,
}

impl Handedness {
    /// `1.0` for right-handed cameras, `-1.0` for left-handed ones. Rotation algorithms multiply
    /// horizontal angles by this so dragging feels the same in both conventions.
    pub fn sign(self) -> f64 {
        match self {
            Handedness::RightHanded => 1.0,
            Handedness::LeftHanded => -1.0,
        }
    }
}

/// The lens of a [`ViewCamera`].
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum ViewProjection {
    /// Perspective camera.
    Perspective {
        /// Horizontal field of view, in degrees.
        field_of_view: f64,
    },
    /// Orthographic camera.
    Orthographic {
        /// Width of the view volume in world units.
        width: f64,
    },
}

impl Default for ViewProjection {
    fn default() -> Self {
        ViewProjection::Perspective {
            field_of_view: 45.0,
        }
    }
}

/// Position and orientation of a camera, without its lens.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct CameraPose {
    /// Eye position.
    pub position: DVec3,
    /// View direction. Its length is the distance to the target.
    pub look_direction: DVec3,
    /// Up direction.
    pub up_direction: DVec3,
}

/// The camera a [`CameraController`](super::component::CameraController) manipulates.
///
/// The controller never owns this value. It receives it as `&mut ViewCamera` for each operation,
/// so a host can keep it anywhere: as a component next to the controller (the Bevy integration
/// does this and copies it onto the entity's `Transform` and `Projection`), or in its own
/// renderer state.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Component)]
#[reflect(Component, Default)]
pub struct ViewCamera {
    /// Eye position.
    pub position: DVec3,
    /// View direction. Not normalized: its length is the distance from the eye to the target,
    /// which is the default pivot for rotating and zooming.
    pub look_direction: DVec3,
    /// Up direction.
    pub up_direction: DVec3,
    /// Perspective field of view or orthographic width.
    pub projection: ViewProjection,
    /// Coordinate system convention of the host.
    pub handedness: Handedness,
    /// Set by hosts while they animate the camera themselves, e.g. flying to a new look-at point.
    /// The frame tick keeps requesting redraws while this is true.
    pub animating: bool,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y)
    }
}

impl ViewCamera {
    /// A perspective camera at `position`, looking at `target`.
    pub fn new(position: DVec3, target: DVec3, up: DVec3) -> Self {
        Self {
            position,
            look_direction: target - position,
            up_direction: up,
            projection: ViewProjection::default(),
            handedness: Handedness::default(),
            animating: false,
        }
    }

    /// Replace the projection.
    #[must_use = "with_projection returns a modified ViewCamera"]
    pub fn with_projection(self, projection: ViewProjection) -> Self {
        Self { projection, ..self }
    }

    /// Replace the handedness.
    #[must_use = "with_handedness returns a modified ViewCamera"]
    pub fn with_handedness(self, handedness: Handedness) -> Self {
        Self { handedness, ..self }
    }

    /// The point the camera is looking at, `position + look_direction`.
    pub fn target(&self) -> DVec3 {
        self.position + self.look_direction
    }

    /// Distance from the eye to the target.
    pub fn target_distance(&self) -> f64 {
        self.look_direction.length()
    }

    /// Is this a perspective camera?
    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, ViewProjection::Perspective { .. })
    }

    /// Current position and orientation.
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            look_direction: self.look_direction,
            up_direction: self.up_direction,
        }
    }

    /// Overwrite position and orientation in one step.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = pose.position;
        self.look_direction = pose.look_direction;
        self.up_direction = pose.up_direction;
    }

    /// Aim at `target` without moving the eye. The new target distance is the distance to
    /// `target`. Ignored if `target` is the eye position.
    pub fn look_at(&mut self, target: DVec3) {
        let look_direction = target - self.position;
        if look_direction.length_squared() > 0.0 {
            self.look_direction = look_direction;
        }
    }

    /// Unit vector pointing to the right of the view, zero if the camera is degenerate.
    pub fn right(&self) -> DVec3 {
        self.look_direction
            .cross(self.up_direction)
            .normalize_or_zero()
            * self.handedness.sign()
    }

    /// Orthonormal view axes `(right, up, forward)`, or `None` when the look and up directions are
    /// zero or parallel.
    pub fn view_axes(&self) -> Option<(DVec3, DVec3, DVec3)> {
        let forward = self.look_direction.try_normalize()?;
        let right = self.right().try_normalize()?;
        let up = (self.up_direction - forward * self.up_direction.dot(forward)).try_normalize()?;
        Some((right, up, forward))
    }

    /// The ray leaving the camera through `point`, a position in logical pixels with the origin at
    /// the top left of a viewport of `viewport` size.
    pub fn ray(&self, viewport: DVec2, point: DVec2) -> Option<ViewRay> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let (right, up, forward) = self.view_axes()?;
        let aspect = viewport.x / viewport.y;
        let ndc = DVec2::new(
            2.0 * point.x / viewport.x - 1.0,
            1.0 - 2.0 * point.y / viewport.y,
        );
        let ray = match self.projection {
            ViewProjection::Perspective { field_of_view } => {
                let half = (field_of_view.to_radians() * 0.5).tan();
                let direction = forward + right * ndc.x * half + up * ndc.y * half / aspect;
                ViewRay {
                    origin: self.position,
                    direction: direction.try_normalize()?,
                }
            }
            ViewProjection::Orthographic { width } => {
                let half = width * 0.5;
                ViewRay {
                    origin: self.position + right * ndc.x * half + up * ndc.y * half / aspect,
                    direction: forward,
                }
            }
        };
        ray.is_finite().then_some(ray)
    }

    /// Project a world position onto a viewport of `viewport` size. `None` for points behind a
    /// perspective camera.
    pub fn project(&self, viewport: DVec2, position: DVec3) -> Option<DVec2> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let (right, up, forward) = self.view_axes()?;
        let aspect = viewport.x / viewport.y;
        let relative = position - self.position;
        let half = match self.projection {
            ViewProjection::Perspective { field_of_view } => {
                let depth = relative.dot(forward);
                if depth <= f64::EPSILON {
                    return None;
                }
                depth * (field_of_view.to_radians() * 0.5).tan()
            }
            ViewProjection::Orthographic { width } => width * 0.5,
        };
        let ndc = DVec2::new(relative.dot(right) / half, relative.dot(up) * aspect / half);
        let point = DVec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        );
        point.is_finite().then_some(point)
    }

    /// The camera pose as a Bevy [`Transform`].
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position.as_vec3())
            .looking_to(self.look_direction.as_vec3(), self.up_direction.as_vec3())
    }
}

/// A double precision ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRay {
    /// Start of the ray.
    pub origin: DVec3,
    /// Unit direction of the ray.
    pub direction: DVec3,
}

impl ViewRay {
    fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.direction.is_finite()
    }

    /// Where the line through this ray crosses the plane through `plane_position` with
    /// `plane_normal`. `None` if the ray runs parallel to the plane.
    pub fn plane_intersection(&self, plane_position: DVec3, plane_normal: DVec3) -> Option<DVec3> {
        let denominator = plane_normal.dot(self.direction);
        if denominator.abs() < 1e-12 {
            return None;
        }
        let distance = plane_normal.dot(plane_position - self.origin) / denominator;
        let point = self.origin + self.direction * distance;
        point.is_finite().then_some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: DVec2 = DVec2::new(800.0, 600.0);

    #[test]
    fn center_ray_follows_look_direction() {
        let camera = ViewCamera::default();
        let ray = camera.ray(VIEWPORT, VIEWPORT / 2.0).unwrap();
        assert!((ray.direction - DVec3::NEG_Z).length() < 1e-12);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn projection_inverts_ray() {
        let camera = ViewCamera::new(DVec3::new(3.0, 2.0, 8.0), DVec3::ZERO, DVec3::Y);
        let point = DVec2::new(120.0, 410.0);
        let ray = camera.ray(VIEWPORT, point).unwrap();
        let world = ray.origin + ray.direction * 5.0;
        let back = camera.project(VIEWPORT, world).unwrap();
        assert!((back - point).length() < 1e-6);

        let ortho = camera.with_projection(ViewProjection::Orthographic { width: 12.0 });
        let ray = ortho.ray(VIEWPORT, point).unwrap();
        let back = ortho.project(VIEWPORT, ray.origin + ray.direction * 3.0).unwrap();
        assert!((back - point).length() < 1e-6);
    }

    #[test]
    fn points_behind_perspective_camera_do_not_project() {
        let camera = ViewCamera::default();
        assert_eq!(camera.project(VIEWPORT, DVec3::new(0.0, 0.0, 20.0)), None);
    }

    #[test]
    fn left_handed_right_axis_flips() {
        let camera = ViewCamera::default();
        let left = camera.with_handedness(Handedness::LeftHanded);
        assert_eq!(camera.right(), DVec3::X);
        assert_eq!(left.right(), DVec3::NEG_X);
    }

    #[test]
    fn parallel_ray_misses_plane() {
        let ray = ViewRay {
            origin: DVec3::ZERO,
            direction: DVec3::X,
        };
        assert_eq!(ray.plane_intersection(DVec3::new(0.0, 1.0, 0.0), DVec3::Y), None);
        assert_eq!(
            ray.plane_intersection(DVec3::new(4.0, 0.0, 0.0), DVec3::X),
            Some(DVec3::new(4.0, 0.0, 0.0))
        );
    }

    #[test]
    fn look_at_keeps_eye() {
        let mut camera = ViewCamera::default();
        camera.look_at(DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(camera.position, DVec3::new(0.0, 0.0, 10.0));
        assert_eq!(camera.target(), DVec3::new(1.0, 0.0, 0.0));
        camera.look_at(camera.position);
        assert_eq!(camera.target(), DVec3::new(1.0, 0.0, 0.0));
    }
}
