//! The [`SceneQuery`] trait the controller uses to find what is under the pointer.

use bevy_math::{DVec2, DVec3};

use super::camera::{ViewCamera, ViewRay};

/// The nearest visible surface under a screen point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// World position of the hit.
    pub position: DVec3,
    /// Surface normal at the hit, if the backend provides one.
    pub normal: Option<DVec3>,
}

/// Answers geometric questions about the scene behind the viewport.
///
/// Only [`SceneQuery::find_nearest`] needs to be implemented: projection defaults to the camera's
/// own pinhole model. The unit type `()` is a scene with nothing in it.
pub trait SceneQuery {
    /// The nearest hit on visible geometry under `point`, in logical pixels.
    fn find_nearest(&self, camera: &ViewCamera, viewport: DVec2, point: DVec2) -> Option<SceneHit>;

    /// Project a world position to the screen.
    fn project(&self, camera: &ViewCamera, viewport: DVec2, position: DVec3) -> Option<DVec2> {
        camera.project(viewport, position)
    }

    /// The ray through a screen point.
    fn unproject(&self, camera: &ViewCamera, viewport: DVec2, point: DVec2) -> Option<ViewRay> {
        camera.ray(viewport, point)
    }
}

impl SceneQuery for () {
    fn find_nearest(&self, _: &ViewCamera, _: DVec2, _: DVec2) -> Option<SceneHit> {
        None
    }
}

/// Intersect the ray through `point` with a plane. `None` if there is no ray or it runs parallel
/// to the plane.
pub fn unproject_onto_plane(
    scene: &dyn SceneQuery,
    camera: &ViewCamera,
    viewport: DVec2,
    point: DVec2,
    plane_position: DVec3,
    plane_normal: DVec3,
) -> Option<DVec3> {
    scene
        .unproject(camera, viewport, point)?
        .plane_intersection(plane_position, plane_normal)
}
