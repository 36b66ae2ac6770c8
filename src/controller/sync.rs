//! Copies controller state to and from Bevy's own camera components.

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::DVec2;
use bevy_render::camera::{Camera, Projection, ScalingMode};
use bevy_transform::prelude::*;

use super::{
    camera::{ViewCamera, ViewProjection},
    component::CameraController,
};

/// Keep [`CameraController::viewport_size`] equal to the logical size of the camera's viewport.
pub fn sync_viewport_size(mut cameras: Query<(&Camera, &mut CameraController)>) {
    for (camera, mut controller) in cameras.iter_mut() {
        let Some(size) = camera.logical_viewport_size() else {
            continue;
        };
        let size = size.as_dvec2();
        if size.cmpgt(DVec2::ZERO).all() && controller.viewport_size != size {
            controller.viewport_size = size;
        }
    }
}

/// Write changed [`ViewCamera`]s onto the entity's [`Transform`] and [`Projection`].
pub fn sync_camera_transforms(
    mut cameras: Query<
        (&ViewCamera, &CameraController, &mut Transform, &mut Projection),
        Changed<ViewCamera>,
    >,
) {
    for (view, controller, mut transform, mut projection) in cameras.iter_mut() {
        if !view.position.is_finite() || view.look_direction.length_squared() == 0.0 {
            continue;
        }
        transform.set_if_neq(view.transform());

        let aspect = controller.viewport_size.x / controller.viewport_size.y;
        match (view.projection, &mut *projection) {
            (ViewProjection::Perspective { field_of_view }, Projection::Perspective(perspective)) => {
                perspective.fov = vertical_fov(field_of_view, aspect) as f32;
            }
            (ViewProjection::Orthographic { width }, Projection::Orthographic(ortho)) => {
                ortho.scaling_mode = ScalingMode::FixedHorizontal {
                    viewport_width: width as f32,
                };
            }
            (_, Projection::Custom(_)) => {
                warn_once!("Custom projections are not updated by the viewport camera controller");
            }
            (view_projection, _) => {
                debug!("Projection kind does not match {view_projection:?}, leaving it unchanged");
            }
        }
    }
}

/// Convert a horizontal field of view in degrees to Bevy's vertical field of view in radians.
pub fn vertical_fov(horizontal_degrees: f64, aspect: f64) -> f64 {
    let horizontal = horizontal_degrees.to_radians();
    if !aspect.is_finite() || aspect <= 0.0 {
        return horizontal;
    }
    2.0 * ((horizontal * 0.5).tan() / aspect).atan()
}
