//! An extension that draws a marker at the point the camera is rotating around, while it rotates.
//! Seeing the pivot makes it much easier to predict where a drag will take the view.

use bevy_app::prelude::*;
use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::{DVec3, Isometry3d, Vec3};
use bevy_reflect::prelude::*;
use bevy_transform::{prelude::*, TransformSystem};

use crate::controller::{
    camera::{ViewCamera, ViewProjection},
    component::CameraController,
};

/// See the [module](self) docs.
pub struct PivotIndicatorPlugin;

impl Plugin for PivotIndicatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            draw_pivot.after(TransformSystem::TransformPropagate),
        )
        .register_type::<PivotIndicator>();
    }
}

/// Optional. Configures whether a [`CameraController`] shows the pivot indicator while rotating.
/// The indicator is shown if this component is not present.
#[derive(Debug, Component, Reflect)]
#[reflect(Component)]
pub struct PivotIndicator {
    /// Should the indicator be visible on this camera?
    pub enabled: bool,
}

impl Default for PivotIndicator {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Size of the indicator in world units, roughly 1% of the visible width at the pivot.
pub fn indicator_scale(camera: &ViewCamera, pivot: DVec3) -> f64 {
    let width = match camera.projection {
        ViewProjection::Perspective { field_of_view } => {
            2.0 * (pivot - camera.position).length() * (field_of_view.to_radians() * 0.5).tan()
        }
        ViewProjection::Orthographic { width } => width,
    };
    width * 0.01
}

/// Use gizmos to draw the rotation pivot in world space.
pub fn draw_pivot(
    cameras: Query<(
        &CameraController,
        &ViewCamera,
        &GlobalTransform,
        Option<&PivotIndicator>,
    )>,
    mut gizmos: Gizmos,
) {
    for (controller, camera, cam_transform, _) in cameras
        .iter()
        .filter(|(.., indicator)| indicator.is_none_or(|i| i.enabled))
    {
        let Some(pivot) = controller.rotation_pivot() else {
            continue;
        };
        let scale = indicator_scale(camera, pivot) as f32;
        if !scale.is_finite() || scale <= 0.0 {
            continue;
        }

        // Nudge toward the eye so the marker is not buried in the surface it sits on.
        let toward_eye = (cam_transform.translation() - pivot.as_vec3()).normalize_or_zero();
        let center = pivot.as_vec3() + toward_eye * scale;
        let color = Color::WHITE;

        gizmos.circle(
            Isometry3d::new(center, cam_transform.rotation()),
            scale,
            color,
        );
        let offset = 1.5 * scale;
        let arm_length = 0.4;
        let arms: [Vec3; 4] = [
            cam_transform.left().into(),
            cam_transform.right().into(),
            cam_transform.up().into(),
            cam_transform.down().into(),
        ];
        for arm in arms {
            gizmos.ray(center + offset * arm, offset * arm_length * arm, color);
        }
    }
}
