//! Pan, orbit, and zoom for CAD-style 3D viewports, with momentum.
//!
//! # Getting Started
//!
//! Add [`DefaultViewportCamPlugins`] and a picking backend to your app, then add a
//! [`CameraController`](crate::controller::component::CameraController) to any 3D camera:
//!
//! ```ignore
//! App::new()
//!     .add_plugins((DefaultPlugins, MeshPickingPlugin, DefaultViewportCamPlugins))
//!     .add_systems(Startup, |mut commands: Commands| {
//!         commands.spawn((
//!             Camera3d::default(),
//!             CameraController::default(),
//!             ViewCamera::new(DVec3::new(0.0, 2.0, 10.0), DVec3::ZERO, DVec3::Y),
//!         ));
//!     });
//! ```
//!
//! # Overview
//!
//! The controller state lives in [`CameraController`](crate::controller::component::CameraController)
//! and manipulates a double precision [`ViewCamera`](crate::controller::camera::ViewCamera). The
//! camera is copied onto the entity's `Transform` and `Projection` whenever it changes.
//!
//! - Gestures: press, drag, and release a pointer to pan, rotate, or zoom. Only one gesture is
//!   active at a time.
//! - Momentum: a quick release keeps the camera moving, and keyboard-style forces accumulate
//!   velocity that decays each frame. Frames are only redrawn while something moves.
//! - Pivots: rotation and zoom can center on the surface under the pointer, found through
//!   [`bevy_picking`], or on a fixed point.
//! - Rotation algorithms: trackball, turntable, and turnball. The math is swappable through
//!   [`RotationMath`](crate::controller::rotation::RotationMath).
//!
//! The controller itself is plain Rust and can be driven without an [`App`](bevy_app::App): every
//! operation takes the camera as `&mut ViewCamera` and a
//! [`SceneQuery`](crate::controller::scene::SceneQuery) for hit testing.

use bevy_app::{prelude::*, PluginGroupBuilder};
use bevy_ecs::prelude::*;
use bevy_transform::TransformSystem;
use bevy_window::RequestRedraw;

pub mod controller;
pub mod extensions;
pub mod input;

use controller::{
    camera::{CameraPose, Handedness, ViewCamera, ViewProjection},
    component::CameraController,
    config::{
        CameraMode, ControllerConfig, EnabledMotion, InertiaSettings, RotationAlgorithm,
        Sensitivity,
    },
    inertia::InertiaState,
    sync::{sync_camera_transforms, sync_viewport_size},
    zoom::ZoomLimits,
};

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            camera::{Handedness, ViewCamera, ViewProjection},
            component::CameraController,
            config::{
                CameraMode, ControllerConfig, EnabledMotion, InertiaSettings, RotationAlgorithm,
                Sensitivity,
            },
            gesture::GestureKind,
            rotation::{RotationMath, StandardRotation},
            scene::{SceneHit, SceneQuery},
            zoom::ZoomLimits,
        },
        input::MouseBindings,
        DefaultViewportCamPlugins, ViewportCamPlugin, ViewportCamSystems,
    };
}

/// Adds the controller, the default mouse input, and any enabled extensions.
pub struct DefaultViewportCamPlugins;

impl PluginGroup for DefaultViewportCamPlugins {
    #[allow(clippy::let_and_return)]
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>()
            .add(ViewportCamPlugin)
            .add(input::DefaultInputPlugin);

        #[cfg(feature = "extension_pivot_indicator")]
        let group = group.add(extensions::pivot_indicator::PivotIndicatorPlugin);

        group
    }
}

/// The camera controller without any input handling.
pub struct ViewportCamPlugin;

impl Plugin for ViewportCamPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RequestRedraw>()
            .configure_sets(PreUpdate, ViewportCamSystems::Input)
            .configure_sets(Update, ViewportCamSystems::Update)
            .configure_sets(
                PostUpdate,
                ViewportCamSystems::Sync.before(TransformSystem::TransformPropagate),
            )
            .add_systems(
                PreUpdate,
                sync_viewport_size.before(ViewportCamSystems::Input),
            )
            .add_systems(
                Update,
                CameraController::update_cameras.in_set(ViewportCamSystems::Update),
            )
            .add_systems(
                PostUpdate,
                sync_camera_transforms.in_set(ViewportCamSystems::Sync),
            )
            .register_type::<ViewCamera>()
            .register_type::<ViewProjection>()
            .register_type::<Handedness>()
            .register_type::<CameraPose>()
            .register_type::<ControllerConfig>()
            .register_type::<CameraMode>()
            .register_type::<RotationAlgorithm>()
            .register_type::<EnabledMotion>()
            .register_type::<Sensitivity>()
            .register_type::<InertiaSettings>()
            .register_type::<InertiaState>()
            .register_type::<ZoomLimits>();
    }
}

/// System sets of the controller, for ordering your own systems around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum ViewportCamSystems {
    /// Input is turned into gestures and forces. Runs in [`PreUpdate`].
    Input,
    /// Momentum is integrated. Runs in [`Update`].
    Update,
    /// Cameras are copied onto Bevy transforms and projections. Runs in [`PostUpdate`].
    Sync,
}
