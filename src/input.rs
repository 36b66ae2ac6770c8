//! Default mouse input for [`CameraController`]s.
//!
//! The [`DefaultInputPlugin`] turns button presses, pointer motion, and the scroll wheel into
//! controller gestures, using [`bevy_picking`] hits to find the surface under the pointer. Remove
//! it from [`DefaultViewportCamPlugins`](crate::DefaultViewportCamPlugins) to drive the controller
//! with your own input handling.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_input::{
    mouse::{AccumulatedMouseScroll, MouseButton, MouseScrollUnit},
    ButtonInput,
};
use bevy_log::prelude::*;
use bevy_math::{DVec2, Vec2};
use bevy_picking::{
    pointer::{PointerId, PointerInteraction},
    PickSet,
};
use bevy_reflect::prelude::*;
use bevy_render::camera::Camera;
use bevy_time::{Real, Time};
use bevy_window::{PrimaryWindow, RequestRedraw, Window};

use crate::{
    controller::{
        camera::ViewCamera,
        component::CameraController,
        gesture::{ActiveGesture, GestureKind},
        scene::{SceneHit, SceneQuery},
    },
    ViewportCamSystems,
};

/// Scroll distance in pixels treated as one wheel notch.
pub const PIXELS_PER_NOTCH: f32 = 40.0;

/// See the [module](self) docs.
pub struct DefaultInputPlugin;

impl Plugin for DefaultInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MouseBindings>()
            .register_type::<MouseBindings>()
            .add_systems(
                PreUpdate,
                default_camera_inputs
                    .in_set(ViewportCamSystems::Input)
                    .after(PickSet::Last),
            );
    }
}

/// Which mouse buttons start which gestures. `None` leaves a gesture unbound.
#[derive(Debug, Clone, Resource, Reflect)]
#[reflect(Resource)]
pub struct MouseBindings {
    /// Starts a pan.
    pub pan: Option<MouseButton>,
    /// Starts a rotation.
    pub rotate: Option<MouseButton>,
    /// Aims the camera at the surface under the pointer, then starts a rotation.
    pub change_look_at: Option<MouseButton>,
    /// Starts a zoom by dragging vertically.
    pub zoom: Option<MouseButton>,
    /// Zoom drags change the field of view instead of the distance.
    pub zoom_changes_field_of_view: bool,
    /// Zoom with the scroll wheel.
    pub scroll_zoom: bool,
}

impl Default for MouseBindings {
    fn default() -> Self {
        Self {
            pan: Some(MouseButton::Middle),
            rotate: Some(MouseButton::Right),
            change_look_at: None,
            zoom: None,
            zoom_changes_field_of_view: false,
            scroll_zoom: true,
        }
    }
}

impl MouseBindings {
    /// The gesture started by pressing `button`, if it is bound.
    pub fn gesture_for(&self, button: MouseButton) -> Option<GestureKind> {
        if self.pan == Some(button) {
            Some(GestureKind::Pan)
        } else if self.rotate == Some(button) {
            Some(GestureKind::Rotate {
                change_look_at: false,
            })
        } else if self.change_look_at == Some(button) {
            Some(GestureKind::Rotate {
                change_look_at: true,
            })
        } else if self.zoom == Some(button) {
            Some(GestureKind::Zoom {
                field_of_view: self.zoom_changes_field_of_view,
            })
        } else {
            None
        }
    }

    /// The button that ends `gesture`.
    pub fn button_for(&self, gesture: &ActiveGesture) -> Option<MouseButton> {
        match gesture {
            ActiveGesture::Pan(_) => self.pan,
            ActiveGesture::Rotate(rotate) if rotate.change_look_at => self.change_look_at,
            ActiveGesture::Rotate(_) => self.rotate,
            ActiveGesture::Zoom(_) => self.zoom,
        }
    }

    fn buttons(&self) -> impl Iterator<Item = MouseButton> + '_ {
        [self.pan, self.rotate, self.change_look_at, self.zoom]
            .into_iter()
            .flatten()
    }
}

/// A [`SceneQuery`] answered by the nearest [`bevy_picking`] hit under the mouse, as found during
/// the last picking update.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerHitScene(pub Option<SceneHit>);

impl PointerHitScene {
    /// The nearest mouse pointer hit seen through `camera`.
    pub fn from_pointers(
        pointers: &Query<(&PointerId, &PointerInteraction)>,
        camera: Entity,
    ) -> Self {
        let hit = pointers
            .iter()
            .filter(|(id, _)| id.is_mouse())
            .filter_map(|(_, interaction)| interaction.get_nearest_hit())
            .filter(|(_, hit)| hit.camera == camera)
            .find_map(|(_, hit)| {
                Some(SceneHit {
                    position: hit.position?.as_dvec3(),
                    normal: hit.normal.map(|normal| normal.as_dvec3()),
                })
            });
        Self(hit)
    }
}

impl SceneQuery for PointerHitScene {
    fn find_nearest(&self, _: &ViewCamera, _: DVec2, _: DVec2) -> Option<SceneHit> {
        self.0
    }
}

/// Convert accumulated scroll into wheel notches.
pub fn scroll_notches(scroll: &AccumulatedMouseScroll) -> f64 {
    let lines = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_NOTCH,
    };
    lines as f64
}

/// Route mouse input in the primary window to the camera under the pointer.
///
/// A camera with a gesture in progress keeps receiving pointer motion even after the pointer
/// leaves its viewport, until the button that started the gesture is released.
#[allow(clippy::too_many_arguments)]
pub fn default_camera_inputs(
    bindings: Res<MouseBindings>,
    mouse: Res<ButtonInput<MouseButton>>,
    scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window, With<PrimaryWindow>>,
    pointers: Query<(&PointerId, &PointerInteraction)>,
    time: Res<Time<Real>>,
    mut cameras: Query<(Entity, &Camera, &mut CameraController, &mut ViewCamera)>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let cursor = window.cursor_position();
    let now = time.elapsed();
    let notches = if bindings.scroll_zoom {
        scroll_notches(&scroll)
    } else {
        0.0
    };

    for (entity, camera, mut controller, mut view) in cameras.iter_mut() {
        if !camera.is_active {
            continue;
        }
        let origin = camera
            .logical_viewport_rect()
            .map(|rect| rect.min)
            .unwrap_or(Vec2::ZERO);
        let point = cursor.map(|cursor| (cursor - origin).as_dvec2());
        let hovered = point.is_some_and(|point| {
            point.cmpge(DVec2::ZERO).all() && point.cmplt(controller.viewport_size).all()
        });
        if !hovered && controller.gesture().is_none() {
            continue;
        }

        let scene = PointerHitScene::from_pointers(&pointers, entity);
        let mut snapshot = *view;
        let mut changed = false;

        if let Some(gesture) = controller.gesture().copied() {
            let released = bindings
                .button_for(&gesture.active)
                .is_none_or(|button| !mouse.pressed(button));
            if released {
                changed |= controller.end_gesture(&mut snapshot, now);
            } else if let Some(point) = point.filter(|p| *p != gesture.session.last_point) {
                changed |= controller.mouse_move(&mut snapshot, &scene, point);
            }
        } else if let Some(point) = point {
            let pressed = bindings
                .buttons()
                .filter(|button| mouse.just_pressed(*button))
                .find_map(|button| bindings.gesture_for(button));
            if let Some(kind) = pressed {
                trace!("Pointer pressed for {kind:?} on {entity}");
                changed |= controller.start_gesture(kind, &mut snapshot, &scene, point, now);
            }
            if notches != 0.0 {
                changed |= controller.mouse_wheel(&mut snapshot, &scene, point, notches);
            }
        }

        if changed {
            view.set_if_neq(snapshot);
            redraw.write(RequestRedraw);
        }
    }
}
