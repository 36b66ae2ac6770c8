//! The pointer gesture state machine: press, drag, release.
//!
//! A controller is either idle or has exactly one active [`Gesture`]. The shared bookkeeping lives
//! in [`GestureSession`], and the variant-specific state in [`ActiveGesture`].

use std::time::Duration;

use bevy_log::prelude::*;
use bevy_math::{DVec2, DVec3};

use super::{
    camera::ViewCamera,
    component::CameraController,
    config::EnabledMotion,
    pan::PanGesture,
    rotate::RotateGesture,
    scene::{unproject_onto_plane, SceneQuery},
    zoom::ZoomGesture,
};

/// What kind of gesture to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Drag the scene along the view plane.
    Pan,
    /// Orbit the camera.
    Rotate {
        /// Aim at the surface under the pointer before rotating.
        change_look_at: bool,
    },
    /// Zoom by dragging vertically.
    Zoom {
        /// Change the field of view instead of the distance.
        field_of_view: bool,
    },
}

impl GestureKind {
    /// Is this kind of gesture allowed to start?
    pub fn can_start(self, enabled: &EnabledMotion) -> bool {
        match self {
            GestureKind::Pan => enabled.pan,
            GestureKind::Rotate { .. } => enabled.rotate,
            GestureKind::Zoom { field_of_view } => {
                enabled.zoom && (!field_of_view || enabled.field_of_view)
            }
        }
    }
}

/// Bookkeeping shared by every gesture, captured when the pointer is pressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    /// Where the pointer was pressed.
    pub mouse_down_point: DVec2,
    /// The press point on the gesture's reference plane, if the ray hit it.
    pub mouse_down_point_3d: Option<DVec3>,
    /// The surface under the press point, if any.
    pub mouse_down_nearest_point_3d: Option<DVec3>,
    /// The latest pointer position.
    pub last_point: DVec2,
    /// The latest pointer position on the reference plane.
    pub last_point_3d: Option<DVec3>,
    /// When the gesture started.
    pub started_at: Duration,
    /// [`Handedness::sign`](super::camera::Handedness::sign) of the camera at press.
    pub handedness: f64,
}

/// Variant-specific state of the active gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveGesture {
    /// Panning.
    Pan(PanGesture),
    /// Rotating.
    Rotate(RotateGesture),
    /// Zooming.
    Zoom(ZoomGesture),
}

/// A gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    /// Shared bookkeeping.
    pub session: GestureSession,
    /// Variant state.
    pub active: ActiveGesture,
}

impl CameraController {
    /// Start panning at `point`. Returns `true` if the pointer should be captured.
    pub fn start_pan(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        now: Duration,
    ) -> bool {
        self.start_gesture(GestureKind::Pan, camera, scene, point, now)
    }

    /// Start rotating at `point`. Returns `true` if the pointer should be captured.
    pub fn start_rotate(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        now: Duration,
    ) -> bool {
        let kind = GestureKind::Rotate {
            change_look_at: false,
        };
        self.start_gesture(kind, camera, scene, point, now)
    }

    /// Aim the camera at the surface under `point`, then rotate about it.
    pub fn start_change_look_at(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        now: Duration,
    ) -> bool {
        let kind = GestureKind::Rotate {
            change_look_at: true,
        };
        self.start_gesture(kind, camera, scene, point, now)
    }

    /// Start zooming at `point`. Returns `true` if the pointer should be captured.
    pub fn start_zoom(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        now: Duration,
    ) -> bool {
        let kind = GestureKind::Zoom {
            field_of_view: false,
        };
        self.start_gesture(kind, camera, scene, point, now)
    }

    /// Start changing the field of view at `point`.
    pub fn start_field_of_view_zoom(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        now: Duration,
    ) -> bool {
        let kind = GestureKind::Zoom {
            field_of_view: true,
        };
        self.start_gesture(kind, camera, scene, point, now)
    }

    /// Start a gesture of any kind. A gesture already in progress is replaced.
    pub fn start_gesture(
        &mut self,
        kind: GestureKind,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        now: Duration,
    ) -> bool {
        if !kind.can_start(&self.config.enabled) {
            trace!("Ignoring {kind:?}: disabled");
            return false;
        }

        let viewport = self.viewport_size;
        let nearest = if self.config.fixed_rotation_point.is_some() {
            None
        } else {
            scene
                .find_nearest(camera, viewport, point)
                .map(|hit| hit.position)
        };

        let pan_plane = PanGesture::new(camera, nearest);
        let (plane_position, plane_normal) = match kind {
            GestureKind::Pan => (pan_plane.plane_position, pan_plane.plane_normal),
            GestureKind::Rotate { .. } | GestureKind::Zoom { .. } => {
                (camera.target(), camera.look_direction)
            }
        };
        let mouse_down_point_3d =
            unproject_onto_plane(scene, camera, viewport, point, plane_position, plane_normal);

        let mut session = GestureSession {
            mouse_down_point: point,
            mouse_down_point_3d,
            mouse_down_nearest_point_3d: nearest,
            last_point: point,
            last_point_3d: mouse_down_point_3d,
            started_at: now,
            handedness: camera.handedness.sign(),
        };

        self.stop_animations();

        let active = match kind {
            GestureKind::Pan => ActiveGesture::Pan(pan_plane),
            GestureKind::Rotate { change_look_at } => ActiveGesture::Rotate(
                self.rotate_started(camera, &mut session, change_look_at),
            ),
            GestureKind::Zoom { field_of_view } => {
                ActiveGesture::Zoom(self.zoom_started(camera, &session, field_of_view))
            }
        };
        debug!("Started {kind:?} at {point}");
        self.gesture = Some(Gesture { session, active });
        true
    }

    /// Feed a new pointer position to the active gesture. Returns `true` if the view should be
    /// redrawn, `false` when no gesture is active.
    pub fn mouse_move(
        &mut self,
        camera: &mut ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
    ) -> bool {
        let Some(mut gesture) = self.gesture else {
            return false;
        };
        let session = &mut gesture.session;
        match gesture.active {
            ActiveGesture::Pan(pan) => self.pan_delta(camera, scene, session, &pan, point),
            ActiveGesture::Rotate(rotate) => self.rotate_delta(camera, session, &rotate, point),
            ActiveGesture::Zoom(zoom) => self.zoom_delta(camera, session, &zoom, point),
        }
        self.gesture = Some(gesture);
        true
    }

    /// End whichever gesture is active. Returns `true` if a gesture ended and the pointer should be
    /// released.
    ///
    /// If the gesture lasted less than the configured spin release time, its motion carries on as
    /// momentum.
    pub fn end_gesture(&mut self, camera: &mut ViewCamera, now: Duration) -> bool {
        let Some(Gesture { session, active }) = self.gesture.take() else {
            return false;
        };
        let elapsed = now.saturating_sub(session.started_at);
        if !elapsed.is_zero() && elapsed < self.config.spin_release_time {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            match active {
                ActiveGesture::Pan(_) => self.pan_fling(camera, &session, elapsed_ms),
                ActiveGesture::Rotate(rotate) => self.rotate_fling(&session, &rotate, elapsed_ms),
                ActiveGesture::Zoom(_) => (),
            }
        }
        debug!("Ended gesture after {elapsed:?}");
        true
    }

    /// End the active gesture if it is a pan.
    pub fn end_pan(&mut self, camera: &mut ViewCamera, now: Duration) -> bool {
        self.is_panning() && self.end_gesture(camera, now)
    }

    /// End the active gesture if it is a rotation.
    pub fn end_rotate(&mut self, camera: &mut ViewCamera, now: Duration) -> bool {
        self.is_rotating() && self.end_gesture(camera, now)
    }

    /// End the active gesture if it is a zoom.
    pub fn end_zoom(&mut self, camera: &mut ViewCamera, now: Duration) -> bool {
        self.is_zooming() && self.end_gesture(camera, now)
    }

    /// Intersect the ray through `point` with a plane. `None` if the ray misses it.
    pub fn unproject(
        &self,
        camera: &ViewCamera,
        scene: &dyn SceneQuery,
        point: DVec2,
        plane_position: DVec3,
        plane_normal: DVec3,
    ) -> Option<DVec3> {
        unproject_onto_plane(
            scene,
            camera,
            self.viewport_size,
            point,
            plane_position,
            plane_normal,
        )
    }
}
