//! Camera momentum: [`InertiaState`], its per-frame decay, and the [`FrameClock`] that measures
//! frame time.

use std::time::Duration;

use bevy_math::{DVec2, DVec3};
use bevy_reflect::prelude::*;

use super::config::InertiaSettings;

/// Squared screen space speed below which rotation and spin stop.
pub const ROTATION_THRESHOLD: f64 = 0.1;
/// Squared world space speed below which panning stops.
pub const PAN_THRESHOLD: f64 = 0.0001;
/// Squared world space speed below which moving stops.
pub const MOVE_THRESHOLD: f64 = 0.0001;
/// Absolute zoom speed below which zooming stops.
pub const ZOOM_THRESHOLD: f64 = 0.001;

/// Velocity of a rotation driven by forces.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct RotationInertia {
    /// Screen space angular rate, pixels per second.
    pub velocity: DVec2,
    /// Screen point the rotation steps start from.
    pub position: DVec2,
    /// World position rotated about.
    pub pivot: DVec3,
}

/// Free spin left over from a flicked rotate gesture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct SpinInertia {
    /// Is a spin in progress?
    pub active: bool,
    /// Screen space angular rate, pixels per second.
    pub velocity: DVec2,
    /// Screen point where the flick started.
    pub position: DVec2,
    /// World position spun about.
    pub pivot: DVec3,
}

/// Zoom velocity and the point it zooms toward.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct ZoomInertia {
    /// Zoom steps per second.
    pub velocity: f64,
    /// World position zoomed toward.
    pub pivot: DVec3,
}

/// Momentum of every motion channel. Persists across gestures.
///
/// At most one of `rotation` and `spin` has a nonzero velocity: adding rotation force clears the
/// spin, and starting a spin clears the rotation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct InertiaState {
    /// Rotation from forces.
    pub rotation: RotationInertia,
    /// Rotation from a flick.
    pub spin: SpinInertia,
    /// Pan velocity, world units per second.
    pub pan: DVec3,
    /// Camera-local move velocity, world units per second.
    pub movement: DVec3,
    /// Zoom velocity.
    pub zoom: ZoomInertia,
}

/// A rotation step between two screen points about a pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateImpulse {
    /// Start of the synthesized drag.
    pub from: DVec2,
    /// End of the synthesized drag.
    pub to: DVec2,
    /// World position to rotate about.
    pub pivot: DVec3,
}

/// The motion one tick of inertia asks for. Applied in field order.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InertiaImpulses {
    /// Directed rotation or spin.
    pub rotate: Option<RotateImpulse>,
    /// World space translation.
    pub pan: Option<DVec3>,
    /// Camera-local translation.
    pub movement: Option<DVec3>,
    /// Zoom delta and pivot.
    pub zoom: Option<(f64, DVec3)>,
}

impl InertiaImpulses {
    /// Does this tick move anything?
    pub fn is_empty(&self) -> bool {
        self.rotate.is_none() && self.pan.is_none() && self.movement.is_none() && self.zoom.is_none()
    }
}

impl InertiaState {
    /// Is every channel at rest?
    pub fn is_idle(&self) -> bool {
        self.rotation.velocity == DVec2::ZERO
            && self.spin.velocity == DVec2::ZERO
            && self.pan == DVec3::ZERO
            && self.movement == DVec3::ZERO
            && self.zoom.velocity == 0.0
    }

    /// Advance momentum by `dt` seconds.
    ///
    /// Every channel above its threshold emits a step of `velocity * dt` and is multiplied by
    /// `factor`. Channels below their threshold are zeroed. With `infinite_spin` a flick spin keeps
    /// its speed.
    #[must_use = "advance returns the decayed state instead of mutating it"]
    pub fn advance(mut self, dt: f64, factor: f64, infinite_spin: bool) -> (Self, InertiaImpulses) {
        let mut impulses = InertiaImpulses::default();

        if self.rotation.velocity.length_squared() > ROTATION_THRESHOLD {
            impulses.rotate = Some(RotateImpulse {
                from: self.rotation.position,
                to: self.rotation.position + self.rotation.velocity * dt,
                pivot: self.rotation.pivot,
            });
            self.rotation.velocity *= factor;
            self.spin.velocity = DVec2::ZERO;
        } else {
            self.rotation.velocity = DVec2::ZERO;
            if self.spin.active && self.spin.velocity.length_squared() > ROTATION_THRESHOLD {
                impulses.rotate = Some(RotateImpulse {
                    from: self.spin.position,
                    to: self.spin.position + self.spin.velocity * dt,
                    pivot: self.spin.pivot,
                });
                if !infinite_spin {
                    self.spin.velocity *= factor;
                }
            } else {
                self.spin.velocity = DVec2::ZERO;
            }
        }

        if self.pan.length_squared() > PAN_THRESHOLD {
            impulses.pan = Some(self.pan * dt);
            self.pan *= factor;
        } else {
            self.pan = DVec3::ZERO;
        }

        if self.movement.length_squared() > MOVE_THRESHOLD {
            impulses.movement = Some(self.movement * dt);
            self.movement *= factor;
        } else {
            self.movement = DVec3::ZERO;
        }

        if self.zoom.velocity.abs() > ZOOM_THRESHOLD {
            impulses.zoom = Some((self.zoom.velocity * dt, self.zoom.pivot));
            self.zoom.velocity *= factor;
        } else {
            self.zoom.velocity = 0.0;
        }

        (self, impulses)
    }
}

/// How much velocity survives a tick of `dt` seconds. The configured factor applies per 20 ms.
/// With inertia disabled nothing survives.
pub fn decay_factor(settings: &InertiaSettings, dt: f64) -> f64 {
    if !settings.enabled {
        return 0.0;
    }
    let factor = settings.factor.powf(dt / 0.02);
    if factor.is_nan() {
        return 0.1;
    }
    factor.clamp(0.1, 1.0)
}

/// Measures the time between frame ticks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct FrameClock {
    last_tick: Option<Duration>,
}

impl FrameClock {
    /// Frame time used for the first tick, or when the clock did not advance.
    pub const DEFAULT_DELTA: f64 = 0.016;
    /// Longest frame time a single tick integrates.
    pub const MAX_DELTA: f64 = 0.05;

    /// Seconds since the previous tick, clamped to `(0, MAX_DELTA]`. `now` is read from any
    /// monotonic clock.
    pub fn delta(&mut self, now: Duration) -> f64 {
        let dt = self
            .last_tick
            .and_then(|last| now.checked_sub(last))
            .map(|elapsed| elapsed.as_secs_f64())
            .filter(|dt| *dt > 0.0)
            .unwrap_or(Self::DEFAULT_DELTA);
        self.last_tick = Some(now);
        dt.min(Self::MAX_DELTA)
    }

    /// Forget the last tick, so the next active frame does not integrate the idle time.
    pub fn reset(&mut self) {
        self.last_tick = None;
    }

    /// Timestamp of the last tick, if the clock is running.
    pub fn last_tick(&self) -> Option<Duration> {
        self.last_tick
    }
}
