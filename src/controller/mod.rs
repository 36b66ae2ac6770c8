//! The camera controller: gestures, manipulators, momentum, and the Bevy systems that drive them.

pub mod camera;
pub mod component;
pub mod config;
pub mod gesture;
pub mod inertia;
pub mod pan;
pub mod rotate;
pub mod rotation;
pub mod scene;
pub mod sync;
pub mod zoom;
