//! Spacerunner - fly a ship through an endless, procedurally spawned asteroid field
//!
//! Core modules:
//! - `sim`: Entity registry, floating-origin camera, physics and the tick driver
//! - `capture`: Draw-command recording, capture files and frame-by-frame playback
//! - `platform`: Output surface and input abstractions
//! - `session`: Per-frame glue between simulation, drawing and key actions
//! - `settings`: Data-driven tuning with per-field fallback

pub mod capture;
pub mod error;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{CaptureError, SettingsError, SimError};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Camera distance from the origin that triggers an origin shift
    pub const ORIGIN_SHIFT_THRESHOLD: f32 = 100.0;

    /// Capture size cap in bytes (1 GiB of encoded records)
    pub const CAPTURE_CAP_BYTES: usize = 1024 * 1024 * 1024;

    /// Background clear colour
    pub const BACKGROUND: (u8, u8, u8) = (40, 79, 79);

    /// Trail tracer history
    pub const TRACE_POINTS: usize = 10;
    /// Seconds between trail samples
    pub const TRACE_INTERVAL: f32 = 0.25;
    pub const TRACE_COLOR: (u8, u8, u8) = (112, 128, 144);

    /// The camera leads the ship by this many seconds of velocity
    pub const CAMERA_LEAD: f32 = 2.0;

    /// Asteroids spawn this many view sizes away from the camera
    pub const SPAWN_DISTANCE: f32 = 1.2;
    /// Asteroids despawn beyond this many fixed view sizes
    pub const DESPAWN_DISTANCE: f32 = 1.5;

    /// Angular step used when approximating arcs with lines
    pub const ARC_STEP: f32 = std::f32::consts::PI / 64.0;

    /// Frames per revolution of the HUD spinner
    pub const SPINNER_WRAP: u32 = 100;
}

/// Point on a circle of `radius` around `center` at angle `theta`
#[inline]
pub fn point_on_circle(center: Vec2, radius: f32, theta: f32) -> Vec2 {
    center + radius * Vec2::new(theta.cos(), theta.sin())
}

/// Rotate a body-local vector by `angle` radians into world orientation
#[inline]
pub fn rotate(local: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(local)
}
