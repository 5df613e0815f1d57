//! Draw-command capture
//!
//! Every primitive the game draws goes through a [`Graphics`] recorder, which
//! forwards it to the output surface and appends a resolution-independent
//! record to an in-memory buffer. Saved buffers replay frame by frame through
//! [`Playback`] on any surface size.
//!
//! File layout (little-endian):
//!
//! ```text
//! header := "SRV3" version:u8
//! record := tag:u8 r:u8 g:u8 b:u8 x1:f32 y1:f32 x2:f32 y2:f32
//! ```
//!
//! Coordinates are fractions of the surface width/height. Files without the
//! header are read as the older untagged layout.

pub mod graphics;
pub mod playback;
pub mod record;

pub use graphics::Graphics;
pub use playback::{FrameStatus, Playback};
pub use record::{Format, Record};

use glam::Vec2;

use crate::consts::ARC_STEP;
use crate::platform::Rgb;
use crate::point_on_circle;

/// Drawing target handed to entities during the draw pass
pub trait Canvas {
    /// Draw a line between two screen points in pixels
    fn line(&mut self, p1: Vec2, p2: Vec2, color: Rgb);

    /// Surface size in pixels
    fn size(&self) -> (u32, u32);

    /// Approximate an arc of `amount` radians starting at `start` with
    /// straight segments
    fn arc(&mut self, center: Vec2, radius: f32, start: f32, amount: f32, color: Rgb) {
        let mut rot = 0.0;
        while rot + ARC_STEP < amount {
            let a = point_on_circle(center, radius, start + rot);
            let b = point_on_circle(center, radius, start + rot + ARC_STEP);
            self.line(a, b, color);
            rot += ARC_STEP;
        }
        let a = point_on_circle(center, radius, start + rot);
        let b = point_on_circle(center, radius, start + amount);
        self.line(a, b, color);
    }
}
