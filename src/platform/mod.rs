//! Platform abstraction layer
//!
//! The window binding is not part of this crate. Everything the core needs
//! from it is behind two narrow seams:
//! - `Surface`: clear, line, present and size queries
//! - `InputState`: the set of currently held keys

use std::collections::HashSet;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const ORANGE: Rgb = Rgb::new(255, 140, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// A pixel render target
pub trait Surface {
    /// Current output size in pixels
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: Rgb);
    fn draw_line(&mut self, p1: IVec2, p2: IVec2, color: Rgb);
    /// Flip the finished frame to the display
    fn present(&mut self);
}

/// One call received by a `MemorySurface`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Clear(Rgb),
    Line(IVec2, IVec2, Rgb),
    Present,
}

/// Headless surface that counts frames and lines, optionally keeping a log
/// of every call
#[derive(Debug, Clone)]
pub struct MemorySurface {
    pub width: u32,
    pub height: u32,
    /// Every call received, empty when created with `counting`
    pub calls: Vec<SurfaceCall>,
    retain: bool,
    frames: usize,
    lines: usize,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            retain: true,
            frames: 0,
            lines: 0,
        }
    }

    /// Surface that only keeps the counters, for long headless runs
    pub fn counting(width: u32, height: u32) -> Self {
        Self {
            retain: false,
            ..Self::new(width, height)
        }
    }

    /// Number of presented frames
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of lines drawn
    pub fn lines(&self) -> usize {
        self.lines
    }

    fn log(&mut self, call: SurfaceCall) {
        if self.retain {
            self.calls.push(call);
        }
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgb) {
        self.log(SurfaceCall::Clear(color));
    }

    fn draw_line(&mut self, p1: IVec2, p2: IVec2, color: Rgb) {
        self.lines += 1;
        self.log(SurfaceCall::Line(p1, p2, color));
    }

    fn present(&mut self) {
        self.frames += 1;
        self.log(SurfaceCall::Present);
    }
}

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Enter,
    F5,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::W => "W",
            Key::A => "A",
            Key::S => "S",
            Key::D => "D",
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Space => "Space",
            Key::Escape => "Escape",
            Key::Enter => "Enter",
            Key::F5 => "F5",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "w" => Some(Key::W),
            "a" => Some(Key::A),
            "s" => Some(Key::S),
            "d" => Some(Key::D),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "space" => Some(Key::Space),
            "escape" | "esc" => Some(Key::Escape),
            "enter" | "return" => Some(Key::Enter),
            "f5" => Some(Key::F5),
            _ => None,
        }
    }
}

/// Keys currently held down
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: HashSet<Key>,
}

impl InputState {
    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.remove(&key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}
