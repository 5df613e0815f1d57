//! Recording draw front-end

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::{IVec2, Vec2};

use super::Canvas;
use super::record::{RECORD_LEN, Record, write_header};
use crate::consts::CAPTURE_CAP_BYTES;
use crate::error::CaptureError;
use crate::platform::{Rgb, Surface};
use crate::sim::geometry::segment_touches_rect;

/// Capture file extension
pub const EXTENSION: &str = "srv3";

#[derive(Debug)]
enum Role {
    Recorder {
        buffer: Vec<u8>,
        cap: usize,
        /// Latched once a record did not fit under the cap
        full: bool,
    },
    Player,
}

/// Draws to a surface and, as a recorder, captures every command.
///
/// A `Graphics` is either a recorder or a player for its whole life. Player
/// instances draw replayed commands without capturing them.
#[derive(Debug)]
pub struct Graphics<S> {
    surface: S,
    role: Role,
}

impl<S: Surface> Graphics<S> {
    /// Recorder with the standard size cap
    pub fn recorder(surface: S) -> Self {
        Self::with_cap(surface, CAPTURE_CAP_BYTES)
    }

    /// Recorder that stops capturing once `cap` bytes of records are buffered
    pub fn with_cap(surface: S, cap: usize) -> Self {
        Self {
            surface,
            role: Role::Recorder {
                buffer: Vec::new(),
                cap,
                full: false,
            },
        }
    }

    /// Draw-only instance used by playback
    pub fn player(surface: S) -> Self {
        Self {
            surface,
            role: Role::Player,
        }
    }

    /// Whether new commands are currently being captured
    pub fn is_recording(&self) -> bool {
        matches!(self.role, Role::Recorder { full: false, .. })
    }

    /// Encoded records buffered so far
    pub fn recorded(&self) -> &[u8] {
        match &self.role {
            Role::Recorder { buffer, .. } => buffer,
            Role::Player => &[],
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn clear(&mut self, color: Rgb) {
        self.surface.clear(color);
        self.push(Record::Clear(color));
    }

    /// Draw a line given in pixels. Lines that miss the surface entirely are
    /// dropped and not captured.
    pub fn line(&mut self, p1: Vec2, p2: Vec2, color: Rgb) {
        let (a, b) = (p1.floor().as_ivec2(), p2.floor().as_ivec2());
        let (width, height) = self.surface.size();
        if !visible(a, b, width, height) {
            return;
        }
        self.surface.draw_line(a, b, color);
        let size = Vec2::new(width as f32, height as f32);
        self.push(Record::Line {
            p1: a.as_vec2() / size,
            p2: b.as_vec2() / size,
            color,
        });
    }

    pub fn mark_end_of_frame(&mut self) {
        self.push(Record::EndOfFrame);
    }

    pub fn present(&mut self) {
        self.surface.present();
    }

    /// Drop everything captured so far and start capturing again
    pub fn reset(&mut self) {
        if let Role::Recorder { buffer, full, .. } = &mut self.role {
            buffer.clear();
            *full = false;
        }
    }

    /// Write the capture to `base.srv3`, or `base_N.srv3` for the first free
    /// `N`, and return the path used. The buffer is left untouched.
    pub fn save(&self, base: &Path) -> Result<PathBuf, CaptureError> {
        let Role::Recorder { buffer, .. } = &self.role else {
            return Err(CaptureError::NotRecording);
        };

        let (path, file) = create_numbered(base)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer)?;
        writer.write_all(buffer)?;
        writer.write_all(&Record::Stop.encode())?;
        writer.flush()?;

        log::info!(
            "Saved capture {} ({} records)",
            path.display(),
            buffer.len() / RECORD_LEN
        );
        Ok(path)
    }

    fn push(&mut self, record: Record) {
        let Role::Recorder { buffer, cap, full } = &mut self.role else {
            return;
        };
        if *full {
            return;
        }
        if buffer.len() + RECORD_LEN > *cap {
            *full = true;
            log::warn!(
                "Capture reached its {} byte cap, recording stopped until reset",
                cap
            );
            return;
        }
        buffer.extend_from_slice(&record.encode());
    }
}

impl<S: Surface> Canvas for Graphics<S> {
    fn line(&mut self, p1: Vec2, p2: Vec2, color: Rgb) {
        Graphics::line(self, p1, p2, color);
    }

    fn size(&self) -> (u32, u32) {
        self.surface.size()
    }
}

/// Whether any pixel of the line lands on a `width` x `height` surface.
/// A surface with no area shows nothing.
fn visible(a: IVec2, b: IVec2, width: u32, height: u32) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let inside = |p: IVec2| p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height;
    inside(a)
        || inside(b)
        || segment_touches_rect(a.as_vec2(), b.as_vec2(), width as f32, height as f32)
}

/// Create the first capture file name under `base` that does not exist yet
fn create_numbered(base: &Path) -> io::Result<(PathBuf, File)> {
    let mut index = 0u32;
    loop {
        let mut name = base.as_os_str().to_os_string();
        if index > 0 {
            name.push(format!("_{index}"));
        }
        name.push(".");
        name.push(EXTENSION);
        let path = PathBuf::from(name);
        match File::create_new(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => index += 1,
            Err(e) => return Err(e),
        }
    }
}
