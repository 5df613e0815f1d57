//! Frame-by-frame capture playback

use std::fs::File;
use std::io::{BufReader, Chain, Cursor, Read};
use std::path::Path;

use glam::Vec2;

use super::Graphics;
use super::record::{Format, HEADER_LEN, Record, detect_format, read_record};
use crate::error::CaptureError;
use crate::platform::Surface;

/// Result of playing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was drawn and more may follow
    More,
    /// The stream has ended, nothing was drawn past the end
    Exhausted,
}

/// Read cursor over a saved capture, drawing onto its own surface
pub struct Playback<R, S> {
    graphics: Graphics<S>,
    /// Header bytes that turned out to be record data are replayed first
    reader: Chain<Cursor<Vec<u8>>, R>,
    format: Format,
    offset: u64,
    frames: usize,
    finished: bool,
}

impl<S: Surface> Playback<BufReader<File>, S> {
    pub fn open(path: &Path, surface: S) -> Result<Self, CaptureError> {
        let file = File::open(path)?;
        let playback = Self::new(BufReader::new(file), surface)?;
        log::info!("Playing {} ({:?} format)", path.display(), playback.format);
        Ok(playback)
    }
}

impl<R: Read, S: Surface> Playback<R, S> {
    pub fn new(mut reader: R, surface: S) -> Result<Self, CaptureError> {
        let mut prefix = Vec::with_capacity(HEADER_LEN);
        reader
            .by_ref()
            .take(HEADER_LEN as u64)
            .read_to_end(&mut prefix)?;
        let (format, consumed) = detect_format(&prefix)?;
        prefix.drain(..consumed);

        Ok(Self {
            graphics: Graphics::player(surface),
            reader: Cursor::new(prefix).chain(reader),
            format,
            offset: consumed as u64,
            frames: 0,
            finished: false,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Frames drawn so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn surface(&self) -> &S {
        self.graphics.surface()
    }

    pub fn into_surface(self) -> S {
        self.graphics.into_surface()
    }

    /// Replay records up to and including the next end-of-frame, then present.
    ///
    /// Coordinates are scaled to the surface's current size, so a capture can
    /// be played back at any resolution. Once the stream has ended, or failed
    /// to decode, every further call returns `Exhausted`.
    pub fn advance_one_frame(&mut self) -> Result<FrameStatus, CaptureError> {
        if self.finished {
            return Ok(FrameStatus::Exhausted);
        }
        let result = self.play_frame();
        if !matches!(result, Ok(FrameStatus::More)) {
            self.finished = true;
        }
        result
    }

    fn play_frame(&mut self) -> Result<FrameStatus, CaptureError> {
        let (width, height) = self.graphics.surface().size();
        let size = Vec2::new(width as f32, height as f32);
        loop {
            let Some(record) = read_record(&mut self.reader, self.format, self.offset)? else {
                return match self.format {
                    Format::Legacy => Ok(FrameStatus::Exhausted),
                    Format::Tagged => Err(CaptureError::UnexpectedEof),
                };
            };
            self.offset += self.format.record_len() as u64;

            match record {
                Record::Clear(color) => self.graphics.clear(color),
                Record::Line { p1, p2, color } => {
                    self.graphics
                        .line((p1 * size).round(), (p2 * size).round(), color);
                }
                Record::EndOfFrame => {
                    self.graphics.present();
                    self.frames += 1;
                    return Ok(FrameStatus::More);
                }
                Record::Stop => return Ok(FrameStatus::Exhausted),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::record::{LEGACY_RECORD_LEN, RECORD_LEN, write_header};
    use crate::platform::{MemorySurface, Rgb, SurfaceCall};
    use glam::IVec2;
    use proptest::prelude::*;

    /// Tagged stream as `save` would write it
    fn saved(records: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_header(&mut bytes).unwrap();
        bytes.extend_from_slice(records);
        bytes.extend_from_slice(&Record::Stop.encode());
        bytes
    }

    fn legacy(color: Rgb, coords: [f32; 4]) -> [u8; LEGACY_RECORD_LEN] {
        let mut out = [0u8; LEGACY_RECORD_LEN];
        out[..3].copy_from_slice(&[color.r, color.g, color.b]);
        for (i, v) in coords.into_iter().enumerate() {
            out[3 + i * 4..7 + i * 4].copy_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_clear_black_does_not_end_stream() {
        let mut g = Graphics::recorder(MemorySurface::new(100, 100));
        g.clear(Rgb::new(40, 79, 79));
        g.line(Vec2::ZERO, Vec2::new(10.0, 10.0), Rgb::RED);
        g.mark_end_of_frame();
        g.clear(Rgb::BLACK);
        g.mark_end_of_frame();

        let bytes = saved(g.recorded());
        let mut playback = Playback::new(Cursor::new(bytes), MemorySurface::new(100, 100)).unwrap();
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::More);
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::More);
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::Exhausted);
        assert_eq!(playback.frames(), 2);

        assert_eq!(
            playback.surface().calls,
            vec![
                SurfaceCall::Clear(Rgb::new(40, 79, 79)),
                SurfaceCall::Line(IVec2::ZERO, IVec2::new(10, 10), Rgb::RED),
                SurfaceCall::Present,
                SurfaceCall::Clear(Rgb::BLACK),
                SurfaceCall::Present,
            ]
        );
    }

    #[test]
    fn test_replay_scales_to_new_size() {
        let mut g = Graphics::recorder(MemorySurface::new(100, 50));
        g.line(Vec2::new(10.0, 10.0), Vec2::new(50.0, 25.0), Rgb::WHITE);
        g.mark_end_of_frame();

        let bytes = saved(g.recorded());
        let mut playback = Playback::new(Cursor::new(bytes), MemorySurface::new(300, 200)).unwrap();
        playback.advance_one_frame().unwrap();
        assert_eq!(
            playback.surface().calls[0],
            SurfaceCall::Line(IVec2::new(30, 40), IVec2::new(150, 100), Rgb::WHITE)
        );
    }

    #[test]
    fn test_missing_stop_is_unexpected_eof() {
        let mut bytes = Vec::new();
        write_header(&mut bytes).unwrap();
        bytes.extend_from_slice(&Record::Clear(Rgb::WHITE).encode());
        bytes.extend_from_slice(&Record::EndOfFrame.encode());

        let mut playback = Playback::new(Cursor::new(bytes), MemorySurface::new(10, 10)).unwrap();
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::More);
        assert!(matches!(
            playback.advance_one_frame(),
            Err(CaptureError::UnexpectedEof)
        ));
        assert!(playback.is_finished());
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::Exhausted);
    }

    #[test]
    fn test_truncated_record_reports_offset() {
        let mut bytes = saved(&Record::Clear(Rgb::WHITE).encode());
        bytes.truncate(HEADER_LEN + RECORD_LEN + 3);

        let mut playback = Playback::new(Cursor::new(bytes), MemorySurface::new(10, 10)).unwrap();
        assert!(matches!(
            playback.advance_one_frame(),
            Err(CaptureError::Truncated { offset }) if offset == (HEADER_LEN + RECORD_LEN) as u64
        ));
    }

    #[test]
    fn test_legacy_stream_plays_to_eof() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&legacy(Rgb::new(40, 79, 79), [0.0; 4]));
        bytes.extend_from_slice(&legacy(Rgb::WHITE, [0.1, 0.2, 0.5, 0.5]));
        bytes.extend_from_slice(&legacy(Rgb::BLACK, [0.0; 4]));

        let mut playback = Playback::new(Cursor::new(bytes), MemorySurface::new(100, 100)).unwrap();
        assert_eq!(playback.format(), Format::Legacy);
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::More);
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::Exhausted);
        assert_eq!(
            playback.surface().calls,
            vec![
                SurfaceCall::Clear(Rgb::new(40, 79, 79)),
                SurfaceCall::Line(IVec2::new(10, 20), IVec2::new(50, 50), Rgb::WHITE),
                SurfaceCall::Present,
            ]
        );
    }

    #[test]
    fn test_capture_cut_by_cap_still_replays() {
        // Room for one full frame plus part of the next
        let mut g = Graphics::with_cap(MemorySurface::new(64, 64), RECORD_LEN * 5);
        for frame in 0..3 {
            g.clear(Rgb::new(frame, 0, 0));
            g.line(Vec2::new(1.0, 1.0), Vec2::new(30.0, 30.0), Rgb::WHITE);
            g.mark_end_of_frame();
        }
        assert_eq!(g.recorded().len(), RECORD_LEN * 5);

        let bytes = saved(g.recorded());
        let mut playback = Playback::new(Cursor::new(bytes), MemorySurface::new(64, 64)).unwrap();
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::More);
        assert_eq!(playback.advance_one_frame().unwrap(), FrameStatus::Exhausted);
        let surface = playback.into_surface();
        assert_eq!(surface.frames(), 1);
        // The partial second frame is still drawn before the stop record
        assert_eq!(surface.lines(), 2);
    }

    fn op_kind() -> impl Strategy<Value = u8> {
        0u8..3
    }

    proptest! {
        #[test]
        fn prop_recorded_calls_replay_identically(
            ops in prop::collection::vec(
                (op_kind(), 0u32..200, 0u32..100, 0u32..200, 0u32..100, any::<[u8; 3]>()),
                0..64,
            )
        ) {
            let mut g = Graphics::recorder(MemorySurface::new(200, 100));
            for &(kind, x1, y1, x2, y2, [r, gr, b]) in &ops {
                let color = Rgb::new(r, gr, b);
                match kind {
                    0 => g.clear(color),
                    1 => g.line(
                        Vec2::new(x1 as f32, y1 as f32),
                        Vec2::new(x2 as f32, y2 as f32),
                        color,
                    ),
                    _ => {
                        g.mark_end_of_frame();
                        g.present();
                    }
                }
            }
            g.mark_end_of_frame();
            g.present();

            let bytes = saved(g.recorded());
            let recorded_calls = g.into_surface().calls;
            let mut playback =
                Playback::new(Cursor::new(bytes), MemorySurface::new(200, 100)).unwrap();
            while playback.advance_one_frame().unwrap() == FrameStatus::More {}
            prop_assert_eq!(playback.into_surface().calls, recorded_calls);
        }
    }
}
