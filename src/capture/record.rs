//! Binary record codec

use std::io::{self, Read, Write};

use glam::Vec2;

use crate::error::CaptureError;
use crate::platform::Rgb;

pub const MAGIC: [u8; 4] = *b"SRV3";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = MAGIC.len() + 1;

/// Encoded size of a tagged record
pub const RECORD_LEN: usize = 20;
/// Encoded size of an untagged record from headerless files
pub const LEGACY_RECORD_LEN: usize = 19;

const TAG_CLEAR: u8 = 0;
const TAG_LINE: u8 = 1;
const TAG_END_OF_FRAME: u8 = 2;
const TAG_STOP: u8 = 3;

/// Capture file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Header plus tagged records
    Tagged,
    /// Headerless colour-and-geometry records. All-zero marks end of frame,
    /// end of file marks end of stream.
    Legacy,
}

impl Format {
    pub fn record_len(self) -> usize {
        match self {
            Format::Tagged => RECORD_LEN,
            Format::Legacy => LEGACY_RECORD_LEN,
        }
    }
}

/// One captured draw command.
///
/// Line endpoints are fractions of the surface width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    Clear(Rgb),
    Line { p1: Vec2, p2: Vec2, color: Rgb },
    EndOfFrame,
    Stop,
}

impl Record {
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let (tag, color, p1, p2) = match *self {
            Record::Clear(color) => (TAG_CLEAR, color, Vec2::ZERO, Vec2::ZERO),
            Record::Line { p1, p2, color } => (TAG_LINE, color, p1, p2),
            Record::EndOfFrame => (TAG_END_OF_FRAME, Rgb::BLACK, Vec2::ZERO, Vec2::ZERO),
            Record::Stop => (TAG_STOP, Rgb::BLACK, Vec2::ZERO, Vec2::ZERO),
        };
        let mut out = [0u8; RECORD_LEN];
        out[0] = tag;
        out[1] = color.r;
        out[2] = color.g;
        out[3] = color.b;
        for (i, v) in [p1.x, p1.y, p2.x, p2.y].into_iter().enumerate() {
            let at = 4 + i * 4;
            out[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Decode a tagged record. `offset` is only used for error reporting.
    pub fn decode(bytes: &[u8; RECORD_LEN], offset: u64) -> Result<Self, CaptureError> {
        let color = Rgb::new(bytes[1], bytes[2], bytes[3]);
        let [x1, y1, x2, y2] = read_floats(&bytes[4..]);
        match bytes[0] {
            TAG_CLEAR => Ok(Record::Clear(color)),
            TAG_LINE => Ok(Record::Line {
                p1: Vec2::new(x1, y1),
                p2: Vec2::new(x2, y2),
                color,
            }),
            TAG_END_OF_FRAME => Ok(Record::EndOfFrame),
            TAG_STOP => Ok(Record::Stop),
            tag => Err(CaptureError::UnknownTag { tag, offset }),
        }
    }

    /// Decode an untagged record: zero geometry is a clear, unless the colour
    /// is black too, which marks end of frame
    pub fn decode_legacy(bytes: &[u8; LEGACY_RECORD_LEN]) -> Self {
        let color = Rgb::new(bytes[0], bytes[1], bytes[2]);
        let [x1, y1, x2, y2] = read_floats(&bytes[3..]);
        if x1 == 0.0 && y1 == 0.0 && x2 == 0.0 && y2 == 0.0 {
            if color.is_black() {
                Record::EndOfFrame
            } else {
                Record::Clear(color)
            }
        } else {
            Record::Line {
                p1: Vec2::new(x1, y1),
                p2: Vec2::new(x2, y2),
                color,
            }
        }
    }
}

fn read_floats(bytes: &[u8]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (i, chunk) in bytes.chunks_exact(4).take(4).enumerate() {
        out[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

pub fn write_header(writer: &mut impl Write) -> io::Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[VERSION])
}

/// Work out the layout from the first bytes of a file.
///
/// Returns the format and how many of `prefix`'s bytes the header used.
pub fn detect_format(prefix: &[u8]) -> Result<(Format, usize), CaptureError> {
    if prefix.len() >= HEADER_LEN && prefix[..MAGIC.len()] == MAGIC {
        let version = prefix[MAGIC.len()];
        if version != VERSION {
            return Err(CaptureError::UnsupportedVersion(version));
        }
        return Ok((Format::Tagged, HEADER_LEN));
    }
    Ok((Format::Legacy, 0))
}

/// Read the next record.
///
/// `Ok(None)` means the stream ended cleanly on a record boundary. A partial
/// record is `Truncated`.
pub fn read_record(
    reader: &mut impl Read,
    format: Format,
    offset: u64,
) -> Result<Option<Record>, CaptureError> {
    let mut buf = [0u8; RECORD_LEN];
    let buf = &mut buf[..format.record_len()];
    let filled = fill(reader, buf)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < buf.len() {
        return Err(CaptureError::Truncated { offset });
    }
    let record = match format {
        Format::Tagged => {
            let mut bytes = [0u8; RECORD_LEN];
            bytes.copy_from_slice(buf);
            Record::decode(&bytes, offset)?
        }
        Format::Legacy => {
            let mut bytes = [0u8; LEGACY_RECORD_LEN];
            bytes.copy_from_slice(buf);
            Record::decode_legacy(&bytes)
        }
    };
    Ok(Some(record))
}

/// Read until `buf` is full or the reader is exhausted
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
