//! Error types
//!
//! Invariant violations (`SimError`) are fatal and end the session. Capture
//! errors during playback are recoverable: the player stops. Settings errors
//! only surface for io failures at startup; bad content falls back to
//! defaults.

use thiserror::Error;

use crate::sim::physics::BodyHandle;

/// Simulation invariant violations
#[derive(Debug, Error)]
pub enum SimError {
    #[error("reset failed, {remaining} entities still alive after clearing")]
    ResetIncomplete { remaining: usize },
    #[error("physics body {0:?} is missing")]
    MissingBody(BodyHandle),
    #[error("camera centre became non-finite")]
    NonFiniteCamera,
}

/// Capture recording and playback errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported capture version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown record tag {tag} at byte {offset}")]
    UnknownTag { tag: u8, offset: u64 },
    #[error("truncated record at byte {offset}")]
    Truncated { offset: u64 },
    #[error("capture ended without a stop record")]
    UnexpectedEof,
    #[error("graphics is in playback mode and has nothing to save")]
    NotRecording,
}

/// Settings file errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("settings file must contain a JSON object")]
    NotAnObject,
}
