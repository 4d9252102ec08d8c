//! Error types for playback.

use thiserror::Error;

use crate::voice::VoiceId;

/// Errors that stop a playback request before or instead of scheduling.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(f64),

    #[error("invalid note length: {0}")]
    InvalidDuration(String),

    #[error("note event {index} is invalid: {reason}")]
    InvalidEvent { index: usize, reason: String },

    #[error("voice '{0}' could not be loaded")]
    VoiceUnavailable(VoiceId),

    #[error("voice pool is shut down")]
    PoolClosed,

    #[error("failed to decode note events: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single note trigger failed. Logged and skipped; never fatal.
#[derive(Debug, Clone, Error)]
#[error("failed to trigger pitch {pitch}: {message}")]
pub struct EmitError {
    pub pitch: u8,
    pub message: String,
}

impl EmitError {
    pub fn new(pitch: u8, message: impl Into<String>) -> Self {
        EmitError {
            pitch,
            message: message.into(),
        }
    }
}
