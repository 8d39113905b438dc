//! Error types for frame acquisition and scene analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while acquiring or analyzing frames.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("No working camera found after probing {probed} devices")]
    NoDeviceFound { probed: u32 },

    #[error("Source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("End of stream")]
    EndOfStream,

    #[error("Frame read failed: {message}")]
    FrameRead { message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a source-unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create a frame-read error.
    pub fn frame_read(message: impl Into<String>) -> Self {
        Self::FrameRead {
            message: message.into(),
        }
    }
}
