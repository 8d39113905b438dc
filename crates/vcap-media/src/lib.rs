#![deny(unreachable_patterns)]
//! Frame acquisition and scene analysis.
//!
//! This crate provides:
//! - FFmpeg-backed frame sources for files and cameras (raw rgb24 over a pipe)
//! - Camera discovery with an injectable device probe
//! - Scene boundary detection via hue/saturation histograms
//! - Sampling policies and bounded frame batching

pub mod camera;
pub mod command;
pub mod error;
pub mod sampling;
pub mod scene;
pub mod source;

pub use camera::{discover_camera, CameraOpener, FfmpegCameraOpener};
pub use command::{check_ffmpeg, probe_video, RawVideoCommand, VideoInfo};
pub use error::{MediaError, MediaResult};
pub use sampling::{FrameBatcher, PendingFrame, SamplingPolicy};
pub use scene::{bhattacharyya, hue_sat_histogram, SceneBoundaryDetector, DEFAULT_SCENE_THRESHOLD};
pub use source::{FfmpegFrameSource, FrameSource};
