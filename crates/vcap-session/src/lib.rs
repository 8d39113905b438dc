//! Live session loop, window aggregation, and batch video pipeline.
//!
//! This crate provides:
//! - `LiveSession` / `SessionHandle` — the per-connection live loop with
//!   cancellation, pacing, and event emission
//! - `WindowAggregator` — per-minute caption windows with a density gate
//! - `VideoPipeline` — offline scene-detect / caption / summarize
//! - The append-only summary log

pub mod aggregator;
pub mod batch;
pub mod config;
pub mod error;
pub mod live;
pub mod logging;
pub mod metrics;
pub mod summary_log;

pub use aggregator::{DetectionTally, WindowAggregator};
pub use batch::{caption_sampled_frames, detect_scene_boundaries, VideoPipeline, VideoReport};
pub use config::{LiveSampling, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use live::{LiveSession, SessionAdapters, SessionHandle, SessionStats, StopHandle};
pub use logging::SessionLogger;
pub use summary_log::SummaryLog;
