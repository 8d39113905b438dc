//! Shared data models for the vcap pipeline.
//!
//! This crate provides the plain types flowing between pipeline stages:
//! - Frames and detection results
//! - The detection-hint text grammar (format, attach, parse)
//! - Caption records and per-minute aggregation windows
//! - Session events and the persisted summary-log entry

pub mod detection;
pub mod event;
pub mod frame;
pub mod hint;
pub mod window;

// Re-export common types
pub use detection::Detections;
pub use event::{EndReason, SessionEvent, SummaryLogEntry};
pub use frame::Frame;
pub use hint::{attach_hint, format_hint, parse_hint_suffix};
pub use window::{minute_floor, CaptionRecord, TimeWindow};
