//! Session events and the persisted summary-log entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Why a live session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Stop was requested through the session handle.
    Cancelled,
    /// The source ran out of frames.
    EndOfStream,
    /// The source failed mid-stream.
    DeviceError,
}

/// Events emitted by a live session.
///
/// Delivered in-process over the session's event channel. `Update`
/// carries the annotated pixel buffer, so the enum itself is not
/// serialized; transports encode what they need.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Per-iteration state: the latest frame and captioning status.
    Update {
        frame_index: u64,
        annotated: Arc<RgbImage>,
        objects: Vec<String>,
        /// Latest caption, empty until the first batch completes.
        caption: String,
        total_captions: u64,
    },
    /// A window was flushed to the summarizer.
    Summary {
        window_start: DateTime<Utc>,
        summary: String,
        record_count: usize,
    },
    /// The session loop exited.
    Ended { reason: EndReason },
}

/// One line of the append-only summary log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryLogEntry {
    /// Window start minute, `YYYY-MM-DD HH:MM`.
    pub time: String,
    pub summary: String,
}

impl SummaryLogEntry {
    pub fn new(window_start: DateTime<Utc>, summary: impl Into<String>) -> Self {
        Self {
            time: window_start.format("%Y-%m-%d %H:%M").to_string(),
            summary: summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_log_entry_serialization() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        let entry = SummaryLogEntry::new(start, "people walking");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"time\":\"2024-05-01 10:30\""));
        assert!(json.contains("\"summary\":\"people walking\""));

        let back: SummaryLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
