//! Pipeline metrics.
//!
//! Records through the `metrics` facade; the embedding process decides
//! which exporter (if any) to install.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "vcap_frames_processed_total";
    pub const FRAMES_SAMPLED_TOTAL: &str = "vcap_frames_sampled_total";
    pub const DETECTION_FAILURES_TOTAL: &str = "vcap_detection_failures_total";

    pub const CAPTION_BATCHES_TOTAL: &str = "vcap_caption_batches_total";
    pub const CAPTION_BATCH_SIZE: &str = "vcap_caption_batch_size";
    pub const CAPTIONS_GENERATED_TOTAL: &str = "vcap_captions_generated_total";
    pub const CAPTION_FAILURES_TOTAL: &str = "vcap_caption_failures_total";

    pub const SUMMARIES_FLUSHED_TOTAL: &str = "vcap_summaries_flushed_total";
    pub const SUMMARIES_FAILED_TOTAL: &str = "vcap_summaries_failed_total";
}

/// Record one processed frame.
pub fn record_frame_processed() {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
}

/// Record a frame forwarded for captioning.
pub fn record_frame_sampled() {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(1);
}

/// Record a detection adapter failure (degraded to no detections).
pub fn record_detection_failure() {
    counter!(names::DETECTION_FAILURES_TOTAL).increment(1);
}

/// Record a caption batch dispatch.
pub fn record_caption_batch(size: usize) {
    counter!(names::CAPTION_BATCHES_TOTAL).increment(1);
    histogram!(names::CAPTION_BATCH_SIZE).record(size as f64);
}

/// Record generated captions.
pub fn record_captions_generated(count: usize) {
    counter!(names::CAPTIONS_GENERATED_TOTAL).increment(count as u64);
}

/// Record a caption adapter failure (batch yielded zero captions).
pub fn record_caption_failure() {
    counter!(names::CAPTION_FAILURES_TOTAL).increment(1);
}

/// Record a flushed window summary.
pub fn record_summary_flushed() {
    counter!(names::SUMMARIES_FLUSHED_TOTAL).increment(1);
}

/// Record a failed window summary (window discarded).
pub fn record_summary_failed() {
    counter!(names::SUMMARIES_FAILED_TOTAL).increment(1);
}
