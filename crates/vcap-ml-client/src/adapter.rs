//! Adapter traits for the external model collaborators.
//!
//! The pipeline never talks to a model directly; it owns adapter objects
//! constructed at session start and passed in explicitly, so every
//! collaborator can be mocked in tests.

use async_trait::async_trait;

use vcap_models::{Detections, Frame};

use crate::error::MlResult;

/// Object detection over a single frame.
#[async_trait]
pub trait DetectionAdapter: Send + Sync {
    /// Detect objects in `frame`, returning labels, counts, and an
    /// annotated copy of the frame.
    async fn detect(&self, frame: &Frame) -> MlResult<Detections>;
}

/// Caption generation over a batch of frames.
#[async_trait]
pub trait CaptionAdapter: Send + Sync {
    /// Caption each image, one output per input in the same order.
    /// `hints` aligns with `images`; empty input yields an empty output.
    async fn caption(&self, images: &[Frame], hints: &[String]) -> MlResult<Vec<String>>;
}

/// Summarization of an ordered collection of caption records.
#[async_trait]
pub trait SummaryAdapter: Send + Sync {
    /// Produce one summary of the given `key -> texts` records. Record
    /// order must be preserved when building the prompt.
    async fn summarize(&self, records: &[(String, Vec<String>)]) -> MlResult<String>;
}
