//! Object detection results.

use std::collections::BTreeMap;
use std::sync::Arc;

use image::RgbImage;

use crate::frame::Frame;

/// Result of running the object detector on one frame.
#[derive(Debug, Clone)]
pub struct Detections {
    /// Class name of every detected object, duplicates kept, detector order.
    pub raw_labels: Vec<String>,
    /// Per-class object counts. BTreeMap so hint strings iterate classes
    /// in sorted order.
    pub counts: BTreeMap<String, u32>,
    /// Frame with boxes and labels burned in by the detector.
    pub annotated: Arc<RgbImage>,
}

impl Detections {
    /// Build a result from the detector's raw label list.
    pub fn from_labels(labels: Vec<String>, annotated: Arc<RgbImage>) -> Self {
        let mut counts = BTreeMap::new();
        for label in &labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        Self {
            raw_labels: labels,
            counts,
            annotated,
        }
    }

    /// Neutral fallback when detection fails: no objects, the annotated
    /// frame is the original.
    pub fn empty(frame: &Frame) -> Self {
        Self {
            raw_labels: Vec::new(),
            counts: BTreeMap::new(),
            annotated: Arc::clone(&frame.image),
        }
    }

    /// Whether any object was detected.
    pub fn is_empty(&self) -> bool {
        self.raw_labels.is_empty()
    }
}
