//! Frame sampling policies and batching.
//!
//! The sampling policy decides which frames are worth model inference;
//! the batcher accumulates forwarded frames into fixed-size units for the
//! caption adapter. The buffer is bounded at `batch_size` because a full
//! batch is handed out before further frames are accepted.

use std::collections::HashSet;

use vcap_models::Frame;

/// Which frames to forward downstream.
#[derive(Debug, Clone)]
pub enum SamplingPolicy {
    /// Forward frame `i` iff `i % every_n == 0`.
    Interval { every_n: u32 },
    /// Forward frame `i` iff `i` is in a precomputed boundary set.
    Boundaries { frames: HashSet<u64> },
}

impl SamplingPolicy {
    /// Interval policy with the given period.
    pub fn interval(every_n: u32) -> Self {
        Self::Interval {
            every_n: every_n.max(1),
        }
    }

    /// Boundary policy over a precomputed boundary list.
    pub fn boundaries(frames: impl IntoIterator<Item = u64>) -> Self {
        Self::Boundaries {
            frames: frames.into_iter().collect(),
        }
    }

    /// Whether the frame at `index` should be forwarded.
    pub fn should_sample(&self, index: u64) -> bool {
        match self {
            SamplingPolicy::Interval { every_n } => index % (*every_n as u64) == 0,
            SamplingPolicy::Boundaries { frames } => frames.contains(&index),
        }
    }
}

/// A frame queued for captioning, paired with its detection-hint string.
pub type PendingFrame = (Frame, String);

/// Accumulates forwarded frames into batches of a fixed size.
pub struct FrameBatcher {
    batch_size: usize,
    pending: Vec<PendingFrame>,
}

impl FrameBatcher {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pending: Vec::new(),
        }
    }

    /// Queue a frame. Returns the full batch exactly when the buffer
    /// reaches capacity; the buffer is emptied before returning.
    pub fn push(&mut self, frame: Frame, hint: String) -> Option<Vec<PendingFrame>> {
        self.pending.push((frame, hint));
        if self.pending.len() >= self.batch_size {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }

    /// Drain whatever is queued at stream end. No frames are silently
    /// dropped: a partial batch is still handed out.
    pub fn take_partial(&mut self) -> Option<Vec<PendingFrame>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// Discard queued frames without flushing (cancellation path).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Frames currently queued.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame(index: u64) -> Frame {
        Frame::new(index, RgbImage::new(2, 2))
    }

    #[test]
    fn test_interval_membership() {
        let policy = SamplingPolicy::interval(10);
        let sampled: Vec<u64> = (0..35).filter(|i| policy.should_sample(*i)).collect();
        assert_eq!(sampled, vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_interval_period_one_takes_everything() {
        let policy = SamplingPolicy::interval(1);
        assert!((0..5).all(|i| policy.should_sample(i)));
    }

    #[test]
    fn test_boundary_membership() {
        let policy = SamplingPolicy::boundaries([0, 17, 42]);
        assert!(policy.should_sample(0));
        assert!(policy.should_sample(42));
        assert!(!policy.should_sample(1));
    }

    #[test]
    fn test_batcher_flush_counts() {
        // 10 frames at batch size 4 -> flushes of 4, 4, then a partial 2.
        let mut batcher = FrameBatcher::new(4);
        let mut flushes = Vec::new();

        for i in 0..10 {
            if let Some(batch) = batcher.push(frame(i), String::new()) {
                flushes.push(batch.len());
            }
        }
        if let Some(partial) = batcher.take_partial() {
            flushes.push(partial.len());
        }

        assert_eq!(flushes, vec![4, 4, 2]);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_batcher_exact_multiple_has_no_partial() {
        let mut batcher = FrameBatcher::new(3);
        let mut full = 0;
        for i in 0..6 {
            if batcher.push(frame(i), String::new()).is_some() {
                full += 1;
            }
        }
        assert_eq!(full, 2);
        assert!(batcher.take_partial().is_none());
    }

    #[test]
    fn test_batcher_never_exceeds_capacity() {
        let mut batcher = FrameBatcher::new(4);
        for i in 0..100 {
            if let Some(batch) = batcher.push(frame(i), String::new()) {
                assert_eq!(batch.len(), 4);
            }
            assert!(batcher.len() < 4);
        }
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut batcher = FrameBatcher::new(4);
        batcher.push(frame(0), String::new());
        batcher.push(frame(1), String::new());
        batcher.clear();
        assert!(batcher.take_partial().is_none());
    }
}
