//! Decoded video frames.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;

/// One decoded frame pulled from a camera or file.
///
/// The pixel buffer is shared behind an `Arc` because the capture loop,
/// the annotation path, and a pending caption batch may all hold the same
/// frame at once. Capture backends reuse their read buffer, so the source
/// must hand out an owned copy here.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame ordinal since stream start. Monotonic, never reset.
    pub index: u64,
    /// Wall-clock time the frame was read.
    pub captured_at: DateTime<Utc>,
    /// Owned RGB pixel data.
    pub image: Arc<RgbImage>,
}

impl Frame {
    /// Create a frame captured now.
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self {
            index,
            captured_at: Utc::now(),
            image: Arc::new(image),
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_shares_pixels() {
        let img = RgbImage::new(4, 4);
        let frame = Frame::new(0, img);
        let copy = frame.clone();
        assert!(Arc::ptr_eq(&frame.image, &copy.image));
        assert_eq!(copy.width(), 4);
        assert_eq!(copy.height(), 4);
    }
}
