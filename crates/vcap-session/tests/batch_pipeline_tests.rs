//! Batch pipeline tests over scripted frame sources.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use vcap_media::{FrameSource, MediaError, MediaResult, SamplingPolicy};
use vcap_ml_client::{CaptionAdapter, MlError, MlResult};
use vcap_models::Frame;
use vcap_session::{caption_sampled_frames, detect_scene_boundaries};

/// Finite source over a fixed color script: one solid color per frame.
struct ColorSource {
    colors: Vec<[u8; 3]>,
    next_index: u64,
}

impl ColorSource {
    fn new(colors: Vec<[u8; 3]>) -> Self {
        Self {
            colors,
            next_index: 0,
        }
    }

    /// A stream of `count` identical gray frames.
    fn static_stream(count: usize) -> Self {
        Self::new(vec![[128, 128, 128]; count])
    }
}

#[async_trait]
impl FrameSource for ColorSource {
    async fn next_frame(&mut self) -> MediaResult<Frame> {
        let Some(color) = self.colors.get(self.next_index as usize) else {
            return Err(MediaError::EndOfStream);
        };
        let image = RgbImage::from_pixel(8, 8, Rgb(*color));
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(frame)
    }

    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (8, 8)
    }
}

struct CountingCaptioner {
    batches: Arc<Mutex<Vec<usize>>>,
    fail: bool,
}

#[async_trait]
impl CaptionAdapter for CountingCaptioner {
    async fn caption(&self, images: &[Frame], _hints: &[String]) -> MlResult<Vec<String>> {
        self.batches.lock().unwrap().push(images.len());
        if self.fail {
            return Err(MlError::request_failed("scripted failure"));
        }
        Ok(images
            .iter()
            .map(|f| format!("frame {} caption", f.index))
            .collect())
    }
}

#[tokio::test]
async fn static_video_yields_exactly_one_boundary() {
    let mut source = ColorSource::static_stream(30);
    let boundaries = detect_scene_boundaries(&mut source, 0.7).await.unwrap();
    assert_eq!(boundaries, vec![0]);
}

#[tokio::test]
async fn hard_cuts_produce_increasing_boundaries() {
    // Three color blocks of 10 frames each: boundaries at 0, 10, 20.
    let mut colors = Vec::new();
    colors.extend(vec![[255, 0, 0]; 10]);
    colors.extend(vec![[0, 255, 0]; 10]);
    colors.extend(vec![[0, 0, 255]; 10]);

    let mut source = ColorSource::new(colors);
    let boundaries = detect_scene_boundaries(&mut source, 0.5).await.unwrap();

    assert_eq!(boundaries, vec![0, 10, 20]);
    assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn interval_captioning_covers_expected_indices() {
    // 100 frames, interval 10, batch 4: batches 4, 4, 2 and one caption
    // per sampled index.
    let batches = Arc::new(Mutex::new(Vec::new()));
    let captioner = CountingCaptioner {
        batches: Arc::clone(&batches),
        fail: false,
    };

    let mut source = ColorSource::static_stream(100);
    let policy = SamplingPolicy::interval(10);
    let captions = caption_sampled_frames(&mut source, &policy, 4, &captioner)
        .await
        .unwrap();

    let indices: Vec<u64> = captions.keys().copied().collect();
    assert_eq!(indices, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90]);
    assert_eq!(*batches.lock().unwrap(), vec![4, 4, 2]);
    assert_eq!(captions.get(&30).unwrap(), "frame 30 caption");
}

#[tokio::test]
async fn boundary_captioning_uses_the_boundary_set() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let captioner = CountingCaptioner {
        batches: Arc::clone(&batches),
        fail: false,
    };

    let mut source = ColorSource::static_stream(50);
    let policy = SamplingPolicy::boundaries([0, 12, 37]);
    let captions = caption_sampled_frames(&mut source, &policy, 8, &captioner)
        .await
        .unwrap();

    let indices: Vec<u64> = captions.keys().copied().collect();
    assert_eq!(indices, vec![0, 12, 37]);
    // All three fit one partial batch flushed at end of stream.
    assert_eq!(*batches.lock().unwrap(), vec![3]);
}

#[tokio::test]
async fn caption_failures_drop_batches_but_not_the_run() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let captioner = CountingCaptioner {
        batches: Arc::clone(&batches),
        fail: true,
    };

    let mut source = ColorSource::static_stream(40);
    let policy = SamplingPolicy::interval(10);
    let captions = caption_sampled_frames(&mut source, &policy, 2, &captioner)
        .await
        .unwrap();

    assert!(captions.is_empty());
    // Both full batches were attempted despite failing.
    assert_eq!(*batches.lock().unwrap(), vec![2, 2]);
}
