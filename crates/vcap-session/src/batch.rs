//! Batch (offline) video pipeline.
//!
//! Scene detection, interval- or boundary-sampled captioning, and a
//! one-shot summary over a finite video file.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use vcap_media::{
    FfmpegFrameSource, FrameBatcher, FrameSource, MediaError, SamplingPolicy,
    SceneBoundaryDetector,
};
use vcap_ml_client::{CaptionAdapter, SummaryAdapter};
use vcap_models::{CaptionRecord, Frame, SummaryLogEntry};

use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::logging::SessionLogger;
use crate::metrics;
use crate::summary_log::SummaryLog;

/// Interval period for the fallback pass when scene captioning produces
/// nothing.
const FALLBACK_EVERY_N: u32 = 60;

/// Walk a finite stream and return its scene boundary indices.
///
/// The list is monotonically increasing and always starts at 0 for a
/// non-empty stream.
pub async fn detect_scene_boundaries(
    source: &mut dyn FrameSource,
    threshold: f64,
) -> SessionResult<Vec<u64>> {
    let mut detector = SceneBoundaryDetector::new(threshold);
    let mut boundaries = Vec::new();

    loop {
        match source.next_frame().await {
            Ok(frame) => {
                if detector.observe(&frame) {
                    boundaries.push(frame.index);
                }
            }
            Err(MediaError::EndOfStream) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(boundaries)
}

/// Caption the frames selected by `policy`, returning `index -> caption`.
///
/// Frames accumulate into batches of `batch_size`; the final partial
/// batch is still flushed. A failed batch is logged and contributes no
/// captions — later frames still process.
pub async fn caption_sampled_frames(
    source: &mut dyn FrameSource,
    policy: &SamplingPolicy,
    batch_size: usize,
    captioner: &dyn CaptionAdapter,
) -> SessionResult<BTreeMap<u64, String>> {
    let mut batcher = FrameBatcher::new(batch_size);
    let mut captions = BTreeMap::new();

    loop {
        match source.next_frame().await {
            Ok(frame) => {
                if policy.should_sample(frame.index) {
                    if let Some(batch) = batcher.push(frame, String::new()) {
                        caption_batch(&mut captions, batch, captioner).await;
                    }
                }
            }
            Err(MediaError::EndOfStream) => break,
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(partial) = batcher.take_partial() {
        caption_batch(&mut captions, partial, captioner).await;
    }

    Ok(captions)
}

async fn caption_batch(
    captions: &mut BTreeMap<u64, String>,
    batch: Vec<(Frame, String)>,
    captioner: &dyn CaptionAdapter,
) {
    metrics::record_caption_batch(batch.len());
    let frames: Vec<Frame> = batch.into_iter().map(|(frame, _)| frame).collect();

    match captioner.caption(&frames, &[]).await {
        Ok(texts) => {
            metrics::record_captions_generated(texts.len());
            for (frame, text) in frames.iter().zip(texts) {
                captions.insert(frame.index, text);
            }
        }
        Err(e) => {
            metrics::record_caption_failure();
            warn!("Captioning failed, batch dropped: {}", e);
        }
    }
}

/// Result of a batch pipeline run.
#[derive(Debug, Clone)]
pub struct VideoReport {
    /// All detected scene boundary indices.
    pub boundaries: Vec<u64>,
    /// Captions keyed by frame index.
    pub captions: BTreeMap<u64, String>,
    /// Final summary, `None` when summarization failed or there was
    /// nothing to summarize.
    pub summary: Option<String>,
}

/// Offline pipeline over a video file: scenes, captions, summary.
pub struct VideoPipeline {
    config: SessionConfig,
    captioner: Arc<dyn CaptionAdapter>,
    summarizer: Arc<dyn SummaryAdapter>,
    summary_log: SummaryLog,
}

impl VideoPipeline {
    pub fn new(
        config: SessionConfig,
        captioner: Arc<dyn CaptionAdapter>,
        summarizer: Arc<dyn SummaryAdapter>,
    ) -> Self {
        let summary_log = SummaryLog::new(&config.summary_log_path);
        Self {
            config,
            captioner,
            summarizer,
            summary_log,
        }
    }

    /// Process one file end to end.
    pub async fn run(&self, path: impl AsRef<Path>) -> SessionResult<VideoReport> {
        let path = path.as_ref();
        let logger = SessionLogger::new(Uuid::new_v4().to_string(), "batch");
        logger.log_start(&format!("video={}", path.display()));

        // Pass 1: scene boundaries.
        let mut source = FfmpegFrameSource::open_file(path).await?;
        let scan = detect_scene_boundaries(&mut source, self.config.scene_threshold).await;
        source.close().await?;
        let boundaries = scan?;
        logger.log_progress(&format!("{} scene boundaries", boundaries.len()));

        // Cap the boundaries captioned so a jumpy video stays affordable.
        let limited: Vec<u64> = boundaries
            .iter()
            .copied()
            .take(self.config.max_scene_frames)
            .collect();

        // Pass 2: caption at scene boundaries.
        let mut source = FfmpegFrameSource::open_file(path).await?;
        let scene_policy = SamplingPolicy::boundaries(limited);
        let result = caption_sampled_frames(
            &mut source,
            &scene_policy,
            self.config.batch_size,
            self.captioner.as_ref(),
        )
        .await;
        source.close().await?;
        let mut captions = result?;

        // Fallback: interval sampling when scene captioning came up empty.
        if captions.is_empty() {
            logger.log_progress("No scene captions, falling back to interval sampling");
            let mut source = FfmpegFrameSource::open_file(path).await?;
            let interval_policy = SamplingPolicy::interval(FALLBACK_EVERY_N);
            let result = caption_sampled_frames(
                &mut source,
                &interval_policy,
                self.config.batch_size,
                self.captioner.as_ref(),
            )
            .await;
            source.close().await?;
            captions = result?;
        }

        let summary = self.summarize(&captions, &logger).await;

        logger.log_completion(&format!(
            "captions={} summarized={}",
            captions.len(),
            summary.is_some()
        ));

        Ok(VideoReport {
            boundaries,
            captions,
            summary,
        })
    }

    async fn summarize(
        &self,
        captions: &BTreeMap<u64, String>,
        logger: &SessionLogger,
    ) -> Option<String> {
        if captions.is_empty() {
            return None;
        }

        let records: Vec<(String, Vec<String>)> = captions
            .iter()
            .map(|(index, text)| (CaptionRecord::frame_key(*index), vec![text.clone()]))
            .collect();

        match self.summarizer.summarize(&records).await {
            Ok(summary) => {
                metrics::record_summary_flushed();
                let entry = SummaryLogEntry::new(Utc::now(), summary.clone());
                if let Err(e) = self.summary_log.append(&entry).await {
                    logger.log_warning(&format!("Summary log append failed: {}", e));
                }
                info!("Video summary: {}", summary);
                Some(summary)
            }
            Err(e) => {
                metrics::record_summary_failed();
                logger.log_warning(&format!("Summary generation failed: {}", e));
                None
            }
        }
    }
}
