//! Live session loop.
//!
//! One cooperative loop per session: pull a frame, detect, sample into
//! batches, caption on flush, tick the minute window, emit an update,
//! pace to the target rate. The only suspension points are the bounded
//! cancellation poll and the pacing sleep, so cancellation is sampled at
//! iteration boundaries and never mid-frame.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, Instrument};
use uuid::Uuid;

use vcap_media::{
    FrameBatcher, FrameSource, MediaError, PendingFrame, SamplingPolicy, SceneBoundaryDetector,
};
use vcap_ml_client::{CaptionAdapter, DetectionAdapter, SummaryAdapter};
use vcap_models::{
    attach_hint, format_hint, CaptionRecord, Detections, EndReason, Frame, SessionEvent,
    SummaryLogEntry,
};

use crate::aggregator::{DetectionTally, WindowAggregator};
use crate::config::{LiveSampling, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::logging::SessionLogger;
use crate::metrics;
use crate::summary_log::SummaryLog;

/// Updates queued for a slow consumer before the session starts dropping
/// them. Dropping keeps the capture loop paced; stale updates are
/// superseded anyway.
const EVENT_BUFFER_SIZE: usize = 32;

/// The model collaborators a session drives, owned explicitly and passed
/// in at construction.
#[derive(Clone)]
pub struct SessionAdapters {
    pub detector: Arc<dyn DetectionAdapter>,
    pub captioner: Arc<dyn CaptionAdapter>,
    pub summarizer: Arc<dyn SummaryAdapter>,
}

/// Final accounting for a completed session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub session_id: String,
    pub frames_processed: u64,
    pub total_captions: u64,
    /// Session-wide running-max object counts.
    pub tally: DetectionTally,
}

/// Cloneable stop signal for a running session.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Request the session to stop at its next iteration boundary.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// Handle to a running live session.
pub struct SessionHandle {
    /// Per-iteration updates and summary events.
    pub events: mpsc::Receiver<SessionEvent>,
    stop: Arc<watch::Sender<bool>>,
    task: JoinHandle<SessionResult<SessionStats>>,
}

impl SessionHandle {
    /// Request the session to stop at its next iteration boundary.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// A stop signal that can outlive borrows of this handle.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: Arc::clone(&self.stop),
        }
    }

    /// Receive the next event, `None` once the session has ended and the
    /// channel drained.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Wait for the session to finish and return its stats.
    pub async fn join(self) -> SessionResult<SessionStats> {
        // Keep the stop sender alive while waiting; dropping it reads as
        // a stop request to the session.
        let SessionHandle {
            events: _events,
            stop: _stop,
            task,
        } = self;
        task.await
            .map_err(|e| SessionError::internal(format!("session task panicked: {}", e)))?
    }
}

/// A live captioning session over one frame source.
pub struct LiveSession {
    id: String,
    config: SessionConfig,
    adapters: SessionAdapters,
    source: Box<dyn FrameSource>,
    policy: SamplingPolicy,
    /// Present only in scene-change sampling mode.
    scene_detector: Option<SceneBoundaryDetector>,
    batcher: FrameBatcher,
    aggregator: WindowAggregator,
    summary_log: SummaryLog,
    tally: DetectionTally,
    logger: SessionLogger,
    cancel_rx: watch::Receiver<bool>,
    events_tx: mpsc::Sender<SessionEvent>,
    frames_processed: u64,
    total_captions: u64,
    last_caption: String,
}

impl LiveSession {
    /// Start a session over `source` and return its handle.
    pub fn spawn(
        source: Box<dyn FrameSource>,
        adapters: SessionAdapters,
        config: SessionConfig,
    ) -> SessionHandle {
        let (stop_tx, cancel_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);

        let id = Uuid::new_v4().to_string();
        let logger = SessionLogger::new(id.clone(), "live");
        let span = logger.create_span();
        let session = LiveSession {
            policy: SamplingPolicy::interval(config.every_n_frames),
            scene_detector: match config.live_sampling {
                LiveSampling::Interval => None,
                LiveSampling::SceneChange => {
                    Some(SceneBoundaryDetector::new(config.scene_threshold))
                }
            },
            batcher: FrameBatcher::new(config.batch_size),
            aggregator: WindowAggregator::new(config.window_min_records, Utc::now()),
            summary_log: SummaryLog::new(&config.summary_log_path),
            tally: DetectionTally::default(),
            logger,
            id,
            config,
            adapters,
            source,
            cancel_rx,
            events_tx,
            frames_processed: 0,
            total_captions: 0,
            last_caption: String::new(),
        };

        let task = tokio::spawn(session.run().instrument(span));

        SessionHandle {
            events: events_rx,
            stop: Arc::new(stop_tx),
            task,
        }
    }

    async fn run(mut self) -> SessionResult<SessionStats> {
        let (width, height) = self.source.dimensions();
        self.logger.log_start(&format!(
            "{}x{} every_n={} batch_size={} target_fps={}",
            width, height, self.config.every_n_frames, self.config.batch_size,
            self.config.target_fps
        ));

        let outcome = self.run_loop().await;

        // Release the source exactly once, on every exit path.
        if let Err(e) = self.source.close().await {
            self.logger.log_warning(&format!("Source close failed: {}", e));
        }

        let reason = match &outcome {
            Ok(reason) => *reason,
            Err(_) => EndReason::DeviceError,
        };
        self.emit(SessionEvent::Ended { reason });

        let stats = SessionStats {
            session_id: self.id.clone(),
            frames_processed: self.frames_processed,
            total_captions: self.total_captions,
            tally: self.tally.clone(),
        };

        match outcome {
            Ok(reason) => {
                self.logger.log_completion(&format!(
                    "reason={:?} frames={} captions={}",
                    reason, stats.frames_processed, stats.total_captions
                ));
                Ok(stats)
            }
            Err(e) => {
                self.logger.log_error(&format!("Session terminated: {}", e));
                Err(e)
            }
        }
    }

    async fn run_loop(&mut self) -> SessionResult<EndReason> {
        loop {
            if self.poll_cancelled().await {
                // Partial state is discarded on cancellation.
                self.batcher.clear();
                return Ok(EndReason::Cancelled);
            }

            let frame = match self.source.next_frame().await {
                Ok(frame) => frame,
                Err(MediaError::EndOfStream) => {
                    self.flush_pending().await;
                    return Ok(EndReason::EndOfStream);
                }
                Err(e) => return Err(e.into()),
            };
            self.frames_processed += 1;
            metrics::record_frame_processed();

            let detections = match self.adapters.detector.detect(&frame).await {
                Ok(detections) => detections,
                Err(e) => {
                    metrics::record_detection_failure();
                    self.logger
                        .log_warning(&format!("Detection failed, treating as empty: {}", e));
                    Detections::empty(&frame)
                }
            };

            // Interval hit or scene boundary, object-gated either way: a
            // hit with zero detections is never forwarded for captioning.
            let sampled = match &mut self.scene_detector {
                Some(detector) => detector.observe(&frame),
                None => self.policy.should_sample(frame.index),
            };
            if sampled && !detections.is_empty() {
                metrics::record_frame_sampled();
                let hint = format_hint(&detections.counts);
                if let Some(batch) = self.batcher.push(frame.clone(), hint) {
                    self.caption_batch(batch).await;
                }
            }

            self.flush_window_if_due(Utc::now()).await;

            self.emit(SessionEvent::Update {
                frame_index: frame.index,
                annotated: Arc::clone(&detections.annotated),
                objects: detections.raw_labels.clone(),
                caption: self.last_caption.clone(),
                total_captions: self.total_captions,
            });

            tokio::time::sleep(self.config.frame_interval()).await;
        }
    }

    /// Bounded check for the out-of-band stop signal.
    async fn poll_cancelled(&mut self) -> bool {
        if *self.cancel_rx.borrow() {
            return true;
        }
        match tokio::time::timeout(self.config.cancel_poll, self.cancel_rx.changed()).await {
            Ok(Ok(())) => *self.cancel_rx.borrow(),
            // Handle dropped: nobody can stop or observe us, shut down.
            Ok(Err(_)) => true,
            Err(_) => false,
        }
    }

    /// Send one batch to the caption adapter and record the results.
    ///
    /// A failed batch yields zero captions; the loop continues.
    async fn caption_batch(&mut self, batch: Vec<PendingFrame>) {
        metrics::record_caption_batch(batch.len());
        let (frames, hints): (Vec<Frame>, Vec<String>) = batch.into_iter().unzip();

        match self.adapters.captioner.caption(&frames, &hints).await {
            Ok(captions) => {
                metrics::record_captions_generated(captions.len());
                let key = CaptionRecord::live_key(Utc::now());
                for (caption, hint) in captions.iter().zip(hints.iter()) {
                    let text = attach_hint(caption, hint);
                    let record = CaptionRecord::new(key.clone(), text.clone());
                    self.tally.observe(&record);
                    self.aggregator.record(record);
                    self.total_captions += 1;
                    self.last_caption = text;
                }
            }
            Err(e) => {
                metrics::record_caption_failure();
                self.logger
                    .log_warning(&format!("Captioning failed, batch dropped: {}", e));
            }
        }
    }

    /// Caption whatever is still queued at end of stream.
    async fn flush_pending(&mut self) {
        if let Some(partial) = self.batcher.take_partial() {
            self.caption_batch(partial).await;
        }
    }

    /// Minute-boundary check; flush the window when it closes dense.
    async fn flush_window_if_due(&mut self, now: DateTime<Utc>) {
        let Some(window) = self.aggregator.tick(now) else {
            return;
        };

        let grouped = window.grouped();
        match self.adapters.summarizer.summarize(&grouped).await {
            Ok(summary) => {
                metrics::record_summary_flushed();
                let entry = SummaryLogEntry::new(window.start_minute, summary.clone());
                if let Err(e) = self.summary_log.append(&entry).await {
                    self.logger
                        .log_warning(&format!("Summary log append failed: {}", e));
                }
                self.emit(SessionEvent::Summary {
                    window_start: window.start_minute,
                    summary,
                    record_count: window.record_count(),
                });
            }
            Err(e) => {
                // Discard rather than retry: no backlog growth.
                metrics::record_summary_failed();
                self.logger
                    .log_warning(&format!("Summarization failed, window discarded: {}", e));
            }
        }
    }

    /// Non-blocking event emit; a saturated consumer loses updates
    /// instead of stalling the capture loop.
    fn emit(&self, event: SessionEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.events_tx.try_send(event) {
            debug!(session_id = %self.id, "Event buffer full, dropping update");
        }
    }
}
