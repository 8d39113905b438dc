//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

/// How a live session picks frames for captioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveSampling {
    /// Every Nth frame.
    #[default]
    Interval,
    /// Frames where the scene boundary detector declares a cut.
    SceneChange,
}

impl LiveSampling {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "interval" => Some(Self::Interval),
            "scene" | "scene_change" => Some(Self::SceneChange),
            _ => None,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Live frame selection policy
    pub live_sampling: LiveSampling,
    /// Caption every Nth frame in live interval mode
    pub every_n_frames: u32,
    /// Frames per caption batch
    pub batch_size: usize,
    /// Target live frame cadence
    pub target_fps: f64,
    /// Bounded wait for the out-of-band stop signal each iteration
    pub cancel_poll: Duration,
    /// Minimum distinct timestamp keys before a window may flush
    pub window_min_records: usize,
    /// Histogram distance above which a scene boundary is declared
    pub scene_threshold: f64,
    /// Cap on scene boundaries captioned per video (bounds inference cost)
    pub max_scene_frames: usize,
    /// Append-only summary log destination
    pub summary_log_path: PathBuf,
    /// How many camera indices to probe during discovery
    pub max_camera_devices: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            live_sampling: LiveSampling::Interval,
            every_n_frames: 10,
            batch_size: 4,
            target_fps: 30.0,
            cancel_poll: Duration::from_millis(10),
            window_min_records: 3,
            scene_threshold: 0.7,
            max_scene_frames: 10,
            summary_log_path: PathBuf::from("summaries/live_summaries.jsonl"),
            max_camera_devices: 5,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            live_sampling: std::env::var("VCAP_LIVE_SAMPLING")
                .ok()
                .and_then(|s| LiveSampling::parse(&s))
                .unwrap_or(defaults.live_sampling),
            every_n_frames: std::env::var("VCAP_EVERY_N_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.every_n_frames),
            batch_size: std::env::var("VCAP_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.batch_size),
            target_fps: std::env::var("VCAP_TARGET_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.target_fps),
            cancel_poll: Duration::from_millis(
                std::env::var("VCAP_CANCEL_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            window_min_records: std::env::var("VCAP_WINDOW_MIN_RECORDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.window_min_records),
            scene_threshold: std::env::var("VCAP_SCENE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scene_threshold),
            max_scene_frames: std::env::var("VCAP_MAX_SCENE_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_scene_frames),
            summary_log_path: std::env::var("VCAP_SUMMARY_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.summary_log_path),
            max_camera_devices: std::env::var("VCAP_MAX_CAMERA_DEVICES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_camera_devices),
        }
    }

    /// Post-iteration pacing delay for the configured frame rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.live_sampling, LiveSampling::Interval);
        assert_eq!(config.every_n_frames, 10);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.window_min_records, 3);
        assert_eq!(config.cancel_poll, Duration::from_millis(10));
    }

    #[test]
    fn test_live_sampling_parse() {
        assert_eq!(LiveSampling::parse("interval"), Some(LiveSampling::Interval));
        assert_eq!(LiveSampling::parse("SCENE"), Some(LiveSampling::SceneChange));
        assert_eq!(LiveSampling::parse("bogus"), None);
    }

    #[test]
    fn test_frame_interval_at_30_fps() {
        let config = SessionConfig::default();
        let interval = config.frame_interval();
        assert!((interval.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}
