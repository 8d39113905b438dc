//! FFmpeg command building and video probing.
//!
//! Frame decoding is delegated to an FFmpeg subprocess emitting raw
//! `rgb24` frames on stdout; this module builds those command lines and
//! probes files for their pixel dimensions.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands that decode to raw RGB frames on stdout.
#[derive(Debug, Clone)]
pub struct RawVideoCommand {
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Input URL: a file path or a capture-device URL
    input: String,
    /// Output frame size, when the input must be scaled/negotiated
    size: Option<(u32, u32)>,
    /// Log level
    log_level: String,
}

impl RawVideoCommand {
    /// Decode a video file.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            input_args: Vec::new(),
            input: path.as_ref().to_string_lossy().to_string(),
            size: None,
            log_level: "error".to_string(),
        }
    }

    /// Capture from a camera device index using the platform demuxer.
    pub fn from_camera(index: u32) -> Self {
        let (demuxer, input) = camera_input(index);
        Self {
            input_args: vec!["-f".to_string(), demuxer.to_string()],
            input,
            size: None,
            log_level: "error".to_string(),
        }
    }

    /// Request a specific output frame size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-v".to_string(), self.log_level.clone()];

        args.extend(self.input_args.clone());
        args.push("-i".to_string());
        args.push(self.input.clone());

        if let Some((w, h)) = self.size {
            args.push("-vf".to_string());
            args.push(format!("scale={}:{}", w, h));
        }

        args.push("-f".to_string());
        args.push("rawvideo".to_string());
        args.push("-pix_fmt".to_string());
        args.push("rgb24".to_string());
        args.push("pipe:1".to_string());

        args
    }

    /// Spawn the FFmpeg child with stdout piped.
    pub fn spawn(&self) -> MediaResult<tokio::process::Child> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        Command::new("ffmpeg")
            .args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::source_unavailable(format!("failed to spawn ffmpeg: {}", e)))
    }
}

/// Platform capture demuxer and device URL for a camera index.
fn camera_input(index: u32) -> (&'static str, String) {
    #[cfg(target_os = "macos")]
    {
        ("avfoundation", format!("{}", index))
    }
    #[cfg(not(target_os = "macos"))]
    {
        ("v4l2", format!("/dev/video{}", index))
    }
}

/// Video stream information from FFprobe.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Duration in seconds (0 when unknown, e.g. live inputs)
    pub duration: f64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
}

/// Probe a video file for dimensions and frame rate.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::InvalidVideo(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("no video stream found".to_string()))?;

    let width = video_stream
        .width
        .ok_or_else(|| MediaError::InvalidVideo("missing width".to_string()))?;
    let height = video_stream
        .height
        .ok_or_else(|| MediaError::InvalidVideo("missing height".to_string()))?;

    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(0.0);

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo {
        width,
        height,
        fps,
        duration,
    })
}

/// Parse FFprobe's `num/den` frame-rate notation.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => rate.parse().ok(),
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_command_args() {
        let cmd = RawVideoCommand::from_file("input.mp4");
        let args = cmd.build_args();
        assert!(args.contains(&"-i".to_string()));
        assert!(args.contains(&"input.mp4".to_string()));
        assert!(args.contains(&"rawvideo".to_string()));
        assert!(args.contains(&"rgb24".to_string()));
        assert_eq!(args.last().unwrap(), "pipe:1");
    }

    #[test]
    fn test_camera_command_has_demuxer() {
        let cmd = RawVideoCommand::from_camera(0).size(640, 480);
        let args = cmd.build_args();
        assert!(args.contains(&"-f".to_string()));
        assert!(args.contains(&"scale=640:480".to_string()));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("30000/1001").map(|f| f.round()), Some(30.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
    }
}
