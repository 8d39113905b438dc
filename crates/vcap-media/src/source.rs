//! Frame sources.
//!
//! A `FrameSource` is the "next frame" primitive the rest of the pipeline
//! consumes. The production implementation reads raw `rgb24` frames from
//! an FFmpeg child's stdout; tests script their own sources.

use std::path::Path;

use async_trait::async_trait;
use image::RgbImage;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout};
use tracing::{debug, warn};

use vcap_models::Frame;

use crate::command::{probe_video, RawVideoCommand};
use crate::error::{MediaError, MediaResult};

/// A sequence of decoded frames with deterministic teardown.
#[async_trait]
pub trait FrameSource: Send {
    /// Pull the next frame. Fails with `EndOfStream` when the input is
    /// exhausted and `FrameRead` on a failed or short read.
    async fn next_frame(&mut self) -> MediaResult<Frame>;

    /// Release the underlying device or file. Idempotent; callers must
    /// invoke it on every exit path.
    async fn close(&mut self) -> MediaResult<()>;

    /// Frame dimensions in pixels.
    fn dimensions(&self) -> (u32, u32);
}

/// Frame source backed by an FFmpeg subprocess decoding to rgb24.
pub struct FfmpegFrameSource {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    width: u32,
    height: u32,
    next_index: u64,
}

impl FfmpegFrameSource {
    /// Open a video file. Dimensions are probed with FFprobe first, so a
    /// missing or broken file fails here rather than on the first read.
    pub async fn open_file(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path).await?;
        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            duration = info.duration,
            "Opening video file"
        );

        let cmd = RawVideoCommand::from_file(path);
        Self::spawn(cmd, info.width, info.height)
    }

    /// Open a camera device at a fixed capture size.
    ///
    /// FFmpeg holds the device exclusively, so a second session against
    /// the same index fails here instead of interleaving reads.
    pub fn open_camera(index: u32, width: u32, height: u32) -> MediaResult<Self> {
        debug!(index, width, height, "Opening camera device");
        let cmd = RawVideoCommand::from_camera(index).size(width, height);
        Self::spawn(cmd, width, height)
    }

    fn spawn(cmd: RawVideoCommand, width: u32, height: u32) -> MediaResult<Self> {
        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::source_unavailable("ffmpeg stdout not captured"))?;

        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            width,
            height,
            next_index: 0,
        })
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn next_frame(&mut self) -> MediaResult<Frame> {
        let stdout = self.stdout.as_mut().ok_or(MediaError::EndOfStream)?;

        let frame_len = (self.width * self.height * 3) as usize;
        let mut buf = vec![0u8; frame_len];

        match stdout.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(MediaError::EndOfStream);
            }
            Err(e) => return Err(MediaError::frame_read(e.to_string())),
        }

        let image = RgbImage::from_vec(self.width, self.height, buf)
            .ok_or_else(|| MediaError::frame_read("frame buffer size mismatch"))?;

        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(frame)
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill ffmpeg child: {}", e);
            }
            let _ = child.wait().await;
            debug!("Frame source released");
        }
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        // Backstop only; the loop is responsible for calling close().
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSource {
        remaining: u32,
        closed: u32,
    }

    #[async_trait]
    impl FrameSource for CountingSource {
        async fn next_frame(&mut self) -> MediaResult<Frame> {
            if self.remaining == 0 {
                return Err(MediaError::EndOfStream);
            }
            self.remaining -= 1;
            Ok(Frame::new(0, RgbImage::new(2, 2)))
        }

        async fn close(&mut self) -> MediaResult<()> {
            self.closed += 1;
            Ok(())
        }

        fn dimensions(&self) -> (u32, u32) {
            (2, 2)
        }
    }

    #[tokio::test]
    async fn test_source_drains_then_ends() {
        let mut source = CountingSource {
            remaining: 2,
            closed: 0,
        };
        assert!(source.next_frame().await.is_ok());
        assert!(source.next_frame().await.is_ok());
        assert!(matches!(
            source.next_frame().await,
            Err(MediaError::EndOfStream)
        ));
        source.close().await.unwrap();
        assert_eq!(source.closed, 1);
    }
}
