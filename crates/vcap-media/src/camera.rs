//! Camera device discovery.
//!
//! Probes device indices in order; a device qualifies only if it opens
//! AND a first read succeeds. The opener is a trait so tests can script
//! probe outcomes deterministically.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::source::{FfmpegFrameSource, FrameSource};

/// Opens a camera device by index.
#[async_trait]
pub trait CameraOpener: Send + Sync {
    async fn open(&self, index: u32) -> MediaResult<Box<dyn FrameSource>>;
}

/// Production opener: FFmpeg capture at a fixed frame size.
pub struct FfmpegCameraOpener {
    pub width: u32,
    pub height: u32,
}

impl Default for FfmpegCameraOpener {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[async_trait]
impl CameraOpener for FfmpegCameraOpener {
    async fn open(&self, index: u32) -> MediaResult<Box<dyn FrameSource>> {
        let source = FfmpegFrameSource::open_camera(index, self.width, self.height)?;
        Ok(Box::new(source))
    }
}

/// Find the first working camera index.
///
/// Probes `0..max_devices` in order. A device is working only if `open`
/// succeeds and one frame can be read; the probe source is closed before
/// the index is returned, so the caller reopens the winner for real use.
pub async fn discover_camera(
    opener: &dyn CameraOpener,
    max_devices: u32,
) -> MediaResult<u32> {
    for index in 0..max_devices {
        debug!(index, "Probing camera device");
        let mut source = match opener.open(index).await {
            Ok(s) => s,
            Err(e) => {
                debug!(index, "Device failed to open: {}", e);
                continue;
            }
        };

        let read_ok = source.next_frame().await.is_ok();
        let _ = source.close().await;

        if read_ok {
            info!(index, "Found working camera");
            return Ok(index);
        }
        debug!(index, "Device opened but first read failed");
    }

    Err(MediaError::NoDeviceFound {
        probed: max_devices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use vcap_models::Frame;

    /// Scripted probe: device behavior per index.
    #[derive(Clone, Copy)]
    enum Probe {
        OpenFails,
        ReadFails,
        Works,
    }

    struct ScriptedOpener {
        probes: Vec<Probe>,
        closes: Arc<AtomicU32>,
    }

    struct ScriptedSource {
        works: bool,
        closes: Arc<AtomicU32>,
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        async fn next_frame(&mut self) -> MediaResult<Frame> {
            if self.works {
                Ok(Frame::new(0, RgbImage::new(2, 2)))
            } else {
                Err(MediaError::frame_read("scripted failure"))
            }
        }

        async fn close(&mut self) -> MediaResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn dimensions(&self) -> (u32, u32) {
            (2, 2)
        }
    }

    #[async_trait]
    impl CameraOpener for ScriptedOpener {
        async fn open(&self, index: u32) -> MediaResult<Box<dyn FrameSource>> {
            match self.probes.get(index as usize) {
                Some(Probe::OpenFails) | None => {
                    Err(MediaError::source_unavailable("scripted open failure"))
                }
                Some(Probe::ReadFails) => Ok(Box::new(ScriptedSource {
                    works: false,
                    closes: Arc::clone(&self.closes),
                })),
                Some(Probe::Works) => Ok(Box::new(ScriptedSource {
                    works: true,
                    closes: Arc::clone(&self.closes),
                })),
            }
        }
    }

    #[tokio::test]
    async fn test_first_working_device_wins() {
        let closes = Arc::new(AtomicU32::new(0));
        let opener = ScriptedOpener {
            probes: vec![Probe::OpenFails, Probe::ReadFails, Probe::Works, Probe::Works],
            closes: Arc::clone(&closes),
        };

        let index = discover_camera(&opener, 5).await.unwrap();
        assert_eq!(index, 2);
        // Both the read-failing probe and the winner were closed.
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_device_found() {
        let opener = ScriptedOpener {
            probes: vec![Probe::OpenFails, Probe::ReadFails],
            closes: Arc::new(AtomicU32::new(0)),
        };

        let err = discover_camera(&opener, 2).await.unwrap_err();
        assert!(matches!(err, MediaError::NoDeviceFound { probed: 2 }));
    }

    #[tokio::test]
    async fn test_probe_order_is_deterministic() {
        let closes = Arc::new(AtomicU32::new(0));
        let opener = ScriptedOpener {
            probes: vec![Probe::Works, Probe::Works],
            closes,
        };

        for _ in 0..3 {
            assert_eq!(discover_camera(&opener, 2).await.unwrap(), 0);
        }
    }
}
