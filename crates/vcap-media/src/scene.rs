//! Scene boundary detection.
//!
//! Declares shot boundaries by comparing consecutive frames' hue/saturation
//! histograms with the Bhattacharyya distance. Only the previous histogram
//! is retained, so memory is O(1) regardless of stream length.

use image::RgbImage;
use tracing::debug;

use vcap_models::Frame;

/// Hue bins over [0, 180).
const HUE_BINS: usize = 50;
/// Saturation bins over [0, 256).
const SAT_BINS: usize = 60;

/// Default Bhattacharyya distance above which a boundary is declared.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.7;

/// Scene boundary detector over a frame stream.
///
/// Frame 0 is always a boundary (implicit scene start); afterwards frame
/// `i` is a boundary when the distance between frames `i-1` and `i`
/// exceeds the threshold. A completely static stream therefore yields
/// exactly one boundary.
pub struct SceneBoundaryDetector {
    threshold: f64,
    prev_histogram: Option<Vec<f32>>,
    boundary_count: u64,
}

impl SceneBoundaryDetector {
    /// Create a detector with the given distance threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            prev_histogram: None,
            boundary_count: 0,
        }
    }

    /// Observe the next frame; returns whether it starts a new scene.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        let histogram = hue_sat_histogram(&frame.image);

        let is_boundary = match &self.prev_histogram {
            None => true,
            Some(prev) => {
                let distance = bhattacharyya(prev, &histogram);
                if distance > self.threshold {
                    debug!(
                        frame_index = frame.index,
                        distance = format!("{:.3}", distance),
                        threshold = self.threshold,
                        "Scene boundary detected"
                    );
                    true
                } else {
                    false
                }
            }
        };

        self.prev_histogram = Some(histogram);
        if is_boundary {
            self.boundary_count += 1;
        }
        is_boundary
    }

    /// Clear state before a new, independent video.
    pub fn reset(&mut self) {
        self.prev_histogram = None;
        self.boundary_count = 0;
    }

    /// Total boundaries declared since the last reset.
    pub fn boundary_count(&self) -> u64 {
        self.boundary_count
    }
}

impl Default for SceneBoundaryDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SCENE_THRESHOLD)
    }
}

/// Compute the L2-normalized 50x60 hue/saturation histogram of an image.
///
/// Hue is binned over [0, 180) and saturation over [0, 256), matching the
/// 8-bit HSV convention of common vision toolkits.
pub fn hue_sat_histogram(image: &RgbImage) -> Vec<f32> {
    let mut hist = vec![0.0f32; HUE_BINS * SAT_BINS];

    for pixel in image.pixels() {
        let (hue, sat) = rgb_to_hue_sat(pixel.0[0], pixel.0[1], pixel.0[2]);
        let hue_bin = ((hue as usize * HUE_BINS) / 180).min(HUE_BINS - 1);
        let sat_bin = ((sat as usize * SAT_BINS) / 256).min(SAT_BINS - 1);
        hist[hue_bin * SAT_BINS + sat_bin] += 1.0;
    }

    let norm = hist.iter().map(|v| (*v as f64) * (*v as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut hist {
            *v = (*v as f64 / norm) as f32;
        }
    }
    hist
}

/// Bhattacharyya distance between two histograms.
///
/// `d = sqrt(1 - sum(sqrt(h1*h2)) / sqrt(sum(h1) * sum(h2)))`, in [0, 1]
/// with 0 for identical histograms, independent of normalization.
pub fn bhattacharyya(h1: &[f32], h2: &[f32]) -> f64 {
    if h1.len() != h2.len() || h1.is_empty() {
        return 1.0;
    }

    let mut bc = 0.0f64;
    let mut sum1 = 0.0f64;
    let mut sum2 = 0.0f64;

    for (a, b) in h1.iter().zip(h2.iter()) {
        let a = *a as f64;
        let b = *b as f64;
        bc += (a * b).sqrt();
        sum1 += a;
        sum2 += b;
    }

    let denom = (sum1 * sum2).sqrt();
    if denom <= 0.0 {
        return 1.0;
    }

    (1.0 - (bc / denom).min(1.0)).max(0.0).sqrt()
}

/// Convert an RGB pixel to 8-bit hue [0, 180) and saturation [0, 256).
fn rgb_to_hue_sat(r: u8, g: u8, b: u8) -> (u8, u8) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let sat = if max > 0.0 {
        (255.0 * delta / max).round().min(255.0) as u8
    } else {
        0
    };

    if delta == 0.0 {
        return (0, sat);
    }

    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    (((hue / 2.0).round() as u32 % 180) as u8, sat)
}
