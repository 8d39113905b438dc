//! Wire types for the ML service.
//!
//! Frames travel as base64-wrapped JPEG; the service replies with labels
//! and an annotated frame in the same encoding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{MlError, MlResult};

/// JPEG quality used for frame payloads.
const JPEG_QUALITY: u8 = 85;

/// Request to `/detect`.
#[derive(Debug, Serialize)]
pub struct DetectRequest {
    /// Base64 JPEG frame.
    pub image: String,
}

/// Response from `/detect`.
#[derive(Debug, Deserialize)]
pub struct DetectResponse {
    /// Class name per detected object, duplicates kept.
    pub labels: Vec<String>,
    /// Base64 JPEG frame with boxes burned in; absent when the service
    /// skipped annotation.
    #[serde(default)]
    pub annotated: Option<String>,
}

/// Request to `/caption`.
#[derive(Debug, Serialize)]
pub struct CaptionRequest {
    /// Base64 JPEG frames.
    pub images: Vec<String>,
    /// Detection hints aligned with `images`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

/// Response from `/caption`.
#[derive(Debug, Deserialize)]
pub struct CaptionResponse {
    /// One caption per input image, input order.
    pub captions: Vec<String>,
}

/// Response from `/health`.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Encode an RGB image as base64 JPEG.
pub fn encode_image(image: &RgbImage) -> MlResult<String> {
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgb8,
        )
        .map_err(|e| MlError::ImageEncoding(e.to_string()))?;
    Ok(BASE64.encode(jpeg))
}

/// Decode a base64 JPEG payload back to an RGB image.
pub fn decode_image(payload: &str) -> MlResult<RgbImage> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| MlError::invalid_response(format!("bad base64 frame: {}", e)))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| MlError::invalid_response(format!("bad jpeg frame: {}", e)))?;
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_round_trip_dimensions() {
        let image = RgbImage::from_pixel(12, 8, image::Rgb([10, 200, 30]));
        let encoded = encode_image(&image).unwrap();
        let decoded = decode_image(&encoded).unwrap();
        assert_eq!(decoded.dimensions(), (12, 8));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image("not-base64!").is_err());
    }

    #[test]
    fn test_caption_request_omits_empty_hints() {
        let req = CaptionRequest {
            images: vec!["abc".into()],
            hints: Vec::new(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("hints"));
    }
}
