use crate::orientation;
use image::ImageReader;
use std::io::Cursor;
use thiserror::Error;
use weddia_core::filename::extension_of;

/// Quality for inputs that are already WebP; a light re-encode that still
/// strips metadata and bakes in orientation.
const WEBP_REENCODE_QUALITY: f32 = 90.0;

/// Quality for full transcodes from other raster formats.
const WEBP_TRANSCODE_QUALITY: f32 = 85.0;

#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The input could not be decoded as a valid instance of its declared type.
    #[error("Failed to decode {file_name}: {reason}")]
    Decode { file_name: String, reason: String },

    #[error("Failed to encode {file_name}: {reason}")]
    Encode { file_name: String, reason: String },
}

/// Result of one optimization run.
///
/// `optimized_size` may exceed `original_size` for already-efficient inputs;
/// both are reported for observability either way.
#[derive(Debug, Clone)]
pub struct OptimizedMedia {
    pub data: Vec<u8>,
    pub content_type: String,
    /// Output extension without the dot ("webp", or the input's own extension
    /// on passthrough).
    pub extension: String,
    pub original_size: usize,
    pub optimized_size: usize,
}

pub struct MediaOptimizer;

impl MediaOptimizer {
    /// Optimize one file's raw bytes according to its declared MIME type.
    ///
    /// Videos and GIFs pass through untouched. Every other raster type is
    /// decoded, orientation-corrected, and re-encoded as WebP, which also
    /// strips EXIF and other metadata.
    pub fn optimize(
        data: Vec<u8>,
        content_type: &str,
        file_name: &str,
    ) -> Result<OptimizedMedia, OptimizeError> {
        let original_size = data.len();

        if content_type.starts_with("video/") || content_type == "image/gif" {
            tracing::debug!(
                file_name = %file_name,
                content_type = %content_type,
                size_bytes = original_size,
                "Passthrough, no re-encode"
            );
            return Ok(OptimizedMedia {
                content_type: content_type.to_string(),
                extension: extension_of(file_name),
                original_size,
                optimized_size: original_size,
                data,
            });
        }

        let quality = if content_type == "image/webp" {
            WEBP_REENCODE_QUALITY
        } else {
            WEBP_TRANSCODE_QUALITY
        };

        let cursor = Cursor::new(&data);
        let img = ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| OptimizeError::Decode {
                file_name: file_name.to_string(),
                reason: e.to_string(),
            })?
            .decode()
            .map_err(|e| OptimizeError::Decode {
                file_name: file_name.to_string(),
                reason: e.to_string(),
            })?;

        let img = orientation::apply_exif_orientation(img, &data);
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let encoder = webp::Encoder::from_rgba(&rgba, width, height);
        let encoded = encoder.encode(quality);
        let optimized = encoded.to_vec();

        tracing::info!(
            file_name = %file_name,
            content_type = %content_type,
            original_size = original_size,
            optimized_size = optimized.len(),
            quality = quality,
            "Image re-encoded to WebP"
        );

        Ok(OptimizedMedia {
            optimized_size: optimized.len(),
            data: optimized,
            content_type: "image/webp".to_string(),
            extension: "webp".to_string(),
            original_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    // RGB, not RGBA: the JPEG encoder rejects alpha.
    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(64, 48, Rgb([200, 30, 90]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    #[test]
    fn png_is_transcoded_to_webp() {
        let input = encode(ImageFormat::Png);
        let original_len = input.len();

        let out = MediaOptimizer::optimize(input, "image/png", "pic.png").unwrap();
        assert_eq!(out.content_type, "image/webp");
        assert_eq!(out.extension, "webp");
        assert_eq!(out.original_size, original_len);
        assert_eq!(out.optimized_size, out.data.len());

        // Output must decode as standard WebP
        let decoded = ImageReader::new(Cursor::new(&out.data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn jpeg_is_transcoded_to_webp() {
        let input = encode(ImageFormat::Jpeg);
        let out = MediaOptimizer::optimize(input, "image/jpeg", "pic.jpg").unwrap();
        assert_eq!(out.content_type, "image/webp");
        assert_eq!(out.extension, "webp");
    }

    #[test]
    fn gif_passes_through_untouched() {
        let input = encode(ImageFormat::Gif);
        let out = MediaOptimizer::optimize(input.clone(), "image/gif", "anim.gif").unwrap();
        assert_eq!(out.data, input);
        assert_eq!(out.content_type, "image/gif");
        assert_eq!(out.extension, "gif");
        assert_eq!(out.original_size, out.optimized_size);
    }

    #[test]
    fn video_passes_through_untouched() {
        let input = vec![0u8; 256];
        let out = MediaOptimizer::optimize(input.clone(), "video/mp4", "clip.MP4").unwrap();
        assert_eq!(out.data, input);
        assert_eq!(out.content_type, "video/mp4");
        assert_eq!(out.extension, "mp4");
    }

    #[test]
    fn corrupt_image_fails_with_decode_error() {
        let result = MediaOptimizer::optimize(b"not a jpeg".to_vec(), "image/jpeg", "bad.jpg");
        match result {
            Err(OptimizeError::Decode { file_name, .. }) => assert_eq!(file_name, "bad.jpg"),
            other => panic!("expected decode error, got {:?}", other.map(|o| o.content_type)),
        }
    }

    #[test]
    fn webp_input_gets_light_reencode() {
        let webp_input = {
            let img = RgbaImage::from_pixel(32, 32, Rgba([10, 120, 210, 255]));
            let encoder = webp::Encoder::from_rgba(&img, 32, 32);
            encoder.encode(100.0).to_vec()
        };

        let out = MediaOptimizer::optimize(webp_input, "image/webp", "pic.webp").unwrap();
        assert_eq!(out.content_type, "image/webp");
        assert_eq!(out.extension, "webp");
    }
}
