//! Image transcoding for derivatives

use super::CacheError;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;

/// Turns source image bytes into derivative bytes.
///
/// Implementations are CPU bound and are called from the blocking pool.
pub trait Transcoder: Send + Sync + 'static {
    fn transcode(&self, source: &[u8]) -> Result<Vec<u8>, CacheError>;
}

/// Lossless WebP encoder
#[derive(Debug, Default, Clone, Copy)]
pub struct WebpTranscoder;

impl WebpTranscoder {
    /// Normalize to 8-bit RGB, or RGBA when the source carries alpha
    fn normalize(image: DynamicImage) -> DynamicImage {
        if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
    }
}

impl Transcoder for WebpTranscoder {
    fn transcode(&self, source: &[u8]) -> Result<Vec<u8>, CacheError> {
        let decoded =
            image::load_from_memory(source).map_err(|e| CacheError::Decode(e.to_string()))?;
        let normalized = Self::normalize(decoded);

        let mut out = Vec::new();
        normalized
            .write_with_encoder(WebPEncoder::new_lossless(&mut out))
            .map_err(|e| CacheError::Encode(e.to_string()))?;

        Ok(out)
    }
}
