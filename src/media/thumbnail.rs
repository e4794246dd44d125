use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::MediaToolkit;
use crate::error::{Error, Result};

/// Quality bounds for the compression search
const QUALITY_MIN: u8 = 50;
const QUALITY_MAX: u8 = 95;

/// Last-resort quality when no setting fits the budget
const QUALITY_FALLBACK: u8 = 75;

/// A compressed representative frame of the video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailArtifact {
    /// Encoded image bytes
    pub bytes: Vec<u8>,

    /// Length of `bytes`, reported separately for response mapping
    pub size_bytes: u64,

    /// Encoding of `bytes`
    pub encoding: &'static str,
}

impl ThumbnailArtifact {
    fn new(bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            size_bytes,
            encoding: "jpeg",
        }
    }
}

/// Extracts one frame from a video and compresses it under a byte budget.
///
/// Extraction is best-effort by contract: a video without a usable frame
/// yields `None`, and an image too large for the budget at any quality falls
/// back to a fixed default quality rather than failing.
pub struct ThumbnailExtractor {
    budget_bytes: u64,
}

impl ThumbnailExtractor {
    pub fn new(budget_bytes: u64) -> Self {
        Self { budget_bytes }
    }

    /// Capture a frame at the given timestamp and compress it.
    pub async fn extract(
        &self,
        media: &dyn MediaToolkit,
        video_path: &Path,
        at_secs: f64,
    ) -> Result<Option<ThumbnailArtifact>> {
        let frame = match media.capture_frame(video_path, at_secs).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Frame capture failed for {}: {}", video_path.display(), e);
                return Ok(None);
            }
        };

        if frame.is_empty() {
            tracing::warn!("Frame capture produced no image for {}", video_path.display());
            return Ok(None);
        }

        let image = match image::load_from_memory(&frame) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Captured frame could not be decoded: {}", e);
                return Ok(None);
            }
        };

        let artifact = self.compress(&image)?;
        tracing::info!(
            "Thumbnail ready: {} bytes at budget {} bytes",
            artifact.size_bytes,
            self.budget_bytes
        );

        Ok(Some(artifact))
    }

    /// Binary-search the encoder quality for the largest result within budget,
    /// falling back to a fixed default quality when nothing fits.
    fn compress(&self, image: &DynamicImage) -> Result<ThumbnailArtifact> {
        let encode = |quality: u8| encode_jpeg(image, quality);

        match search_quality(encode, QUALITY_MIN, QUALITY_MAX, self.budget_bytes)? {
            Some((bytes, quality)) => {
                tracing::debug!("Thumbnail fits budget at quality {}", quality);
                Ok(ThumbnailArtifact::new(bytes))
            }
            None => {
                tracing::warn!(
                    "No quality in [{}, {}] fits {} bytes, using default quality {}",
                    QUALITY_MIN,
                    QUALITY_MAX,
                    self.budget_bytes,
                    QUALITY_FALLBACK
                );
                let bytes = encode_jpeg(image, QUALITY_FALLBACK)?;
                Ok(ThumbnailArtifact::new(bytes))
            }
        }
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| Error::Internal(format!("thumbnail encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Find the highest quality in `[lo, hi]` whose encoding fits `budget` bytes.
///
/// Returns the best fitting encoding with its quality, or `None` when even
/// the lowest quality exceeds the budget.
fn search_quality<F>(
    mut encode: F,
    lo: u8,
    hi: u8,
    budget: u64,
) -> Result<Option<(Vec<u8>, u8)>>
where
    F: FnMut(u8) -> Result<Vec<u8>>,
{
    let mut lo = lo;
    let mut hi = hi;
    let mut best: Option<(Vec<u8>, u8)> = None;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let candidate = encode(mid)?;

        if candidate.len() as u64 <= budget {
            best = Some((candidate, mid));
            lo = mid + 1;
        } else {
            if mid == 0 {
                break;
            }
            hi = mid - 1;
        }
    }

    Ok(best)
}
