use crate::error::DecodeError;
use crate::models::Rgb;
use std::sync::Arc;

/// Red weight of the luminance formula `0.299R + 0.587G + 0.114B`, per mille
const RED_WEIGHT: u64 = 299;
const GREEN_WEIGHT: u64 = 587;
const BLUE_WEIGHT: u64 = 114;
const WEIGHT_SCALE: f64 = 1000.0;

/// Backgrounds with an average luminance below this are dark
pub const DARK_THRESHOLD: f64 = 128.0;

/// Average brightness and color of an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    /// Mean of `0.299R + 0.587G + 0.114B` over all pixels, in [0, 255]
    pub average_luminance: f64,
    /// Per-channel mean, rounded half up
    pub average_color: Rgb,
}

impl PixelStats {
    pub fn is_dark(&self) -> bool {
        is_dark(self.average_luminance)
    }
}

/// Strict threshold: exactly 128 is light
pub fn is_dark(average_luminance: f64) -> bool {
    average_luminance < DARK_THRESHOLD
}

/// Decode an encoded image (PNG, JPEG, GIF, WebP, BMP, ...) and compute its
/// pixel statistics. Alpha is ignored.
pub fn analyze(image_bytes: &[u8]) -> Result<PixelStats, DecodeError> {
    let img = image::load_from_memory(image_bytes)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    analyze_rgba(rgba.as_raw(), width, height)
}

/// Compute statistics over a raw RGBA8 buffer of `width * height` pixels
pub fn analyze_rgba(samples: &[u8], width: u32, height: u32) -> Result<PixelStats, DecodeError> {
    let pixels = width as usize * height as usize;
    if pixels == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    let expected = pixels * 4;
    if samples.len() < expected {
        return Err(DecodeError::ShortBuffer {
            expected,
            actual: samples.len(),
        });
    }

    let (mut sum_r, mut sum_g, mut sum_b) = (0u64, 0u64, 0u64);
    for px in samples[..expected].chunks_exact(4) {
        sum_r += px[0] as u64;
        sum_g += px[1] as u64;
        sum_b += px[2] as u64;
    }

    let n = pixels as f64;
    // Mean of the weighted sum equals the weighted sum of the means
    let weighted = RED_WEIGHT * sum_r + GREEN_WEIGHT * sum_g + BLUE_WEIGHT * sum_b;
    let average_luminance = weighted as f64 / (WEIGHT_SCALE * n);

    let channel = |sum: u64| (sum as f64 / n).round().clamp(0.0, 255.0) as u8;

    Ok(PixelStats {
        average_luminance,
        average_color: Rgb::new(channel(sum_r), channel(sum_g), channel(sum_b)),
    })
}

/// Run [`analyze`] on the blocking pool
pub async fn analyze_in_background(image_bytes: Arc<[u8]>) -> Result<PixelStats, DecodeError> {
    tokio::task::spawn_blocking(move || analyze(&image_bytes))
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))?
}
