//! Sharpness and brightness metrics.
//!
//! Both operate on a grayscale derivation of the RGB image that is computed
//! on demand and thrown away afterwards; it never feeds back into the
//! pipeline.
//!
//! - **Sharpness**: variance of the 3×3 Laplacian response
//!   (`[0,1,0; 1,-4,1; 0,1,0]`) over every pixel, reflect-101 borders.
//!   More edge energy means a higher value.
//! - **Brightness**: mean gray level, 0–255.

use super::EnhanceError;
use super::filters::reflect_101;
use image::{GrayImage, Luma, RgbImage};
use serde::Serialize;

/// Sharpness/brightness pair for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub sharpness: f64,
    pub brightness: f64,
}

impl QualityMetrics {
    /// Grayscale-derive `image` and measure it.
    pub fn measure(image: &RgbImage) -> Result<Self, EnhanceError> {
        let gray = to_gray(image);
        Ok(Self {
            sharpness: sharpness(&gray)?,
            brightness: brightness(&gray)?,
        })
    }
}

/// BT.601 luma in 14-bit fixed point, rounded.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (src, dst) in image.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        *dst = Luma([y as u8]);
    }
    gray
}

fn ensure_non_empty(gray: &GrayImage, what: &str) -> Result<(), EnhanceError> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(EnhanceError::InvalidInput(format!(
            "{what} of an empty image is undefined"
        )));
    }
    Ok(())
}

/// Variance of the Laplacian response.
pub fn sharpness(gray: &GrayImage) -> Result<f64, EnhanceError> {
    ensure_non_empty(gray, "sharpness")?;
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let at = |x: i64, y: i64| -> f64 {
        gray.get_pixel(reflect_101(x, w) as u32, reflect_101(y, h) as u32).0[0] as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = (w * h) as f64;
    let mean = sum / n;
    Ok((sum_sq / n - mean * mean).max(0.0))
}

/// Mean gray level.
pub fn brightness(gray: &GrayImage) -> Result<f64, EnhanceError> {
    ensure_non_empty(gray, "brightness")?;
    let total: u64 = gray.as_raw().iter().map(|&v| v as u64).sum();
    Ok(total as f64 / gray.as_raw().len() as f64)
}
