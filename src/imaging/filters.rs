//! Per-pixel and neighborhood filters on RGB8 images.
//!
//! All functions here are pure and shape-preserving.
//!
//! | Filter | Implementation |
//! |---|---|
//! | Gamma | 256-entry lookup table, rounded |
//! | Bilateral | circular window, L1 color distance, reflect-101 borders |
//! | Unsharp | `image::imageops::blur` + weighted combine |

use super::params::{BilateralParams, UnsharpParams};
use image::RgbImage;

/// Mirror an out-of-range index back into `0..n`, excluding the edge pixel
/// (`... 2 1 | 0 1 2 ... n-1 | n-2 n-3 ...`).
pub(crate) fn reflect_101(i: i64, n: i64) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let i = i.rem_euclid(period);
    (if i >= n { period - i } else { i }) as usize
}

/// Build the gamma lookup table: `v' = round(255 * (v/255)^(1/gamma))`.
///
/// Gamma above 1 lifts midtones, below 1 darkens them. 0 and 255 are fixed
/// points for every gamma.
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv_gamma = 1.0 / gamma as f64;
    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
        let mapped = (i as f64 / 255.0).powf(inv_gamma) * 255.0;
        *v = mapped.round().clamp(0.0, 255.0) as u8;
    }
    table
}

/// Apply a gamma lookup table to every channel of every pixel.
pub fn apply_gamma(image: &RgbImage, gamma: f32) -> RgbImage {
    let table = gamma_lut(gamma);
    let mut out = image.clone();
    for v in out.iter_mut() {
        *v = table[*v as usize];
    }
    out
}

/// Edge-preserving bilateral smoothing.
///
/// Each output pixel is the weighted mean of its circular neighborhood,
/// weighted by `exp(-d²/2σs²) · exp(-c²/2σc²)` where `d` is the spatial
/// distance and `c` the sum of absolute channel differences to the center.
pub fn bilateral(image: &RgbImage, params: &BilateralParams) -> RgbImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as i64, height as i64);
    let radius = (params.diameter / 2) as i64;

    let space_coeff = -0.5 / (params.sigma_space as f64 * params.sigma_space as f64);
    let color_coeff = -0.5 / (params.sigma_color as f64 * params.sigma_color as f64);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = (dx * dx + dy * dy) as f64;
            if d2 <= (radius * radius) as f64 {
                offsets.push((dx, dy, (d2 * space_coeff).exp() as f32));
            }
        }
    }

    // L1 distance over three channels spans 0..=765.
    let color_weight: Vec<f32> = (0..=255 * 3)
        .map(|c| ((c * c) as f64 * color_coeff).exp() as f32)
        .collect();

    // Reflected coordinates for the padded ranges, indexed by `coord + radius`.
    let xs: Vec<usize> = (-radius..w + radius).map(|x| reflect_101(x, w)).collect();
    let ys: Vec<usize> = (-radius..h + radius).map(|y| reflect_101(y, h)).collect();

    let src = image.as_raw();
    let stride = width as usize * 3;
    let mut out = RgbImage::new(width, height);
    let dst: &mut [u8] = &mut out;

    for y in 0..h {
        for x in 0..w {
            let center = y as usize * stride + x as usize * 3;
            let (cr, cg, cb) = (src[center], src[center + 1], src[center + 2]);

            let mut sum = [0.0f32; 3];
            let mut weight_sum = 0.0f32;
            for &(dx, dy, space_weight) in &offsets {
                let nx = xs[(x + dx + radius) as usize];
                let ny = ys[(y + dy + radius) as usize];
                let idx = ny * stride + nx * 3;
                let (r, g, b) = (src[idx], src[idx + 1], src[idx + 2]);
                let dist =
                    r.abs_diff(cr) as usize + g.abs_diff(cg) as usize + b.abs_diff(cb) as usize;
                let weight = space_weight * color_weight[dist];
                sum[0] += weight * r as f32;
                sum[1] += weight * g as f32;
                sum[2] += weight * b as f32;
                weight_sum += weight;
            }

            // The center always contributes weight 1, so weight_sum > 0.
            for c in 0..3 {
                dst[center + c] = (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

/// Unsharp mask: `(1 + s)·original − s·blurred`, rounded and clamped.
///
/// A strength of 0 returns the input untouched without blurring.
pub fn unsharp(image: &RgbImage, params: &UnsharpParams) -> RgbImage {
    if params.strength == 0.0 {
        return image.clone();
    }
    let blurred = image::imageops::blur(image, params.sigma);
    let gain = 1.0 + params.strength;

    let mut out = image.clone();
    for (o, b) in out.iter_mut().zip(blurred.iter()) {
        let v = gain * *o as f32 - params.strength * *b as f32;
        *o = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, gradient, uniform_rgb};
    use image::Rgb;

    #[test]
    fn reflect_101_mirrors_without_edge() {
        let n = 5;
        let mapped: Vec<usize> = (-3..8).map(|i| reflect_101(i, n)).collect();
        assert_eq!(mapped, vec![3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1]);
        assert_eq!(reflect_101(-1, 1), 0);
        assert_eq!(reflect_101(7, 1), 0);
    }

    #[test]
    fn gamma_one_is_identity_table() {
        let table = gamma_lut(1.0);
        for (i, v) in table.iter().enumerate() {
            assert_eq!(*v as usize, i);
        }
    }

    #[test]
    fn gamma_endpoints_are_fixed() {
        for gamma in [0.5, 1.2, 2.5] {
            let table = gamma_lut(gamma);
            assert_eq!(table[0], 0);
            assert_eq!(table[255], 255);
        }
    }

    #[test]
    fn gamma_above_one_lifts_midtones() {
        let table = gamma_lut(1.2);
        assert_eq!(table[128], 144);
        assert!(table.iter().enumerate().all(|(i, v)| *v as usize >= i));
    }

    #[test]
    fn gamma_below_one_darkens_midtones() {
        let table = gamma_lut(0.5);
        assert!(table[128] < 128);
    }

    #[test]
    fn gamma_table_is_monotonic() {
        let table = gamma_lut(1.7);
        assert!(table.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn bilateral_keeps_flat_regions_flat() {
        let img = uniform_rgb(15, 9, 90);
        let out = bilateral(&img, &BilateralParams::default());
        assert_eq!(out, img);
    }

    #[test]
    fn bilateral_preserves_strong_edge() {
        // Left half black, right half white: a 255-per-channel step has
        // color weight exp(-765²/2·75²) ≈ 0, so the edge survives.
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let out = bilateral(&img, &BilateralParams::default());
        assert_eq!(out.get_pixel(9, 5).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(10, 5).0, [255, 255, 255]);
    }

    #[test]
    fn bilateral_smooths_small_noise() {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            let v = if (x + y) % 2 == 0 { 120 } else { 130 };
            Rgb([v, v, v])
        });
        let out = bilateral(&img, &BilateralParams::default());
        let center = out.get_pixel(8, 8).0[0];
        assert!((123..=127).contains(&center), "got {center}");
    }

    #[test]
    fn bilateral_handles_tiny_images() {
        let img = RgbImage::from_pixel(1, 1, Rgb([10, 20, 30]));
        let out = bilateral(&img, &BilateralParams::default());
        assert_eq!(out, img);
    }

    #[test]
    fn unsharp_zero_strength_is_identity() {
        let img = checkerboard(12, 12, 3);
        assert_eq!(unsharp(&img, &UnsharpParams::with_strength(0.0)), img);
    }

    #[test]
    fn unsharp_leaves_flat_image_alone() {
        let img = uniform_rgb(10, 10, 128);
        assert_eq!(unsharp(&img, &UnsharpParams::with_strength(2.0)), img);
    }

    #[test]
    fn unsharp_increases_edge_contrast() {
        let img = gradient(32, 8);
        let out = unsharp(&img, &UnsharpParams::with_strength(1.5));
        assert_eq!(out.dimensions(), img.dimensions());

        let edge = RgbImage::from_fn(32, 8, |x, _| {
            if x < 16 { Rgb([100, 100, 100]) } else { Rgb([160, 160, 160]) }
        });
        let sharpened = unsharp(&edge, &UnsharpParams::with_strength(1.0));
        assert!(sharpened.get_pixel(15, 4).0[0] < 100);
        assert!(sharpened.get_pixel(16, 4).0[0] > 160);
    }
}
