//! Shared test utilities for the photoprep test suite.
//!
//! Synthetic images with known properties, plus a helper for writing them
//! to disk as encoded fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let flat = uniform_rgb(100, 100, 128);   // zero sharpness, brightness 128
//! let edges = checkerboard(64, 64, 8);     // high sharpness
//! let tmp = TempDir::new().unwrap();
//! let path = write_image(tmp.path(), "edges.png", &edges);
//! ```

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic images
// =========================================================================

/// Every channel of every pixel set to `value`.
pub fn uniform_rgb(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
}

/// Black/white squares of `cell` pixels, starting black at the origin.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Neutral gray ramp from black at the left edge to white at the right.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    let span = width.saturating_sub(1).max(1);
    RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / span) as u8;
        Rgb([v, v, v])
    })
}

/// Deterministic per-channel noise (xorshift), so tests never depend on a RNG crate.
pub fn noisy(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 24) as u8
    };
    RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]))
}

// =========================================================================
// Fixtures on disk
// =========================================================================

/// Encode `image` into `dir/name` (format from the extension) and return the path.
pub fn write_image(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

/// Encode `image` as PNG into memory.
pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
