//! The closed set of enhancement operators.
//!
//! Each variant carries its own parameters and maps one RGB8 image to a new
//! RGB8 image of the same dimensions. Ordering is not decided here; see
//! [`Pipeline`](super::Pipeline).

use super::clahe;
use super::color::remap_lightness;
use super::filters::{apply_gamma, bilateral, unsharp};
use super::params::{BilateralParams, ClaheParams, UnsharpParams};
use image::RgbImage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    /// CLAHE on the Lab lightness channel; chroma untouched.
    AdaptiveContrast(ClaheParams),
    /// Per-channel gamma lookup.
    GammaCorrect { gamma: f32 },
    /// Bilateral smoothing.
    Denoise(BilateralParams),
    /// Unsharp mask.
    Sharpen(UnsharpParams),
}

impl Operator {
    /// Short stable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::AdaptiveContrast(_) => "adaptive-contrast",
            Operator::GammaCorrect { .. } => "gamma",
            Operator::Denoise(_) => "denoise",
            Operator::Sharpen(_) => "sharpen",
        }
    }

    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        match self {
            Operator::AdaptiveContrast(params) => {
                remap_lightness(image, |lightness| clahe::equalize(lightness, params))
            }
            Operator::GammaCorrect { gamma } => apply_gamma(image, *gamma),
            Operator::Denoise(params) => bilateral(image, params),
            Operator::Sharpen(params) => unsharp(image, params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient, uniform_rgb};

    fn all_operators() -> Vec<Operator> {
        vec![
            Operator::AdaptiveContrast(ClaheParams::default()),
            Operator::GammaCorrect { gamma: 1.2 },
            Operator::Denoise(BilateralParams::default()),
            Operator::Sharpen(UnsharpParams::with_strength(1.0)),
        ]
    }

    #[test]
    fn every_operator_preserves_shape() {
        let img = gradient(33, 17);
        for op in all_operators() {
            assert_eq!(op.apply(&img).dimensions(), (33, 17), "{}", op.name());
        }
    }

    #[test]
    fn adaptive_contrast_changes_flat_gray() {
        let img = uniform_rgb(100, 100, 128);
        let out = Operator::AdaptiveContrast(ClaheParams::default()).apply(&img);
        assert_ne!(out.get_pixel(50, 50).0, [128, 128, 128]);
    }

    #[test]
    fn adaptive_contrast_keeps_gray_neutral() {
        let img = gradient(40, 40);
        let out = Operator::AdaptiveContrast(ClaheParams::default()).apply(&img);
        for p in out.pixels() {
            let [r, g, b] = p.0;
            assert!(r.abs_diff(g) <= 2 && g.abs_diff(b) <= 2, "{:?}", p.0);
        }
    }

    #[test]
    fn names_are_distinct() {
        let names: Vec<_> = all_operators().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["adaptive-contrast", "gamma", "denoise", "sharpen"]);
    }
}
