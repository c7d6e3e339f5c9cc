//! Fixed-order composition of the enhancement operators.
//!
//! ```text
//! adaptive contrast (if enabled)
//!   → gamma correction (always)
//!   → denoise (if enabled)
//!   → unsharp sharpen (always; strength 0 is a no-op)
//! ```
//!
//! Contrast and denoise see the original dynamic range before gamma reshapes
//! it; sharpening runs last so nothing blurs or re-equalizes it afterwards.
//!
//! The [`Enhancer`] trait is the seam the batch driver works against, so
//! tests can substitute a mock without touching pixel code.

use super::operators::Operator;
use super::params::{BilateralParams, ClaheParams, OperatorConfig, UnsharpParams};
use image::RgbImage;
use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnhanceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid config: {parameter} = {value} ({reason})")]
    InvalidConfig {
        parameter: &'static str,
        value: f64,
        reason: String,
    },
}

/// Something that turns one image into an enhanced image of the same shape.
pub trait Enhancer: Sync {
    fn enhance(&self, image: &RgbImage) -> Result<RgbImage, EnhanceError>;
}

/// Ordered operator list built from an [`OperatorConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    operators: Vec<Operator>,
}

impl Pipeline {
    pub fn from_config(config: &OperatorConfig) -> Self {
        let mut operators = Vec::with_capacity(4);
        if config.clahe_enabled() {
            operators.push(Operator::AdaptiveContrast(ClaheParams::default()));
        }
        operators.push(Operator::GammaCorrect {
            gamma: config.gamma(),
        });
        if config.denoise_enabled() {
            operators.push(Operator::Denoise(BilateralParams::default()));
        }
        operators.push(Operator::Sharpen(UnsharpParams::with_strength(
            config.sharpen_strength(),
        )));
        Self { operators }
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }
}

impl Enhancer for Pipeline {
    fn enhance(&self, image: &RgbImage) -> Result<RgbImage, EnhanceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EnhanceError::InvalidInput(format!(
                "cannot enhance a {}x{} image",
                image.width(),
                image.height()
            )));
        }
        let mut current = image.clone();
        for op in &self.operators {
            debug!("applying {} to {}x{}", op.name(), current.width(), current.height());
            current = op.apply(&current);
        }
        Ok(current)
    }
}

/// Enhance one image with the pipeline described by `config`.
pub fn enhance(image: &RgbImage, config: OperatorConfig) -> Result<RgbImage, EnhanceError> {
    Pipeline::from_config(&config).enhance(image)
}
