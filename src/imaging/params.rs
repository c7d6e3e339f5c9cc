//! Parameter types for the enhancement operators.
//!
//! These structs describe *what* to do, not *how* to do it. The
//! [`operators`](super::operators) module turns them into pixel work and the
//! [`pipeline`](super::pipeline) decides the order.
//!
//! ## Types
//!
//! - [`OperatorConfig`]: the caller-facing knobs (CLAHE toggle, gamma, denoise toggle,
//!   sharpen strength). Validated on construction, immutable afterwards.
//! - [`ClaheParams`]: tile grid and clip limit for adaptive contrast (fixed).
//! - [`BilateralParams`]: window diameter and color/space falloff for denoise (fixed).
//! - [`UnsharpParams`]: blur sigma and strength for the unsharp mask.

use super::EnhanceError;

/// Documented gamma range.
pub const GAMMA_RANGE: (f32, f32) = (0.5, 2.5);

/// Documented sharpen strength range.
pub const SHARPEN_RANGE: (f32, f32) = (0.0, 3.0);

/// Knobs for one enhancement run.
///
/// Built once per invocation (single image or batch) and passed by value.
/// Fields are private so an out-of-range value can never reach the pipeline;
/// use [`OperatorConfig::new`] or [`OperatorConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorConfig {
    clahe_enabled: bool,
    gamma: f32,
    denoise_enabled: bool,
    sharpen_strength: f32,
}

impl OperatorConfig {
    /// Validate and build a config.
    ///
    /// Gamma must lie in [`GAMMA_RANGE`], sharpen strength in [`SHARPEN_RANGE`].
    /// NaN is rejected for both.
    pub fn new(
        clahe_enabled: bool,
        gamma: f32,
        denoise_enabled: bool,
        sharpen_strength: f32,
    ) -> Result<Self, EnhanceError> {
        check_range("gamma", gamma, GAMMA_RANGE)?;
        check_range("sharpen_strength", sharpen_strength, SHARPEN_RANGE)?;
        Ok(Self {
            clahe_enabled,
            gamma,
            denoise_enabled,
            sharpen_strength,
        })
    }

    /// Config under which [`enhance`](super::enhance) returns its input unchanged.
    pub fn identity() -> Self {
        Self {
            clahe_enabled: false,
            gamma: 1.0,
            denoise_enabled: false,
            sharpen_strength: 0.0,
        }
    }

    pub fn clahe_enabled(&self) -> bool {
        self.clahe_enabled
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn denoise_enabled(&self) -> bool {
        self.denoise_enabled
    }

    pub fn sharpen_strength(&self) -> f32 {
        self.sharpen_strength
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            clahe_enabled: true,
            gamma: 1.2,
            denoise_enabled: true,
            sharpen_strength: 1.0,
        }
    }
}

fn check_range(parameter: &'static str, value: f32, range: (f32, f32)) -> Result<(), EnhanceError> {
    if value.is_nan() || value < range.0 || value > range.1 {
        return Err(EnhanceError::InvalidConfig {
            parameter,
            value: value as f64,
            reason: format!("must be within {}..={}", range.0, range.1),
        });
    }
    Ok(())
}

/// Contrast-limited adaptive histogram equalization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheParams {
    /// Tiles along (x, y).
    pub grid: (u32, u32),
    /// Bin amplification cap, relative to a flat histogram.
    pub clip_limit: f32,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            grid: (8, 8),
            clip_limit: 2.0,
        }
    }
}

/// Bilateral filter parameters.
///
/// - `diameter`: neighborhood diameter in pixels (window radius = diameter / 2)
/// - `sigma_color`: intensity falloff (higher = smooths across stronger edges)
/// - `sigma_space`: spatial falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralParams {
    pub diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for BilateralParams {
    fn default() -> Self {
        Self {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

/// Unsharp mask parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpParams {
    pub sigma: f32,
    pub strength: f32,
}

impl UnsharpParams {
    pub fn with_strength(strength: f32) -> Self {
        Self {
            sigma: 3.0,
            strength,
        }
    }
}
