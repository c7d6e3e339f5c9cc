//! Configuration module.
//!
//! Handles loading, validating, and merging `photoprep.toml`. Configuration
//! is layered: stock defaults, then the user file, then command-line flags.
//! The resolved values are turned into an immutable
//! [`OperatorConfig`](crate::imaging::OperatorConfig) once per invocation.
//!
//! ## Config File Location
//!
//! `photoprep.toml` in the working directory is picked up automatically.
//! Pass `--config <file>` to use a different file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [enhance]
//! clahe = true              # Adaptive local contrast on lightness
//! gamma = 1.2               # 0.5-2.5; above 1 brightens midtones
//! denoise = true            # Edge-preserving bilateral smoothing
//! sharpen_strength = 1.0    # 0.0-3.0; 0 disables sharpening
//!
//! [batch]
//! on_error = "abort"        # "abort" or "skip"
//! jpeg_quality = 95         # 1-100, for .jpg/.jpeg outputs
//! max_workers = 4           # Omit for sequential processing
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [enhance]
//! gamma = 1.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::batch::{BatchOptions, FailurePolicy};
use crate::imaging::OperatorConfig;
use crate::imaging::codec::DEFAULT_JPEG_QUALITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "photoprep.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `photoprep.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Enhancement operator settings.
    pub enhance: EnhanceConfig,
    /// Batch run settings.
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.operator_config()?;
        if !(1..=100).contains(&self.batch.jpeg_quality) {
            return Err(ConfigError::Validation(
                "batch.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.batch.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "batch.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the validated, immutable operator configuration.
    pub fn operator_config(&self) -> Result<OperatorConfig, ConfigError> {
        let e = &self.enhance;
        OperatorConfig::new(e.clahe, e.gamma, e.denoise, e.sharpen_strength)
            .map_err(|err| ConfigError::Validation(format!("enhance: {err}")))
    }

    /// Batch driver options, with the worker count capped to available cores.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            failure_policy: self.batch.on_error,
            max_workers: effective_workers(&self.batch),
            jpeg_quality: self.batch.jpeg_quality,
        }
    }
}

/// Enhancement operator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    /// CLAHE on the lightness channel.
    pub clahe: bool,
    /// Gamma exponent, 0.5-2.5.
    pub gamma: f32,
    /// Bilateral denoise.
    pub denoise: bool,
    /// Unsharp mask strength, 0.0-3.0.
    pub sharpen_strength: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        let stock = OperatorConfig::default();
        Self {
            clahe: stock.clahe_enabled(),
            gamma: stock.gamma(),
            denoise: stock.denoise_enabled(),
            sharpen_strength: stock.sharpen_strength(),
        }
    }
}

/// Batch run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// What to do when one image fails.
    pub on_error: FailurePolicy,
    /// Maximum number of parallel workers.
    /// When absent, images are processed one at a time.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
    /// JPEG encoding quality for `.jpg`/`.jpeg` outputs.
    pub jpeg_quality: u8,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            on_error: FailurePolicy::Abort,
            max_workers: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_workers(config: &BatchConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.clamp(1, cores)).unwrap_or(1)
}

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` onto `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. A missing file is `Ok(None)`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `photoprep.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    resolve_config(
        stock_defaults_value(),
        load_raw_config(&dir.join(CONFIG_FILE_NAME))?,
    )
}

/// Returns a fully-commented stock `photoprep.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photoprep configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Enhancement
# ---------------------------------------------------------------------------
# Operators always run in this order:
#   adaptive contrast -> gamma -> denoise -> sharpen
[enhance]
# Contrast-limited adaptive histogram equalization on the lightness channel.
# Boosts local contrast without shifting colors.
clahe = true

# Gamma correction, 0.5-2.5. Above 1 brightens midtones, below 1 darkens them.
# 1.0 leaves pixel values unchanged.
gamma = 1.2

# Edge-preserving bilateral smoothing. Keeps strong edges for feature matching.
denoise = true

# Unsharp mask strength, 0.0-3.0. 0 disables sharpening.
sharpen_strength = 1.0

# ---------------------------------------------------------------------------
# Batch runs
# ---------------------------------------------------------------------------
[batch]
# What to do when an image cannot be decoded, enhanced, or written:
#   "abort" - stop, remove everything written so far, report the file
#   "skip"  - record the failure and continue with the remaining images
on_error = "abort"

# Encoding quality for .jpg/.jpeg outputs (1 = worst, 100 = best).
# PNG and TIFF outputs are lossless.
jpeg_quality = 95

# Maximum parallel workers. Omit to process images one at a time.
# Values above the number of CPU cores are clamped down.
# max_workers = 4
"##
}
