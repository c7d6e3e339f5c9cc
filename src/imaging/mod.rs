//! Image enhancement and measurement in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, TIFF, WebP) | `image` crate decoders |
//! | **Adaptive contrast** | custom CLAHE on Lab lightness |
//! | **Gamma** | 256-entry lookup table |
//! | **Denoise** | custom bilateral filter |
//! | **Sharpen** | `image::imageops::blur` + unsharp combine |
//! | **Metrics** | Laplacian variance, mean gray |
//! | **Encode** | JPEG / PNG / TIFF by output extension |
//!
//! The module is split into:
//! - **Parameters**: validated [`OperatorConfig`] and per-operator params
//! - **Operators**: the closed [`Operator`] set, each a pure image → image map
//! - **Pipeline**: fixed-order composition behind the [`Enhancer`] trait
//! - **Metrics**: [`QualityMetrics`] over a throwaway gray derivation
//! - **Codec**: bytes/paths ↔ RGB8 with per-file error context

mod clahe;
pub mod codec;
mod color;
pub mod filters;
pub mod metrics;
pub mod operators;
mod params;
pub mod pipeline;

pub use codec::{CodecError, OutputEncoding, decode_bytes, decode_path, encode_to_path};
pub use metrics::QualityMetrics;
pub use operators::Operator;
pub use params::{
    BilateralParams, ClaheParams, GAMMA_RANGE, OperatorConfig, SHARPEN_RANGE, UnsharpParams,
};
pub use pipeline::{EnhanceError, Enhancer, Pipeline, enhance};
