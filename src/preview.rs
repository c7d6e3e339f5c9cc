//! Single-image mode: encoded bytes in, enhanced JPEG bytes and metrics out.
//!
//! A direct call into the pipeline and metrics with no batching, output
//! directory, or archive.

use crate::imaging::codec::{self, CodecError, DEFAULT_JPEG_QUALITY};
use crate::imaging::{EnhanceError, Enhancer, OperatorConfig, Pipeline, QualityMetrics};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Enhance(#[from] EnhanceError),
}

/// Result of enhancing one image.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    #[serde(skip)]
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub before: QualityMetrics,
    pub after: QualityMetrics,
}

/// Decode `bytes`, enhance with `config`, and re-encode as JPEG.
pub fn enhance_bytes(
    name: &str,
    bytes: &[u8],
    config: OperatorConfig,
) -> Result<Preview, PreviewError> {
    enhance_bytes_with(&Pipeline::from_config(&config), name, bytes, DEFAULT_JPEG_QUALITY)
}

/// Same as [`enhance_bytes`] with an explicit enhancer and JPEG quality.
pub fn enhance_bytes_with(
    enhancer: &impl Enhancer,
    name: &str,
    bytes: &[u8],
    jpeg_quality: u8,
) -> Result<Preview, PreviewError> {
    let raw = codec::decode_bytes(name, bytes)?;
    let before = QualityMetrics::measure(&raw)?;
    let enhanced = enhancer.enhance(&raw)?;
    let after = QualityMetrics::measure(&enhanced)?;
    Ok(Preview {
        jpeg: codec::encode_jpeg_bytes(&enhanced, jpeg_quality)?,
        width: enhanced.width(),
        height: enhanced.height(),
        before,
        after,
    })
}
