//! # photoprep
//!
//! Photo enhancement for photogrammetry capture sets. Raw photographs are
//! run through a fixed sequence of local-contrast, exposure, noise, and
//! sharpness operators, and every image is measured before and after so the
//! effect can be judged by numbers rather than by eye.
//!
//! # Architecture: Enhance, Measure, Package
//!
//! ```text
//! 1. Decode    bytes/path   →  RGB8 image
//! 2. Enhance   RGB8 image   →  RGB8 image     (fixed operator order)
//! 3. Measure   before/after →  QualityMetrics (Laplacian variance, mean gray)
//! 4. Package   output dir   →  <dir>.zip      (batch runs only)
//! ```
//!
//! Every stage is a plain function over owned images. The batch driver adds
//! ordering, failure handling, and cleanup on top; it never reaches into
//! pixel code.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Operators, pipeline, metrics, codec: all pixel work |
//! | [`batch`] | Batch driver: per-image stats, failure policy, worker pool, cleanup |
//! | [`archive`] | Flat ZIP packaging written through a temp file |
//! | [`preview`] | Single-image mode: bytes in, JPEG bytes and metrics out |
//! | [`config`] | `photoprep.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting: progress lines and the stats table |
//! | [`logging`] | `flexi_logger` setup for the `log` facade |
//!
//! # Design Decisions
//!
//! ## Immutable Operator Config
//!
//! [`imaging::OperatorConfig`] is validated on construction and has no
//! setters. One value is built per invocation and passed by value into the
//! pipeline and the batch driver; nothing reads enhancement settings from
//! ambient state.
//!
//! ## Operators as a Closed Enum
//!
//! The four operators are variants of [`imaging::Operator`]. The
//! [`imaging::Pipeline`] builds its operator list from the config in one
//! place, which makes the order an explicit, testable contract:
//!
//! ```text
//! adaptive contrast (optional) → gamma → denoise (optional) → sharpen
//! ```
//!
//! ## Determinism
//!
//! Identical image and config always produce byte-identical output. All
//! operators are integer LUTs or fixed-order float reductions, and batch
//! results are reported in input order regardless of worker count.

pub mod archive;
pub mod batch;
pub mod config;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod preview;

#[cfg(test)]
pub(crate) mod test_helpers;
