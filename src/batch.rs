//! Batch driver: enhance many images, measure them, write them, archive them.
//!
//! For every input, in input order:
//!
//! ```text
//! decode → before-metrics → enhance → after-metrics → write <basename>
//! ```
//!
//! then every file the batch wrote is packaged into `<output_location>.zip`.
//!
//! ## Failure policy
//!
//! [`FailurePolicy::Abort`] (the default) stops at the first failing image
//! and returns an error naming it. [`FailurePolicy::SkipAndContinue`] records
//! the failure in [`BatchResult::failures`] and keeps going.
//!
//! ## Workers
//!
//! With `max_workers > 1` images are processed on a dedicated
//! [rayon](https://docs.rs/rayon) pool, one image end-to-end per task.
//! Each task encodes into a private staging file; staged files are then moved
//! to their final names in input order. Records, failures, and basename
//! collisions (last write wins) therefore come out the same for any worker
//! count.
//!
//! ## Cleanup
//!
//! Until the archive exists, an [`OutputGuard`] owns everything the batch
//! wrote. Returning early through any error path removes those files, and
//! the output directory too if the batch created it.

use crate::archive::{self, ArchiveError};
use crate::imaging::codec::{self, CodecError, DEFAULT_JPEG_QUALITY, OutputEncoding};
use crate::imaging::{EnhanceError, Enhancer, OperatorConfig, Pipeline, QualityMetrics};
use image::RgbImage;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::Instant;
use thiserror::Error;

/// Why a single image could not be processed.
#[derive(Error, Debug)]
pub enum ImageFailureKind {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Enhance(#[from] EnhanceError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to process {filename}: {source}")]
    Image {
        filename: String,
        source: ImageFailureKind,
    },
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Archive failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Invalid batch option: {0}")]
    Config(#[from] EnhanceError),
    #[error("Could not start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Where the pixels for one batch entry come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Already decoded.
    Decoded(RgbImage),
    /// Encoded bytes (JPEG, PNG, ...), decoded inside the batch.
    Encoded(Vec<u8>),
    /// A file on disk, decoded inside the batch.
    Path(PathBuf),
}

/// One named input image.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Output basename is taken from the last path component of this name.
    pub name: String,
    pub source: ImageSource,
}

impl BatchItem {
    pub fn decoded(name: impl Into<String>, image: RgbImage) -> Self {
        Self {
            name: name.into(),
            source: ImageSource::Decoded(image),
        }
    }

    pub fn encoded(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: ImageSource::Encoded(bytes),
        }
    }

    /// Named by the file name of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: ImageSource::Path(path),
        }
    }

    fn load(&self) -> Result<Cow<'_, RgbImage>, CodecError> {
        match &self.source {
            ImageSource::Decoded(image) => Ok(Cow::Borrowed(image)),
            ImageSource::Encoded(bytes) => codec::decode_bytes(&self.name, bytes).map(Cow::Owned),
            ImageSource::Path(path) => codec::decode_path(path).map(Cow::Owned),
        }
    }

    fn basename(&self) -> Result<String, CodecError> {
        Path::new(&self.name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CodecError::UnsupportedFormat {
                name: self.name.clone(),
            })
    }
}

/// Before/after statistics for one image, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStatRecord {
    /// Output basename, as stored in the archive.
    pub filename: String,
    #[serde(rename = "sharp_before")]
    pub sharpness_before: f64,
    #[serde(rename = "sharp_after")]
    pub sharpness_after: f64,
    pub brightness_before: f64,
    pub brightness_after: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl ImageStatRecord {
    pub fn new(filename: impl Into<String>, before: QualityMetrics, after: QualityMetrics) -> Self {
        Self {
            filename: filename.into(),
            sharpness_before: round2(before.sharpness),
            sharpness_after: round2(after.sharpness),
            brightness_before: round2(before.brightness),
            brightness_after: round2(after.brightness),
        }
    }
}

/// An image skipped under [`FailurePolicy::SkipAndContinue`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFailure {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// One record per successfully processed image, in input order.
    pub records: Vec<ImageStatRecord>,
    pub archive_path: PathBuf,
    /// Wall-clock time for processing and writing, excluding archiving.
    pub elapsed_seconds: f64,
    /// Skipped images, in input order. Always empty under [`FailurePolicy::Abort`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ImageFailure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    #[default]
    Abort,
    #[serde(alias = "skip")]
    SkipAndContinue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub failure_policy: FailurePolicy,
    /// 1 processes sequentially on the calling thread.
    pub max_workers: usize,
    /// Used for `.jpg`/`.jpeg` outputs; must be 1–100.
    pub jpeg_quality: u8,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            max_workers: 1,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl BatchOptions {
    fn validate(&self) -> Result<(), EnhanceError> {
        if self.max_workers == 0 {
            return Err(EnhanceError::InvalidConfig {
                parameter: "max_workers",
                value: 0.0,
                reason: "must be at least 1".into(),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(EnhanceError::InvalidConfig {
                parameter: "jpeg_quality",
                value: self.jpeg_quality as f64,
                reason: "must be 1-100".into(),
            });
        }
        Ok(())
    }
}

/// Progress notifications, sent from whichever thread finished the work.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
        workers: usize,
    },
    ImageDone {
        index: usize,
        total: usize,
        record: ImageStatRecord,
    },
    ImageSkipped {
        index: usize,
        total: usize,
        failure: ImageFailure,
    },
    Archived {
        path: PathBuf,
        entries: usize,
    },
}

// ============================================================================
// Scoped cleanup
// ============================================================================

/// Owns the files a batch has written until [`commit`](Self::commit).
/// Dropping an uncommitted guard removes them.
struct OutputGuard {
    dir: PathBuf,
    created_dir: bool,
    written: Vec<PathBuf>,
    committed: bool,
}

impl OutputGuard {
    fn acquire(dir: &Path) -> Result<Self, BatchError> {
        let created_dir = !dir.exists();
        std::fs::create_dir_all(dir).map_err(|source| BatchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            created_dir,
            written: Vec::new(),
            committed: false,
        })
    }

    fn track(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if self.created_dir {
            let _ = std::fs::remove_dir_all(&self.dir);
            return;
        }
        for path in &self.written {
            let _ = std::fs::remove_file(path);
        }
    }
}

// ============================================================================
// Per-image work
// ============================================================================

/// An image that has been measured, enhanced, and encoded to a staging file.
struct Staged {
    record: ImageStatRecord,
    basename: String,
    staging: PathBuf,
}

enum Outcome {
    Staged(Staged),
    Failed(ImageFailureKind),
    /// Not attempted because an earlier failure aborted the batch.
    Cancelled,
}

fn staging_path(dir: &Path, index: usize, basename: &str) -> PathBuf {
    dir.join(format!(".{basename}.{index}.partial"))
}

fn process_one(
    enhancer: &impl Enhancer,
    item: &BatchItem,
    index: usize,
    output_dir: &Path,
    jpeg_quality: u8,
) -> Result<Staged, ImageFailureKind> {
    let basename = item.basename()?;
    let encoding = OutputEncoding::for_name(&basename, jpeg_quality)?;

    let raw = item.load()?;
    let before = QualityMetrics::measure(&raw)?;
    let enhanced = enhancer.enhance(&raw)?;
    let after = QualityMetrics::measure(&enhanced)?;

    let staging = staging_path(output_dir, index, &basename);
    if let Err(e) = codec::encode_to_path(&enhanced, &staging, encoding) {
        let _ = std::fs::remove_file(&staging);
        return Err(e.into());
    }

    Ok(Staged {
        record: ImageStatRecord::new(basename.clone(), before, after),
        basename,
        staging,
    })
}

// ============================================================================
// Driver
// ============================================================================

/// Enhance `items` with the pipeline built from `config`.
///
/// See the [module docs](self) for ordering, failure, and cleanup semantics.
pub fn run_batch(
    items: &[BatchItem],
    output_location: &Path,
    config: OperatorConfig,
    options: &BatchOptions,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, BatchError> {
    let pipeline = Pipeline::from_config(&config);
    run_batch_with(&pipeline, items, output_location, options, progress)
}

/// Run a batch with a specific enhancer (allows testing with mock).
pub fn run_batch_with(
    enhancer: &impl Enhancer,
    items: &[BatchItem],
    output_location: &Path,
    options: &BatchOptions,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, BatchError> {
    options.validate()?;
    let start = Instant::now();
    let total = items.len();
    let workers = options.max_workers.min(total.max(1));
    let emit = |event: BatchEvent| {
        if let Some(tx) = &progress {
            tx.send(event).ok();
        }
    };
    emit(BatchEvent::Started { total, workers });

    let mut guard = OutputGuard::acquire(output_location)?;
    let abort = AtomicBool::new(false);

    let run = |(index, item): (usize, &BatchItem)| -> Outcome {
        if abort.load(Ordering::Relaxed) {
            return Outcome::Cancelled;
        }
        match process_one(enhancer, item, index, output_location, options.jpeg_quality) {
            Ok(staged) => {
                info!("enhanced {} ({}/{})", item.name, index + 1, total);
                emit(BatchEvent::ImageDone {
                    index,
                    total,
                    record: staged.record.clone(),
                });
                Outcome::Staged(staged)
            }
            Err(error) => {
                if options.failure_policy == FailurePolicy::Abort {
                    abort.store(true, Ordering::Relaxed);
                } else {
                    warn!("skipping {}: {}", item.name, error);
                    emit(BatchEvent::ImageSkipped {
                        index,
                        total,
                        failure: ImageFailure {
                            filename: item.name.clone(),
                            error: error.to_string(),
                        },
                    });
                }
                Outcome::Failed(error)
            }
        }
    };

    let outcomes: Vec<Outcome> = if workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        pool.install(|| items.par_iter().enumerate().map(run).collect())
    } else {
        items.iter().enumerate().map(run).collect()
    };

    // Every staging file belongs to the guard before anything can bail out.
    for outcome in &outcomes {
        if let Outcome::Staged(staged) = outcome {
            guard.track(staged.staging.clone());
        }
    }

    let mut records = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut written: Vec<String> = Vec::new();
    let mut staged_ok = Vec::with_capacity(total);
    for (item, outcome) in items.iter().zip(outcomes) {
        match outcome {
            Outcome::Staged(staged) => staged_ok.push(staged),
            Outcome::Failed(source) => match options.failure_policy {
                FailurePolicy::Abort => {
                    return Err(BatchError::Image {
                        filename: item.name.clone(),
                        source,
                    });
                }
                FailurePolicy::SkipAndContinue => failures.push(ImageFailure {
                    filename: item.name.clone(),
                    error: source.to_string(),
                }),
            },
            Outcome::Cancelled => {}
        }
    }

    // Input order: a later image with the same basename replaces an earlier one.
    for staged in staged_ok {
        let target = output_location.join(&staged.basename);
        std::fs::rename(&staged.staging, &target).map_err(|source| BatchError::Image {
            filename: staged.record.filename.clone(),
            source: ImageFailureKind::Io {
                path: target.clone(),
                source,
            },
        })?;
        guard.track(target);
        if !written.contains(&staged.basename) {
            written.push(staged.basename);
        }
        records.push(staged.record);
    }
    let elapsed_seconds = start.elapsed().as_secs_f64();

    let archive_path = archive::archive_path_for(output_location)?;
    let entries = archive::write_archive(output_location, &written, &archive_path)?;
    emit(BatchEvent::Archived {
        path: archive_path.clone(),
        entries,
    });
    guard.commit();

    Ok(BatchResult {
        records,
        archive_path,
        elapsed_seconds,
        failures,
    })
}
