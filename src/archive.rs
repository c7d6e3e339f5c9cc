//! Flat ZIP packaging of batch outputs.
//!
//! The archive is written to a temporary file next to its final location and
//! only renamed into place once every entry has been written and the central
//! directory flushed. A failure at any point leaves no file at the archive
//! path.

use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn io_at(path: &Path) -> impl Fn(std::io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Archive path for an output directory: the sibling path with `.zip`
/// appended (`out` → `out.zip`, `photos/run-1/` → `photos/run-1.zip`).
///
/// A path that does not end in a plain name (`.`, `..`) is resolved on disk
/// first, so `.` inside `/a/b` archives to `/a/b.zip`. A filesystem root has
/// no sibling and is rejected.
pub fn archive_path_for(output_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let normalized: PathBuf = output_dir.components().collect();
    let dir = match normalized.components().next_back() {
        Some(Component::Normal(_)) => normalized,
        _ => output_dir.canonicalize().map_err(io_at(output_dir))?,
    };
    if dir.parent().is_none() || dir.file_name().is_none() {
        return Err(ArchiveError::Io {
            path: output_dir.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output directory has no parent to hold the archive",
            ),
        });
    }
    let mut name = dir.into_os_string();
    name.push(".zip");
    Ok(PathBuf::from(name))
}

/// Write `names` (files directly inside `dir`) into a deflate-compressed ZIP
/// at `archive_path`. Entries are flat, named by file name, in the given
/// order. Returns the number of entries written.
pub fn write_archive(
    dir: &Path,
    names: &[String],
    archive_path: &Path,
) -> Result<usize, ArchiveError> {
    let parent = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(io_at(parent))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(tmp.as_file_mut());
    for name in names {
        let path = dir.join(name);
        let mut reader = BufReader::new(File::open(&path).map_err(io_at(&path))?);
        zip.start_file(name.as_str(), options)?;
        std::io::copy(&mut reader, &mut zip).map_err(io_at(&path))?;
    }
    zip.finish()?;

    tmp.persist(archive_path)
        .map_err(|e| io_at(archive_path)(e.error))?;
    info!(
        "archived {} file(s) into {}",
        names.len(),
        archive_path.display()
    );
    Ok(names.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::file_names;
    use std::io::Read;
    use tempfile::TempDir;

    fn entry_names(archive: &Path) -> Vec<String> {
        let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        zip.file_names().map(str::to_string).collect()
    }

    #[test]
    fn archive_path_is_sibling_with_zip_extension() {
        assert_eq!(archive_path_for(Path::new("out")).unwrap(), PathBuf::from("out.zip"));
        assert_eq!(
            archive_path_for(Path::new("photos/run-1/")).unwrap(),
            PathBuf::from("photos/run-1.zip")
        );
        assert_eq!(
            archive_path_for(Path::new("/tmp/enhanced")).unwrap(),
            PathBuf::from("/tmp/enhanced.zip")
        );
    }

    fn with_zip(dir: &Path) -> PathBuf {
        let mut name = dir.as_os_str().to_owned();
        name.push(".zip");
        PathBuf::from(name)
    }

    #[test]
    fn dot_paths_resolve_to_the_named_directory() {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(archive_path_for(Path::new(".")).unwrap(), with_zip(&cwd));

        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir(&out).unwrap();
        assert_eq!(archive_path_for(&out.join(".")).unwrap(), with_zip(&out));
        assert_eq!(
            archive_path_for(&out.join("..")).unwrap(),
            with_zip(&tmp.path().canonicalize().unwrap())
        );
    }

    #[cfg(unix)]
    #[test]
    fn root_has_no_sibling_archive() {
        let err = archive_path_for(Path::new("/")).unwrap_err();
        match err {
            ArchiveError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn entries_are_flat_and_ordered() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("b.jpg"), b"bbb").unwrap();
        std::fs::write(dir.join("a.jpg"), b"aaaa").unwrap();

        let archive = archive_path_for(&dir).unwrap();
        let names = vec!["b.jpg".to_string(), "a.jpg".to_string()];
        assert_eq!(write_archive(&dir, &names, &archive).unwrap(), 2);

        let mut entries = entry_names(&archive);
        entries.sort();
        assert_eq!(entries, vec!["a.jpg", "b.jpg"]);

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("a.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "aaaa");
    }

    #[test]
    fn empty_archive_is_valid() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("empty.zip");
        assert_eq!(write_archive(tmp.path(), &[], &archive).unwrap(), 0);
        assert!(entry_names(&archive).is_empty());
    }

    #[test]
    fn missing_entry_leaves_no_archive() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        std::fs::create_dir(&dir).unwrap();
        let archive = archive_path_for(&dir).unwrap();

        let err = write_archive(&dir, &["ghost.jpg".to_string()], &archive).unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
        assert!(!archive.exists());
        // Temp file was cleaned up as well.
        assert_eq!(file_names(tmp.path()), vec!["out"]);
    }
}
