//! Decoding to and encoding from the pipeline's RGB8 representation.
//!
//! Inputs of any color type the `image` crate can read (gray, RGBA, 16-bit)
//! are normalized to 8-bit RGB on decode. Outputs are encoded according to
//! the destination file's extension.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Default JPEG quality for enhanced outputs.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode {name}: {source}")]
    Decode {
        name: String,
        source: image::ImageError,
    },
    #[error("Unsupported output format for {name}")]
    UnsupportedFormat { name: String },
    #[error("Failed to encode {name}: {source}")]
    Encode {
        name: String,
        source: image::ImageError,
    },
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [supported input extensions](supported_input_extensions).
pub fn is_supported_input(path: &Path) -> bool {
    lowercase_extension(path)
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// How an enhanced image is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Jpeg { quality: u8 },
    Png,
    Tiff,
}

impl OutputEncoding {
    /// Pick the encoding from the extension of `name`.
    ///
    /// `jpeg_quality` is clamped to 1–100 and only used for `.jpg`/`.jpeg`.
    pub fn for_name(name: &str, jpeg_quality: u8) -> Result<Self, CodecError> {
        match lowercase_extension(Path::new(name)).as_deref() {
            Some("jpg" | "jpeg") => Ok(Self::Jpeg {
                quality: jpeg_quality.clamp(1, 100),
            }),
            Some("png") => Ok(Self::Png),
            Some("tif" | "tiff") => Ok(Self::Tiff),
            _ => Err(CodecError::UnsupportedFormat {
                name: name.to_string(),
            }),
        }
    }
}

/// Decode an in-memory encoded image. `name` is used only for error context.
pub fn decode_bytes(name: &str, bytes: &[u8]) -> Result<RgbImage, CodecError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|source| CodecError::Decode {
            name: name.to_string(),
            source,
        })
}

/// Load and decode an image from disk. The format is sniffed from content,
/// falling back to the extension.
pub fn decode_path(path: &Path) -> Result<RgbImage, CodecError> {
    let io_err = |source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?
        .decode()
        .map(|img| img.to_rgb8())
        .map_err(|source| CodecError::Decode {
            name: path.display().to_string(),
            source,
        })
}

/// Encode `image` to `path` with the given encoding. An existing file is
/// overwritten.
pub fn encode_to_path(
    image: &RgbImage,
    path: &Path,
    encoding: OutputEncoding,
) -> Result<(), CodecError> {
    let file = std::fs::File::create(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let result = match encoding {
        OutputEncoding::Jpeg { quality } => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        }
        OutputEncoding::Png => image.write_with_encoder(PngEncoder::new(&mut writer)),
        OutputEncoding::Tiff => image.write_with_encoder(TiffEncoder::new(&mut writer)),
    };
    result.map_err(|source| CodecError::Encode {
        name: path.display().to_string(),
        source,
    })?;
    std::io::Write::flush(&mut writer).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode `image` as JPEG into memory.
pub fn encode_jpeg_bytes(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))
        .map_err(|source| CodecError::Encode {
            name: "<memory>".to_string(),
            source,
        })?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, gradient};
    use tempfile::TempDir;

    #[test]
    fn encoding_follows_extension() {
        assert_eq!(
            OutputEncoding::for_name("a.JPG", 95).unwrap(),
            OutputEncoding::Jpeg { quality: 95 }
        );
        assert_eq!(
            OutputEncoding::for_name("b.png", 95).unwrap(),
            OutputEncoding::Png
        );
        assert_eq!(
            OutputEncoding::for_name("c.tiff", 95).unwrap(),
            OutputEncoding::Tiff
        );
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(
            OutputEncoding::for_name("a.jpeg", 0).unwrap(),
            OutputEncoding::Jpeg { quality: 1 }
        );
        assert_eq!(
            OutputEncoding::for_name("a.jpeg", 200).unwrap(),
            OutputEncoding::Jpeg { quality: 100 }
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        for name in ["photo.bmp", "noext", "archive.zip"] {
            assert!(matches!(
                OutputEncoding::for_name(name, 95),
                Err(CodecError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn garbage_bytes_name_the_file() {
        let err = decode_bytes("broken.jpg", b"not an image").unwrap_err();
        match &err {
            CodecError::Decode { name, .. } => assert_eq!(name, "broken.jpg"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("broken.jpg"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = decode_path(&tmp.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, CodecError::Io { .. }));
    }

    #[test]
    fn png_is_lossless() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let img = checkerboard(9, 7, 2);
        encode_to_path(&img, &path, OutputEncoding::Png).unwrap();
        assert_eq!(decode_path(&path).unwrap(), img);
    }

    #[test]
    fn jpeg_and_tiff_preserve_dimensions() {
        let tmp = TempDir::new().unwrap();
        let img = gradient(21, 13);
        for (name, encoding) in [
            ("out.jpg", OutputEncoding::Jpeg { quality: 90 }),
            ("out.tif", OutputEncoding::Tiff),
        ] {
            let path = tmp.path().join(name);
            encode_to_path(&img, &path, encoding).unwrap();
            assert_eq!(decode_path(&path).unwrap().dimensions(), (21, 13));
        }
    }

    #[test]
    fn gray_png_decodes_to_rgb() {
        let gray = image::GrayImage::from_pixel(4, 3, image::Luma([77]));
        let mut buf = Cursor::new(Vec::new());
        gray.write_to(&mut buf, ImageFormat::Png).unwrap();
        let rgb = decode_bytes("gray.png", buf.get_ref()).unwrap();
        assert_eq!(rgb.dimensions(), (4, 3));
        assert!(rgb.pixels().all(|p| p.0 == [77, 77, 77]));
    }

    #[test]
    fn jpeg_bytes_start_with_soi_marker() {
        let bytes = encode_jpeg_bytes(&gradient(8, 8), 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn supported_inputs() {
        assert!(supported_input_extensions().contains(&"jpg"));
        assert!(is_supported_input(Path::new("x/Y.PNG")));
        assert!(!is_supported_input(Path::new("notes.txt")));
    }
}
