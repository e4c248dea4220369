// ============================================================================
// IMAGE I/O — decode inputs, encode the merged canvas
// ============================================================================

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbImage, RgbaImage};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{MergeError, Result};

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Output encodings, chosen from the output file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
    Tga,
    Tiff,
}

impl OutputFormat {
    /// Infer the format from `path`'s extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "jpg" | "jpeg" => OutputFormat::Jpeg,
            "bmp"          => OutputFormat::Bmp,
            "tga"          => OutputFormat::Tga,
            "tiff" | "tif" => OutputFormat::Tiff,
            _              => OutputFormat::Png,
        }
    }
}

/// Decode `path` into an RGBA buffer.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(MergeError::InputMissing(path.to_path_buf()));
    }
    let decode_err = |source: ImageError| MergeError::DecodeFailure {
        path: path.to_path_buf(),
        source,
    };
    // Content sniffing first, extension as the fallback (TGA has no magic bytes)
    let reader = image::io::Reader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| decode_err(e.into()))?;
    Ok(reader.decode().map_err(decode_err)?.to_rgba8())
}

/// Encode an opaque canvas in memory.
pub fn encode(image: &RgbImage, format: OutputFormat, quality: u8) -> std::result::Result<Vec<u8>, ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    let (w, h) = image.dimensions();
    let raw = image.as_raw();

    match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(raw, w, h, ColorType::Rgb8)?;
        }
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(raw, w, h, ColorType::Rgb8)?;
        }
        OutputFormat::Bmp => {
            BmpEncoder::new(&mut buffer).write_image(raw, w, h, ColorType::Rgb8)?;
        }
        OutputFormat::Tga => {
            TgaEncoder::new(&mut buffer).write_image(raw, w, h, ColorType::Rgb8)?;
        }
        OutputFormat::Tiff => {
            TiffEncoder::new(&mut buffer).write_image(raw, w, h, ColorType::Rgb8)?;
        }
    }

    Ok(buffer.into_inner())
}

/// Encode `image` and write it to `path`.
///
/// The parent directory is created if needed. Bytes go to a sibling temp
/// file that is renamed over `path` only once fully written, so a failed
/// save never leaves a partial file at the target.
pub fn save_canvas(image: &RgbImage, path: &Path, quality: u8) -> Result<PathBuf> {
    let encode_err = |reason: String| MergeError::EncodeFailure {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|e| encode_err(e.to_string()))?;
    }

    let bytes = encode(image, OutputFormat::from_path(path), quality)
        .map_err(|e| encode_err(e.to_string()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| encode_err("output path has no file name".into()))?;
    let tmp = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));

    let written = File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(&bytes)?;
            f.sync_all()
        })
        .and_then(|_| std::fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(encode_err(e.to_string()));
    }

    Ok(path.to_path_buf())
}

/// Insert a `_YYYYmmdd_HHMMSS` suffix before the extension.
pub fn stamp_output(path: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamped = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, now.format("%Y%m%d_%H%M%S"), ext.to_string_lossy()),
        None => format!("{}_{}", stem, now.format("%Y%m%d_%H%M%S")),
    };
    path.with_file_name(stamped)
}
