// ============================================================================
// MERGE ERRORS — every failure a merge call can surface
// ============================================================================

use std::path::PathBuf;

use image::ImageError;

/// Error type for merge operations. All variants are fail-fast; nothing is
/// retried and no output file is left behind.
#[derive(Debug)]
pub enum MergeError {
    /// A referenced input file does not exist.
    InputMissing(PathBuf),
    /// Explicit grid dimensions cannot hold every image.
    ConfigConflict {
        columns: u32,
        rows: u32,
        images: usize,
    },
    /// A configuration value is out of its allowed range.
    InvalidConfig(String),
    /// An input file could not be decoded as an image.
    DecodeFailure { path: PathBuf, source: ImageError },
    /// The output directory or file could not be written.
    EncodeFailure { path: PathBuf, reason: String },
    /// The settings document could not be read or written.
    Settings { path: PathBuf, reason: String },
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::InputMissing(path) => {
                write!(f, "input file '{}' does not exist", path.display())
            }
            MergeError::ConfigConflict {
                columns,
                rows,
                images,
            } => write!(
                f,
                "a {}x{} grid cannot hold {} images",
                columns, rows, images
            ),
            MergeError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            MergeError::DecodeFailure { path, source } => {
                write!(f, "could not decode '{}': {}", path.display(), source)
            }
            MergeError::EncodeFailure { path, reason } => {
                write!(f, "could not write '{}': {}", path.display(), reason)
            }
            MergeError::Settings { path, reason } => {
                write!(f, "settings file '{}': {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::DecodeFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_grid_and_count() {
        let err = MergeError::ConfigConflict {
            columns: 2,
            rows: 1,
            images: 3,
        };
        assert_eq!(err.to_string(), "a 2x1 grid cannot hold 3 images");
    }

    #[test]
    fn decode_failure_exposes_source() {
        use std::error::Error;
        let err = MergeError::DecodeFailure {
            path: PathBuf::from("broken.png"),
            source: ImageError::IoError(std::io::Error::other("truncated")),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("broken.png"));
    }
}
