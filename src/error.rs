//! Runtime error type.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Error type for extraction and cache directory failures.
///
/// Paths outside the mount and dependencies without hooks are not errors;
/// they are passed through unchanged and never reach this type.
///
/// # Example
///
/// ```ignore
/// match runtime.resolve("/__memfs__/lib/7z.so") {
///     Ok(path) => load_library(&path),
///     Err(RuntimeError::CacheDirectoryUnavailable { reason }) => {
///         eprintln!("no writable cache directory: {reason}");
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Copying a file out of the mount failed.
    #[error("failed to extract {} into {}: {source}", .source_path.display(), .destination.display())]
    Extraction {
        /// File that was being copied.
        source_path: PathBuf,
        /// Directory the file was copied into.
        destination: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// No writable cache directory could be created or none is configured.
    #[error("cache directory unavailable: {reason}")]
    CacheDirectoryUnavailable {
        /// Why the cache directory is missing.
        reason: String,
    },

    /// A load path could not be represented or joined.
    #[error("invalid load path: {}", .0.display())]
    InvalidLoadPath(PathBuf),

    /// Directory traversal failed while mirroring a subtree.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Other file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Create an extraction error for `source_path` copied into `destination`.
    pub fn extraction(source_path: &Path, destination: &Path, source: io::Error) -> Self {
        Self::Extraction {
            source_path: source_path.to_path_buf(),
            destination: destination.to_path_buf(),
            source,
        }
    }

    /// Create a cache-directory-unavailable error.
    pub fn cache_unavailable(reason: impl Into<String>) -> Self {
        Self::CacheDirectoryUnavailable {
            reason: reason.into(),
        }
    }

    /// Check if this error means the cache directory is missing.
    pub fn is_cache_unavailable(&self) -> bool {
        matches!(self, Self::CacheDirectoryUnavailable { .. })
    }
}
