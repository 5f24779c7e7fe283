//! Process-lifetime cache directory.
//!
//! Creation tries the system temp location first and falls back to the
//! working directory remembered at startup. Teardown removes the tree once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{CACHE_PREFIX, Config};
use crate::error::{Result, RuntimeError};

/// Where and how to create the cache directory.
#[derive(Debug, Clone)]
pub struct CacheDirOptions {
    /// Directory name prefix.
    pub prefix: String,
    /// Parent for the primary attempt (system temp dir if `None`).
    pub temp_root: Option<PathBuf>,
    /// Parent for the fallback attempt.
    pub original_dir: Option<PathBuf>,
}

impl Default for CacheDirOptions {
    fn default() -> Self {
        Self {
            prefix: CACHE_PREFIX.to_string(),
            temp_root: None,
            original_dir: None,
        }
    }
}

impl From<&Config> for CacheDirOptions {
    fn from(config: &Config) -> Self {
        Self {
            prefix: config.cache_prefix.clone(),
            temp_root: config.temp_root.clone(),
            original_dir: config.original_dir.clone(),
        }
    }
}

/// A writable directory holding materialized memfs files.
///
/// Temporary directories are removed on [`teardown`](Self::teardown) or drop,
/// whichever comes first. Adopted directories are left in place.
#[derive(Debug)]
pub struct CacheDirectory {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl CacheDirectory {
    /// Create a fresh temporary cache directory.
    ///
    /// Fails with [`RuntimeError::CacheDirectoryUnavailable`] when neither
    /// the temp location nor the original directory can host it.
    pub fn initialize(options: &CacheDirOptions) -> Result<Self> {
        let primary = match create_temp(&options.prefix, options.temp_root.as_deref()) {
            Ok(dir) => return Ok(Self::owned(dir)),
            Err(e) => e,
        };

        let Some(original) = options.original_dir.as_deref() else {
            return Err(RuntimeError::cache_unavailable(format!(
                "cannot create temporary directory: {primary}"
            )));
        };

        tracing::warn!(
            error = %primary,
            fallback = %original.display(),
            "temporary directory unavailable, retrying in original directory"
        );
        create_temp(&options.prefix, Some(original))
            .map(Self::owned)
            .map_err(|fallback| {
                RuntimeError::cache_unavailable(format!(
                    "cannot create temporary directory: {primary}; fallback in {} failed: {fallback}",
                    original.display()
                ))
            })
    }

    /// Use an existing directory, creating it if needed. Never removed.
    pub fn adopt(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(Self { path, temp: None })
    }

    fn owned(dir: TempDir) -> Self {
        let path = dir.path().to_path_buf();
        tracing::info!(path = %path.display(), "created memfs cache directory");
        Self {
            path,
            temp: Some(dir),
        }
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory is removed on teardown.
    pub fn is_owned(&self) -> bool {
        self.temp.is_some()
    }

    /// Remove the directory tree. Later calls do nothing.
    ///
    /// A directory that is already gone is not an error.
    pub fn teardown(&mut self) {
        let Some(dir) = self.temp.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed memfs cache directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove memfs cache directory"
            ),
        }
    }
}

impl Drop for CacheDirectory {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn create_temp(prefix: &str, parent: Option<&Path>) -> io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);
    match parent {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn options(temp_root: Option<&Path>, original_dir: Option<&Path>) -> CacheDirOptions {
        CacheDirOptions {
            prefix: "memfs-runtime-".to_string(),
            temp_root: temp_root.map(Path::to_path_buf),
            original_dir: original_dir.map(Path::to_path_buf),
        }
    }

    #[test]
    fn test_initialize_in_temp_root() {
        let root = TempDir::new().unwrap();
        let cache = CacheDirectory::initialize(&options(Some(root.path()), None)).unwrap();

        assert!(cache.path().is_dir());
        assert!(cache.path().starts_with(root.path()));
        assert!(cache.is_owned());
        let name = cache.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("memfs-runtime-"));
    }

    #[test]
    fn test_initialize_falls_back_to_original_dir() {
        let original = TempDir::new().unwrap();
        let broken = original.path().join("does/not/exist");

        let cache =
            CacheDirectory::initialize(&options(Some(&broken), Some(original.path()))).unwrap();

        assert!(cache.path().starts_with(original.path()));
        assert!(cache.path().is_dir());
    }

    #[test]
    fn test_initialize_fails_without_original_dir() {
        let root = TempDir::new().unwrap();
        let broken = root.path().join("missing");

        let err = CacheDirectory::initialize(&options(Some(&broken), None)).unwrap_err();

        assert!(err.is_cache_unavailable());
    }

    #[test]
    fn test_initialize_fails_when_both_fail() {
        let root = TempDir::new().unwrap();
        let broken = root.path().join("missing");
        let also_broken = root.path().join("also-missing");

        let err = CacheDirectory::initialize(&options(Some(&broken), Some(&also_broken))).unwrap_err();

        assert!(err.is_cache_unavailable());
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn test_teardown_removes_once() {
        let root = TempDir::new().unwrap();
        let mut cache = CacheDirectory::initialize(&options(Some(root.path()), None)).unwrap();
        let path = cache.path().to_path_buf();
        fs::write(path.join("a.so"), "x").unwrap();

        cache.teardown();
        assert!(!path.exists());
        cache.teardown();
        assert!(!cache.is_owned());
    }

    #[test]
    fn test_teardown_ignores_missing_directory() {
        let root = TempDir::new().unwrap();
        let mut cache = CacheDirectory::initialize(&options(Some(root.path()), None)).unwrap();
        fs::remove_dir_all(cache.path()).unwrap();

        cache.teardown();
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = TempDir::new().unwrap();
        let path = {
            let cache = CacheDirectory::initialize(&options(Some(root.path()), None)).unwrap();
            cache.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_adopted_directory_survives() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("fixed-cache");
        {
            let mut cache = CacheDirectory::adopt(&path).unwrap();
            assert!(!cache.is_owned());
            cache.teardown();
        }
        assert!(path.is_dir());
    }
}
