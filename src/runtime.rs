//! Process context tying mount, cache directory and ledger together.
//!
//! A [`Runtime`] is built once at startup from a [`Config`] and shared
//! (usually in an `Arc`) with every hook that rewrites paths. Tests build
//! their own runtime with a temporary mount instead of touching globals.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::dispatch::{HookDispatcher, HookRegistry, PassThroughGate};
use crate::error::{Result, RuntimeError};
use crate::memfs::{CacheDirOptions, CacheDirectory, Classified, ExtractionCache, MountPoint};

/// Options for [`Runtime::resolve_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    /// Also extract same-extension siblings of the file.
    pub wild: bool,
    /// Extract here instead of the runtime's cache directory.
    pub cache_dir: Option<&'a Path>,
}

impl<'a> ResolveOptions<'a> {
    /// Options with `wild` enabled.
    pub fn wild() -> Self {
        Self {
            wild: true,
            cache_dir: None,
        }
    }

    /// Extract into `dir` instead of the default cache directory.
    pub fn in_dir(mut self, dir: &'a Path) -> Self {
        self.cache_dir = Some(dir);
        self
    }
}

/// Mount point, cache directory and extraction ledger of one process.
#[derive(Debug)]
pub struct Runtime {
    config: Config,
    cache_dir: std::result::Result<CacheDirectory, String>,
    cache: ExtractionCache,
    gate: PassThroughGate,
}

impl Runtime {
    /// Build a runtime, creating its cache directory.
    ///
    /// Cache directory failures do not fail construction; they surface as
    /// [`RuntimeError::CacheDirectoryUnavailable`] on the first extraction.
    pub fn new(config: Config) -> Self {
        let cache_dir = match &config.cache_dir {
            Some(dir) => CacheDirectory::adopt(dir),
            None => CacheDirectory::initialize(&CacheDirOptions::from(&config)),
        }
        .map_err(|e| {
            tracing::warn!(error = %e, "memfs cache directory unavailable");
            e.to_string()
        });

        Self {
            gate: PassThroughGate::from_config(&config),
            cache: ExtractionCache::new(),
            cache_dir,
            config,
        }
    }

    /// Replace the pass-through gate derived from the configuration.
    pub fn with_gate(mut self, gate: PassThroughGate) -> Self {
        self.gate = gate;
        self
    }

    /// Build a runtime from the global configuration.
    pub fn from_global_config() -> Self {
        Self::new(config::get().clone())
    }

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The mount point.
    pub fn mount(&self) -> &MountPoint {
        &self.config.mount_point
    }

    /// The default cache directory.
    pub fn cache_dir(&self) -> Result<&Path> {
        match &self.cache_dir {
            Ok(dir) => Ok(dir.path()),
            Err(reason) => Err(RuntimeError::cache_unavailable(reason.clone())),
        }
    }

    /// The extraction ledger.
    pub fn extraction_cache(&self) -> &ExtractionCache {
        &self.cache
    }

    /// Whether pass-through mode is active right now.
    pub fn is_pass_through(&self) -> bool {
        self.gate.should_pass_through()
    }

    /// Build a dispatcher over `registry` with this runtime's settings.
    pub fn dispatcher<T: 'static>(&self, registry: HookRegistry) -> HookDispatcher<T> {
        HookDispatcher::new(registry, self.gate.clone(), self.config.log_enabled)
    }

    /// Classify a path string against the mount.
    pub fn classify(&self, path: &str) -> Classified {
        self.mount().classify(path)
    }

    // =========================================================================
    // Path rewriting
    // =========================================================================

    /// Rewrite `path` to its extracted location.
    ///
    /// Paths outside the mount, or missing, are returned unchanged.
    /// Quoting is preserved.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // /__memfs__/lib/7z.so exists inside the package
    /// let path = runtime.resolve("/__memfs__/lib/7z.so")?;
    /// assert_eq!(path, format!("{}/7z.so", runtime.cache_dir()?.display()));
    /// ```
    pub fn resolve(&self, path: &str) -> Result<String> {
        self.resolve_with(path, ResolveOptions::default())
    }

    /// Rewrite `path` with explicit options.
    pub fn resolve_with(&self, path: &str, options: ResolveOptions<'_>) -> Result<String> {
        let classified = self.classify(path);
        if !classified.is_virtual {
            return Ok(path.to_string());
        }

        let destination = match options.cache_dir {
            Some(dir) => dir,
            None => self.cache_dir()?,
        };
        let target = self.cache.extract_once(&classified.path, options.wild, destination)?;
        let target = target.to_str().ok_or_else(|| RuntimeError::InvalidLoadPath(target.clone()))?;
        Ok(classified.requote(target))
    }

    /// Rewrite many paths in parallel, keeping their order.
    #[cfg(feature = "batch")]
    pub fn resolve_all<S>(&self, paths: &[S], options: ResolveOptions<'_>) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        use rayon::prelude::*;

        paths
            .par_iter()
            .map(|path| self.resolve_with(path.as_ref(), options))
            .collect()
    }

    /// Rewrite include paths, mirroring mounted directories into the cache.
    ///
    /// Each path under the mount becomes `<cache>/<path relative to mount>`
    /// and its contents are copied there once. Other paths are kept as is.
    pub fn resolve_load_paths<I, P>(&self, paths: I) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolved = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match self.mount().relative(path) {
                Some(relative) => {
                    let mirrored = self.cache_dir()?.join(relative);
                    self.cache.mirror_once(path, &mirrored)?;
                    resolved.push(mirrored);
                }
                None => resolved.push(path.to_path_buf()),
            }
        }
        Ok(resolved)
    }

    // =========================================================================
    // Bundle manifest
    // =========================================================================

    /// Location of the packaged bundle manifest, if present.
    ///
    /// Returns `<mount>/.bundle/Gemfile` when it exists. In pass-through mode
    /// the filesystem is not consulted and `None` is returned.
    pub fn bundle_manifest(&self) -> Option<PathBuf> {
        if self.is_pass_through() {
            return None;
        }
        let manifest = self.mount().as_path().join(".bundle").join("Gemfile");
        manifest.exists().then_some(manifest)
    }

    /// Remove the cache directory now instead of at drop.
    pub fn shutdown(mut self) {
        if let Ok(dir) = &mut self.cache_dir {
            dir.teardown();
        }
    }
}

/// Join load paths with the platform path-list separator.
///
/// Returns `None` for an empty list.
pub fn join_load_paths(paths: &[PathBuf]) -> Result<Option<OsString>> {
    if paths.is_empty() {
        return Ok(None);
    }
    std::env::join_paths(paths).map(Some).map_err(|_| {
        let bad = paths
            .iter()
            .find(|p| std::env::join_paths([p]).is_err())
            .cloned()
            .unwrap_or_default();
        RuntimeError::InvalidLoadPath(bad)
    })
}

// =============================================================================
// Tests
// =============================================================================
