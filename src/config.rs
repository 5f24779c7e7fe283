//! Configuration for memfs-runtime.
//!
//! This module provides the runtime configuration: mount point, cache directory
//! placement, pass-through switch and trace flag.
//! Use [`ConfigBuilder`] at application startup, then hand the result to
//! [`Runtime::new`](crate::Runtime::new) or install it process-wide with
//! [`ConfigBuilder::init`].

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::memfs::MountPoint;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Environment variable that switches the runtime into pass-through mode.
pub const PASS_THROUGH_VAR: &str = "MEMFS_PASS_THROUGH";

/// Environment variable that enables dispatcher trace lines by default.
pub const LOG_VAR: &str = "MEMFS_RUNTIME_LOG";

/// Prefix for the temporary cache directory name.
pub const CACHE_PREFIX: &str = "memfs-runtime-";

/// Dependency redirected to the platform stub in pass-through mode.
pub const STUB_DEPENDENCY: &str = "ffi";

/// Runtime configuration for memfs-runtime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix of the embedded read-only filesystem.
    pub mount_point: MountPoint,
    /// Existing directory to use as the cache instead of a temporary one.
    /// Adopted directories are never removed on teardown.
    pub cache_dir: Option<PathBuf>,
    /// Parent for the temporary cache directory (system temp dir if `None`).
    pub temp_root: Option<PathBuf>,
    /// Working directory remembered at startup, used as fallback parent.
    pub original_dir: Option<PathBuf>,
    /// Name prefix of the temporary cache directory.
    pub cache_prefix: String,
    /// Name of the pass-through environment variable.
    pub pass_through_var: String,
    /// Dependency served by the platform stub in pass-through mode.
    pub stub_dependency: String,
    /// Emit dispatcher trace lines.
    pub log_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mount_point: MountPoint::default(),
            cache_dir: None,
            temp_root: None,
            original_dir: None,
            cache_prefix: CACHE_PREFIX.to_string(),
            pass_through_var: PASS_THROUGH_VAR.to_string(),
            stub_dependency: STUB_DEPENDENCY.to_string(),
            log_enabled: env_flag(LOG_VAR),
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    mount_point: Option<MountPoint>,
    cache_dir: Option<PathBuf>,
    temp_root: Option<PathBuf>,
    original_dir: Option<PathBuf>,
    cache_prefix: Option<String>,
    pass_through_var: Option<String>,
    stub_dependency: Option<String>,
    log_enabled: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mount point of the embedded filesystem.
    ///
    /// Default: `/__memfs__` (`A:/__memfs__` on Windows)
    ///
    /// # Example
    ///
    /// ```
    /// use memfs_runtime::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .with_mount_point("/virt")
    ///     .build();
    /// assert_eq!(config.mount_point.as_path(), std::path::Path::new("/virt"));
    /// ```
    pub fn with_mount_point(mut self, mount: impl Into<PathBuf>) -> Self {
        self.mount_point = Some(MountPoint::new(mount));
        self
    }

    /// Use an existing directory as the cache instead of a temporary one.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Create the temporary cache directory under `root`.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Set the fallback parent for the cache directory.
    pub fn with_original_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.original_dir = Some(dir.into());
        self
    }

    /// Remember the current working directory as the fallback parent.
    pub fn capture_original_dir(mut self) -> Self {
        self.original_dir = std::env::current_dir().ok();
        self
    }

    /// Set the temporary cache directory name prefix.
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = Some(prefix.into());
        self
    }

    /// Set the pass-through environment variable name.
    pub fn with_pass_through_var(mut self, var: impl Into<String>) -> Self {
        self.pass_through_var = Some(var.into());
        self
    }

    /// Set the dependency redirected to the platform stub.
    pub fn with_stub_dependency(mut self, name: impl Into<String>) -> Self {
        self.stub_dependency = Some(name.into());
        self
    }

    /// Enable or disable dispatcher trace lines.
    ///
    /// Default: enabled when `MEMFS_RUNTIME_LOG` is set to a true value.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_enabled = Some(enabled);
        self
    }

    /// Build an owned configuration.
    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            mount_point: self.mount_point.unwrap_or(defaults.mount_point),
            cache_dir: self.cache_dir,
            temp_root: self.temp_root,
            original_dir: self.original_dir,
            cache_prefix: self.cache_prefix.unwrap_or(defaults.cache_prefix),
            pass_through_var: self.pass_through_var.unwrap_or(defaults.pass_through_var),
            stub_dependency: self.stub_dependency.unwrap_or(defaults.stub_dependency),
            log_enabled: self.log_enabled.unwrap_or(defaults.log_enabled),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        CONFIG.set(self.build()).is_ok()
    }
}

/// Initialize memfs-runtime with default configuration.
///
/// The current working directory is captured as the fallback parent.
pub fn init_default() -> bool {
    ConfigBuilder::new().capture_original_dir().init()
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Interpret an environment variable as a boolean switch.
///
/// Unset is false; set values are read with [`flag_value`].
pub fn env_flag(var: &str) -> bool {
    std::env::var_os(var).is_some_and(|value| flag_value(&value.to_string_lossy()))
}

/// Interpret a switch value.
///
/// Empty, `0`, `false`, `no` and `off` (any case) are false, anything else is true.
pub fn flag_value(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value.eq_ignore_ascii_case("off"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache_prefix, "memfs-runtime-");
        assert_eq!(config.pass_through_var, "MEMFS_PASS_THROUGH");
        assert_eq!(config.stub_dependency, "ffi");
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .with_mount_point("/virt")
            .with_original_dir("/work")
            .with_logging(true)
            .build();
        assert_eq!(config.mount_point.as_path(), Path::new("/virt"));
        assert_eq!(config.original_dir.as_deref(), Some(Path::new("/work")));
        assert!(config.log_enabled);
    }

    #[test]
    fn test_capture_original_dir() {
        let config = ConfigBuilder::new().capture_original_dir().build();
        assert_eq!(config.original_dir, std::env::current_dir().ok());
    }

    #[test]
    fn test_env_flag_unset() {
        assert!(!env_flag("MEMFS_RUNTIME_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_flag_value() {
        for on in ["1", "true", "yes", "TRUE", " on "] {
            assert!(flag_value(on), "{on:?} should be on");
        }
        for off in ["", "0", "false", "False", "no", "OFF", "  "] {
            assert!(!flag_value(off), "{off:?} should be off");
        }
    }
}
