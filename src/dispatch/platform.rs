//! Static platform description served in pass-through mode.
//!
//! Stands in for a dependency whose own platform probing cannot run while
//! interception is disabled.

use std::sync::LazyLock;

/// Platform values of the running process.
static CURRENT: LazyLock<PlatformStub> =
    LazyLock::new(|| PlatformStub::from_target(std::env::consts::OS, std::env::consts::ARCH));

/// Operating system, architecture and shared-library naming of a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformStub {
    /// Operating system name (`linux`, `darwin`, `windows`, ...).
    pub os: String,
    /// CPU architecture name (`x86_64`, `i386`, `aarch64`, ...).
    pub arch: String,
    /// Shared library file prefix (`lib`, `cyg` or empty).
    pub lib_prefix: String,
    /// Shared library extension without the dot (`so`, `dylib`, `dll`).
    pub lib_suffix: String,
    /// Always `true`: marks values produced by the stub.
    pub pass_through: bool,
}

impl PlatformStub {
    /// Stub for the running process.
    pub fn current() -> &'static PlatformStub {
        &CURRENT
    }

    /// Build the stub from Rust target names (`std::env::consts` values).
    pub fn from_target(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" | "ios" => "darwin",
            "dragonfly" => "dragonflybsd",
            "illumos" | "solaris" => "solaris",
            other => other,
        };
        let arch = match arch {
            "x86" => "i386",
            "sparc64" => "sparcv9",
            other => other,
        };
        let lib_prefix = match os {
            "windows" => "",
            "cygwin" => "cyg",
            _ => "lib",
        };
        let lib_suffix = match os {
            "darwin" => "dylib",
            "windows" | "cygwin" => "dll",
            _ => "so",
        };
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
            lib_prefix: lib_prefix.to_string(),
            lib_suffix: lib_suffix.to_string(),
            pass_through: true,
        }
    }

    /// Check for a macOS platform.
    pub fn is_mac(&self) -> bool {
        self.os == "darwin"
    }

    /// Map a bare library name to its platform file name.
    ///
    /// Names containing a path separator or already ending with the
    /// library suffix are returned unchanged.
    pub fn map_library_name(&self, name: &str) -> String {
        let suffix = format!(".{}", self.lib_suffix);
        if name.contains(['/', '\\']) || name.ends_with(&suffix) {
            return name.to_string();
        }
        if name.starts_with(&self.lib_prefix) {
            format!("{name}{suffix}")
        } else {
            format!("{}{name}{suffix}", self.lib_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_stub() {
        let stub = PlatformStub::from_target("linux", "x86_64");
        assert_eq!(stub.os, "linux");
        assert_eq!(stub.arch, "x86_64");
        assert_eq!(stub.lib_prefix, "lib");
        assert_eq!(stub.lib_suffix, "so");
        assert!(stub.pass_through);
    }

    #[test]
    fn test_windows_stub() {
        let stub = PlatformStub::from_target("windows", "x86");
        assert_eq!(stub.arch, "i386");
        assert_eq!(stub.lib_prefix, "");
        assert_eq!(stub.lib_suffix, "dll");
        assert_eq!(stub.map_library_name("7z"), "7z.dll");
    }

    #[test]
    fn test_macos_stub() {
        let stub = PlatformStub::from_target("macos", "aarch64");
        assert!(stub.is_mac());
        assert_eq!(stub.lib_suffix, "dylib");
    }

    #[test]
    fn test_map_library_name() {
        let stub = PlatformStub::from_target("linux", "x86_64");
        assert_eq!(stub.map_library_name("ffi"), "libffi.so");
        assert_eq!(stub.map_library_name("libffi"), "libffi.so");
        assert_eq!(stub.map_library_name("libffi.so"), "libffi.so");
        assert_eq!(stub.map_library_name("/opt/lib/x.so.1"), "/opt/lib/x.so.1");
    }

    #[test]
    fn test_current_is_shared() {
        assert!(std::ptr::eq(PlatformStub::current(), PlatformStub::current()));
        assert!(PlatformStub::current().pass_through);
    }
}
