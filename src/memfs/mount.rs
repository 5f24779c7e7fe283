//! Mount point and path classification.
//!
//! Decides whether a path lies inside the embedded filesystem and handles
//! quoted path strings.

use std::path::{Component, Path, PathBuf};

/// Characters accepted as path quotes.
const QUOTES: [char; 2] = ['"', '\''];

// =============================================================================
// MountPoint
// =============================================================================

/// Prefix of the embedded read-only filesystem.
///
/// `A:/__memfs__` on Windows, `/__memfs__` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPoint {
    root: PathBuf,
}

impl Default for MountPoint {
    fn default() -> Self {
        if cfg!(windows) {
            Self::new("A:/__memfs__")
        } else {
            Self::new("/__memfs__")
        }
    }
}

impl MountPoint {
    /// Create a mount point at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize_lexically(&root.into()),
        }
    }

    /// The mount prefix.
    pub fn as_path(&self) -> &Path {
        &self.root
    }

    /// Check whether `path` is lexically under the mount.
    ///
    /// Pure prefix test; the filesystem is not consulted.
    pub fn contains(&self, path: &Path) -> bool {
        normalize_lexically(path).starts_with(&self.root)
    }

    /// Path of `path` relative to the mount, if it lies under it.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        normalize_lexically(path)
            .strip_prefix(&self.root)
            .ok()
            .map(Path::to_path_buf)
    }

    /// Classify a path string.
    ///
    /// The path is virtual only if it exists right now and its normalized
    /// form is under the mount. Missing paths are never virtual.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mount = MountPoint::new("/__memfs__");
    /// let c = mount.classify("\"/__memfs__/lib/7z.so\"");
    /// assert!(c.was_quoted());
    /// ```
    pub fn classify(&self, raw: &str) -> Classified {
        let (unquoted, quote) = split_quotes(raw);
        let path = Path::new(unquoted);
        let normalized = normalize_lexically(path);
        let is_virtual = normalized.starts_with(&self.root) && path.exists();
        Classified {
            is_virtual,
            path: normalized,
            quote,
        }
    }
}

impl std::fmt::Display for MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

// =============================================================================
// Classified
// =============================================================================

/// Result of [`MountPoint::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// The path exists and lies inside the mount.
    pub is_virtual: bool,
    /// Unquoted, lexically normalized path.
    pub path: PathBuf,
    /// Quote character stripped from the input, if any.
    pub quote: Option<char>,
}

impl Classified {
    /// Whether the input was wrapped in matching quotes.
    pub fn was_quoted(&self) -> bool {
        self.quote.is_some()
    }

    /// Re-apply the original quoting to `path`.
    pub fn requote(&self, path: &str) -> String {
        match self.quote {
            Some(q) => quote(path, q),
            None => path.to_string(),
        }
    }
}

// =============================================================================
// Quoting
// =============================================================================

/// Strip matching surrounding quotes.
///
/// Returns the inner string and the quote character, or the input unchanged.
pub fn split_quotes(raw: &str) -> (&str, Option<char>) {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if first == last && QUOTES.contains(&first) => {
            (&raw[first.len_utf8()..raw.len() - last.len_utf8()], Some(first))
        }
        _ => (raw, None),
    }
}

/// Wrap `path` in `quote` characters.
pub fn quote(path: &str, quote: char) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push(quote);
    out.push_str(path);
    out.push(quote);
    out
}

/// Check whether a string is wrapped in matching quotes.
pub fn is_quoted(raw: &str) -> bool {
    split_quotes(raw).1.is_some()
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a path without touching the filesystem.
///
/// Drops `.` components and folds `..` into its parent. `..` never climbs
/// above the root of an absolute path.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_quotes() {
        assert_eq!(split_quotes("\"/a/b\""), ("/a/b", Some('"')));
        assert_eq!(split_quotes("'/a/b'"), ("/a/b", Some('\'')));
        assert_eq!(split_quotes("/a/b"), ("/a/b", None));
        assert_eq!(split_quotes("\"/a/b'"), ("\"/a/b'", None));
        assert_eq!(split_quotes("\""), ("\"", None));
        assert_eq!(split_quotes("\"\""), ("", Some('"')));
        assert_eq!(split_quotes(""), ("", None));
    }

    #[test]
    fn test_quote_roundtrip() {
        assert_eq!(quote("/tmp/x", '"'), "\"/tmp/x\"");
        assert!(is_quoted("'/tmp/x'"));
        assert!(!is_quoted("/tmp/x"));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_lexically(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_lexically(Path::new("a/..")), PathBuf::new());
    }

    #[test]
    fn test_contains_is_component_wise() {
        let mount = MountPoint::new("/__memfs__");
        assert!(mount.contains(Path::new("/__memfs__/lib/a.so")));
        assert!(!mount.contains(Path::new("/__memfs__x/lib/a.so")));
        assert!(!mount.contains(Path::new("/__memfs__/../etc/passwd")));
    }

    #[test]
    fn test_relative() {
        let mount = MountPoint::new("/__memfs__");
        assert_eq!(
            mount.relative(Path::new("/__memfs__/gems/sass")),
            Some(PathBuf::from("gems/sass"))
        );
        assert_eq!(mount.relative(Path::new("/usr/lib")), None);
    }

    #[test]
    fn test_classify_existing_file_in_mount() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test1.file");
        fs::write(&file, "x").unwrap();

        let mount = MountPoint::new(dir.path());
        let c = mount.classify(file.to_str().unwrap());
        assert!(c.is_virtual);
        assert!(!c.was_quoted());
        assert_eq!(c.path, file);
    }

    #[test]
    fn test_classify_missing_file_is_not_virtual() {
        let dir = TempDir::new().unwrap();
        let mount = MountPoint::new(dir.path());
        let missing = dir.path().join("missing.file");
        assert!(!mount.classify(missing.to_str().unwrap()).is_virtual);
    }

    #[test]
    fn test_classify_outside_mount() {
        let mount_dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let file = other.path().join("test.file");
        fs::write(&file, "x").unwrap();

        let mount = MountPoint::new(mount_dir.path());
        assert!(!mount.classify(file.to_str().unwrap()).is_virtual);
    }

    #[test]
    fn test_classify_quoted() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test1.file");
        fs::write(&file, "x").unwrap();

        let mount = MountPoint::new(dir.path());
        let c = mount.classify(&quote(file.to_str().unwrap(), '"'));
        assert!(c.is_virtual);
        assert!(c.was_quoted());
        assert_eq!(c.requote("/cache/test1.file"), "\"/cache/test1.file\"");
    }
}
