//! Copying files out of the mount.
//!
//! Two operations:
//!
//! - [`extract`]: one file, or one file plus its same-extension siblings
//! - [`mirror_dir`]: a whole subtree, for include-path style lookups

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, RuntimeError};

/// Copy `source` into `destination`.
///
/// With `wild`, every file next to `source` sharing its extension is copied
/// in the same batch (the `dirname(source)/*.ext` glob). `destination` is
/// created with its parents if missing. A directory `source` is mirrored
/// recursively into `destination/basename(source)`; `wild` does not apply.
///
/// Any copy failure aborts the whole operation and removes the files this
/// call created, so `destination/basename(source)` only exists after a
/// complete batch.
///
/// Returns the paths written under `destination`.
pub fn extract(source: &Path, wild: bool, destination: &Path) -> Result<Vec<PathBuf>> {
    if source.is_dir() {
        return extract_dir(source, destination);
    }

    let files = if wild {
        siblings_with_extension(source)?
    } else {
        vec![source.to_path_buf()]
    };

    fs::create_dir_all(destination)
        .map_err(|e| RuntimeError::extraction(source, destination, e))?;

    let mut written = Vec::with_capacity(files.len());
    let mut created = Vec::new();
    for file in &files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = destination.join(name);
        let existed = target.exists();
        let copied = fs::copy(file, &target);
        if !existed && target.is_file() {
            created.push(target.clone());
        }
        if let Err(e) = copied {
            discard(&created);
            return Err(RuntimeError::extraction(file, destination, e));
        }
        written.push(target);
    }

    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        wild,
        count = written.len(),
        "extracted from memfs"
    );
    Ok(written)
}

fn extract_dir(source: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let Some(name) = source.file_name() else {
        return Err(RuntimeError::extraction(
            source,
            destination,
            io::Error::new(io::ErrorKind::InvalidInput, "directory has no name"),
        ));
    };
    let target = destination.join(name);
    let existed = target.exists();
    if let Err(e) = mirror_dir(source, &target) {
        if !existed {
            let _ = fs::remove_dir_all(&target);
        }
        return Err(e);
    }
    Ok(vec![target])
}

/// Remove the files a failed batch created.
fn discard(created: &[PathBuf]) {
    for path in created {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial extraction");
        }
    }
}

/// List the files next to `source` with the same extension, then `source`.
///
/// Hidden files are skipped, like a shell glob would. `source` itself is
/// always included, even when it is hidden or has no extension, and comes
/// last so its copy marks the batch as complete.
fn siblings_with_extension(source: &Path) -> Result<Vec<PathBuf>> {
    let Some(dir) = source.parent() else {
        return Ok(vec![source.to_path_buf()]);
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let extension = source.extension();

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| RuntimeError::extraction(source, dir, e))? {
        let entry = entry?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || path.file_name() == source.file_name() {
            continue;
        }
        if path.extension() == extension && entry.file_type()?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    files.push(source.to_path_buf());
    Ok(files)
}

/// Copy the contents of `source_dir` into `destination`, recursively.
///
/// `destination` is always created. A missing `source_dir` copies nothing.
/// Returns the number of files copied.
pub fn mirror_dir(source_dir: &Path, destination: &Path) -> Result<usize> {
    fs::create_dir_all(destination)
        .map_err(|e| RuntimeError::extraction(source_dir, destination, e))?;
    if !source_dir.exists() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source_dir).min_depth(1) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| RuntimeError::extraction(entry.path(), destination, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| RuntimeError::extraction(entry.path(), destination, e))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| RuntimeError::extraction(entry.path(), destination, e))?;
            copied += 1;
        }
    }

    tracing::debug!(
        source = %source_dir.display(),
        destination = %destination.display(),
        copied,
        "mirrored memfs directory"
    );
    Ok(copied)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        fs::write(files.join("test1.file"), "one").unwrap();
        fs::write(files.join("test2.file"), "two").unwrap();
        fs::write(files.join("test3.other"), "three").unwrap();
        fs::write(files.join(".hidden.file"), "hidden").unwrap();
        dir
    }

    #[test]
    fn test_extract_single_file() {
        let src = fixture();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("files/test1.file");

        let written = extract(&source, false, dst.path()).unwrap();

        assert_eq!(written, vec![dst.path().join("test1.file")]);
        assert_eq!(fs::read_to_string(dst.path().join("test1.file")).unwrap(), "one");
        assert!(!dst.path().join("test2.file").exists());
    }

    #[test]
    fn test_extract_wild_copies_same_extension() {
        let src = fixture();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("files/test1.file");

        let written = extract(&source, true, dst.path()).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written.last(), Some(&dst.path().join("test1.file")));
        assert!(dst.path().join("test1.file").exists());
        assert!(dst.path().join("test2.file").exists());
        assert!(!dst.path().join("test3.other").exists());
        assert!(!dst.path().join(".hidden.file").exists());
    }

    #[test]
    fn test_extract_creates_destination() {
        let src = fixture();
        let dst = TempDir::new().unwrap();
        let nested = dst.path().join("a/b/c");

        extract(&src.path().join("files/test1.file"), false, &nested).unwrap();

        assert!(nested.join("test1.file").exists());
    }

    #[test]
    fn test_extract_missing_source_fails() {
        let src = fixture();
        let dst = TempDir::new().unwrap();

        let err = extract(&src.path().join("files/missing.file"), false, dst.path()).unwrap_err();

        assert!(matches!(err, RuntimeError::Extraction { .. }));
    }

    #[test]
    fn test_mirror_dir_copies_tree() {
        let src = fixture();
        fs::create_dir(src.path().join("files/nested")).unwrap();
        fs::write(src.path().join("files/nested/_partial.scss"), "$a: 1;").unwrap();
        let dst = TempDir::new().unwrap();
        let target = dst.path().join("mirror");

        let copied = mirror_dir(&src.path().join("files"), &target).unwrap();

        assert_eq!(copied, 5);
        assert!(target.join("test3.other").exists());
        assert!(target.join("nested/_partial.scss").exists());
    }

    #[test]
    fn test_mirror_dir_missing_source() {
        let dst = TempDir::new().unwrap();
        let target = dst.path().join("mirror");

        let copied = mirror_dir(Path::new("/nonexistent/memfs/dir"), &target).unwrap();

        assert_eq!(copied, 0);
        assert!(target.is_dir());
    }

    #[test]
    fn test_extract_wild_failure_removes_created_files() {
        let src = fixture();
        fs::write(src.path().join("files/test0.file"), "zero").unwrap();
        fs::write(src.path().join("files/test3.file"), "three").unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("test0.file"), "kept").unwrap();
        fs::create_dir(dst.path().join("test2.file")).unwrap();

        let err = extract(&src.path().join("files/test3.file"), true, dst.path()).unwrap_err();

        assert!(matches!(err, RuntimeError::Extraction { .. }));
        assert!(dst.path().join("test0.file").is_file());
        assert!(!dst.path().join("test1.file").exists());
        assert!(!dst.path().join("test3.file").exists());
        assert!(dst.path().join("test2.file").is_dir());
    }

    #[test]
    fn test_extract_directory_mirrors_it() {
        let src = fixture();
        let dst = TempDir::new().unwrap();

        let written = extract(&src.path().join("files"), true, dst.path()).unwrap();

        assert_eq!(written, vec![dst.path().join("files")]);
        assert!(dst.path().join("files/test3.other").is_file());
        assert!(dst.path().join("files/.hidden.file").is_file());
    }

    #[test]
    fn test_mirror_dir_unwritable_destination() {
        let src = fixture();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("blocker"), "").unwrap();

        let err = mirror_dir(&src.path().join("files"), &dst.path().join("blocker/mirror")).unwrap_err();

        assert!(matches!(err, RuntimeError::Extraction { .. }));
    }
}
