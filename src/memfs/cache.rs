//! Extract-once ledger.
//!
//! # Dedup Strategy
//!
//! ```text
//! ExtractionCache
//! ├── ledger: Mutex<FxHashSet<PathBuf>>   destination paths already populated
//! └── stats:  hits / extractions / files_copied
//!
//! extract_once(src, wild, dir)            mirror_once(src_dir, dst_dir)
//!   lock ledger                             lock ledger
//!   ├─ dir/basename(src) on disk ─► hit     ├─ dst_dir recorded ─► skip
//!   └─ extract, record every written file   └─ mirror_dir, record
//!   unlock                                  unlock
//! ```
//!
//! The key is the destination path, never the source content: once a
//! destination is populated, later requests for it are skipped even when
//! they name a different source. One cache directory serves one logical
//! resource.
//!
//! The lock covers the whole check, copy and record sequence, so a thread
//! past the check always sees a fully populated destination. Failed
//! extractions are not recorded and leave no target behind, so the next
//! request retries. A target deleted from disk is extracted again.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::extract::{extract, mirror_dir};
use crate::error::Result;

// =============================================================================
// ExtractionStats
// =============================================================================

/// Counters describing cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Requests answered without copying.
    pub hits: u64,
    /// Extraction or mirror operations performed.
    pub extractions: u64,
    /// Files written by those operations.
    pub files_copied: u64,
}

// =============================================================================
// ExtractionCache
// =============================================================================

/// Ledger of populated destinations.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    ledger: Mutex<FxHashSet<PathBuf>>,
    hits: AtomicU64,
    extractions: AtomicU64,
    files_copied: AtomicU64,
}

impl ExtractionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract `source` into `destination_dir` unless the target is on disk.
    ///
    /// Returns `destination_dir/basename(source)`, which exists on success.
    pub fn extract_once(&self, source: &Path, wild: bool, destination_dir: &Path) -> Result<PathBuf> {
        let target = match source.file_name() {
            Some(name) => destination_dir.join(name),
            None => destination_dir.to_path_buf(),
        };

        let mut ledger = self.ledger.lock();
        if target.exists() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target = %target.display(), "memfs cache hit");
            return Ok(target);
        }

        let written = extract(source, wild, destination_dir)?;
        self.extractions.fetch_add(1, Ordering::Relaxed);
        self.files_copied.fetch_add(written.len() as u64, Ordering::Relaxed);
        ledger.extend(written);
        ledger.insert(target.clone());
        Ok(target)
    }

    /// Mirror `source_dir` into `destination` unless already done.
    ///
    /// Only the ledger is consulted; an existing `destination` that was not
    /// populated by this cache is still mirrored into.
    pub fn mirror_once(&self, source_dir: &Path, destination: &Path) -> Result<()> {
        let mut ledger = self.ledger.lock();
        if ledger.contains(destination) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let copied = mirror_dir(source_dir, destination)?;
        self.extractions.fetch_add(1, Ordering::Relaxed);
        self.files_copied.fetch_add(copied as u64, Ordering::Relaxed);
        ledger.insert(destination.to_path_buf());
        Ok(())
    }

    /// Check whether `destination` has been recorded.
    pub fn is_recorded(&self, destination: &Path) -> bool {
        self.ledger.lock().contains(destination)
    }

    /// Number of recorded destinations.
    pub fn len(&self) -> usize {
        self.ledger.lock().len()
    }

    /// Check if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.ledger.lock().is_empty()
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> ExtractionStats {
        ExtractionStats {
            hits: self.hits.load(Ordering::Relaxed),
            extractions: self.extractions.load(Ordering::Relaxed),
            files_copied: self.files_copied.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
