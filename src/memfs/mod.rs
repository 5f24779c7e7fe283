//! Extraction of embedded files into a writable cache.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Resolve Flow                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  "\"/__memfs__/lib/7z.so\"" ──► MountPoint::classify        │
//! │                    │                                        │
//! │                    ├─► missing / outside mount              │
//! │                    │   └─► input returned unchanged         │
//! │                    │                                        │
//! │                    └─► virtual                              │
//! │                        └─► ExtractionCache::extract_once    │
//! │                            ├─► hit: <cache>/7z.so           │
//! │                            └─► extract() then record        │
//! │                                                             │
//! │  result re-quoted: "\"<cache>/7z.so\""                      │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Cache Directory
//!
//! [`CacheDirectory`] owns everything extracted. It is created once per
//! [`Runtime`](crate::Runtime) and removed when the runtime goes away.

mod cache;
mod cache_dir;
mod extract;
mod mount;

pub use cache::{ExtractionCache, ExtractionStats};
pub use cache_dir::{CacheDirOptions, CacheDirectory};
pub use extract::{extract, mirror_dir};
pub use mount::{Classified, MountPoint, is_quoted, normalize_lexically, quote, split_quotes};
