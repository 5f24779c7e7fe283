//! # memfs-runtime
//!
//! Runtime support for applications packaged with an embedded read-only
//! filesystem (the "memfs").
//!
//! Some dependencies cannot read from the memfs: native libraries handed to
//! the system loader, stylesheet include paths given to a C library, and so
//! on. This crate copies such files out to a real, writable cache directory
//! on demand and gives the caller the new path:
//!
//! - **Path rewriting**: `resolve()` extracts a memfs file once and returns
//!   its cached location; anything outside the mount is returned unchanged
//! - **Wild extraction**: a file plus every sibling with the same extension
//! - **Dedup ledger**: each destination is populated once, even under
//!   concurrent callers
//! - **Load hooks**: pre/post hooks per dependency name run around the
//!   host's load call, as a middleware chain
//! - **Pass-through mode**: one environment variable disables it all
//!
//! ## Quick Start
//!
//! ```ignore
//! use memfs_runtime::prelude::*;
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(Runtime::new(
//!     ConfigBuilder::new().capture_original_dir().build(),
//! ));
//!
//! // Native library inside the package
//! let lib = runtime.resolve("/__memfs__/lib/7z.so")?;
//!
//! // Attach an adapter after "ffi" is loaded
//! let rt = Arc::clone(&runtime);
//! let registry = HookRegistry::new().with_post("ffi", move |_: &str| {
//!     rt.resolve_with("/__memfs__/lib/libffi.so", ResolveOptions::wild())?;
//!     Ok(HookOutcome::Applied)
//! });
//! let dispatcher: HookDispatcher<bool> = runtime.dispatcher(registry);
//! let loaded = dispatcher.load("ffi", |request| host_require(request.name()));
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Mount point, cache placement, pass-through variable
//! - [`memfs`]: Classification, extraction, ledger, cache directory
//! - [`dispatch`]: Hook registry, middleware chain, pass-through gate
//! - [`runtime`]: The process context and path rewriting entry points
//! - [`error`]: Error type

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod memfs;
pub mod runtime;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use memfs_runtime::prelude::*;
/// ```
///
/// This includes:
/// - Runtime: `Runtime`, `ResolveOptions`
/// - Configuration: `Config`, `ConfigBuilder`
/// - Dispatch: `HookDispatcher`, `HookRegistry`, `HookOutcome`, `LoadRequest`
/// - Errors: `RuntimeError`, `Result`
pub mod prelude {
    pub use crate::{
        Config, ConfigBuilder, HookDispatcher, HookOutcome, HookRegistry, LoadRequest,
        ResolveOptions, Result, Runtime, RuntimeError,
    };
}

// =============================================================================
// Runtime
// =============================================================================

pub use runtime::{join_load_paths, ResolveOptions, Runtime};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use dispatch::{
    Hook, HookDispatcher, HookOutcome, HookRegistry, LoadRequest, LoadStage, Middleware, Next,
    PassThroughGate, PlatformStub, Route,
};
pub use error::{Result, RuntimeError};
pub use memfs::{
    CacheDirOptions, CacheDirectory, Classified, ExtractionCache, ExtractionStats, MountPoint,
};
