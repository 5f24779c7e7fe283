//! Pre-load and post-load hooks keyed by dependency name.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::Result;

/// What a hook did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The hook ran its adapter.
    Applied,
    /// Nothing to do (for example, the adapter was already attached).
    Skipped,
}

/// Code run around the load of one dependency.
///
/// Hooks run for their side effects; their result never changes what the
/// load returns. Closures taking the dependency name implement this trait.
///
/// # Example
///
/// ```ignore
/// let runtime = Arc::new(Runtime::new(config));
/// let rt = Arc::clone(&runtime);
/// registry.register_post("sevenz", move |_name: &str| {
///     rt.resolve_with("/__memfs__/lib/7z.so", ResolveOptions::wild())?;
///     Ok(HookOutcome::Applied)
/// });
/// ```
pub trait Hook: Send + Sync {
    /// Run the hook for dependency `name`.
    fn run(&self, name: &str) -> Result<HookOutcome>;
}

impl<F> Hook for F
where
    F: Fn(&str) -> Result<HookOutcome> + Send + Sync,
{
    fn run(&self, name: &str) -> Result<HookOutcome> {
        self(name)
    }
}

/// Shared hook handle.
pub type HookRef = Arc<dyn Hook>;

/// Pre and post hooks per dependency name.
///
/// At most one hook of each kind per name; registering again replaces the
/// previous hook. Build it at startup, then hand it to a
/// [`HookDispatcher`](super::HookDispatcher).
#[derive(Clone, Default)]
pub struct HookRegistry {
    pre: FxHashMap<String, HookRef>,
    post: FxHashMap<String, HookRef>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hook run before `name` is loaded.
    ///
    /// Returns the hook it replaced, if any.
    pub fn register_pre(&mut self, name: impl Into<String>, hook: impl Hook + 'static) -> Option<HookRef> {
        self.pre.insert(name.into(), Arc::new(hook))
    }

    /// Register the hook run after `name` is loaded.
    ///
    /// Returns the hook it replaced, if any.
    pub fn register_post(&mut self, name: impl Into<String>, hook: impl Hook + 'static) -> Option<HookRef> {
        self.post.insert(name.into(), Arc::new(hook))
    }

    /// Builder form of [`register_pre`](Self::register_pre).
    pub fn with_pre(mut self, name: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.register_pre(name, hook);
        self
    }

    /// Builder form of [`register_post`](Self::register_post).
    pub fn with_post(mut self, name: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.register_post(name, hook);
        self
    }

    /// Pre-load hook for `name`.
    pub fn pre(&self, name: &str) -> Option<&HookRef> {
        self.pre.get(name)
    }

    /// Post-load hook for `name`.
    pub fn post(&self, name: &str) -> Option<&HookRef> {
        self.post.get(name)
    }

    /// Check if any hook is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.pre.contains_key(name) || self.post.contains_key(name)
    }

    /// Number of registered hooks, pre and post together.
    pub fn len(&self) -> usize {
        self.pre.len() + self.post.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pre: Vec<_> = self.pre.keys().collect();
        let mut post: Vec<_> = self.post.keys().collect();
        pre.sort();
        post.sort();
        f.debug_struct("HookRegistry")
            .field("pre", &pre)
            .field("post", &post)
            .finish()
    }
}
