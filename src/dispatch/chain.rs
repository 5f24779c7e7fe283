//! Middleware chain wrapping the host's load call.
//!
//! ```text
//! HookDispatcher::load(name, real)
//!     │
//!     ├─► Route::PassThrough ──► real(request)
//!     ├─► Route::Stub        ──► real(request with PlatformStub)
//!     └─► Route::Intercept
//!           │
//!           ├─► middleware[0] ─► ... ─► HookStage
//!           │                             ├─► pre hook      (PreHookRun)
//!           │                             ├─► real(request) (RealLoadRun)
//!           │                             └─► post hook     (PostHookRun)
//!           └─► value of real(request), unmodified
//! ```

use std::fmt;
use std::sync::Arc;

use crate::config::Config;

use super::gate::{PassThroughGate, Route};
use super::platform::PlatformStub;
use super::registry::{HookOutcome, HookRef, HookRegistry};

// =============================================================================
// LoadRequest / LoadStage
// =============================================================================

/// A request to load one dependency.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    name: &'a str,
    stub: Option<&'static PlatformStub>,
}

impl<'a> LoadRequest<'a> {
    /// Request for the real dependency `name`.
    pub fn new(name: &'a str) -> Self {
        Self { name, stub: None }
    }

    fn stubbed(name: &'a str, stub: &'static PlatformStub) -> Self {
        Self { name, stub: Some(stub) }
    }

    /// Dependency name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Platform stub to load instead of the real module, in pass-through mode.
    pub fn stub(&self) -> Option<&'static PlatformStub> {
        self.stub
    }
}

/// Stages of one intercepted load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Nothing has run.
    NotStarted,
    /// The pre-load hook ran.
    PreHookRun,
    /// The real load ran.
    RealLoadRun,
    /// The post-load hook ran.
    PostHookRun,
    /// The request completed.
    Done,
}

impl LoadStage {
    /// The stage that follows this one. `Done` is terminal.
    pub fn advance(self) -> Self {
        match self {
            Self::NotStarted => Self::PreHookRun,
            Self::PreHookRun => Self::RealLoadRun,
            Self::RealLoadRun => Self::PostHookRun,
            Self::PostHookRun | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "dispatching",
            Self::PreHookRun => "pre-processing",
            Self::RealLoadRun => "loading",
            Self::PostHookRun => "attaching an adapter for",
            Self::Done => "loaded",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Middleware / Next
// =============================================================================

/// One layer around the real load.
///
/// A middleware may act before and after calling `next.run(request)`; it
/// must return what `next` returned to keep the load result unmodified.
pub trait Middleware<T>: Send + Sync {
    /// Handle `request`, delegating to the rest of the chain through `next`.
    fn handle(&self, request: &LoadRequest<'_>, next: Next<'_, T>) -> T;
}

/// Continuation to the remaining middleware and the real load.
pub struct Next<'a, T> {
    rest: &'a [Arc<dyn Middleware<T>>],
    load: Box<dyn FnOnce(&LoadRequest<'_>) -> T + 'a>,
}

impl<T> Next<'_, T> {
    /// Run the rest of the chain.
    pub fn run(self, request: &LoadRequest<'_>) -> T {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(request, Next { rest, load: self.load }),
            None => (self.load)(request),
        }
    }
}

// =============================================================================
// HookStage
// =============================================================================

/// Built-in middleware running the registered pre and post hooks.
pub struct HookStage {
    registry: Arc<HookRegistry>,
    log_enabled: bool,
}

impl HookStage {
    /// Create the stage over `registry`.
    pub fn new(registry: Arc<HookRegistry>, log_enabled: bool) -> Self {
        Self {
            registry,
            log_enabled,
        }
    }

    fn trace(&self, stage: LoadStage, name: &str) {
        if self.log_enabled {
            tracing::info!(target: "memfs_runtime::dispatch", "{stage} {name}");
        }
    }

    fn run_hook(&self, hook: Option<&HookRef>, name: &str, stage: LoadStage) {
        let Some(hook) = hook else {
            return;
        };
        self.trace(stage, name);
        match hook.run(name) {
            Ok(HookOutcome::Applied) => {}
            Ok(HookOutcome::Skipped) => {
                if self.log_enabled {
                    tracing::info!(target: "memfs_runtime::dispatch", "skipped {name}");
                }
            }
            Err(e) => {
                tracing::warn!(target: "memfs_runtime::dispatch", dependency = name, %stage, error = %e, "hook failed");
            }
        }
    }
}

impl<T> Middleware<T> for HookStage {
    fn handle(&self, request: &LoadRequest<'_>, next: Next<'_, T>) -> T {
        let name = request.name();
        let pre = self.registry.pre(name);
        let post = self.registry.post(name);

        let mut stage = LoadStage::NotStarted;
        self.trace(stage, name);
        if pre.is_none() && post.is_none() && self.log_enabled {
            tracing::info!(
                target: "memfs_runtime::dispatch",
                "no pre-processing or adapter definitions for {name}"
            );
        }

        stage = stage.advance();
        self.run_hook(pre, name, stage);

        stage = stage.advance();
        self.trace(stage, name);
        let loaded = next.run(request);

        stage = stage.advance();
        self.run_hook(post, name, stage);

        self.trace(stage.advance(), name);
        loaded
    }
}

// =============================================================================
// HookDispatcher
// =============================================================================

/// Entry point wrapping every load of the host.
///
/// `T` is what the host's real load returns; the dispatcher hands it back
/// unchanged.
///
/// # Example
///
/// ```ignore
/// let registry = HookRegistry::new().with_post("ffi", ffi_adapter);
/// let dispatcher: HookDispatcher<bool> = HookDispatcher::from_config(registry, &config);
///
/// let loaded = dispatcher.load("ffi", |request| host.require(request.name()));
/// ```
pub struct HookDispatcher<T> {
    registry: Arc<HookRegistry>,
    gate: PassThroughGate,
    middleware: Vec<Arc<dyn Middleware<T>>>,
}

impl<T: 'static> HookDispatcher<T> {
    /// Create a dispatcher over `registry`, gated by `gate`.
    pub fn new(registry: HookRegistry, gate: PassThroughGate, log_enabled: bool) -> Self {
        let registry = Arc::new(registry);
        let stage = HookStage::new(Arc::clone(&registry), log_enabled);
        Self {
            registry,
            gate,
            middleware: vec![Arc::new(stage) as Arc<dyn Middleware<T>>],
        }
    }

    /// Create a dispatcher using the gate and trace flag from `config`.
    pub fn from_config(registry: HookRegistry, config: &Config) -> Self {
        Self::new(registry, PassThroughGate::from_config(config), config.log_enabled)
    }

    /// Add a middleware outside the hook stage.
    ///
    /// Middleware runs in the order added, all before the hooks.
    pub fn with_middleware(mut self, middleware: impl Middleware<T> + 'static) -> Self {
        let at = self.middleware.len() - 1;
        self.middleware.insert(at, Arc::new(middleware));
        self
    }

    /// The hook registry.
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// The pass-through gate.
    pub fn gate(&self) -> &PassThroughGate {
        &self.gate
    }

    /// Load dependency `name` through the chain; `real` performs the load.
    pub fn load<F>(&self, name: &str, real: F) -> T
    where
        F: FnOnce(&LoadRequest<'_>) -> T,
    {
        match self.gate.route(name) {
            Route::Intercept => {
                let next = Next {
                    rest: &self.middleware,
                    load: Box::new(real),
                };
                next.run(&LoadRequest::new(name))
            }
            Route::PassThrough => real(&LoadRequest::new(name)),
            Route::Stub(stub) => real(&LoadRequest::stubbed(name, stub)),
        }
    }
}

impl<T> fmt::Debug for HookDispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("registry", &self.registry)
            .field("gate", &self.gate)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
