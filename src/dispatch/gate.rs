//! Pass-through switch.
//!
//! When the pass-through flag is set, load requests skip every hook. The one
//! exception is the stubbed dependency on the stub platform (Windows by
//! default), which is routed to [`PlatformStub`] instead of its real module.

use crate::config::{self, Config, STUB_DEPENDENCY};

use super::platform::PlatformStub;

/// Where a load request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the middleware chain and hooks.
    Intercept,
    /// Run the real load only.
    PassThrough,
    /// Serve the static platform stub instead of the real module.
    Stub(&'static PlatformStub),
}

#[derive(Debug, Clone)]
enum FlagSource {
    Env(String),
    Fixed(bool),
}

/// Decides per request whether interception is active.
#[derive(Debug, Clone)]
pub struct PassThroughGate {
    source: FlagSource,
    stub_dependency: String,
    stub_platform: bool,
}

impl PassThroughGate {
    /// Gate driven by the environment variable `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            source: FlagSource::Env(var.into()),
            stub_dependency: STUB_DEPENDENCY.to_string(),
            stub_platform: cfg!(windows),
        }
    }

    /// Gate with a fixed state, ignoring the environment.
    pub fn fixed(active: bool) -> Self {
        Self {
            source: FlagSource::Fixed(active),
            ..Self::new(config::PASS_THROUGH_VAR)
        }
    }

    /// Gate configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pass_through_var.clone()).with_stub_dependency(config.stub_dependency.clone())
    }

    /// Set the dependency served by the platform stub.
    pub fn with_stub_dependency(mut self, name: impl Into<String>) -> Self {
        self.stub_dependency = name.into();
        self
    }

    /// Override whether the stub applies on this platform.
    pub fn with_stub_platform(mut self, enabled: bool) -> Self {
        self.stub_platform = enabled;
        self
    }

    /// Read the flag. The environment is consulted on every call.
    pub fn should_pass_through(&self) -> bool {
        match &self.source {
            FlagSource::Env(var) => config::env_flag(var),
            FlagSource::Fixed(active) => *active,
        }
    }

    /// Route a load request for `name`.
    pub fn route(&self, name: &str) -> Route {
        if !self.should_pass_through() {
            return Route::Intercept;
        }
        if self.stub_platform && name == self.stub_dependency {
            Route::Stub(PlatformStub::current())
        } else {
            Route::PassThrough
        }
    }
}

impl Default for PassThroughGate {
    fn default() -> Self {
        Self::new(config::PASS_THROUGH_VAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_gate_intercepts() {
        let gate = PassThroughGate::fixed(false).with_stub_platform(true);
        assert!(!gate.should_pass_through());
        assert_eq!(gate.route("ffi"), Route::Intercept);
        assert_eq!(gate.route("fiddle"), Route::Intercept);
    }

    #[test]
    fn test_active_gate_passes_through() {
        let gate = PassThroughGate::fixed(true).with_stub_platform(false);
        assert_eq!(gate.route("ffi"), Route::PassThrough);
        assert_eq!(gate.route("sassc"), Route::PassThrough);
    }

    #[test]
    fn test_active_gate_stubs_on_stub_platform() {
        let gate = PassThroughGate::fixed(true).with_stub_platform(true);
        assert_eq!(gate.route("ffi"), Route::Stub(PlatformStub::current()));
        assert_eq!(gate.route("fiddle"), Route::PassThrough);
    }

    #[test]
    fn test_custom_stub_dependency() {
        let gate = PassThroughGate::fixed(true)
            .with_stub_platform(true)
            .with_stub_dependency("native");
        assert!(matches!(gate.route("native"), Route::Stub(_)));
        assert_eq!(gate.route("ffi"), Route::PassThrough);
    }

    #[test]
    fn test_set_env_var_is_active() {
        // cargo sets this for every test process
        let gate = PassThroughGate::new("CARGO_MANIFEST_DIR").with_stub_platform(false);
        assert!(gate.should_pass_through());
        assert_eq!(gate.route("x"), Route::PassThrough);
        assert_eq!(gate.route("ffi"), Route::PassThrough);
    }

    #[test]
    fn test_unset_env_var_is_inactive() {
        let gate = PassThroughGate::new("MEMFS_RUNTIME_TEST_UNSET_PASS_THROUGH");
        assert!(!gate.should_pass_through());
        assert_eq!(gate.route("ffi"), Route::Intercept);
    }
}
