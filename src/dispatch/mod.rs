//! Load interception.
//!
//! The host routes every dependency load through [`HookDispatcher::load`].
//! Adapters register a pre-load and/or post-load [`Hook`] per dependency
//! name in a [`HookRegistry`]; the dispatcher runs them around the real load
//! and returns the real load's value untouched.
//!
//! Setting `MEMFS_PASS_THROUGH` disables all of it (see [`PassThroughGate`]).

mod chain;
mod gate;
mod platform;
mod registry;

pub use chain::{HookDispatcher, HookStage, LoadRequest, LoadStage, Middleware, Next};
pub use gate::{PassThroughGate, Route};
pub use platform::PlatformStub;
pub use registry::{Hook, HookOutcome, HookRef, HookRegistry};
