//! Ralph Tab Management
//!
//! The ordered registry of open workspace sessions ("tabs"), the single active
//! pointer, and the dispatcher that turns registry transitions into each
//! session's mount/unmount/activate/deactivate hooks.
//!
//! Every store operation is total over the current registry: unknown ids are
//! no-ops. The only failure a mutating operation reports is a lifecycle hook
//! returning an error, which is passed through to the caller.

mod error;
mod hooks;
mod lifecycle;
mod liveness;
mod state;
mod store;
mod tab;

pub use error::TabError;
pub use hooks::{HookFn, LifecycleHook, TabHooks};
pub use liveness::LivenessToken;
pub use state::TabState;
pub use store::TabStore;
pub use tab::{Tab, TabData, TabId, TabKind, TabMeta, TabSpec};

pub type Result<T> = std::result::Result<T, TabError>;
