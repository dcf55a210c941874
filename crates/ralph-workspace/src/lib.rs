//! Ralph Workspace
//!
//! Coordination layer for the tabbed workspace: the tab store, the per-kind
//! renderer registry, the backend transport and the resource loaders that tab
//! content uses, plus the narrow action surface UI call sites go through.

mod actions;
mod config;
mod error;
mod registry;
mod resources;
mod terminal;
mod transport;
mod workspace;

pub use actions::TabActions;
pub use config::WorkspaceConfig;
pub use error::WorkspaceError;
pub use registry::{KindRegistry, TabModule};
pub use resources::{CropBox, ModelFormTree, ModelOption, Resources};
pub use terminal::{
    default_terminal_tab, task_terminal_tab, terminal_tab, Agent, Effort, PermissionLevel,
    TerminalParams,
};
pub use transport::{invoke_as, Transport};
pub use workspace::{load_into_tab, spawn_load_into_tab, LoadOutcome, Workspace};

// Re-export core components
pub use ralph_cache::{CacheError, ResourceCache, ResourceKey};
pub use ralph_tabs::{
    HookFn, LifecycleHook, LivenessToken, Tab, TabData, TabError, TabHooks, TabId, TabKind,
    TabMeta, TabSpec, TabState, TabStore,
};

pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// Initialize logging. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed (tests, embedding hosts)
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
