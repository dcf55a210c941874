//! Tab error types

use thiserror::Error;

use crate::hooks::LifecycleHook;
use crate::state::TabState;
use crate::tab::TabId;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("{hook} hook failed for tab {tab_id}")]
    Hook {
        hook: LifecycleHook,
        tab_id: TabId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: TabState, to: TabState },
}
