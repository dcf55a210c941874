//! Workspace error types

use thiserror::Error;

use ralph_tabs::TabKind;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Tab error: {0}")]
    Tab(#[from] ralph_tabs::TabError),

    #[error("Resource error: {0}")]
    Cache(#[from] ralph_cache::CacheError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown tab kind: {0}")]
    UnknownKind(TabKind),

    #[error("Invalid tab parameters: {0}")]
    InvalidParams(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
