//! Cache error types

use std::sync::Arc;

use thiserror::Error;

/// Errors are `Clone` because one failure is handed to every coalesced caller.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("Failed to load resource {key}: {reason}")]
    Load {
        key: String,
        reason: Arc<anyhow::Error>,
    },
}

impl CacheError {
    pub(crate) fn load(key: String, reason: anyhow::Error) -> Self {
        CacheError::Load {
            key,
            reason: Arc::new(reason),
        }
    }

    /// The key whose producer failed
    pub fn key(&self) -> &str {
        match self {
            CacheError::Load { key, .. } => key,
        }
    }
}
