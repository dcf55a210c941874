//! Workspace configuration

use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Upper bound on open tabs; the oldest closeable tab is evicted beyond it
    pub max_tabs: Option<usize>,
    /// Title of tabs opened by the "new terminal" actions
    pub default_terminal_title: String,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl WorkspaceConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tabs == Some(0) {
            return Err(WorkspaceError::Config(
                "max_tabs must be at least 1".to_string(),
            ));
        }
        if self.default_terminal_title.trim().is_empty() {
            return Err(WorkspaceError::Config(
                "default_terminal_title cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_tabs: Some(10),
            default_terminal_title: "New Terminal".to_string(),
            log_filter: "info".to_string(),
        }
    }
}
