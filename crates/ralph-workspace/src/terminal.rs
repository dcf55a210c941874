//! Terminal tab factory
//!
//! Terminal tabs carry their launch parameters under the `params` payload
//! field. Parameters are validated when the tab is built and again whenever
//! they are read back, since hosted content may have rewritten them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ralph_tabs::{Tab, TabData, TabKind, TabSpec};

use crate::error::WorkspaceError;
use crate::Result;

const PARAMS_FIELD: &str = "params";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Claude,
    Codex,
}

impl Agent {
    pub fn display_name(&self) -> &'static str {
        match self {
            Agent::Claude => "Claude",
            Agent::Codex => "Codex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Safe,
    Balanced,
    Auto,
    FullAuto,
}

/// Launch parameters of a terminal session. Every field is optional; the
/// backend fills in its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TerminalParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<Effort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_level: Option<PermissionLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_prompt: Option<String>,
}

impl TerminalParams {
    /// Read and validate the params stored on a terminal tab
    pub fn from_tab(tab: &Tab) -> Result<Self> {
        if tab.kind != TabKind::Terminal {
            return Err(WorkspaceError::InvalidParams(format!(
                "{} tab has no terminal parameters",
                tab.kind
            )));
        }
        Self::from_data(&tab.data)
    }

    /// A payload without a `params` field means "all defaults"
    pub fn from_data(data: &TabData) -> Result<Self> {
        let params = match data.get(PARAMS_FIELD) {
            None | Some(Value::Null) => Self::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| WorkspaceError::InvalidParams(e.to_string()))?,
        };
        params.normalized()
    }

    pub fn to_data(&self) -> Result<TabData> {
        let mut data = TabData::new();
        data.insert(PARAMS_FIELD.to_string(), serde_json::to_value(self)?);
        Ok(data)
    }

    fn normalized(mut self) -> Result<Self> {
        if let Some(model) = self.model.take() {
            let model = model.trim();
            if model.is_empty() {
                return Err(WorkspaceError::InvalidParams(
                    "model cannot be blank".to_string(),
                ));
            }
            self.model = Some(model.to_string());
        }
        if self.task_id == Some(0) {
            return Err(WorkspaceError::InvalidParams(
                "task id must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Title shown when the caller does not supply one. Claude is the
    /// backend's default agent.
    pub fn default_title(&self) -> String {
        format!(
            "{} ({})",
            self.agent.unwrap_or(Agent::Claude).display_name(),
            self.model.as_deref().unwrap_or("default")
        )
    }
}

/// [`TabSpec`] for a terminal tab launched with `params`
pub fn terminal_tab(params: TerminalParams, title: Option<String>) -> Result<TabSpec> {
    let params = params.normalized()?;
    let title = title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| params.default_title());

    Ok(TabSpec::new(TabKind::Terminal, title)
        .with_icon("terminal")
        .with_data(params.to_data()?))
}

/// Plain terminal with backend defaults
pub fn default_terminal_tab(title: impl Into<String>) -> TabSpec {
    TabSpec::new(TabKind::Terminal, title).with_icon("terminal")
}

/// Terminal bound to a task, titled `Task #NNN` unless `title` is given
pub fn task_terminal_tab(task_id: u32, title: Option<String>) -> Result<TabSpec> {
    let title = title.unwrap_or_else(|| format!("Task #{:03}", task_id));
    terminal_tab(
        TerminalParams {
            task_id: Some(task_id),
            ..TerminalParams::default()
        },
        Some(title),
    )
}
