//! Tab data structure
//!
//! A tab is one open unit of work in the workspace: a kind tag that selects its
//! renderer, a title and icon the content declares about itself, and a private
//! payload of named fields.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::error::TabError;
use crate::hooks::TabHooks;
use crate::state::TabState;
use crate::Result;

/// Variant-specific payload of a tab
pub type TabData = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabKind {
    Terminal,
    TaskForm,
    FeatureForm,
    DisciplineForm,
    TaskDetail,
    FeatureDetail,
    DisciplineDetail,
    SubsystemDetail,
    BraindumpForm,
    AgentSessionConfig,
}

impl TabKind {
    pub const ALL: [TabKind; 10] = [
        TabKind::Terminal,
        TabKind::TaskForm,
        TabKind::FeatureForm,
        TabKind::DisciplineForm,
        TabKind::TaskDetail,
        TabKind::FeatureDetail,
        TabKind::DisciplineDetail,
        TabKind::SubsystemDetail,
        TabKind::BraindumpForm,
        TabKind::AgentSessionConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TabKind::Terminal => "terminal",
            TabKind::TaskForm => "task-form",
            TabKind::FeatureForm => "feature-form",
            TabKind::DisciplineForm => "discipline-form",
            TabKind::TaskDetail => "task-detail",
            TabKind::FeatureDetail => "feature-detail",
            TabKind::DisciplineDetail => "discipline-detail",
            TabKind::SubsystemDetail => "subsystem-detail",
            TabKind::BraindumpForm => "braindump-form",
            TabKind::AgentSessionConfig => "agent-session-config",
        }
    }
}

impl fmt::Display for TabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TabKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TabKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown tab kind: {}", s))
    }
}

/// Title/icon declared by a tab's own content. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabMeta {
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl TabMeta {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Everything needed to open a tab. The store assigns the id and order.
#[derive(Debug, Clone)]
pub struct TabSpec {
    pub kind: TabKind,
    pub title: String,
    pub icon: Option<String>,
    pub closeable: bool,
    /// Dedupe key: opening a `TabSpec` whose key is already open focuses that tab
    pub key: Option<String>,
    pub data: TabData,
    pub hooks: TabHooks,
}

impl TabSpec {
    pub fn new(kind: TabKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            icon: None,
            closeable: true,
            key: None,
            data: TabData::new(),
            hooks: TabHooks::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_data(mut self, data: TabData) -> Self {
        self.data = data;
        self
    }

    pub fn with_hooks(mut self, hooks: TabHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Pinned tabs survive every close operation
    pub fn pinned(mut self) -> Self {
        self.closeable = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    /// Unique for the lifetime of the store
    pub id: TabId,
    pub kind: TabKind,
    pub key: Option<String>,
    pub title: String,
    /// Opaque icon reference, resolved by the renderer
    pub icon: Option<String>,
    pub closeable: bool,
    pub data: TabData,
    /// Position in the tab strip, contiguous from 0
    pub order: usize,
    pub state: TabState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activated_at: Option<DateTime<Utc>>,
}

impl Tab {
    pub(crate) fn open(spec: TabSpec) -> (Self, TabHooks) {
        let now = Utc::now();

        let tab = Self {
            id: TabId::generate(),
            kind: spec.kind,
            key: spec.key,
            title: spec.title,
            icon: spec.icon,
            closeable: spec.closeable,
            data: spec.data,
            order: 0,
            state: TabState::Opening,
            created_at: now,
            updated_at: now,
            last_activated_at: None,
        };

        (tab, spec.hooks)
    }

    /// Attempt to transition to a new state
    pub fn transition_to(&mut self, new_state: TabState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(TabError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        tracing::debug!(
            tab_id = %self.id,
            from = %self.state,
            to = %new_state,
            "Tab state transition"
        );

        self.state = new_state;
        self.updated_at = Utc::now();

        if new_state == TabState::Active {
            self.last_activated_at = Some(self.updated_at);
        }

        Ok(())
    }

    /// Shallow-merge `partial` into the payload; absent fields are untouched
    pub fn merge_data(&mut self, partial: TabData) {
        for (field, value) in partial {
            self.data.insert(field, value);
        }
        self.updated_at = Utc::now();
    }

    /// Apply self-declared title/icon. Returns false when nothing changed.
    pub fn apply_meta(&mut self, meta: TabMeta) -> bool {
        let mut changed = false;

        if let Some(title) = meta.title {
            if title != self.title {
                self.title = title;
                changed = true;
            }
        }
        if let Some(icon) = meta.icon {
            if self.icon.as_deref() != Some(icon.as_str()) {
                self.icon = Some(icon);
                changed = true;
            }
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    /// Typed read of one payload field
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.data
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn is_active(&self) -> bool {
        self.state == TabState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> TabData {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_open_tab() {
        let (tab, hooks) = Tab::open(TabSpec::new(TabKind::Terminal, "New Terminal"));
        assert_eq!(tab.state, TabState::Opening);
        assert_eq!(tab.title, "New Terminal");
        assert!(tab.closeable);
        assert!(tab.last_activated_at.is_none());
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let (a, _) = Tab::open(TabSpec::new(TabKind::Terminal, "A"));
        let (b, _) = Tab::open(TabSpec::new(TabKind::Terminal, "A"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_state_transitions() {
        let (mut tab, _) = Tab::open(TabSpec::new(TabKind::TaskDetail, "Task #101"));

        assert!(tab.transition_to(TabState::Active).is_err());

        tab.transition_to(TabState::Background).unwrap();
        tab.transition_to(TabState::Active).unwrap();
        assert!(tab.last_activated_at.is_some());

        tab.transition_to(TabState::Closed).unwrap();
        assert!(matches!(
            tab.transition_to(TabState::Active),
            Err(TabError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_merge_data_keeps_existing_fields() {
        let (mut tab, _) = Tab::open(TabSpec::new(TabKind::Terminal, "T"));

        tab.merge_data(data(json!({ "x": 1 })));
        tab.merge_data(data(json!({ "y": 2 })));
        assert_eq!(Value::Object(tab.data.clone()), json!({ "x": 1, "y": 2 }));

        tab.merge_data(data(json!({ "x": 3 })));
        assert_eq!(tab.field::<i64>("x"), Some(3));
        assert_eq!(tab.field::<i64>("y"), Some(2));
        assert_eq!(tab.field::<String>("missing"), None);
    }

    #[test]
    fn test_apply_meta_reports_changes() {
        let (mut tab, _) = Tab::open(TabSpec::new(TabKind::TaskDetail, "Loading"));

        assert!(!tab.apply_meta(TabMeta::title("Loading")));
        assert!(tab.apply_meta(TabMeta::title("Task #007").with_icon("list-todo")));
        assert_eq!(tab.icon.as_deref(), Some("list-todo"));
        assert!(!tab.apply_meta(TabMeta::default()));
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in TabKind::ALL {
            assert_eq!(kind.as_str().parse::<TabKind>(), Ok(kind));
        }
        assert_eq!(
            serde_json::to_value(TabKind::AgentSessionConfig).unwrap(),
            json!("agent-session-config")
        );
    }
}
