//! Workspace container
//!
//! Owns the tab store, the kind registry and the resource loaders for one
//! workspace window. There is no global instance; hosts construct one and hand
//! clones of it (or of its store) to whatever needs them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use ralph_tabs::{TabData, TabId, TabKind, TabSpec, TabStore};

use crate::actions::TabActions;
use crate::config::WorkspaceConfig;
use crate::error::WorkspaceError;
use crate::registry::KindRegistry;
use crate::resources::Resources;
use crate::Result;

/// What became of an async result meant for a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Written into the tab's payload
    Applied,
    /// The tab closed before the result arrived
    Discarded,
}

pub struct Workspace<R> {
    config: WorkspaceConfig,
    store: TabStore,
    registry: Arc<KindRegistry<R>>,
    resources: Resources,
}

impl<R> Workspace<R> {
    pub fn new(
        config: WorkspaceConfig,
        registry: KindRegistry<R>,
        resources: Resources,
    ) -> Result<Self> {
        config.validate()?;

        let store = TabStore::with_max_tabs(config.max_tabs);
        tracing::info!(
            max_tabs = ?config.max_tabs,
            kinds = registry.kinds().len(),
            "Workspace initialized"
        );

        Ok(Self {
            config,
            store,
            registry: Arc::new(registry),
            resources,
        })
    }

    pub fn store(&self) -> &TabStore {
        &self.store
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn registry(&self) -> &KindRegistry<R> {
        &self.registry
    }

    /// Action facade bound to this workspace's store. The facade opens
    /// terminal tabs, so the terminal kind must be registered.
    pub fn actions(&self) -> Result<TabActions> {
        self.registry.renderer(TabKind::Terminal)?;

        Ok(
            TabActions::new(self.store.clone(), self.config.default_terminal_title.as_str())
                .with_terminal_hooks(self.registry.lifecycle(TabKind::Terminal)),
        )
    }

    /// Open a tab of a registered kind. Hooks on `spec` win over the kind's
    /// default hooks.
    pub fn open(&self, spec: TabSpec) -> Result<TabId> {
        let spec = self.prepare(spec)?;
        Ok(self.store.open_tab(spec)?)
    }

    pub fn open_after(&self, after: &TabId, spec: TabSpec) -> Result<TabId> {
        let spec = self.prepare(spec)?;
        Ok(self.store.open_tab_after(after, spec)?)
    }

    fn prepare(&self, spec: TabSpec) -> Result<TabSpec> {
        // Fail before the tab exists rather than at render time
        self.registry.renderer(spec.kind)?;

        let hooks = spec.hooks.clone().or(&self.registry.lifecycle(spec.kind));
        Ok(spec.with_hooks(hooks))
    }

    /// Renderer for an open tab; `None` if the tab is not open
    pub fn renderer_for(&self, id: &TabId) -> Result<Option<&R>> {
        match self.store.get_tab(id) {
            Some(tab) => self.registry.renderer(tab.kind).map(Some),
            None => Ok(None),
        }
    }

    /// Await `load` and merge `apply(value)` into tab `id`, unless the tab was
    /// closed in the meantime.
    pub async fn load_into_tab<Fut, T, E, A>(
        &self,
        id: &TabId,
        load: Fut,
        apply: A,
    ) -> Result<LoadOutcome>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<WorkspaceError> + fmt::Display,
        A: FnOnce(T) -> TabData,
    {
        load_into_tab(&self.store, id, load, apply).await
    }

    /// [`Workspace::load_into_tab`] as a background task
    pub fn spawn_load_into_tab<Fut, T, E, A>(
        &self,
        id: TabId,
        load: Fut,
        apply: A,
    ) -> JoinHandle<Result<LoadOutcome>>
    where
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<WorkspaceError> + fmt::Display + Send + 'static,
        A: FnOnce(T) -> TabData + Send + 'static,
    {
        spawn_load_into_tab(&self.store, id, load, apply)
    }
}

/// Await `load` on behalf of tab `id` and write the result back through the
/// tab's liveness token.
///
/// A tab that is already closed, or closes while `load` is pending, never sees
/// the result. A failure that arrives after the tab closed is dropped too.
pub async fn load_into_tab<Fut, T, E, A>(
    store: &TabStore,
    id: &TabId,
    load: Fut,
    apply: A,
) -> Result<LoadOutcome>
where
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<WorkspaceError> + fmt::Display,
    A: FnOnce(T) -> TabData,
{
    let Some(token) = store.liveness(id) else {
        tracing::debug!(tab_id = %id, "Tab not open, skipping load");
        return Ok(LoadOutcome::Discarded);
    };

    match load.await {
        Ok(value) => {
            if store.apply_if_live(&token, apply(value)) {
                Ok(LoadOutcome::Applied)
            } else {
                Ok(LoadOutcome::Discarded)
            }
        }
        Err(err) if !token.is_live() => {
            tracing::debug!(tab_id = %id, error = %err, "Dropping load failure for closed tab");
            Ok(LoadOutcome::Discarded)
        }
        Err(err) => Err(err.into()),
    }
}

/// Run [`load_into_tab`] on the current tokio runtime. Lifecycle hooks use
/// this to start loads without blocking dispatch.
///
/// Must be called from within a tokio runtime.
pub fn spawn_load_into_tab<Fut, T, E, A>(
    store: &TabStore,
    id: TabId,
    load: Fut,
    apply: A,
) -> JoinHandle<Result<LoadOutcome>>
where
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<WorkspaceError> + fmt::Display + Send + 'static,
    A: FnOnce(T) -> TabData + Send + 'static,
{
    let store = store.clone();
    tokio::spawn(async move { load_into_tab(&store, &id, load, apply).await })
}

impl<R> Clone for Workspace<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
            registry: Arc::clone(&self.registry),
            resources: self.resources.clone(),
        }
    }
}
