//! Kind registry
//!
//! Maps each [`TabKind`] to the renderer that draws it and the lifecycle hooks
//! every tab of that kind gets by default. The renderer type is opaque here.

use std::collections::HashMap;

use ralph_tabs::{TabHooks, TabKind};

use crate::error::WorkspaceError;
use crate::Result;

#[derive(Debug, Clone)]
pub struct TabModule<R> {
    pub renderer: R,
    pub lifecycle: TabHooks,
}

#[derive(Debug)]
pub struct KindRegistry<R> {
    modules: HashMap<TabKind, TabModule<R>>,
}

impl<R> KindRegistry<R> {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Register a renderer with no-op lifecycle hooks
    pub fn register(&mut self, kind: TabKind, renderer: R) -> &mut Self {
        self.register_with_lifecycle(kind, renderer, TabHooks::default())
    }

    /// Register a renderer; replaces any earlier registration for `kind`
    pub fn register_with_lifecycle(
        &mut self,
        kind: TabKind,
        renderer: R,
        lifecycle: TabHooks,
    ) -> &mut Self {
        if self
            .modules
            .insert(kind, TabModule { renderer, lifecycle })
            .is_some()
        {
            tracing::debug!(kind = %kind, "Replaced tab module");
        }
        self
    }

    pub fn renderer(&self, kind: TabKind) -> Result<&R> {
        self.modules
            .get(&kind)
            .map(|module| &module.renderer)
            .ok_or(WorkspaceError::UnknownKind(kind))
    }

    /// Default hooks for `kind`; empty when none were registered
    pub fn lifecycle(&self, kind: TabKind) -> TabHooks {
        self.modules
            .get(&kind)
            .map(|module| module.lifecycle.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, kind: TabKind) -> bool {
        self.modules.contains_key(&kind)
    }

    /// Registered kinds, in declaration order
    pub fn kinds(&self) -> Vec<TabKind> {
        TabKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }
}

impl<R> Default for KindRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ralph_tabs::LifecycleHook;

    #[test]
    fn test_lookup_by_kind() {
        let mut registry = KindRegistry::new();
        registry
            .register(TabKind::Terminal, "TerminalView")
            .register(TabKind::TaskDetail, "TaskDetailView");

        assert_eq!(*registry.renderer(TabKind::Terminal).unwrap(), "TerminalView");
        assert_eq!(registry.kinds(), vec![TabKind::Terminal, TabKind::TaskDetail]);
        assert!(matches!(
            registry.renderer(TabKind::BraindumpForm),
            Err(WorkspaceError::UnknownKind(TabKind::BraindumpForm))
        ));
    }

    #[test]
    fn test_missing_lifecycle_is_noop() {
        let mut registry = KindRegistry::new();
        registry.register(TabKind::FeatureForm, ());

        assert!(registry.lifecycle(TabKind::FeatureForm).is_empty());
        assert!(registry.lifecycle(TabKind::Terminal).is_empty());
    }

    #[test]
    fn test_register_with_lifecycle() {
        let mut registry = KindRegistry::new();
        registry.register_with_lifecycle(
            TabKind::Terminal,
            (),
            TabHooks::new().on_unmount(|_, _| Ok(())),
        );

        let hooks = registry.lifecycle(TabKind::Terminal);
        assert!(hooks.get(LifecycleHook::Unmount).is_some());
        assert!(hooks.get(LifecycleHook::Mount).is_none());
    }
}
