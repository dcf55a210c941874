//! Lifecycle hook slots supplied when a tab is opened

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::store::TabStore;
use crate::tab::Tab;

/// A hook receives the store (so content can write back into its own tab)
/// and a snapshot of the tab at the moment of the transition.
pub type HookFn = Arc<dyn Fn(&TabStore, &Tab) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleHook {
    #[serde(rename = "onMount")]
    Mount,
    #[serde(rename = "onUnmount")]
    Unmount,
    #[serde(rename = "onActivate")]
    Activate,
    #[serde(rename = "onDeactivate")]
    Deactivate,
}

impl LifecycleHook {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleHook::Mount => "onMount",
            LifecycleHook::Unmount => "onUnmount",
            LifecycleHook::Activate => "onActivate",
            LifecycleHook::Deactivate => "onDeactivate",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default)]
pub struct TabHooks {
    on_mount: Option<HookFn>,
    on_unmount: Option<HookFn>,
    on_activate: Option<HookFn>,
    on_deactivate: Option<HookFn>,
}

impl TabHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_mount<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TabStore, &Tab) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_mount = Some(Arc::new(hook));
        self
    }

    pub fn on_unmount<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TabStore, &Tab) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_unmount = Some(Arc::new(hook));
        self
    }

    pub fn on_activate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TabStore, &Tab) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_activate = Some(Arc::new(hook));
        self
    }

    pub fn on_deactivate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TabStore, &Tab) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_deactivate = Some(Arc::new(hook));
        self
    }

    pub fn get(&self, hook: LifecycleHook) -> Option<&HookFn> {
        match hook {
            LifecycleHook::Mount => self.on_mount.as_ref(),
            LifecycleHook::Unmount => self.on_unmount.as_ref(),
            LifecycleHook::Activate => self.on_activate.as_ref(),
            LifecycleHook::Deactivate => self.on_deactivate.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on_mount.is_none()
            && self.on_unmount.is_none()
            && self.on_activate.is_none()
            && self.on_deactivate.is_none()
    }

    /// Fill every empty slot from `fallback`
    pub fn or(self, fallback: &TabHooks) -> Self {
        Self {
            on_mount: self.on_mount.or_else(|| fallback.on_mount.clone()),
            on_unmount: self.on_unmount.or_else(|| fallback.on_unmount.clone()),
            on_activate: self.on_activate.or_else(|| fallback.on_activate.clone()),
            on_deactivate: self.on_deactivate.or_else(|| fallback.on_deactivate.clone()),
        }
    }
}

impl fmt::Debug for TabHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabHooks")
            .field("on_mount", &self.on_mount.is_some())
            .field("on_unmount", &self.on_unmount.is_some())
            .field("on_activate", &self.on_activate.is_some())
            .field("on_deactivate", &self.on_deactivate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_fills_empty_slots_only() {
        let own = TabHooks::new().on_mount(|_, _| Ok(()));
        let fallback = TabHooks::new()
            .on_mount(|_, _| anyhow::bail!("fallback mount"))
            .on_unmount(|_, _| Ok(()));

        let merged = own.clone().or(&fallback);
        assert!(Arc::ptr_eq(
            merged.get(LifecycleHook::Mount).unwrap(),
            own.get(LifecycleHook::Mount).unwrap()
        ));
        assert!(merged.get(LifecycleHook::Unmount).is_some());
        assert!(merged.get(LifecycleHook::Activate).is_none());
    }

    #[test]
    fn test_hook_names() {
        assert_eq!(LifecycleHook::Deactivate.to_string(), "onDeactivate");
        assert!(TabHooks::new().is_empty());
    }
}
