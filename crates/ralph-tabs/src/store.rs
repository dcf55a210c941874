//! Tab Store
//!
//! The single registry of open tabs: their order, the active pointer, and the
//! primitive mutations on them. Each mutation is applied atomically under one
//! write lock, then the lifecycle dispatcher fires the hooks it implies.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::hooks::TabHooks;
use crate::lifecycle::LifecycleDispatcher;
use crate::liveness::{Liveness, LivenessToken};
use crate::tab::{Tab, TabData, TabId, TabMeta, TabSpec};
use crate::Result;

pub(crate) struct Entry {
    pub(crate) tab: Tab,
    pub(crate) hooks: TabHooks,
    pub(crate) liveness: Liveness,
}

impl Entry {
    fn new(tab: Tab, hooks: TabHooks) -> Self {
        let liveness = Liveness::new(tab.id.clone());
        Self {
            tab,
            hooks,
            liveness,
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    /// Open tabs in display order
    pub(crate) entries: Vec<Entry>,
    pub(crate) active: Option<TabId>,
    /// Removed tabs whose unmount is still owed
    pub(crate) closing: VecDeque<Entry>,
}

impl Registry {
    fn position(&self, id: &TabId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.tab.id == id)
    }

    fn entry_mut(&mut self, id: &TabId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| &entry.tab.id == id)
    }

    fn contains(&self, id: &TabId) -> bool {
        self.position(id).is_some()
    }

    fn find_key(&self, key: &str) -> Option<TabId> {
        self.entries
            .iter()
            .find(|entry| entry.tab.key.as_deref() == Some(key))
            .map(|entry| entry.tab.id.clone())
    }

    fn renumber(&mut self) {
        for (order, entry) in self.entries.iter_mut().enumerate() {
            entry.tab.order = order;
        }
    }

    /// Remove every closeable tab matching `pred`. Must run before
    /// `renumber` so `order` still holds the pre-removal positions.
    fn remove_where<P>(&mut self, pred: P) -> Vec<TabId>
    where
        P: Fn(&Tab) -> bool,
    {
        let active_order = self
            .active
            .as_ref()
            .and_then(|id| self.position(id))
            .map(|index| self.entries[index].tab.order);

        let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.tab.closeable && pred(&entry.tab));
        self.entries = kept;

        let mut removed_ids = Vec::with_capacity(removed.len());
        for entry in removed {
            entry.liveness.revoke();
            tracing::info!(tab_id = %entry.tab.id, kind = %entry.tab.kind, "Closed tab");
            removed_ids.push(entry.tab.id.clone());
            self.closing.push_back(entry);
        }

        self.normalize_active(active_order);
        self.renumber();
        removed_ids
    }

    /// Keep the active pointer naming an open tab: the tab now at or after the
    /// old active position, else the rightmost tab, else none.
    fn normalize_active(&mut self, active_order: Option<usize>) {
        if self.active.as_ref().is_some_and(|id| self.contains(id)) {
            return;
        }

        let next = match active_order {
            Some(order) => self
                .entries
                .iter()
                .find(|entry| entry.tab.order > order)
                .or_else(|| self.entries.last()),
            None => self.entries.last(),
        };
        self.active = next.map(|entry| entry.tab.id.clone());
    }

    /// Close the oldest closeable tabs until at most `max` remain
    fn evict_over(&mut self, max: usize, keep: &TabId) {
        while self.entries.len() > max {
            let Some(oldest) = self
                .entries
                .iter()
                .find(|entry| entry.tab.closeable && &entry.tab.id != keep)
                .map(|entry| entry.tab.id.clone())
            else {
                break;
            };

            tracing::info!(tab_id = %oldest, max_tabs = max, "Evicting oldest tab");
            self.remove_where(|tab| tab.id == oldest);
        }
    }
}

pub struct TabStore {
    registry: Arc<RwLock<Registry>>,
    /// Held by a hook-dispatching operation from its mutation until its last
    /// hook returns. The flag is set while hooks are running.
    dispatch: Arc<ReentrantMutex<Cell<bool>>>,
    max_tabs: Option<usize>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::with_max_tabs(None)
    }

    /// A store that evicts its oldest closeable tab when opening would exceed
    /// `max_tabs`
    pub fn with_max_tabs(max_tabs: Option<usize>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            dispatch: Arc::new(ReentrantMutex::new(Cell::new(false))),
            max_tabs,
        }
    }

    pub(crate) fn registry(&self) -> &RwLock<Registry> {
        &self.registry
    }

    /// Serializes hook-dispatching operations across threads. Reentrant, so
    /// a hook may call back into the store on its own thread.
    pub(crate) fn dispatch_lock(&self) -> ReentrantMutexGuard<'_, Cell<bool>> {
        self.dispatch.lock()
    }

    fn dispatch(&self) -> Result<()> {
        LifecycleDispatcher::new(self).run()
    }

    /// Append a tab and make it active
    pub fn open_tab(&self, spec: TabSpec) -> Result<TabId> {
        self.insert_tab(None, spec)
    }

    /// Insert a tab directly after `after` and make it active. Falls back to
    /// appending when `after` is not open.
    pub fn open_tab_after(&self, after: &TabId, spec: TabSpec) -> Result<TabId> {
        self.insert_tab(Some(after), spec)
    }

    fn insert_tab(&self, after: Option<&TabId>, spec: TabSpec) -> Result<TabId> {
        let _serial = self.dispatch_lock();
        let id = {
            let mut registry = self.registry.write();
            let existing = spec.key.as_deref().and_then(|key| registry.find_key(key));

            match existing {
                Some(id) => {
                    tracing::debug!(tab_id = %id, "Tab already open, focusing it");
                    registry.active = Some(id.clone());
                    id
                }
                None => {
                    let (tab, hooks) = Tab::open(spec);
                    let id = tab.id.clone();
                    let kind = tab.kind;

                    let position = match after {
                        Some(anchor) => registry.position(anchor).map(|index| index + 1),
                        None => None,
                    };
                    if position.is_none() {
                        if let Some(anchor) = after {
                            tracing::debug!(anchor = %anchor, "Anchor tab not open, appending");
                        }
                    }
                    let position = position.unwrap_or(registry.entries.len());

                    registry.entries.insert(position, Entry::new(tab, hooks));
                    registry.active = Some(id.clone());
                    registry.renumber();

                    if let Some(max) = self.max_tabs {
                        registry.evict_over(max, &id);
                    }

                    // Eviction may have shifted the new tab left
                    let order = registry.position(&id).unwrap_or(position);
                    tracing::info!(tab_id = %id, kind = %kind, order, "Opened tab");
                    id
                }
            }
        };

        self.dispatch()?;
        Ok(id)
    }

    /// Close one tab. Pinned tabs and unknown ids are left alone.
    pub fn close_tab(&self, id: &TabId) -> Result<()> {
        let _serial = self.dispatch_lock();
        {
            let mut registry = self.registry.write();
            registry.remove_where(|tab| &tab.id == id);
        }
        self.dispatch()
    }

    pub fn close_all(&self) -> Result<()> {
        let _serial = self.dispatch_lock();
        {
            let mut registry = self.registry.write();
            let removed = registry.remove_where(|_| true);
            tracing::info!(count = removed.len(), "Closed all tabs");
        }
        self.dispatch()
    }

    /// Close every tab except `id`, which becomes active
    pub fn close_all_except(&self, id: &TabId) -> Result<()> {
        let _serial = self.dispatch_lock();
        {
            let mut registry = self.registry.write();
            if registry.contains(id) {
                registry.remove_where(|tab| &tab.id != id);
                registry.active = Some(id.clone());
            } else {
                registry.normalize_active(None);
            }
        }
        self.dispatch()
    }

    /// Close every tab to the right of `id`. If the active tab was among them,
    /// `id` becomes active.
    pub fn close_to_right(&self, id: &TabId) -> Result<()> {
        let _serial = self.dispatch_lock();
        {
            let mut registry = self.registry.write();
            let Some(order) = registry.position(id) else {
                return Ok(());
            };

            let previous_active = registry.active.clone();
            let removed = registry.remove_where(|tab| tab.order > order);
            if previous_active.is_some_and(|active| removed.contains(&active)) {
                registry.active = Some(id.clone());
            }
        }
        self.dispatch()
    }

    /// Point the active pointer at `id`; no-op if `id` is not open
    pub fn switch_tab(&self, id: &TabId) -> Result<()> {
        let _serial = self.dispatch_lock();
        {
            let mut registry = self.registry.write();
            if !registry.contains(id) || registry.active.as_ref() == Some(id) {
                return Ok(());
            }
            registry.active = Some(id.clone());
        }
        self.dispatch()
    }

    /// Move the tab at `from` to `to`, keeping everyone else's relative order.
    /// Returns false if nothing moved.
    pub fn reorder_tabs(&self, from: usize, to: usize) -> bool {
        let mut registry = self.registry.write();
        let len = registry.entries.len();
        if from >= len {
            return false;
        }

        let to = to.min(len - 1);
        if from == to {
            return false;
        }

        let entry = registry.entries.remove(from);
        registry.entries.insert(to, entry);
        registry.renumber();

        tracing::debug!(from, to, "Reordered tabs");
        true
    }

    /// Shallow-merge `partial` into the tab's payload. Returns false if `id`
    /// is not open.
    pub fn set_tab_data(&self, id: &TabId, partial: TabData) -> bool {
        match self.registry.write().entry_mut(id) {
            Some(entry) => {
                entry.tab.merge_data(partial);
                true
            }
            None => false,
        }
    }

    /// Title/icon declared by the tab's own content. Returns true only if
    /// something changed, so calling it on every render is cheap.
    pub fn set_tab_meta(&self, id: &TabId, meta: TabMeta) -> bool {
        self.registry
            .write()
            .entry_mut(id)
            .is_some_and(|entry| entry.tab.apply_meta(meta))
    }

    /// Write a late async result back only if the tab that requested it is
    /// still open. Returns whether the write happened.
    pub fn apply_if_live(&self, token: &LivenessToken, partial: TabData) -> bool {
        let mut registry = self.registry.write();
        if !token.is_live() {
            tracing::debug!(tab_id = %token.tab_id(), "Discarding result for closed tab");
            return false;
        }

        match registry.entry_mut(token.tab_id()) {
            Some(entry) => {
                entry.tab.merge_data(partial);
                true
            }
            None => false,
        }
    }

    /// Liveness token for work started on behalf of `id`
    pub fn liveness(&self, id: &TabId) -> Option<LivenessToken> {
        let registry = self.registry.read();
        registry
            .position(id)
            .map(|index| registry.entries[index].liveness.token())
    }

    /// All open tabs in display order
    pub fn tabs(&self) -> Vec<Tab> {
        self.registry
            .read()
            .entries
            .iter()
            .map(|entry| entry.tab.clone())
            .collect()
    }

    pub fn get_tab(&self, id: &TabId) -> Option<Tab> {
        let registry = self.registry.read();
        registry
            .position(id)
            .map(|index| registry.entries[index].tab.clone())
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.registry.read().active.clone()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        let id = self.active_tab_id()?;
        self.get_tab(&id)
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.registry.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.registry.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TabStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TabStore {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            dispatch: Arc::clone(&self.dispatch),
            max_tabs: self.max_tabs,
        }
    }
}
