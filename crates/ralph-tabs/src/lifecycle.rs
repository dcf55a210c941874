//! Lifecycle Dispatcher
//!
//! After every registry mutation the dispatcher reconciles each tab's
//! [`TabState`] with the registry and fires one hook per transition, in this
//! order:
//!
//! 1. `onDeactivate` for a tab that is `Active` but no longer the active pointer
//! 2. `onUnmount` for removed tabs, in removal order
//! 3. `onMount` for tabs still `Opening`, left to right
//! 4. `onActivate` for the active pointer if it is only `Background`
//!
//! The state change is recorded under the registry lock before the hook runs,
//! so each hook fires at most once per transition. Store operations issued by a
//! hook do not dispatch on their own; the running dispatcher picks up the
//! transitions they cause once the hook returns. Operations on other threads
//! wait until the running dispatch has finished, so every hook error reaches
//! the caller whose operation caused it.

use std::cell::Cell;

use crate::error::TabError;
use crate::hooks::{HookFn, LifecycleHook};
use crate::state::TabState;
use crate::store::{Registry, TabStore};
use crate::tab::Tab;
use crate::Result;

struct PendingHook {
    hook: LifecycleHook,
    tab: Tab,
    handler: Option<HookFn>,
}

impl PendingHook {
    fn fire(self, store: &TabStore) -> Result<()> {
        let Some(handler) = self.handler else {
            return Ok(());
        };

        tracing::debug!(
            tab_id = %self.tab.id,
            hook = %self.hook,
            "Running lifecycle hook"
        );

        handler(store, &self.tab).map_err(|source| TabError::Hook {
            hook: self.hook,
            tab_id: self.tab.id.clone(),
            source,
        })
    }
}

pub(crate) struct LifecycleDispatcher<'a> {
    store: &'a TabStore,
}

/// Clears the dispatching flag even if a hook panics
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<'a> LifecycleDispatcher<'a> {
    pub(crate) fn new(store: &'a TabStore) -> Self {
        Self { store }
    }

    /// Fire every hook owed by the current registry state.
    ///
    /// Stops at the first failing hook and returns its error; hooks still owed
    /// run on the next dispatch.
    pub(crate) fn run(&self) -> Result<()> {
        let dispatching = self.store.dispatch_lock();
        // Already dispatching further up this thread's stack
        if dispatching.get() {
            return Ok(());
        }
        dispatching.set(true);
        let _guard = DispatchGuard(&dispatching);

        loop {
            let next = {
                let mut registry = self.store.registry().write();
                next_hook(&mut registry)?
            };
            match next {
                Some(pending) => pending.fire(self.store)?,
                None => return Ok(()),
            }
        }
    }
}

fn next_hook(registry: &mut Registry) -> Result<Option<PendingHook>> {
    let active = registry.active.clone();

    // A removed tab that was active is deactivated before it unmounts
    if let Some(entry) = registry
        .closing
        .iter_mut()
        .find(|entry| entry.tab.state == TabState::Active)
    {
        entry.tab.transition_to(TabState::Background)?;
        return Ok(Some(entry.pending(LifecycleHook::Deactivate)));
    }

    if let Some(entry) = registry.entries.iter_mut().find(|entry| {
        entry.tab.state == TabState::Active && Some(&entry.tab.id) != active.as_ref()
    }) {
        entry.tab.transition_to(TabState::Background)?;
        return Ok(Some(entry.pending(LifecycleHook::Deactivate)));
    }

    if let Some(entry) = registry.closing.front_mut() {
        // Removed before this dispatch reached its mount: mount it now so the
        // unmount below always pairs with one
        if entry.tab.state == TabState::Opening {
            entry.tab.transition_to(TabState::Background)?;
            return Ok(Some(entry.pending(LifecycleHook::Mount)));
        }
    }

    if let Some(mut entry) = registry.closing.pop_front() {
        entry.tab.transition_to(TabState::Closed)?;
        return Ok(Some(entry.pending(LifecycleHook::Unmount)));
    }

    if let Some(entry) = registry
        .entries
        .iter_mut()
        .find(|entry| entry.tab.state == TabState::Opening)
    {
        entry.tab.transition_to(TabState::Background)?;
        return Ok(Some(entry.pending(LifecycleHook::Mount)));
    }

    if let Some(active) = active {
        if let Some(entry) = registry
            .entries
            .iter_mut()
            .find(|entry| entry.tab.id == active && entry.tab.state == TabState::Background)
        {
            entry.tab.transition_to(TabState::Active)?;
            return Ok(Some(entry.pending(LifecycleHook::Activate)));
        }
    }

    Ok(None)
}

impl crate::store::Entry {
    fn pending(&self, hook: LifecycleHook) -> PendingHook {
        PendingHook {
            hook,
            tab: self.tab.clone(),
            handler: self.hooks.get(hook).cloned(),
        }
    }
}
