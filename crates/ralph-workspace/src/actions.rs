//! Tab actions
//!
//! The named operations UI call sites use. Each one is a direct composition of
//! [`TabStore`] operations; the facade keeps no state of its own beyond what it
//! needs to build new terminal tabs.

use ralph_tabs::{TabHooks, TabId, TabSpec, TabStore};

use crate::terminal::{default_terminal_tab, terminal_tab, TerminalParams};
use crate::Result;

pub struct TabActions {
    store: TabStore,
    new_terminal_title: String,
    terminal_hooks: TabHooks,
}

impl TabActions {
    pub fn new(store: TabStore, new_terminal_title: impl Into<String>) -> Self {
        Self {
            store,
            new_terminal_title: new_terminal_title.into(),
            terminal_hooks: TabHooks::default(),
        }
    }

    /// Hooks given to every terminal tab this facade opens
    pub fn with_terminal_hooks(mut self, hooks: TabHooks) -> Self {
        self.terminal_hooks = hooks;
        self
    }

    pub fn switch_tab(&self, id: &TabId) -> Result<()> {
        Ok(self.store.switch_tab(id)?)
    }

    pub fn close_tab(&self, id: &TabId) -> Result<()> {
        Ok(self.store.close_tab(id)?)
    }

    pub fn close_all(&self) -> Result<()> {
        Ok(self.store.close_all()?)
    }

    pub fn close_others(&self, id: &TabId) -> Result<()> {
        Ok(self.store.close_all_except(id)?)
    }

    pub fn close_to_right(&self, id: &TabId) -> Result<()> {
        Ok(self.store.close_to_right(id)?)
    }

    /// Open a plain terminal at the end of the strip
    pub fn new_terminal(&self) -> Result<TabId> {
        Ok(self.store.open_tab(self.plain_terminal())?)
    }

    /// Open a plain terminal directly after `id`
    pub fn new_tab_to_right(&self, id: &TabId) -> Result<TabId> {
        Ok(self.store.open_tab_after(id, self.plain_terminal())?)
    }

    /// Open a terminal launched with `params`
    pub fn open_terminal(&self, params: TerminalParams, title: Option<String>) -> Result<TabId> {
        let spec = terminal_tab(params, title)?;
        Ok(self.store.open_tab(self.with_hooks(spec))?)
    }

    pub fn reorder_tabs(&self, from: usize, to: usize) -> bool {
        self.store.reorder_tabs(from, to)
    }

    fn plain_terminal(&self) -> TabSpec {
        self.with_hooks(default_terminal_tab(self.new_terminal_title.as_str()))
    }

    fn with_hooks(&self, spec: TabSpec) -> TabSpec {
        let hooks = spec.hooks.clone().or(&self.terminal_hooks);
        spec.with_hooks(hooks)
    }
}

impl Clone for TabActions {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            new_terminal_title: self.new_terminal_title.clone(),
            terminal_hooks: self.terminal_hooks.clone(),
        }
    }
}
