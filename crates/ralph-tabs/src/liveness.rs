//! Per-tab liveness tokens
//!
//! Closing a tab does not abort work it started. Instead the tab's token is
//! revoked before `onUnmount` runs, and any late result checks the token
//! before writing back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::tab::TabId;

#[derive(Debug)]
pub(crate) struct Liveness {
    tab_id: TabId,
    live: Arc<AtomicBool>,
}

impl Liveness {
    pub(crate) fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn token(&self) -> LivenessToken {
        LivenessToken {
            tab_id: self.tab_id.clone(),
            live: Arc::clone(&self.live),
        }
    }

    pub(crate) fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct LivenessToken {
    tab_id: TabId,
    live: Arc<AtomicBool>,
}

impl LivenessToken {
    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    /// False once the originating tab has been closed
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}
