//! Tab Lifecycle State Machine
//!
//! ```text
//! Opening
//!   ↓ mount
//! Background ⇄ Active
//!   ↓ close (from any live state)
//! Closed
//! ```
//!
//! `Closed` is terminal: no hook ever fires for a closed tab again.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabState {
    /// Registered but `onMount` has not run yet
    Opening,
    /// Mounted, not the active tab
    Background,
    /// Mounted and presented to the user
    Active,
    /// Removed from the registry
    Closed,
}

impl TabState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: TabState) -> bool {
        match (self, target) {
            (TabState::Opening, TabState::Background) => true,
            (TabState::Background, TabState::Active) => true,
            (TabState::Active, TabState::Background) => true,
            (TabState::Closed, _) => false,
            (_, TabState::Closed) => true,
            // Same state is a no-op
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    /// Returns true once `onMount` has run and until the tab is closed
    pub fn is_mounted(&self) -> bool {
        matches!(self, TabState::Background | TabState::Active)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TabState::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabState::Opening => "opening",
            TabState::Background => "background",
            TabState::Active => "active",
            TabState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TabState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opening" => Ok(TabState::Opening),
            "background" => Ok(TabState::Background),
            "active" => Ok(TabState::Active),
            "closed" => Ok(TabState::Closed),
            _ => Err(format!("Unknown tab state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(TabState::Opening.can_transition_to(TabState::Background));
        assert!(TabState::Background.can_transition_to(TabState::Active));
        assert!(TabState::Active.can_transition_to(TabState::Background));
        assert!(TabState::Active.can_transition_to(TabState::Closed));
        assert!(TabState::Background.can_transition_to(TabState::Closed));
        assert!(TabState::Opening.can_transition_to(TabState::Closed));
    }

    #[test]
    fn test_invalid_transitions() {
        // Must mount before activation
        assert!(!TabState::Opening.can_transition_to(TabState::Active));
        // Closed is terminal
        assert!(!TabState::Closed.can_transition_to(TabState::Closed));
        assert!(!TabState::Closed.can_transition_to(TabState::Active));
        assert!(!TabState::Background.can_transition_to(TabState::Opening));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Active".parse::<TabState>(), Ok(TabState::Active));
        assert!("frozen".parse::<TabState>().is_err());
        assert!(TabState::Active.is_mounted());
        assert!(!TabState::Opening.is_mounted());
    }
}
