//! Composite cache keys
//!
//! A key is a resource namespace plus the caller-chosen dimensions that identify
//! one value inside it, e.g. `cropped-image` + `[discipline, label, crop box]`.
//! Keys from different namespaces never compare equal, even when their parts do.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    namespace: &'static str,
    parts: Vec<String>,
}

impl ResourceKey {
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            parts: Vec::new(),
        }
    }

    /// Append one dimension to the key
    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.parts.push(part.to_string());
        self
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        for (i, part) in self.parts.iter().enumerate() {
            let sep = if i == 0 { ':' } else { '|' };
            write!(f, "{}{}", sep, part)?;
        }
        Ok(())
    }
}
