//! Ralph Resource Cache
//!
//! Memoizes expensive, re-derivable data (images, option trees) fetched from the
//! backend. A key has at most one producer running at a time; concurrent callers
//! share its result. Failures are never cached.

mod cache;
mod error;
mod key;

pub use cache::ResourceCache;
pub use error::CacheError;
pub use key::ResourceKey;

pub type Result<T> = std::result::Result<T, CacheError>;
