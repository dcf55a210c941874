//! Resource Cache
//!
//! Keyed memoization of asynchronous producers. A key is either absent, has a
//! cached value, or has exactly one producer in flight that every caller for the
//! key awaits. Entries live until they are invalidated or the cache is cleared. A
//! load that every caller has stopped awaiting is forgotten.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::error::CacheError;
use crate::Result;

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V>>>;

type Slots<K, V> = Mutex<HashMap<K, Slot<V>>>;

enum Slot<V> {
    Ready(V),
    /// `ticket` identifies the population cycle that started the load
    Pending { ticket: u64, load: SharedLoad<V> },
}

pub struct ResourceCache<K, V> {
    slots: Arc<Slots<K, V>>,
    next_ticket: Arc<AtomicU64>,
}

impl<K, V> ResourceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the value for `key`, running `producer` only if the key is neither
    /// cached nor already loading.
    ///
    /// The producer is not called until the returned future is first polled, and
    /// never while the cache lock is held.
    pub async fn get<F, Fut>(&self, key: K, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let (ticket, load) = {
            let mut slots = self.slots.lock();
            match slots.get(&key) {
                Some(Slot::Ready(value)) => return Ok(value.clone()),
                Some(Slot::Pending { ticket, load }) => {
                    tracing::trace!(key = %key, "Joining in-flight resource load");
                    (*ticket, load.clone())
                }
                None => {
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let load =
                        Self::start(Arc::downgrade(&self.slots), key.clone(), ticket, producer);
                    slots.insert(
                        key.clone(),
                        Slot::Pending {
                            ticket,
                            load: load.clone(),
                        },
                    );
                    (ticket, load)
                }
            }
        };

        let mut waiter = Waiter {
            slots: &self.slots,
            key,
            ticket,
            load,
        };
        (&mut waiter.load).await
    }

    fn start<F, Fut>(slots: Weak<Slots<K, V>>, key: K, ticket: u64, producer: F) -> SharedLoad<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        async move {
            tracing::debug!(key = %key, "Loading resource");

            match producer().await {
                Ok(value) => {
                    settle(&slots, &key, ticket, Some(value.clone()));
                    Ok(value)
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Resource load failed");
                    settle(&slots, &key, ticket, None);
                    Err(CacheError::load(key.to_string(), err))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Cached value for `key`, without loading
    pub fn peek(&self, key: &K) -> Option<V> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Store a value directly, superseding any load in flight for the key
    pub fn insert(&self, key: K, value: V) {
        self.slots.lock().insert(key, Slot::Ready(value));
    }

    /// Drop the entry for `key`. A load already in flight still resolves for
    /// its callers but its result is not stored.
    pub fn invalidate(&self, key: &K) -> bool {
        self.slots.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    pub fn is_inflight(&self, key: &K) -> bool {
        matches!(self.slots.lock().get(key), Some(Slot::Pending { .. }))
    }

    /// Number of cached values (loads in flight are not counted)
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replace the in-flight marker with the outcome, unless the entry was
/// invalidated or superseded while the producer ran.
fn settle<K, V>(slots: &Weak<Slots<K, V>>, key: &K, ticket: u64, value: Option<V>)
where
    K: Eq + Hash + Clone,
{
    let Some(slots) = slots.upgrade() else {
        return;
    };
    let mut slots = slots.lock();

    let current = matches!(
        slots.get(key),
        Some(Slot::Pending { ticket: t, .. }) if *t == ticket
    );
    if !current {
        return;
    }

    match value {
        Some(value) => {
            slots.insert(key.clone(), Slot::Ready(value));
        }
        None => {
            slots.remove(key);
        }
    }
}

/// One caller's handle on an in-flight load. If the last caller stops waiting
/// before the producer settles, the pending entry is dropped with it.
struct Waiter<'a, K: Eq + Hash, V> {
    slots: &'a Slots<K, V>,
    key: K,
    ticket: u64,
    load: SharedLoad<V>,
}

impl<K: Eq + Hash, V> Drop for Waiter<'_, K, V> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        // `None` once this handle has seen the result
        let Some(holders) = self.load.strong_count() else {
            return;
        };
        let current = matches!(
            slots.get(&self.key),
            Some(Slot::Pending { ticket, .. }) if *ticket == self.ticket
        );
        // The entry's own clone plus this one
        if current && holders <= 2 {
            slots.remove(&self.key);
            tracing::trace!("Abandoned resource load dropped");
        }
    }
}

impl<K, V> Default for ResourceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for ResourceCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            next_ticket: Arc::clone(&self.next_ticket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<String>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok(value.to_string())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_producer() {
        let cache: ResourceCache<String, String> = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get("img".to_string(), counting(&calls, "first")),
            cache.get("img".to_string(), counting(&calls, "second")),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "first");
        assert_eq!(b.unwrap(), "first");
        assert!(!cache.is_inflight(&"img".to_string()));
    }

    #[tokio::test]
    async fn test_abandoned_load_is_forgotten() {
        let cache: ResourceCache<String, String> = ResourceCache::new();
        let key = "tree".to_string();
        let stalled = || futures_util::future::pending::<anyhow::Result<String>>();

        let mut first = Box::pin(cache.get(key.clone(), stalled));
        assert!((&mut first).now_or_never().is_none());
        let second = cache.get(key.clone(), stalled);
        assert!(second.now_or_never().is_none());
        // The first caller is still waiting
        assert!(cache.is_inflight(&key));

        drop(first);
        assert!(!cache.is_inflight(&key));

        let calls = Arc::new(AtomicUsize::new(0));
        let value = cache
            .get(key.clone(), counting(&calls, "fresh"))
            .await
            .unwrap();
        assert_eq!(value, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_value_skips_producer() {
        let cache: ResourceCache<String, String> = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get("tree".to_string(), counting(&calls, "v1"))
            .await
            .unwrap();
        let again = cache
            .get("tree".to_string(), counting(&calls, "v2"))
            .await
            .unwrap();

        assert_eq!(again, "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.peek(&"tree".to_string()), Some("v1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache: ResourceCache<String, String> = ResourceCache::new();

        let err = cache
            .get("img".to_string(), || async { Err(anyhow::anyhow!("backend offline")) })
            .await
            .unwrap_err();
        assert_eq!(err.key(), "img");
        assert!(err.to_string().contains("backend offline"));
        assert!(cache.peek(&"img".to_string()).is_none());
        assert!(!cache.is_inflight(&"img".to_string()));

        let value = cache
            .get("img".to_string(), || async { Ok("retried".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "retried");
    }

    #[tokio::test]
    async fn test_failure_reaches_every_coalesced_caller() {
        let cache: ResourceCache<String, String> = ResourceCache::new();

        let (a, b) = tokio::join!(
            cache.get("img".to_string(), || async {
                tokio::task::yield_now().await;
                Err(anyhow::anyhow!("decode failed"))
            }),
            cache.get("img".to_string(), || async { Ok("unused".to_string()) }),
        );

        assert!(a.is_err());
        assert!(b.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_during_flight_discards_result() {
        let cache: ResourceCache<String, u32> = ResourceCache::new();
        let key = "tree".to_string();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let (loaded, _) = tokio::join!(
            cache.get(key.clone(), move || async move {
                let _ = rx.await;
                Ok(7)
            }),
            async {
                assert!(cache.is_inflight(&key));
                assert!(cache.invalidate(&key));
                let _ = tx.send(());
            },
        );

        assert_eq!(loaded.unwrap(), 7);
        assert!(cache.peek(&key).is_none());
    }

    #[tokio::test]
    async fn test_distinct_keys_load_independently() {
        let cache: ResourceCache<String, String> = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get("a".to_string(), counting(&calls, "a")),
            cache.get("b".to_string(), counting(&calls, "b")),
        );

        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
