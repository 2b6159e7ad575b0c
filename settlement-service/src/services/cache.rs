//! Request cache with TTL and in-flight de-duplication.
//!
//! Concurrent lookups for the same key share one load. Successful results
//! are kept for the configured TTL; failures are never stored. Callers that
//! mutate the underlying records must `invalidate` the key afterwards; a load
//! that was already running when the key was invalidated does not repopulate
//! the cache.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::services::metrics::CACHE_LOOKUPS_TOTAL;

type SharedLoad<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum Slot<V, E> {
    Ready { value: V, stored_at: Instant },
    Loading { generation: u64, load: SharedLoad<V, E> },
}

enum Lookup<V, E> {
    Hit(V),
    Join(u64, SharedLoad<V, E>),
    Start,
}

pub struct RequestCache<K, V, E> {
    entries: Arc<DashMap<K, Slot<V, E>>>,
    ttl: Duration,
    next_generation: Arc<AtomicU64>,
}

impl<K, V, E> Clone for RequestCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
            next_generation: Arc::clone(&self.next_generation),
        }
    }
}

impl<K, V, E> RequestCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached value for `key`, join a load already running for it,
    /// or start `load` and share it with anyone who asks meanwhile.
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        // The map guard must be released before awaiting.
        let (generation, pending) = {
            match self.entries.entry(key.clone()) {
                Entry::Occupied(mut occupied) => {
                    let lookup = match occupied.get() {
                        Slot::Ready { value, stored_at } if stored_at.elapsed() < self.ttl => {
                            Lookup::Hit(value.clone())
                        }
                        Slot::Loading { generation, load } => {
                            Lookup::Join(*generation, load.clone())
                        }
                        Slot::Ready { .. } => Lookup::Start,
                    };
                    match lookup {
                        Lookup::Hit(value) => {
                            CACHE_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
                            return Ok(value);
                        }
                        Lookup::Join(generation, pending) => {
                            CACHE_LOOKUPS_TOTAL.with_label_values(&["joined"]).inc();
                            (generation, pending)
                        }
                        Lookup::Start => {
                            CACHE_LOOKUPS_TOTAL.with_label_values(&["loaded"]).inc();
                            let (generation, pending) = self.start(load);
                            occupied.insert(Slot::Loading {
                                generation,
                                load: pending.clone(),
                            });
                            (generation, pending)
                        }
                    }
                }
                Entry::Vacant(vacant) => {
                    CACHE_LOOKUPS_TOTAL.with_label_values(&["loaded"]).inc();
                    let (generation, pending) = self.start(load);
                    vacant.insert(Slot::Loading {
                        generation,
                        load: pending.clone(),
                    });
                    (generation, pending)
                }
            }
        };

        let result = pending.await;
        self.finish(&key, generation, &result);
        result
    }

    /// Drop whatever is cached or loading for `key`.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    fn start<F, Fut>(&self, load: F) -> (u64, SharedLoad<V, E>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        (generation, load().boxed().shared())
    }

    // Every waiter calls this; only the first one for a generation has an effect.
    fn finish(&self, key: &K, generation: u64, result: &Result<V, E>) {
        if let Entry::Occupied(mut occupied) = self.entries.entry(key.clone()) {
            let current = matches!(
                occupied.get(),
                Slot::Loading { generation: g, .. } if *g == generation
            );
            if !current {
                return;
            }
            match result {
                Ok(value) => {
                    occupied.insert(Slot::Ready {
                        value: value.clone(),
                        stored_at: Instant::now(),
                    });
                }
                Err(_) => {
                    occupied.remove();
                }
            }
        }
    }
}
