//! In-Flight Request Registry
//!
//! Coalesces concurrent misses: at most one origin fetch per key is in flight,
//! and every caller that misses while it runs awaits the same shared result.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::error::FetchError;

/// Result of one origin fetch, shared by all waiters.
pub type FetchOutcome = Result<FetchedValue, FetchError>;

/// A pending origin fetch that any number of callers can await.
pub type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

// == Fetched Value ==
/// The value an origin fetch produced, exactly as produced.
///
/// Waiters asking for the fetcher's own type get a clone of it; the encoded
/// payload, when encoding succeeded, serves waiters asking for another type.
#[derive(Clone)]
pub struct FetchedValue {
    value: Arc<dyn Any + Send + Sync>,
    payload: Option<Arc<String>>,
}

impl FetchedValue {
    pub fn new<T: Any + Send + Sync>(value: T, payload: Option<String>) -> Self {
        Self {
            value: Arc::new(value),
            payload: payload.map(Arc::new),
        }
    }

    /// Clones the value out if it is a `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    /// Encoded form, absent if the value could not be encoded.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for FetchedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedValue")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

struct Slot {
    id: u64,
    fetch: SharedFetch,
}

// == Claim ==
/// What a caller got from the registry for a missed key.
pub enum Claim {
    /// Another caller is already fetching this key
    Joined(SharedFetch),
    /// This caller registered the fetch and must run it, then call
    /// [`Completion::complete`]
    Leader {
        fetch: SharedFetch,
        completion: Completion,
    },
}

// == Registry ==
/// Concurrent map from cache key to the fetch currently computing it.
#[derive(Default)]
pub struct InFlightRegistry {
    slots: DashMap<String, Slot>,
    next_id: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Join Or Register ==
    /// Returns the fetch already registered for `key`, or registers a new one.
    ///
    /// Check and insert happen under the same shard lock, so two callers can
    /// never both become leader for one key.
    pub fn join_or_register(self: &Arc<Self>, key: &str) -> Claim {
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(slot) => Claim::Joined(slot.get().fetch.clone()),
            Entry::Vacant(vacant) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = oneshot::channel::<FetchOutcome>();

                let fetch = async move {
                    rx.await.unwrap_or_else(|_| {
                        Err(FetchError::Panicked(
                            "origin fetch ended without a result".to_string(),
                        ))
                    })
                }
                .boxed()
                .shared();

                vacant.insert(Slot {
                    id,
                    fetch: fetch.clone(),
                });

                Claim::Leader {
                    fetch,
                    completion: Completion {
                        guard: SlotGuard {
                            registry: Arc::clone(self),
                            key: key.to_string(),
                            id,
                        },
                        tx,
                    },
                }
            }
        }
    }

    /// Number of fetches currently in flight.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Checks whether a fetch for `key` is in flight.
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    fn release(&self, key: &str, id: u64) {
        self.slots.remove_if(key, |_, slot| slot.id == id);
    }
}

impl fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("pending", &self.slots.len())
            .finish()
    }
}

// == Completion ==
/// Obligation held by the leader of a fetch.
///
/// Dropping it without completing (e.g. the fetch task panicked) still frees
/// the slot, and waiters observe [`FetchError::Panicked`].
pub struct Completion {
    guard: SlotGuard,
    tx: oneshot::Sender<FetchOutcome>,
}

impl Completion {
    /// Frees the slot, then wakes every waiter with `outcome`.
    pub fn complete(self, outcome: FetchOutcome) {
        let Completion { guard, tx } = self;
        drop(guard);
        // All waiters may already be gone
        let _ = tx.send(outcome);
    }
}

struct SlotGuard {
    registry: Arc<InFlightRegistry>,
    key: String,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.id);
    }
}
