//! Client-side state mirror
//!
//! A consumer holding a local copy of server state (its cart, its order
//! list) wraps it in a [`StateCache`]: reads go stale after a deadline,
//! optimistic local mutations are allowed, and `reconcile` replaces the
//! whole copy with server truth. A failed reconciliation discards the local
//! copy outright, so optimistic mutations never outlive a failed round-trip.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct StateCache<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    stale_after: Duration,
}

impl<T> StateCache<T> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            stale_after,
        }
    }

    /// The cached value, or `None` when nothing fresh is held. Stale data is
    /// withheld so callers reconcile instead of rendering it.
    pub fn get(&self) -> Option<&T> {
        if self.is_stale() {
            None
        } else {
            self.value.as_ref()
        }
    }

    pub fn is_stale(&self) -> bool {
        match self.fetched_at {
            Some(at) => at.elapsed() >= self.stale_after,
            None => true,
        }
    }

    /// Applies a local mutation ahead of the server round-trip. No-op when
    /// nothing is cached. The change survives only until the next
    /// reconciliation.
    pub fn apply_optimistic(&mut self, mutate: impl FnOnce(&mut T)) {
        if let Some(value) = self.value.as_mut() {
            mutate(value);
        }
    }

    /// Replaces local state with fetched truth. On fetch failure the local
    /// copy (including optimistic mutations) is dropped and the error is
    /// returned.
    pub fn reconcile<E>(&mut self, fetch: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        match fetch() {
            Ok(value) => {
                self.fetched_at = Some(Instant::now());
                Ok(self.value.insert(value))
            }
            Err(e) => {
                self.invalidate();
                Err(e)
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.value = None;
        self.fetched_at = None;
    }
}
