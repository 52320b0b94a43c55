//! Per-session rate limiting.
//!
//! Counters are keyed by the opaque sid and live behind the [`CounterStore`]
//! trait. The bundled [`InMemoryCounterStore`] gives single-instance
//! semantics; multi-instance deploys need a shared store behind the same
//! trait.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Login attempts allowed per window.
pub const LOGIN_MAX: u32 = 5;
/// Login window.
pub const LOGIN_WINDOW: Duration = Duration::from_secs(5);

/// Password-reset requests allowed per window.
pub const RESET_REQUEST_MAX: u32 = 3;
/// Password-reset request window.
pub const RESET_REQUEST_WINDOW: Duration = Duration::from_secs(300);

/// Mutations (create user/vendor/package, settings) allowed per window.
pub const MUTATION_MAX: u32 = 5;
/// Mutation window.
pub const MUTATION_WINDOW: Duration = Duration::from_secs(5);

/// A counter with its expiry deadline.
#[derive(Debug, Clone, Copy)]
pub struct CounterEntry {
    /// Number of hits recorded in the live window.
    pub count: u32,
    /// When the window expires.
    pub expires_at: Instant,
}

/// Storage for rate-limit counters.
///
/// `get` must not return expired entries. `put` stores the counter and
/// resets its TTL.
pub trait CounterStore: Send + Sync {
    /// Get the live counter for a key, if any.
    fn get(&self, key: &str) -> Option<CounterEntry>;

    /// Store a counter with a fresh TTL.
    fn put(&self, key: &str, count: u32, ttl: Duration);
}

/// Process-local counter store backed by a mutexed map.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl InMemoryCounterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn get(&self, key: &str) -> Option<CounterEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(*entry),
            Some(_) => {
                // Expired: drop it so the map doesn't grow unbounded.
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, count: u32, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            key.to_owned(),
            CounterEntry {
                count,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

/// Returned when a key has exhausted its budget for the live window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    /// How long until the window resets.
    pub retry_after: Duration,
}

/// Rate limiter over an injected counter store.
pub struct RateLimiter {
    store: Box<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a limiter over the given store.
    #[must_use]
    pub fn new(store: Box<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Record a hit for `key` and check it against the budget.
    ///
    /// Reaching `max` hits inside a live window rejects further hits until
    /// the TTL expires, which implicitly resets the counter. Each recorded
    /// hit refreshes the TTL.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded` with the time until the window resets.
    pub fn check_and_increment(
        &self,
        key: &str,
        max: u32,
        window: Duration,
    ) -> Result<(), RateLimitExceeded> {
        match self.store.get(key) {
            Some(entry) if entry.count >= max => Err(RateLimitExceeded {
                retry_after: entry.expires_at.saturating_duration_since(Instant::now()),
            }),
            Some(entry) => {
                self.store.put(key, entry.count + 1, window);
                Ok(())
            }
            None => {
                self.store.put(key, 1, window);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Box::new(InMemoryCounterStore::new()))
    }

    #[test]
    fn test_allows_up_to_max_hits() {
        let limiter = limiter();
        for _ in 0..5 {
            assert!(
                limiter
                    .check_and_increment("login:abc", 5, Duration::from_secs(60))
                    .is_ok()
            );
        }
        assert!(
            limiter
                .check_and_increment("login:abc", 5, Duration::from_secs(60))
                .is_err()
        );
    }

    #[test]
    fn test_rejection_reports_retry_after() {
        let limiter = limiter();
        for _ in 0..2 {
            limiter
                .check_and_increment("k", 2, Duration::from_secs(60))
                .expect("within budget");
        }
        let err = limiter
            .check_and_increment("k", 2, Duration::from_secs(60))
            .expect_err("over budget");
        assert!(err.retry_after <= Duration::from_secs(60));
        assert!(err.retry_after > Duration::from_secs(50));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter();
        limiter
            .check_and_increment("login:a", 1, Duration::from_secs(60))
            .expect("first hit ok");
        assert!(
            limiter
                .check_and_increment("login:a", 1, Duration::from_secs(60))
                .is_err()
        );
        assert!(
            limiter
                .check_and_increment("login:b", 1, Duration::from_secs(60))
                .is_ok()
        );
    }

    #[test]
    fn test_expired_window_resets_counter() {
        let limiter = limiter();
        limiter
            .check_and_increment("k", 1, Duration::from_millis(10))
            .expect("first hit ok");
        assert!(
            limiter
                .check_and_increment("k", 1, Duration::from_millis(10))
                .is_err()
        );

        std::thread::sleep(Duration::from_millis(20));

        assert!(
            limiter
                .check_and_increment("k", 1, Duration::from_millis(10))
                .is_ok()
        );
    }
}
