//! Nonce ledger: process-local replay defense (spec §4.3.4).
//!
//! Bounded by `capacity`; once full, the oldest entry is evicted to make
//! room regardless of whether it has expired yet (insertion-order
//! eviction). Expired entries are only purged lazily, on the next
//! `check_and_insert` call that happens to touch them, rather than by a
//! background sweep -- this is a process-local defense with no durability
//! guarantee across restarts (Non-goal, spec §9.5).

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

pub struct NonceLedger {
    capacity: usize,
    ttl: Duration,
    state: Mutex<State>,
}

struct State {
    seen: HashMap<String, Instant>,
    order: VecDeque<String>,
}

impl NonceLedger {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            state: Mutex::new(State {
                seen: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Atomically check whether `nonce` has been seen (and is still within
    /// its TTL) and, if not, record it. Returns `true` if this is the first
    /// time the nonce has been observed.
    pub async fn check_and_insert(&self, nonce: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if let Some(seen_at) = state.seen.get(nonce) {
            if now.duration_since(*seen_at) < self.ttl {
                return false;
            }
            // Expired: fall through and treat as unseen, replacing the stale entry.
            state.seen.remove(nonce);
        }

        state.seen.insert(nonce.to_string(), now);
        state.order.push_back(nonce.to_string());

        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.seen.remove(&oldest);
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_use_is_accepted_second_is_rejected() {
        let ledger = NonceLedger::new(10, Duration::from_secs(300));
        assert!(ledger.check_and_insert("n1").await);
        assert!(!ledger.check_and_insert("n1").await);
    }

    #[tokio::test]
    async fn eviction_makes_room_for_new_entries_at_capacity() {
        let ledger = NonceLedger::new(2, Duration::from_secs(300));
        assert!(ledger.check_and_insert("n1").await);
        assert!(ledger.check_and_insert("n2").await);
        assert!(ledger.check_and_insert("n3").await);
        // n1 was evicted to make room for n3, so it is accepted again.
        assert!(ledger.check_and_insert("n1").await);
    }

    #[tokio::test]
    async fn expired_entry_is_accepted_again() {
        let ledger = NonceLedger::new(10, Duration::from_millis(1));
        assert!(ledger.check_and_insert("n1").await);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(ledger.check_and_insert("n1").await);
    }
}
