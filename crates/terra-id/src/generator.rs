/*
 * generator.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Injectable id generators.
 */

//! Id generators.
//!
//! There is no process-wide generator. Whoever creates entities owns a
//! generator and passes it down, which keeps tests deterministic.
//!
//! Both generators guarantee that ids produced by the same instance compare
//! strictly increasing in production order.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::{NoContext, Timestamp, Uuid};

/// A source of fresh, increasing UUIDs.
///
/// Implementations must be `Send + Sync` so one generator can be shared by
/// concurrent request handlers.
pub trait IdGenerator: Send + Sync {
    /// Produce the next id. Must be strictly greater than every id previously
    /// produced by this generator.
    fn next_uuid(&self) -> Uuid;
}

/// Time-ordered UUIDv7 generator.
///
/// Within the same millisecond (or if the clock goes backwards) the previous
/// id is incremented instead, so ordering never regresses.
#[derive(Debug, Default)]
pub struct MonotonicGenerator {
    last: Mutex<u128>,
}

impl MonotonicGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for MonotonicGenerator {
    fn next_uuid(&self) -> Uuid {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let candidate = Uuid::new_v7(Timestamp::from_unix(
            NoContext,
            now.as_secs(),
            now.subsec_nanos(),
        ))
        .as_u128();

        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = if candidate > *last {
            candidate
        } else {
            *last + 1
        };
        *last = next;
        Uuid::from_u128(next)
    }
}

/// Deterministic generator yielding `1, 2, 3, ...` as UUIDs.
#[derive(Debug, Default)]
pub struct SequentialGenerator {
    counter: AtomicU64,
}

impl SequentialGenerator {
    /// Create a generator whose first id is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator whose first id is `start + 1`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_uuid(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Uuid::from_u128(u128::from(n))
    }
}
