//! Keyed per-ride exclusion.
//!
//! Every lifecycle transition is a read-modify-write on one ride's
//! `driver`/`status` pair, so transitions on the *same* ride must serialize
//! while unrelated rides proceed in parallel. The table hands out one async
//! mutex per ride id; the guard is held from before the read until the
//! persisted write and the success/failure decision are final.
//!
//! There is deliberately no global lock and no cross-ride ordering.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use ridehail_proto::RideId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of per-ride exclusion scopes.
///
/// Clone-able handle; clones share the table. Entries are pruned
/// opportunistically once no task holds or awaits them.
#[derive(Clone, Default)]
pub struct RideLocks {
    table: Arc<Mutex<HashMap<RideId, Arc<AsyncMutex<()>>>>>,
}

/// Guard proving exclusive access to one ride's mutable fields.
pub type RideGuard = OwnedMutexGuard<()>;

impl RideLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusion scope for `ride_id`, waiting if another task
    /// holds it. Guards for different rides never contend.
    #[allow(clippy::expect_used)]
    pub async fn acquire(&self, ride_id: RideId) -> RideGuard {
        let entry = {
            let mut table = self.table.lock().expect("lock table poisoned");

            // Drop entries nobody holds or awaits anymore. Keeps the table
            // bounded by the number of rides currently in flight.
            table.retain(|_, lock| Arc::strong_count(lock) > 1);

            Arc::clone(table.entry(ride_id).or_default())
        };

        entry.lock_owned().await
    }

    /// Number of rides with a live exclusion scope.
    #[allow(clippy::expect_used)]
    pub fn active_count(&self) -> usize {
        self.table.lock().expect("lock table poisoned").len()
    }
}

impl std::fmt::Debug for RideLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideLocks").field("active_count", &self.active_count()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn same_ride_serializes() {
        let locks = RideLocks::new();
        let counter = Arc::new(AtomicU32::new(0));
        let ride = RideId(1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(ride).await;
                // Inside the guard, no other task may be inside it too.
                let inside = counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(inside, 0, "two tasks inside the same ride guard");
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_rides_do_not_contend() {
        let locks = RideLocks::new();

        let _guard_a = locks.acquire(RideId(1)).await;
        // Acquiring a different ride while holding the first must not block.
        let _guard_b = locks.acquire(RideId(2)).await;

        assert_eq!(locks.active_count(), 2);
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = RideLocks::new();

        {
            let _guard = locks.acquire(RideId(1)).await;
        }
        // Next acquire sweeps the idle entry before inserting its own.
        let _guard = locks.acquire(RideId(2)).await;

        assert_eq!(locks.active_count(), 1);
    }
}
