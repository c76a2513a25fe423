//! In-process exclusive locks keyed by favorites partition.
//!
//! Every rank mutation holds the lock of its `(owner, kind)` partition from
//! the first rank read until commit. Waits are bounded; a timeout surfaces as
//! [`Error::Busy`](crate::Error::Busy).

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::models::Partition;
use crate::{Error, Result};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Table size at which idle partition locks are dropped before adding another.
const PRUNE_THRESHOLD: usize = 256;

/// One partition's lock: `Mutex<bool>` + `Condvar`.
#[derive(Default)]
struct PartitionLock {
    held: Mutex<bool>,
    wake: Condvar,
}

impl PartitionLock {
    fn acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        // The guarded bool is always consistent, so a poisoned mutex is still usable.
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            held = self
                .wake
                .wait_timeout(held, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *held = true;
        true
    }

    fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if *held {
            *held = false;
            self.wake.notify_one();
        }
    }
}

/// Lazily creates one lock per partition and hands out RAII guards.
pub struct PartitionLocks {
    locks: Mutex<HashMap<Partition, Arc<PartitionLock>>>,
    timeout: Duration,
}

impl PartitionLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn get_lock(&self, partition: Partition) -> Arc<PartitionLock> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() >= PRUNE_THRESHOLD && !locks.contains_key(&partition) {
            // Handles are only cloned under this mutex, so a lock the table
            // alone refers to has no holder and no waiter.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(partition).or_default().clone()
    }

    /// Take the exclusive lock of one partition, waiting at most the configured timeout.
    pub fn lock(&self, partition: Partition) -> Result<PartitionGuard> {
        let lock = self.get_lock(partition);
        if !lock.acquire(self.timeout) {
            tracing::warn!(%partition, timeout_ms = self.timeout.as_millis() as u64, "partition lock timed out");
            return Err(Error::Busy(format!("favorites of {} are being modified", partition)));
        }
        Ok(PartitionGuard { partition, lock })
    }

    /// Lock several partitions in ascending order so concurrent callers never deadlock.
    /// Already-acquired guards are released if a later partition times out.
    pub fn lock_all<I>(&self, partitions: I) -> Result<Vec<PartitionGuard>>
    where
        I: IntoIterator<Item = Partition>,
    {
        let ordered: BTreeSet<Partition> = partitions.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for partition in ordered {
            guards.push(self.lock(partition)?);
        }
        Ok(guards)
    }
}

impl Default for PartitionLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

/// Held partition lock; released on drop.
pub struct PartitionGuard {
    partition: Partition,
    lock: Arc<PartitionLock>,
}

impl PartitionGuard {
    pub fn partition(&self) -> Partition {
        self.partition
    }
}

impl Drop for PartitionGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn partition(owner: i64, kind: TargetKind) -> Partition {
        Partition::new(owner, kind)
    }

    #[test]
    fn test_lock_times_out_while_held() {
        let locks = PartitionLocks::new(Duration::from_millis(20));
        let _guard = locks.lock(partition(1, TargetKind::Comic)).unwrap();

        let err = locks.lock(partition(1, TargetKind::Comic)).err().unwrap();
        assert!(err.is_transient());
    }

    #[test]
    fn test_partitions_are_independent() {
        let locks = PartitionLocks::new(Duration::from_millis(20));
        let _comics = locks.lock(partition(1, TargetKind::Comic)).unwrap();

        assert!(locks.lock(partition(1, TargetKind::Novel)).is_ok());
        assert!(locks.lock(partition(2, TargetKind::Comic)).is_ok());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = PartitionLocks::new(Duration::from_millis(20));
        {
            let guard = locks.lock(partition(1, TargetKind::Comic)).unwrap();
            assert_eq!(guard.partition(), partition(1, TargetKind::Comic));
        }
        assert!(locks.lock(partition(1, TargetKind::Comic)).is_ok());
    }

    #[test]
    fn test_lock_all_sorts_and_dedups() {
        let locks = PartitionLocks::default();
        let guards = locks
            .lock_all([
                partition(2, TargetKind::Comic),
                partition(1, TargetKind::Novel),
                partition(2, TargetKind::Comic),
            ])
            .unwrap();

        let held: Vec<Partition> = guards.iter().map(PartitionGuard::partition).collect();
        assert_eq!(held, vec![partition(1, TargetKind::Novel), partition(2, TargetKind::Comic)]);
    }

    #[test]
    fn test_lock_all_releases_on_timeout() {
        let locks = PartitionLocks::new(Duration::from_millis(20));
        let blocker = locks.lock(partition(2, TargetKind::Comic)).unwrap();

        assert!(locks
            .lock_all([partition(1, TargetKind::Comic), partition(2, TargetKind::Comic)])
            .is_err());
        drop(blocker);

        // partition 1 was released when the batch failed
        assert!(locks.lock(partition(1, TargetKind::Comic)).is_ok());
    }

    #[test]
    fn test_idle_locks_are_pruned() {
        let locks = PartitionLocks::new(Duration::from_millis(20));
        let held = locks.lock(partition(0, TargetKind::Comic)).unwrap();

        for owner in 1..=(2 * PRUNE_THRESHOLD as i64) {
            drop(locks.lock(partition(owner, TargetKind::Novel)).unwrap());
        }

        let size = locks.locks.lock().unwrap().len();
        assert!(size <= PRUNE_THRESHOLD, "lock table grew to {size}");
        // the held lock survived pruning and still excludes
        assert!(locks.lock(partition(0, TargetKind::Comic)).is_err());
        drop(held);
        assert!(locks.lock(partition(0, TargetKind::Comic)).is_ok());
    }

    #[test]
    fn test_mutual_exclusion_across_threads() {
        let locks = Arc::new(PartitionLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = locks.lock(partition(1, TargetKind::Comic)).unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
