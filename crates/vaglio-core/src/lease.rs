// ABOUTME: Lease bookkeeping shared by both work pools: expiry policy, sweep, and selection.
// ABOUTME: Expiry is evaluated lazily on every checkout pass; there are no timers.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::eliminated::EliminatedView;

/// Default time a reviewer may hold a unit before it is reclaimed.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(30 * 60);

/// A work item that can be leased to one reviewer at a time.
///
/// A leased item always carries a stamp; `acquire` and `release` are the
/// only transitions that touch it.
pub trait Leasable {
    fn id(&self) -> i64;
    fn is_leased(&self) -> bool;
    fn is_available(&self) -> bool;
    fn lease_stamp(&self) -> Option<f64>;
    fn acquire(&mut self, now: f64);
    /// Return the item to its pre-lease status and clear the stamp.
    fn release(&mut self);
}

/// How long a lease stays valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeasePolicy {
    pub ttl: Duration,
}

impl Default for LeasePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LEASE_TTL,
        }
    }
}

impl LeasePolicy {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(secs),
        }
    }

    /// A lease expires once its age is strictly greater than the TTL.
    pub fn is_expired(&self, stamp: f64, now: f64) -> bool {
        now - stamp > self.ttl.as_secs_f64()
    }
}

/// Seconds since the Unix epoch, the unit lease stamps are stored in.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Release every lease older than the policy allows. A leased item with no
/// stamp is treated as freshly leased. Returns the number of items reclaimed.
pub fn sweep_expired<T: Leasable>(items: &mut [T], policy: &LeasePolicy, now: f64) -> usize {
    let mut reclaimed = 0;
    for item in items.iter_mut().filter(|item| item.is_leased()) {
        let stamp = item.lease_stamp().unwrap_or(now);
        if policy.is_expired(stamp, now) {
            tracing::warn!(id = item.id(), age_secs = now - stamp, "lease expired, reclaiming");
            item.release();
            reclaimed += 1;
        }
    }
    reclaimed
}

/// First available item, in iteration order, that is not eliminated.
pub fn first_available<'a, T: Leasable>(
    items: &'a mut [T],
    eliminated: &EliminatedView,
) -> Option<&'a mut T> {
    items
        .iter_mut()
        .find(|item| item.is_available() && !eliminated.contains(item.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Block, BlockStatus};

    fn leased(id: i64, stamp: f64) -> Block {
        let mut block = Block::new(id);
        block.acquire(stamp);
        block
    }

    #[test]
    fn lease_expires_only_past_ttl() {
        let policy = LeasePolicy::from_secs(1800);
        assert!(!policy.is_expired(1000.0, 2800.0));
        assert!(policy.is_expired(1000.0, 2801.0));
    }

    #[test]
    fn sweep_reclaims_stale_leases() {
        let policy = LeasePolicy::default();
        let now = 10_000.0;
        let mut blocks = vec![leased(1, now - 1801.0), leased(2, now - 60.0)];

        let reclaimed = sweep_expired(&mut blocks, &policy, now);

        assert_eq!(reclaimed, 1);
        assert_eq!(blocks[0].status, BlockStatus::Pending);
        assert!(blocks[0].timestamp_in_progress.is_none());
        assert_eq!(blocks[1].status, BlockStatus::InProgress);
    }

    #[test]
    fn sweep_keeps_unstamped_lease() {
        let mut block = Block::new(1);
        block.status = BlockStatus::InProgress;
        let mut blocks = vec![block];

        assert_eq!(sweep_expired(&mut blocks, &LeasePolicy::default(), 1e9), 0);
        assert_eq!(blocks[0].status, BlockStatus::InProgress);
    }

    #[test]
    fn first_available_skips_eliminated() {
        let mut blocks = vec![Block::new(1), Block::new(2)];
        let eliminated = EliminatedView::from_ids([1]);

        let found = first_available(&mut blocks, &eliminated).map(|b| b.id_domanda);
        assert_eq!(found, Some(2));
    }

    #[test]
    fn epoch_seconds_keeps_subsecond_precision() {
        let at = DateTime::from_timestamp_millis(1_500).unwrap();
        assert_eq!(epoch_seconds(at), 1.5);
    }
}
