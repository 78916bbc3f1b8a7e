//! Per-kind totals and record failures for one scope migration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::EntityKind;

#[derive(Default)]
struct Cell {
    total: AtomicU64,
    moved: AtomicU64,
}

/// Running `(total, moved)` counts per entity kind.
///
/// One instance is built for each scope migration and handed to every copy
/// operation. Counts only ever increase. Records that were seen but not
/// moved are kept with the reason, in the order they failed.
pub struct MigrationCounters {
    cells: [Cell; EntityKind::COUNT],
    failures: Mutex<Vec<RecordFailure>>,
}

impl MigrationCounters {
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| Cell::default()),
            failures: Mutex::new(Vec::new()),
        }
    }

    fn cell(&self, kind: EntityKind) -> &Cell {
        &self.cells[kind.index()]
    }

    /// Count a source record of `kind`.
    pub fn record_seen(&self, kind: EntityKind) {
        self.add_seen(kind, 1);
    }

    /// Count a record of `kind` that now exists in the target scope.
    pub fn record_moved(&self, kind: EntityKind) {
        self.add_moved(kind, 1);
    }

    pub fn add_seen(&self, kind: EntityKind, n: u64) {
        self.cell(kind).total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_moved(&self, kind: EntityKind, n: u64) {
        self.cell(kind).moved.fetch_add(n, Ordering::Relaxed);
    }

    pub fn total(&self, kind: EntityKind) -> u64 {
        self.cell(kind).total.load(Ordering::Relaxed)
    }

    pub fn moved(&self, kind: EntityKind) -> u64 {
        self.cell(kind).moved.load(Ordering::Relaxed)
    }

    pub fn tally(&self, kind: EntityKind) -> KindTally {
        KindTally {
            kind,
            total: self.total(kind),
            moved: self.moved(kind),
        }
    }

    /// Tallies for the given kinds, in the order given.
    pub fn snapshot(&self, kinds: &[EntityKind]) -> Vec<KindTally> {
        kinds.iter().map(|kind| self.tally(*kind)).collect()
    }

    /// Remember a record that did not reach the target.
    pub fn record_failure(&self, kind: EntityKind, identifier: &str, reason: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordFailure {
                kind,
                identifier: identifier.to_string(),
                reason: reason.to_string(),
            });
    }

    pub fn failures(&self) -> Vec<RecordFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MigrationCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time view of one kind's counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindTally {
    pub kind: EntityKind,
    pub total: u64,
    pub moved: u64,
}

/// A source record that was not copied, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub kind: EntityKind,
    pub identifier: String,
    pub reason: String,
}

impl KindTally {
    /// Every source record of this kind is present in the target.
    pub fn is_complete(&self) -> bool {
        self.moved == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_counters_are_zero() {
        let counters = MigrationCounters::new();
        for kind in EntityKind::ALL {
            assert_eq!(counters.total(kind), 0);
            assert_eq!(counters.moved(kind), 0);
        }
    }

    #[test]
    fn test_kinds_are_independent() {
        let counters = MigrationCounters::new();
        counters.record_seen(EntityKind::Connector);
        counters.record_seen(EntityKind::Connector);
        counters.record_moved(EntityKind::Connector);
        counters.add_seen(EntityKind::Tag, 3);

        assert_eq!(
            counters.tally(EntityKind::Connector),
            KindTally {
                kind: EntityKind::Connector,
                total: 2,
                moved: 1
            }
        );
        assert_eq!(counters.total(EntityKind::Tag), 3);
        assert_eq!(counters.total(EntityKind::Environment), 0);
    }

    #[test]
    fn test_snapshot_order() {
        let counters = MigrationCounters::new();
        counters.record_seen(EntityKind::Pipeline);
        let snapshot = counters.snapshot(&[EntityKind::Pipeline, EntityKind::Connector]);
        assert_eq!(snapshot[0].kind, EntityKind::Pipeline);
        assert_eq!(snapshot[0].total, 1);
        assert!(!snapshot[0].is_complete());
        assert!(snapshot[1].is_complete());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments() {
        let counters = std::sync::Arc::new(MigrationCounters::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counters = counters.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    counters.record_seen(EntityKind::Service);
                    counters.record_moved(EntityKind::Service);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(counters.total(EntityKind::Service), 800);
        assert_eq!(counters.moved(EntityKind::Service), 800);
    }

    #[test]
    fn test_failures_kept_in_order() {
        let counters = MigrationCounters::new();
        counters.record_failure(EntityKind::Pipeline, "build", "Invalid yaml");
        counters.record_failure(EntityKind::Connector, "git", "Secret not found");

        let failures = counters.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].kind, EntityKind::Pipeline);
        assert_eq!(failures[0].identifier, "build");
        assert_eq!(failures[1].reason, "Secret not found");
    }
}
