//! The gate between copying and freezing.

use crate::{FeatureAreas, KindTally, MigrationCounters};

/// Outcome of checking a scope's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Tallies for every kind in scope for the run.
    pub tallies: Vec<KindTally>,
}

impl ValidationReport {
    /// Whether every in-scope kind moved all of its records.
    pub fn passed(&self) -> bool {
        self.tallies.iter().all(KindTally::is_complete)
    }

    /// Kinds that fell short.
    pub fn shortfalls(&self) -> Vec<KindTally> {
        self.tallies
            .iter()
            .filter(|tally| !tally.is_complete())
            .copied()
            .collect()
    }
}

/// Check that every kind enabled by `areas` has `moved == total`.
///
/// Kinds outside the enabled areas are ignored even if they were counted.
pub fn validate(counters: &MigrationCounters, areas: FeatureAreas) -> ValidationReport {
    ValidationReport {
        tallies: counters.snapshot(&areas.kinds()),
    }
}
