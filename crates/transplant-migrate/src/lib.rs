//! Scope migration for the delivery platform.
//!
//! Copies the configuration entities of one organization+project scope into
//! another, checks that every record arrived, then freezes the source.
//!
//! The flow for one scope pair lives in [`MigrationPipeline`]; [`run_batch`]
//! runs a list of pairs one after another.

pub mod batch;
pub mod counters;
pub mod descriptor;
pub mod duplicate;
pub mod error;
pub mod freeze;
pub mod kind;
pub mod operation;
pub mod pipeline;
pub mod project;
pub mod record;
pub mod report;
pub mod rewrite;
pub mod validation;

pub use batch::{BatchReport, ScopeRow, run_batch};
pub use counters::{KindTally, MigrationCounters, RecordFailure};
pub use descriptor::{KindDescriptor, descriptor};
pub use duplicate::{CreateOutcome, FailureClass, classify};
pub use error::MigrateError;
pub use freeze::{FreezeReport, FreezeWindow, freeze_source};
pub use kind::{EntityKind, Family, FeatureAreas};
pub use operation::{CopyContext, EntityCopy, Operation};
pub use pipeline::{MigrationOptions, MigrationPipeline, ScopePair};
pub use record::EntityRecord;
pub use report::{
    MigrationOutcome, ProjectSummary, render_failures, render_status, render_summary,
};
pub use rewrite::{RewritePath, Rewritten, rewrite_document, rewrite_json};
pub use validation::{ValidationReport, validate};
