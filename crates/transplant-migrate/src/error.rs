//! Error types for scope migration.

use thiserror::Error;
use transplant_platform::{PlatformError, Scope};

use crate::EntityKind;

/// Errors that stop a scope's migration.
///
/// Record-level create failures never show up here; they are logged and
/// absorbed into the counters.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Source records of a kind could not be enumerated.
    #[error("failed to list {kind} records in {scope}: {source}")]
    Enumeration {
        kind: EntityKind,
        scope: Scope,
        source: PlatformError,
    },

    /// The transport failed while creating a record.
    #[error("transport failure copying {kind} '{identifier}': {source}")]
    Transport {
        kind: EntityKind,
        identifier: String,
        source: PlatformError,
    },

    /// The source project does not exist.
    #[error("source project {0} not found")]
    MissingSourceProject(Scope),

    /// A project bootstrap step failed.
    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        source: PlatformError,
    },

    /// The source scope could not be frozen.
    #[error("failed to freeze {scope}: {reason}")]
    Freeze { scope: Scope, reason: String },
}

impl MigrateError {
    /// Error text with embedded newlines stripped, for log fields.
    pub fn log_text(&self) -> String {
        transplant_platform::single_line(&self.to_string())
    }
}
