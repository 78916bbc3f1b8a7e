//! Running a list of scope pairs.

use serde::Deserialize;
use tracing::{info, warn};
use transplant_platform::Scope;

use crate::pipeline::{MigrationPipeline, ScopePair};
use crate::report::ProjectSummary;

/// One row of batch input, as read from the CSV file.
///
/// Empty cells are treated like missing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScopeRow {
    #[serde(default, alias = "sourceOrg", alias = "Source Org", alias = "source_org")]
    pub source_org: Option<String>,
    #[serde(
        default,
        alias = "sourceProject",
        alias = "Source Project",
        alias = "source_project"
    )]
    pub source_project: Option<String>,
    #[serde(default, alias = "targetOrg", alias = "Target Org", alias = "target_org")]
    pub target_org: Option<String>,
    #[serde(
        default,
        alias = "targetProject",
        alias = "Target Project",
        alias = "target_project"
    )]
    pub target_project: Option<String>,
}

fn present(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

impl ScopeRow {
    /// The scope pair this row names.
    ///
    /// `None` when the source org, source project or target org is missing.
    /// A missing target project defaults to the source project.
    pub fn resolve(&self) -> Option<ScopePair> {
        let source_org = present(&self.source_org)?;
        let source_project = present(&self.source_project)?;
        let target_org = present(&self.target_org)?;
        let target_project = present(&self.target_project).unwrap_or(source_project);

        Some(ScopePair {
            source: Scope::new(source_org, source_project),
            target: Scope::new(target_org, target_project),
        })
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub summaries: Vec<ProjectSummary>,
    /// Rows skipped for missing fields.
    pub skipped: Vec<ScopeRow>,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.summaries.iter().filter(|s| s.successful()).count()
    }
}

/// Migrate every valid row, one scope at a time.
pub async fn run_batch(pipeline: &MigrationPipeline<'_>, rows: Vec<ScopeRow>) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        let Some(pair) = row.resolve() else {
            warn!(
                row = index + 1,
                source_org = ?row.source_org,
                source_project = ?row.source_project,
                target_org = ?row.target_org,
                "skipping row with missing fields"
            );
            report.skipped.push(row);
            continue;
        };

        let summary = pipeline.migrate(&pair).await;
        info!(
            source_scope = %summary.source,
            target_scope = %summary.target,
            successful = summary.successful(),
            outcome = %summary.outcome.describe(),
            "scope migration finished"
        );
        report.summaries.push(summary);
    }

    report
}
