//! The per-scope migration pipeline.
//!
//! A scope pair is migrated in three stages: copy every in-scope kind in
//! dependency order, check the counters, and freeze the source only if every
//! kind moved all of its records.

use tracing::{error, info, instrument, warn};
use transplant_platform::{PlatformClient, Scope};

use crate::counters::MigrationCounters;
use crate::error::MigrateError;
use crate::freeze::{FreezeWindow, freeze_source};
use crate::kind::FeatureAreas;
use crate::operation::{CopyContext, EntityCopy, Operation};
use crate::project::{ProjectBootstrap, RemoveCurrentUser, project_exists};
use crate::report::{MigrationOutcome, ProjectSummary};
use crate::validation::validate;

/// Run-wide toggles.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    pub areas: FeatureAreas,
    pub show_progress: bool,
}

/// A source scope and the scope it is copied into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePair {
    pub source: Scope,
    pub target: Scope,
}

pub struct MigrationPipeline<'a> {
    client: &'a PlatformClient,
    options: MigrationOptions,
}

impl<'a> MigrationPipeline<'a> {
    pub fn new(client: &'a PlatformClient, options: MigrationOptions) -> Self {
        Self { client, options }
    }

    /// Operations for one scope, in the order they run.
    ///
    /// Project creation and removal of the creator's membership only run
    /// when the target project does not exist yet.
    pub fn plan(areas: FeatureAreas, target_exists: bool) -> Vec<Box<dyn Operation>> {
        let mut operations: Vec<Box<dyn Operation>> = Vec::new();
        if !target_exists {
            operations.push(Box::new(ProjectBootstrap));
            operations.push(Box::new(RemoveCurrentUser));
        }
        for kind in areas.copy_order() {
            if let Some(copy) = EntityCopy::for_kind(kind) {
                operations.push(Box::new(copy));
            }
        }
        operations
    }

    /// Migrate one scope pair to completion.
    ///
    /// Never returns an error: every failure is folded into the summary's
    /// outcome so the batch can continue with the next pair.
    #[instrument(skip(self, pair), fields(source_scope = %pair.source, target_scope = %pair.target))]
    pub async fn migrate(&self, pair: &ScopePair) -> ProjectSummary {
        let counters = MigrationCounters::new();
        let areas = self.options.areas;

        let outcome = match self.copy(pair, &counters).await {
            Err(err) => {
                error!(error = %err.log_text(), "copy stopped");
                MigrationOutcome::CopyFailed(err.log_text())
            }
            Ok(()) => {
                let report = validate(&counters, areas);
                for tally in &report.tallies {
                    info!(
                        kind = %tally.kind,
                        total = tally.total,
                        moved = tally.moved,
                        "migration status"
                    );
                }

                if report.passed() {
                    match freeze_source(self.client, &pair.source, &FreezeWindow::now()).await {
                        Ok(freeze) => MigrationOutcome::Frozen(freeze),
                        Err(err) => {
                            error!(error = %err.log_text(), "freeze failed");
                            MigrationOutcome::FreezeFailed(err.log_text())
                        }
                    }
                } else {
                    warn!(
                        shortfalls = report.shortfalls().len(),
                        "validation failed, source left unfrozen"
                    );
                    MigrationOutcome::ValidationFailed(report.shortfalls())
                }
            }
        };

        ProjectSummary {
            source: pair.source.clone(),
            target: pair.target.clone(),
            outcome,
            tallies: counters.snapshot(&areas.kinds()),
            failures: counters.failures(),
        }
    }

    async fn copy(&self, pair: &ScopePair, counters: &MigrationCounters) -> Result<(), MigrateError> {
        let source_exists = project_exists(self.client, &pair.source)
            .await
            .map_err(|source| MigrateError::Step {
                step: "check source project",
                source,
            })?;
        if !source_exists {
            return Err(MigrateError::MissingSourceProject(pair.source.clone()));
        }

        let target_exists = project_exists(self.client, &pair.target)
            .await
            .map_err(|source| MigrateError::Step {
                step: "check target project",
                source,
            })?;

        let ctx = CopyContext {
            client: self.client,
            source: &pair.source,
            target: &pair.target,
            counters,
            show_progress: self.options.show_progress,
        };

        for operation in Self::plan(self.options.areas, target_exists) {
            info!(operation = operation.name(), "running");
            operation.run(&ctx).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(operations: &[Box<dyn Operation>]) -> Vec<&'static str> {
        operations.iter().map(|op| op.name()).collect()
    }

    #[test]
    fn test_plan_for_new_target_feature_flags() {
        let areas = FeatureAreas {
            continuous_delivery: false,
            feature_flags: true,
        };
        assert_eq!(
            names(&MigrationPipeline::plan(areas, false)),
            vec![
                "create project",
                "remove current user",
                "connector",
                "environment",
                "environment group",
                "feature flag",
                "target",
                "target group",
            ]
        );
    }

    #[test]
    fn test_plan_for_existing_target_skips_bootstrap() {
        let areas = FeatureAreas {
            continuous_delivery: true,
            feature_flags: false,
        };
        let plan = names(&MigrationPipeline::plan(areas, true));
        assert_eq!(plan.first(), Some(&"connector"));
        assert_eq!(plan.last(), Some(&"trigger"));
        assert_eq!(plan.len(), 18);
        assert!(!plan.contains(&"tag"));
    }

    #[test]
    fn test_plan_without_areas_only_bootstraps() {
        let plan = names(&MigrationPipeline::plan(FeatureAreas::default(), false));
        assert_eq!(plan, vec!["create project", "remove current user"]);
    }
}
