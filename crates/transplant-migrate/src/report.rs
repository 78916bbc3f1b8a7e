//! Per-scope outcomes and their console rendering.

use std::fmt::Write;

use transplant_platform::Scope;

use crate::counters::{KindTally, RecordFailure};
use crate::freeze::FreezeReport;

/// How a scope migration ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Copied, validated and frozen.
    Frozen(FreezeReport),
    /// Copying stopped early: enumeration, transport or bootstrap failure.
    CopyFailed(String),
    /// Some kinds did not move every record; the source was left unfrozen.
    ValidationFailed(Vec<KindTally>),
    /// Copy and validation passed but the source could not be frozen.
    FreezeFailed(String),
}

impl MigrationOutcome {
    /// One-line description for logs and the summary table.
    pub fn describe(&self) -> String {
        match self {
            MigrationOutcome::Frozen(report) if report.downgrade_failures.is_empty() => {
                format!("frozen ({})", report.freeze_id)
            }
            MigrationOutcome::Frozen(report) => format!(
                "frozen ({}), {} role assignment(s) not downgraded",
                report.freeze_id,
                report.downgrade_failures.len()
            ),
            MigrationOutcome::CopyFailed(reason) => format!("copy failed: {reason}"),
            MigrationOutcome::ValidationFailed(shortfalls) => {
                let kinds: Vec<String> = shortfalls
                    .iter()
                    .map(|t| format!("{} {}/{}", t.kind, t.moved, t.total))
                    .collect();
                format!("validation failed: {}", kinds.join(", "))
            }
            MigrationOutcome::FreezeFailed(reason) => format!("freeze failed: {reason}"),
        }
    }
}

/// Result of migrating one scope pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub source: Scope,
    pub target: Scope,
    pub outcome: MigrationOutcome,
    /// Per-kind counts for the kinds in scope, in declaration order.
    pub tallies: Vec<KindTally>,
    /// Records that were not copied, in the order they failed.
    pub failures: Vec<RecordFailure>,
}

impl ProjectSummary {
    /// Copied, validated and frozen.
    pub fn successful(&self) -> bool {
        matches!(self.outcome, MigrationOutcome::Frozen(_))
    }
}

/// Per-kind `Total`/`Moved` table for one scope.
pub fn render_status(summary: &ProjectSummary) -> String {
    let rows: Vec<[String; 3]> = summary
        .tallies
        .iter()
        .map(|t| {
            [
                t.kind.heading().to_string(),
                t.total.to_string(),
                t.moved.to_string(),
            ]
        })
        .collect();

    let mut out = format!("{} -> {}\n", summary.source, summary.target);
    out.push_str(&render_table(["Entity", "Total", "Moved"], &rows));
    out
}

/// Entity / identifier / error table of the records a scope failed to copy.
///
/// Empty when every attempted record was copied.
pub fn render_failures(summary: &ProjectSummary) -> String {
    if summary.failures.is_empty() {
        return String::new();
    }

    let rows: Vec<[String; 3]> = summary
        .failures
        .iter()
        .map(|f| {
            [
                f.kind.heading().to_string(),
                f.identifier.clone(),
                f.reason.clone(),
            ]
        })
        .collect();

    let mut out = format!("Failed records in {}\n", summary.source);
    out.push_str(&render_table(["Entity", "Identifier", "Error"], &rows));
    out
}

/// Source / target / success table for a batch.
pub fn render_summary(summaries: &[ProjectSummary]) -> String {
    let rows: Vec<[String; 3]> = summaries
        .iter()
        .map(|s| {
            [
                s.source.to_string(),
                s.target.to_string(),
                if s.successful() { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    render_table(["Source Project", "Target Project", "Successful"], &rows)
}

fn render_table(headers: [&str; 3], rows: &[[String; 3]]) -> String {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: [&str; 3]| {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
        );
    };
    line(&mut out, headers);
    line(
        &mut out,
        [
            &"-".repeat(widths[0]),
            &"-".repeat(widths[1]),
            &"-".repeat(widths[2]),
        ],
    );
    for row in rows {
        line(&mut out, [&row[0], &row[1], &row[2]]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;
    use pretty_assertions::assert_eq;

    fn summary(outcome: MigrationOutcome) -> ProjectSummary {
        ProjectSummary {
            source: Scope::new("src", "payments"),
            target: Scope::new("tgt", "payments"),
            outcome,
            tallies: vec![
                KindTally {
                    kind: EntityKind::Connector,
                    total: 2,
                    moved: 2,
                },
                KindTally {
                    kind: EntityKind::Environment,
                    total: 0,
                    moved: 0,
                },
            ],
            failures: Vec::new(),
        }
    }

    fn frozen() -> MigrationOutcome {
        MigrationOutcome::Frozen(FreezeReport {
            freeze_id: "f1".to_string(),
            downgraded: 1,
            downgrade_failures: Vec::new(),
        })
    }

    #[test]
    fn test_successful_only_when_frozen() {
        assert!(summary(frozen()).successful());
        assert!(!summary(MigrationOutcome::FreezeFailed("x".into())).successful());
        assert!(!summary(MigrationOutcome::ValidationFailed(Vec::new())).successful());
        assert!(!summary(MigrationOutcome::CopyFailed("x".into())).successful());
    }

    #[test]
    fn test_render_status() {
        let expected = "\
src/payments -> tgt/payments
Entity        Total  Moved
------------  -----  -----
Connectors    2      2
Environments  0      0
";
        assert_eq!(render_status(&summary(frozen())), expected);
    }

    #[test]
    fn test_render_summary() {
        let summaries = vec![
            summary(frozen()),
            summary(MigrationOutcome::CopyFailed("boom".into())),
        ];
        let expected = "\
Source Project  Target Project  Successful
--------------  --------------  ----------
src/payments    tgt/payments    yes
src/payments    tgt/payments    no
";
        assert_eq!(render_summary(&summaries), expected);
    }

    #[test]
    fn test_describe_validation_failure() {
        let outcome = MigrationOutcome::ValidationFailed(vec![KindTally {
            kind: EntityKind::Pipeline,
            total: 4,
            moved: 3,
        }]);
        assert_eq!(outcome.describe(), "validation failed: pipeline 3/4");
    }

    #[test]
    fn test_render_failures() {
        let mut summary = summary(MigrationOutcome::ValidationFailed(Vec::new()));
        summary.failures = vec![
            RecordFailure {
                kind: EntityKind::Connector,
                identifier: "github".to_string(),
                reason: "API error (400): INVALID_REQUEST: Secret not found".to_string(),
            },
            RecordFailure {
                kind: EntityKind::Pipeline,
                identifier: "deploy_prod".to_string(),
                reason: "API error (400): Invalid yaml".to_string(),
            },
        ];
        let expected = "\
Failed records in src/payments
Entity      Identifier   Error
----------  -----------  --------------------------------------------------
Connectors  github       API error (400): INVALID_REQUEST: Secret not found
Pipelines   deploy_prod  API error (400): Invalid yaml
";
        assert_eq!(render_failures(&summary), expected);
    }

    #[test]
    fn test_render_failures_empty() {
        assert_eq!(render_failures(&summary(frozen())), "");
    }
}
