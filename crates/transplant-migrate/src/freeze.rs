//! Locking the source scope after a verified copy.
//!
//! Freezing is a two-phase call: the freeze is created disabled, then its
//! status is flipped to enabled. After that every remaining role assignment
//! on the source scope is rebound to the project viewer role.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use transplant_platform::{PlatformClient, PlatformError, Query, Scope, single_line};

use crate::EntityKind;
use crate::descriptor::descriptor;
use crate::duplicate::{FailureClass, classify};
use crate::error::MigrateError;
use crate::operation::list_kind;
use crate::record::EntityRecord;

/// Identifier of the freeze created on a source scope.
pub const FREEZE_IDENTIFIER: &str = "transplant_source_freeze";

/// Display name of the freeze.
pub const FREEZE_NAME: &str = "Transplant Source Freeze";

pub const FREEZE_TIME_ZONE: Tz = chrono_tz::America::Los_Angeles;

pub const FREEZE_DURATION: &str = "365d";

/// Role that remaining assignments are rebound to.
pub const VIEWER_ROLE: &str = "_project_viewer";

const START_TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// When the freeze applies.
#[derive(Debug, Clone, PartialEq)]
pub struct FreezeWindow {
    pub time_zone: Tz,
    pub start: DateTime<Tz>,
    pub duration: &'static str,
}

impl FreezeWindow {
    /// A window starting at `now`, in the freeze time zone.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            time_zone: FREEZE_TIME_ZONE,
            start: now.with_timezone(&FREEZE_TIME_ZONE),
            duration: FREEZE_DURATION,
        }
    }

    pub fn now() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Start time as the platform expects it, e.g. `2024-03-01 09:30 AM`.
    pub fn start_time(&self) -> String {
        self.start.format(START_TIME_FORMAT).to_string()
    }
}

#[derive(Serialize)]
struct FreezeRequest<'a> {
    freeze: FreezeSpec<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FreezeSpec<'a> {
    name: &'a str,
    identifier: &'a str,
    entity_configs: Vec<EntityConfig<'a>>,
    status: &'a str,
    org_identifier: &'a str,
    project_identifier: &'a str,
    windows: Vec<WindowSpec>,
}

#[derive(Serialize)]
struct EntityConfig<'a> {
    name: &'a str,
    entities: Vec<EntityFilter<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityFilter<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    filter_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowSpec {
    time_zone: String,
    start_time: String,
    duration: String,
}

/// The YAML body that creates a disabled freeze on `scope`.
pub fn freeze_yaml(scope: &Scope, window: &FreezeWindow) -> Result<String, serde_yaml::Error> {
    let request = FreezeRequest {
        freeze: FreezeSpec {
            name: FREEZE_NAME,
            identifier: FREEZE_IDENTIFIER,
            entity_configs: vec![EntityConfig {
                name: FREEZE_IDENTIFIER,
                entities: vec![
                    EntityFilter {
                        kind: "Service",
                        filter_type: "All",
                    },
                    EntityFilter {
                        kind: "EnvType",
                        filter_type: "All",
                    },
                ],
            }],
            status: "Disabled",
            org_identifier: &scope.org,
            project_identifier: &scope.project,
            windows: vec![WindowSpec {
                time_zone: window.time_zone.name().to_string(),
                start_time: window.start_time(),
                duration: window.duration.to_string(),
            }],
        },
    };
    serde_yaml::to_string(&request)
}

/// What the freeze step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeReport {
    pub freeze_id: String,
    /// Role assignments rebound to the viewer role.
    pub downgraded: usize,
    /// Single-line descriptions of assignments that could not be rebound.
    pub downgrade_failures: Vec<String>,
}

/// Freeze `source` and downgrade its role assignments.
///
/// Failing to create or enable the freeze is an error. Downgrades are
/// best-effort per assignment and reported in the [`FreezeReport`].
pub async fn freeze_source(
    client: &PlatformClient,
    source: &Scope,
    window: &FreezeWindow,
) -> Result<FreezeReport, MigrateError> {
    let fail = |reason: String| MigrateError::Freeze {
        scope: source.clone(),
        reason: single_line(&reason),
    };

    let body = freeze_yaml(source, window).map_err(|e| fail(e.to_string()))?;
    let freeze_id = create_freeze(client, source, body)
        .await
        .map_err(|e| fail(format!("create: {e}")))?;

    let mut query: Query = source.query().into();
    query.push(("status", "Enabled".to_string()));
    client
        .post_json("/ng/api/freeze/updateFreezeStatus", &query, &[freeze_id.as_str()])
        .await
        .map_err(|e| fail(format!("enable: {e}")))?;
    info!(source_scope = %source, freeze_id = %freeze_id, "source scope frozen");

    let (downgraded, downgrade_failures) = downgrade_role_assignments(client, source).await;

    Ok(FreezeReport {
        freeze_id,
        downgraded,
        downgrade_failures,
    })
}

async fn create_freeze(
    client: &PlatformClient,
    source: &Scope,
    body: String,
) -> Result<String, PlatformError> {
    match client.post_yaml("/ng/api/freeze", &source.query(), body).await {
        Ok(response) => Ok(response
            .pointer("/data/identifier")
            .and_then(Value::as_str)
            .unwrap_or(FREEZE_IDENTIFIER)
            .to_string()),
        Err(err)
            if err.api_body().is_some_and(|(status, body)| {
                classify(status, body) == FailureClass::BenignDuplicate
            }) =>
        {
            info!(source_scope = %source, "freeze already exists, enabling it");
            Ok(FREEZE_IDENTIFIER.to_string())
        }
        Err(err) => Err(err),
    }
}

/// Whether an assignment is rebound to the viewer role.
fn needs_downgrade(assignment: &EntityRecord) -> bool {
    let flag = |name: &str| assignment.entity.get(name).and_then(Value::as_bool) == Some(true);
    !flag("disabled")
        && !flag("internal")
        && !flag("managed")
        && assignment.field("/roleIdentifier") != VIEWER_ROLE
}

async fn downgrade_role_assignments(client: &PlatformClient, source: &Scope) -> (usize, Vec<String>) {
    let Some(desc) = descriptor(EntityKind::RoleAssignment) else {
        return (0, Vec::new());
    };
    let assignments = match list_kind(client, desc, source).await {
        Ok(assignments) => assignments,
        Err(err) => {
            let reason = single_line(&err.to_string());
            error!(source_scope = %source, error = %reason, "failed to list role assignments");
            return (0, vec![format!("listing role assignments: {reason}")]);
        }
    };

    let mut downgraded = 0;
    let mut failures = Vec::new();
    for assignment in assignments.iter().filter(|a| needs_downgrade(a)) {
        match downgrade(client, source, assignment).await {
            Ok(()) => downgraded += 1,
            Err(err) => {
                let reason = single_line(&err.to_string());
                warn!(
                    source_scope = %source,
                    identifier = %assignment.identifier,
                    error = %reason,
                    "failed to downgrade role assignment"
                );
                failures.push(format!("{}: {reason}", assignment.identifier));
            }
        }
    }

    info!(source_scope = %source, downgraded, failed = failures.len(), "role assignments downgraded");
    (downgraded, failures)
}

async fn downgrade(
    client: &PlatformClient,
    source: &Scope,
    assignment: &EntityRecord,
) -> Result<(), PlatformError> {
    let path = format!("/authz/api/roleassignments/{}", assignment.identifier);
    client.delete(&path, &source.query()).await?;

    let body = json!({
        "resourceGroupIdentifier": assignment.field("/resourceGroupIdentifier"),
        "roleIdentifier": VIEWER_ROLE,
        "principal": assignment.entity.get("principal").cloned().unwrap_or(Value::Null),
        "disabled": false,
        "managed": false,
    });
    client
        .post_json("/authz/api/roleassignments", &source.query(), &body)
        .await?;
    Ok(())
}
