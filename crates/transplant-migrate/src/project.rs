//! Project-level bootstrap steps.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{info, warn};
use transplant_platform::{PlatformClient, PlatformError, Scope};

use crate::duplicate::{FailureClass, classify};
use crate::error::MigrateError;
use crate::operation::{CopyContext, Operation};

/// Project fields carried over to a newly created target project.
const PROJECT_FIELDS: &[&str] = &["name", "color", "modules", "description", "tags"];

/// Whether `scope`'s project exists.
pub async fn project_exists(client: &PlatformClient, scope: &Scope) -> Result<bool, PlatformError> {
    match fetch_project(client, scope).await {
        Ok(_) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

async fn fetch_project(client: &PlatformClient, scope: &Scope) -> Result<Value, PlatformError> {
    let path = format!("/ng/api/projects/{}", scope.project);
    let response = client
        .get(&path, &[("orgIdentifier", scope.org.clone())])
        .await?;
    response
        .pointer("/data/project")
        .cloned()
        .ok_or_else(|| PlatformError::InvalidResponse("project response has no data.project".into()))
}

/// Creates the target project from the source project's metadata.
pub struct ProjectBootstrap;

#[async_trait]
impl Operation for ProjectBootstrap {
    fn name(&self) -> &'static str {
        "create project"
    }

    async fn run(&self, ctx: &CopyContext<'_>) -> Result<(), MigrateError> {
        let step = self.name();
        let source_project = fetch_project(ctx.client, ctx.source)
            .await
            .map_err(|source| MigrateError::Step { step, source })?;

        let mut project = Map::new();
        for field in PROJECT_FIELDS {
            if let Some(value) = source_project.get(*field) {
                project.insert((*field).to_string(), value.clone());
            }
        }
        project.insert("identifier".into(), json!(ctx.target.project));
        project.insert("orgIdentifier".into(), json!(ctx.target.org));
        project
            .entry("name")
            .or_insert_with(|| json!(ctx.target.project));

        let result = ctx
            .client
            .post_json(
                "/ng/api/projects",
                &[("orgIdentifier", ctx.target.org.clone())],
                &json!({ "project": project }),
            )
            .await;

        match result {
            Ok(_) => {
                info!(target_scope = %ctx.target, "created target project");
                Ok(())
            }
            Err(err)
                if err.api_body().is_some_and(|(status, body)| {
                    classify(status, body) == FailureClass::BenignDuplicate
                }) =>
            {
                info!(target_scope = %ctx.target, "target project already exists");
                Ok(())
            }
            Err(source) => Err(MigrateError::Step { step, source }),
        }
    }
}

/// Removes the calling user's automatic membership from a new target project.
///
/// The platform adds the creator as a project member; without removal the
/// caller's own membership would be copied as if it were a source user.
pub struct RemoveCurrentUser;

#[async_trait]
impl Operation for RemoveCurrentUser {
    fn name(&self) -> &'static str {
        "remove current user"
    }

    async fn run(&self, ctx: &CopyContext<'_>) -> Result<(), MigrateError> {
        let step = self.name();
        let current = ctx
            .client
            .get("/ng/api/user/currentUser", &[])
            .await
            .map_err(|source| MigrateError::Step { step, source })?;
        let Some(uuid) = current.pointer("/data/uuid").and_then(Value::as_str) else {
            return Err(MigrateError::Step {
                step,
                source: PlatformError::InvalidResponse("current user has no uuid".into()),
            });
        };

        let path = format!("/ng/api/user/{uuid}");
        match ctx.client.delete(&path, &ctx.target.query()).await {
            Ok(_) => {
                info!(target_scope = %ctx.target, "removed current user from target project");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(target_scope = %ctx.target, "current user was not a member of the target project");
                Ok(())
            }
            Err(source) => Err(MigrateError::Step { step, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::MigrationCounters;
    use transplant_platform::ClientConfig;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PlatformClient {
        PlatformClient::new(ClientConfig::new(server.uri(), "pat.test", "acct1")).unwrap()
    }

    async fn mount_source_project(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ng/api/projects/src_proj"))
            .and(query_param("orgIdentifier", "src_org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"project": {
                    "identifier": "src_proj",
                    "orgIdentifier": "src_org",
                    "name": "Payments",
                    "color": "#0063F7",
                    "modules": ["CD", "CF"],
                    "description": "",
                    "tags": {}
                }}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_project_exists() {
        let mock_server = MockServer::start().await;
        mount_source_project(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/ng/api/projects/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "RESOURCE_NOT_FOUND",
                "message": "Project with orgIdentifier [o] and identifier [missing] not found"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        assert!(project_exists(&client, &Scope::new("src_org", "src_proj")).await.unwrap());
        assert!(!project_exists(&client, &Scope::new("o", "missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_copies_metadata() {
        let mock_server = MockServer::start().await;
        mount_source_project(&mock_server).await;
        Mock::given(method("POST"))
            .and(path("/ng/api/projects"))
            .and(query_param("orgIdentifier", "tgt_org"))
            .and(body_json(json!({"project": {
                "identifier": "tgt_proj",
                "orgIdentifier": "tgt_org",
                "name": "Payments",
                "color": "#0063F7",
                "modules": ["CD", "CF"],
                "description": "",
                "tags": {}
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let counters = MigrationCounters::new();
        let (source, target) = (Scope::new("src_org", "src_proj"), Scope::new("tgt_org", "tgt_proj"));
        let ctx = CopyContext {
            client: &client,
            source: &source,
            target: &target,
            counters: &counters,
            show_progress: false,
        };

        ProjectBootstrap.run(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_current_user() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ng/api/user/currentUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"uuid": "u-123", "email": "ops@example.com"}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/ng/api/user/u-123"))
            .and(query_param("orgIdentifier", "tgt_org"))
            .and(query_param("projectIdentifier", "tgt_proj"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let counters = MigrationCounters::new();
        let (source, target) = (Scope::new("src_org", "src_proj"), Scope::new("tgt_org", "tgt_proj"));
        let ctx = CopyContext {
            client: &client,
            source: &source,
            target: &target,
            counters: &counters,
            show_progress: false,
        };

        RemoveCurrentUser.run(&ctx).await.unwrap();
    }
}
