//! Copy operations run by the pipeline.
//!
//! Every entity kind is copied by the same [`EntityCopy`] operation, driven
//! by the kind's [`KindDescriptor`]. Project bootstrap steps implement the
//! same [`Operation`] trait so the pipeline can run one ordered list.

use std::io::Write;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use transplant_platform::{PlatformClient, PlatformError, Query, Scope};

use crate::EntityKind;
use crate::counters::MigrationCounters;
use crate::descriptor::{KindDescriptor, ListMethod, PAGE_SIZE, RequestBody, descriptor};
use crate::duplicate::CreateOutcome;
use crate::error::MigrateError;
use crate::record::EntityRecord;

/// Shared state for the operations of one scope migration.
pub struct CopyContext<'a> {
    pub client: &'a PlatformClient,
    pub source: &'a Scope,
    pub target: &'a Scope,
    pub counters: &'a MigrationCounters,
    /// Write per-kind progress to stderr.
    pub show_progress: bool,
}

/// One step of a scope migration.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run the step. Record-level failures are logged, not returned.
    async fn run(&self, ctx: &CopyContext<'_>) -> Result<(), MigrateError>;
}

// =============================================================================
// Listing
// =============================================================================

/// List every non-managed record of a kind in `scope`.
///
/// Kinds with a parent are listed once per parent record.
pub async fn list_kind(
    client: &PlatformClient,
    desc: &KindDescriptor,
    scope: &Scope,
) -> Result<Vec<EntityRecord>, PlatformError> {
    let Some(parent) = desc.parent else {
        return list_pages(client, desc, scope, None).await;
    };

    let parent_desc = descriptor(parent.kind).ok_or_else(|| {
        PlatformError::InvalidResponse(format!("no listing for parent kind {}", parent.kind))
    })?;
    let parents = list_pages(client, parent_desc, scope, None).await?;

    let mut records = Vec::new();
    for parent_record in &parents {
        let children = list_pages(client, desc, scope, Some(&parent_record.identifier)).await?;
        records.extend(children);
    }
    Ok(records)
}

async fn list_pages(
    client: &PlatformClient,
    desc: &KindDescriptor,
    scope: &Scope,
    parent: Option<&str>,
) -> Result<Vec<EntityRecord>, PlatformError> {
    let mut records = Vec::new();
    let mut page: u64 = 0;

    loop {
        let mut query: Query = scope.query().into();
        query.extend(desc.list.query.iter().map(|(k, v)| (*k, v.to_string())));
        if let (Some(spec), Some(parent)) = (desc.parent, parent) {
            query.push((spec.param, parent.to_string()));
        }
        if let Some(paging) = desc.list.paging {
            query.push((paging.index_param, page.to_string()));
            query.push((paging.size_param, PAGE_SIZE.to_string()));
        }

        let response = match desc.list.method {
            ListMethod::Get => client.get(desc.list.path, &query).await?,
            ListMethod::Post(filter) => {
                client
                    .post_json(desc.list.path, &query, &filter())
                    .await?
            }
        };

        let entries = response
            .pointer(desc.list.content)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for entry in entries {
            let record = desc.to_record(entry, parent);
            if desc.is_managed(entry) {
                warn!(
                    kind = %desc.kind,
                    identifier = %record.identifier,
                    "skipping platform-managed record"
                );
                continue;
            }
            records.push(record);
        }

        page += 1;
        let total_pages = desc
            .list
            .paging
            .and_then(|paging| response.pointer(paging.total_pages))
            .and_then(Value::as_u64)
            .unwrap_or(1);
        if entries.is_empty() || page >= total_pages {
            break;
        }
    }

    debug!(kind = %desc.kind, scope = %scope, count = records.len(), "listed records");
    Ok(records)
}

// =============================================================================
// Entity copy
// =============================================================================

/// Copies every record of one kind from the source to the target scope.
pub struct EntityCopy {
    descriptor: &'static KindDescriptor,
}

impl EntityCopy {
    pub fn new(descriptor: &'static KindDescriptor) -> Self {
        Self { descriptor }
    }

    /// The copy operation for a kind, if it has one.
    pub fn for_kind(kind: EntityKind) -> Option<Self> {
        descriptor(kind).map(Self::new)
    }

    pub fn kind(&self) -> EntityKind {
        self.descriptor.kind
    }

    /// Fetch the full record when list entries are summaries.
    async fn detail(
        &self,
        ctx: &CopyContext<'_>,
        record: EntityRecord,
    ) -> Result<EntityRecord, PlatformError> {
        let Some(detail) = self.descriptor.detail else {
            return Ok(record);
        };

        let path = detail.path.replace("{id}", &record.identifier);
        let mut query: Query = ctx.source.query().into();
        for (param, pointer) in detail.query {
            query.push((*param, record.field(pointer).to_string()));
        }
        if let (Some(spec), Some(parent)) = (self.descriptor.parent, &record.parent) {
            query.push((spec.param, parent.clone()));
        }

        let response = ctx.client.get(&path, &query).await?;
        let entity = response.pointer(detail.data).cloned().ok_or_else(|| {
            PlatformError::InvalidResponse(format!("{} detail has no {}", record.kind, detail.data))
        })?;

        Ok(EntityRecord { entity, ..record })
    }

    async fn copy_record(&self, ctx: &CopyContext<'_>, record: EntityRecord) -> CreateOutcome {
        let desc = self.descriptor;

        let record = match self.detail(ctx, record).await {
            Ok(record) => record,
            Err(err) if err.is_transport() => return CreateOutcome::Transport(err),
            Err(err) => {
                return CreateOutcome::Rejected(transplant_platform::single_line(&err.to_string()));
            }
        };

        let body = match desc.build_body(&record, ctx.source, ctx.target) {
            Ok(body) => body,
            Err(reason) => return CreateOutcome::Rejected(reason),
        };

        let mut query: Query = ctx.target.query().into();
        if let (Some(spec), Some(parent)) = (desc.parent, &record.parent) {
            query.push((spec.param, parent.clone()));
        }

        let result = match body {
            RequestBody::Json(body) => ctx.client.post_json(desc.create.path, &query, &body).await,
            RequestBody::Yaml(body) => ctx.client.post_yaml(desc.create.path, &query, body).await,
        };
        CreateOutcome::from_result(result)
    }
}

#[async_trait]
impl Operation for EntityCopy {
    fn name(&self) -> &'static str {
        self.descriptor.kind.label()
    }

    async fn run(&self, ctx: &CopyContext<'_>) -> Result<(), MigrateError> {
        let desc = self.descriptor;
        let kind = desc.kind;

        let records = list_kind(ctx.client, desc, ctx.source)
            .await
            .map_err(|source| MigrateError::Enumeration {
                kind,
                scope: ctx.source.clone(),
                source,
            })?;

        info!(kind = %kind, source_scope = %ctx.source, count = records.len(), "copying records");
        let mut progress = Progress::new(kind, records.len(), ctx.show_progress);

        for record in records {
            let identifier = record.identifier.clone();
            let tags = desc.tag_count(&record);
            ctx.counters.record_seen(kind);
            ctx.counters.add_seen(EntityKind::Tag, tags);

            info!(
                kind = %kind,
                identifier = %identifier,
                source_scope = %ctx.source,
                target_scope = %ctx.target,
                "copying record"
            );

            let outcome = self.copy_record(ctx, record).await;
            if outcome.is_moved() {
                ctx.counters.record_moved(kind);
                ctx.counters.add_moved(EntityKind::Tag, tags);
            }

            match outcome {
                CreateOutcome::Created => {}
                CreateOutcome::AlreadyExists => {
                    info!(kind = %kind, identifier = %identifier, "already present in target");
                }
                CreateOutcome::Rejected(reason) => {
                    error!(
                        kind = %kind,
                        identifier = %identifier,
                        error = %reason,
                        "failed to copy record"
                    );
                    ctx.counters.record_failure(kind, &identifier, &reason);
                }
                CreateOutcome::Transport(source) => {
                    progress.finish();
                    let reason = transplant_platform::single_line(&source.to_string());
                    ctx.counters.record_failure(kind, &identifier, &reason);
                    return Err(MigrateError::Transport {
                        kind,
                        identifier,
                        source,
                    });
                }
            }
            progress.advance();
        }

        progress.finish();
        Ok(())
    }
}

/// `Heading: n/total` on stderr, rewritten in place.
struct Progress {
    kind: EntityKind,
    done: usize,
    total: usize,
    enabled: bool,
}

impl Progress {
    fn new(kind: EntityKind, total: usize, enabled: bool) -> Self {
        let progress = Self {
            kind,
            done: 0,
            total,
            enabled,
        };
        progress.draw();
        progress
    }

    fn advance(&mut self) {
        self.done += 1;
        self.draw();
    }

    fn draw(&self) {
        if self.enabled {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r{}: {}/{}", self.kind.heading(), self.done, self.total);
            let _ = stderr.flush();
        }
    }

    fn finish(&mut self) {
        if self.enabled {
            eprintln!();
            self.enabled = false;
        }
    }
}
