//! Per-kind endpoint descriptors.
//!
//! Every copyable kind is described by a static [`KindDescriptor`]: where to
//! list it, how to find the entity inside a list entry, which entries are
//! platform-managed, whether a detail fetch is needed, and how to build the
//! create request. [`crate::EntityCopy`] drives all kinds from these tables.

use serde_json::{Value, json};
use transplant_platform::Scope;

use crate::EntityKind;
use crate::record::EntityRecord;
use crate::rewrite::{rewrite_document, rewrite_json};

/// Page size requested from paged list endpoints.
pub const PAGE_SIZE: u32 = 100;

/// HTTP method of a list call.
#[derive(Debug, Clone, Copy)]
pub enum ListMethod {
    Get,
    /// POST with a filter body.
    Post(fn() -> Value),
}

/// Paging parameters of a list endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub index_param: &'static str,
    pub size_param: &'static str,
    /// JSON pointer to the total page count in the response.
    pub total_pages: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub method: ListMethod,
    pub path: &'static str,
    /// JSON pointer to the array of entries in the response.
    pub content: &'static str,
    pub paging: Option<Paging>,
    /// Fixed extra query parameters.
    pub query: &'static [(&'static str, &'static str)],
}

/// Kinds listed once per record of a parent kind.
#[derive(Debug, Clone, Copy)]
pub struct ParentSpec {
    pub kind: EntityKind,
    /// Query parameter naming the parent on list, detail and create calls.
    pub param: &'static str,
}

/// Detail fetch for kinds whose list entries are summaries.
#[derive(Debug, Clone, Copy)]
pub struct DetailSpec {
    /// Path with an `{id}` placeholder for the record identifier.
    pub path: &'static str,
    /// JSON pointer to the full record in the response.
    pub data: &'static str,
    /// Query parameters taken from the summary entity: `(param, pointer)`.
    pub query: &'static [(&'static str, &'static str)],
}

/// How the create request body is built from a record.
#[derive(Debug, Clone, Copy)]
pub enum BodySpec {
    /// The entity as JSON, optionally wrapped under a key. `yaml_field`
    /// points at an embedded YAML document that is rewritten as well.
    Json {
        wrap: Option<&'static str>,
        yaml_field: Option<&'static str>,
    },
    /// The YAML document at `field`, sent as `application/yaml`.
    Yaml { field: &'static str },
    /// A body assembled from the record for the `(source, target)` scopes.
    Custom(fn(&EntityRecord, &Scope, &Scope) -> Value),
}

#[derive(Debug, Clone, Copy)]
pub struct CreateSpec {
    pub path: &'static str,
    pub body: BodySpec,
}

/// Everything needed to copy one kind.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub kind: EntityKind,
    pub list: ListSpec,
    pub parent: Option<ParentSpec>,
    pub detail: Option<DetailSpec>,
    pub create: CreateSpec,
    /// Whether the body's scope references are rewritten.
    pub rewrite: bool,
    /// JSON pointer to the entity inside a list entry (`""` for the entry).
    pub entity: &'static str,
    /// Pointers into the list entry; any `true` marks a platform-managed entry.
    pub managed: &'static [&'static str],
    /// Pointers into the entity.
    pub identifier: &'static str,
    pub name: &'static str,
    /// Pointer to the entity's tag map, counted under [`EntityKind::Tag`].
    pub tags: Option<&'static str>,
}

/// A create request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Yaml(String),
}

impl KindDescriptor {
    /// Whether a list entry is a platform-managed default.
    pub fn is_managed(&self, entry: &Value) -> bool {
        self.managed
            .iter()
            .any(|pointer| entry.pointer(pointer).and_then(Value::as_bool) == Some(true))
    }

    /// Build a record from a list entry.
    pub fn to_record(&self, entry: &Value, parent: Option<&str>) -> EntityRecord {
        let entity = entry.pointer(self.entity).cloned().unwrap_or(Value::Null);
        let identifier = entity
            .pointer(self.identifier)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let name = entity
            .pointer(self.name)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(identifier.as_str())
            .to_string();

        EntityRecord {
            kind: self.kind,
            identifier,
            name,
            parent: parent.map(str::to_string),
            entity,
        }
    }

    /// Number of tags carried by a record.
    pub fn tag_count(&self, record: &EntityRecord) -> u64 {
        let Some(pointer) = self.tags else {
            return 0;
        };
        match record.entity.pointer(pointer) {
            Some(Value::Object(map)) => map.len() as u64,
            Some(Value::Array(items)) => items.len() as u64,
            _ => 0,
        }
    }

    /// Build the create body for a record.
    ///
    /// Fails with a message when the record lacks the document to send.
    pub fn build_body(
        &self,
        record: &EntityRecord,
        source: &Scope,
        target: &Scope,
    ) -> Result<RequestBody, String> {
        match self.create.body {
            BodySpec::Json { wrap, yaml_field } => {
                let mut entity = if self.rewrite {
                    rewrite_json(&record.entity, target)
                } else {
                    record.entity.clone()
                };
                if let Some(Value::String(yaml)) =
                    yaml_field.and_then(|field| entity.pointer_mut(field))
                {
                    *yaml = rewrite_document(yaml, source, target).body;
                }
                Ok(RequestBody::Json(match wrap {
                    Some(key) => json!({ key: entity }),
                    None => entity,
                }))
            }
            BodySpec::Yaml { field } => {
                let yaml = record.field(field);
                if yaml.trim().is_empty() {
                    return Err(format!("record has no document at {field}"));
                }
                if self.rewrite {
                    Ok(RequestBody::Yaml(rewrite_document(yaml, source, target).body))
                } else {
                    Ok(RequestBody::Yaml(yaml.to_string()))
                }
            }
            BodySpec::Custom(build) => Ok(RequestBody::Json(build(record, source, target))),
        }
    }
}

/// The descriptor for a kind. Tags have none; they travel with services.
pub fn descriptor(kind: EntityKind) -> Option<&'static KindDescriptor> {
    Some(match kind {
        EntityKind::Connector => &CONNECTOR,
        EntityKind::Environment => &ENVIRONMENT,
        EntityKind::EnvironmentGroup => &ENVIRONMENT_GROUP,
        EntityKind::Service => &SERVICE,
        EntityKind::ServiceOverride => &SERVICE_OVERRIDE,
        EntityKind::Pipeline => &PIPELINE,
        EntityKind::InputSet => &INPUT_SET,
        EntityKind::Template => &TEMPLATE,
        EntityKind::Variable => &VARIABLE,
        EntityKind::FileStore => &FILE_STORE,
        EntityKind::Infrastructure => &INFRASTRUCTURE,
        EntityKind::Tag => return None,
        EntityKind::User => &USER,
        EntityKind::UserGroup => &USER_GROUP,
        EntityKind::ServiceAccount => &SERVICE_ACCOUNT,
        EntityKind::Role => &ROLE,
        EntityKind::RoleAssignment => &ROLE_ASSIGNMENT,
        EntityKind::ResourceGroup => &RESOURCE_GROUP,
        EntityKind::Trigger => &TRIGGER,
        EntityKind::FeatureFlag => &FEATURE_FLAG,
        EntityKind::Target => &TARGET,
        EntityKind::TargetGroup => &TARGET_GROUP,
    })
}

// =============================================================================
// Descriptor tables
// =============================================================================

const NG_PAGING: Option<Paging> = Some(Paging {
    index_param: "pageIndex",
    size_param: "pageSize",
    total_pages: "/data/totalPages",
});

const SPRING_PAGING: Option<Paging> = Some(Paging {
    index_param: "page",
    size_param: "size",
    total_pages: "/data/totalPages",
});

const FF_PAGING: Option<Paging> = Some(Paging {
    index_param: "pageNumber",
    size_param: "pageSize",
    total_pages: "/pageCount",
});

const PLAIN_JSON: BodySpec = BodySpec::Json {
    wrap: None,
    yaml_field: None,
};

const JSON_WITH_YAML: BodySpec = BodySpec::Json {
    wrap: None,
    yaml_field: Some("/yaml"),
};

const ENVIRONMENT_PARENT: Option<ParentSpec> = Some(ParentSpec {
    kind: EntityKind::Environment,
    param: "environmentIdentifier",
});

const HARNESS_MANAGED: &[&str] = &["/harnessManaged"];

fn connector_filter() -> Value {
    json!({ "filterType": "Connector" })
}

fn pipeline_filter() -> Value {
    json!({ "filterType": "PipelineSetup" })
}

fn template_filter() -> Value {
    json!({ "filterType": "Template" })
}

fn environment_group_filter() -> Value {
    json!({ "filterType": "EnvironmentGroup" })
}

fn empty_filter() -> Value {
    json!({})
}

const fn simple(
    kind: EntityKind,
    list: ListSpec,
    entity: &'static str,
    create: CreateSpec,
) -> KindDescriptor {
    KindDescriptor {
        kind,
        list,
        parent: None,
        detail: None,
        create,
        rewrite: true,
        entity,
        managed: &[],
        identifier: "/identifier",
        name: "/name",
        tags: None,
    }
}

static CONNECTOR: KindDescriptor = KindDescriptor {
    managed: HARNESS_MANAGED,
    ..simple(
        EntityKind::Connector,
        ListSpec {
            method: ListMethod::Post(connector_filter),
            path: "/ng/api/connectors/listV2",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "/connector",
        CreateSpec {
            path: "/ng/api/connectors",
            body: BodySpec::Json {
                wrap: Some("connector"),
                yaml_field: None,
            },
        },
    )
};

static ENVIRONMENT: KindDescriptor = simple(
    EntityKind::Environment,
    ListSpec {
        method: ListMethod::Get,
        path: "/ng/api/environmentsV2",
        content: "/data/content",
        paging: SPRING_PAGING,
        query: &[],
    },
    "/environment",
    CreateSpec {
        path: "/ng/api/environmentsV2",
        body: JSON_WITH_YAML,
    },
);

static ENVIRONMENT_GROUP: KindDescriptor = simple(
    EntityKind::EnvironmentGroup,
    ListSpec {
        method: ListMethod::Post(environment_group_filter),
        path: "/ng/api/environmentGroup/list",
        content: "/data/content",
        paging: SPRING_PAGING,
        query: &[],
    },
    "/envGroup",
    CreateSpec {
        path: "/ng/api/environmentGroup",
        body: JSON_WITH_YAML,
    },
);

static VARIABLE: KindDescriptor = simple(
    EntityKind::Variable,
    ListSpec {
        method: ListMethod::Get,
        path: "/ng/api/variables",
        content: "/data/content",
        paging: NG_PAGING,
        query: &[],
    },
    "/variable",
    CreateSpec {
        path: "/ng/api/variables",
        body: BodySpec::Json {
            wrap: Some("variable"),
            yaml_field: None,
        },
    },
);

fn file_store_body(record: &EntityRecord, _source: &Scope, target: &Scope) -> Value {
    json!({
        "identifier": record.identifier,
        "name": record.name,
        "type": record.field("/type"),
        "parentIdentifier": record.field("/parentIdentifier"),
        "description": record.field("/description"),
        "orgIdentifier": target.org,
        "projectIdentifier": target.project,
    })
}

static FILE_STORE: KindDescriptor = KindDescriptor {
    rewrite: false,
    ..simple(
        EntityKind::FileStore,
        ListSpec {
            method: ListMethod::Get,
            path: "/ng/api/file-store",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/ng/api/file-store",
            body: BodySpec::Custom(file_store_body),
        },
    )
};

static INFRASTRUCTURE: KindDescriptor = KindDescriptor {
    parent: ENVIRONMENT_PARENT,
    ..simple(
        EntityKind::Infrastructure,
        ListSpec {
            method: ListMethod::Get,
            path: "/ng/api/infrastructures",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[],
        },
        "/infrastructure",
        CreateSpec {
            path: "/ng/api/infrastructures",
            body: JSON_WITH_YAML,
        },
    )
};

static SERVICE: KindDescriptor = KindDescriptor {
    tags: Some("/tags"),
    ..simple(
        EntityKind::Service,
        ListSpec {
            method: ListMethod::Get,
            path: "/ng/api/servicesV2",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[],
        },
        "/service",
        CreateSpec {
            path: "/ng/api/servicesV2",
            body: JSON_WITH_YAML,
        },
    )
};

fn service_override_body(record: &EntityRecord, source: &Scope, target: &Scope) -> Value {
    json!({
        "orgIdentifier": target.org,
        "projectIdentifier": target.project,
        "environmentIdentifier": record.field("/environmentRef"),
        "serviceIdentifier": record.field("/serviceRef"),
        "yaml": rewrite_document(record.field("/yaml"), source, target).body,
    })
}

static SERVICE_OVERRIDE: KindDescriptor = KindDescriptor {
    parent: ENVIRONMENT_PARENT,
    identifier: "/serviceRef",
    name: "/serviceRef",
    rewrite: false,
    ..simple(
        EntityKind::ServiceOverride,
        ListSpec {
            method: ListMethod::Get,
            path: "/ng/api/environmentsV2/serviceOverrides",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/ng/api/environmentsV2/serviceOverrides",
            body: BodySpec::Custom(service_override_body),
        },
    )
};

static TEMPLATE: KindDescriptor = KindDescriptor {
    detail: Some(DetailSpec {
        path: "/template/api/templates/{id}",
        data: "/data",
        query: &[("versionLabel", "/versionLabel")],
    }),
    ..simple(
        EntityKind::Template,
        ListSpec {
            method: ListMethod::Post(template_filter),
            path: "/template/api/templates/list-metadata",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[("templateListType", "All")],
        },
        "",
        CreateSpec {
            path: "/template/api/templates",
            body: BodySpec::Yaml { field: "/yaml" },
        },
    )
};

static PIPELINE: KindDescriptor = KindDescriptor {
    detail: Some(DetailSpec {
        path: "/pipeline/api/pipelines/{id}",
        data: "/data",
        query: &[],
    }),
    ..simple(
        EntityKind::Pipeline,
        ListSpec {
            method: ListMethod::Post(pipeline_filter),
            path: "/pipeline/api/pipelines/list",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/pipeline/api/pipelines/v2",
            body: BodySpec::Yaml {
                field: "/yamlPipeline",
            },
        },
    )
};

static INPUT_SET: KindDescriptor = KindDescriptor {
    parent: Some(ParentSpec {
        kind: EntityKind::Pipeline,
        param: "pipelineIdentifier",
    }),
    detail: Some(DetailSpec {
        path: "/pipeline/api/inputSets/{id}",
        data: "/data",
        query: &[],
    }),
    ..simple(
        EntityKind::InputSet,
        ListSpec {
            method: ListMethod::Get,
            path: "/pipeline/api/inputSets",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[("inputSetType", "ALL")],
        },
        "",
        CreateSpec {
            path: "/pipeline/api/inputSets",
            body: BodySpec::Yaml {
                field: "/inputSetYaml",
            },
        },
    )
};

fn user_body(record: &EntityRecord, _source: &Scope, _target: &Scope) -> Value {
    json!({
        "emails": [record.identifier],
        "userGroups": [],
        "roleBindings": [],
    })
}

static USER: KindDescriptor = KindDescriptor {
    identifier: "/email",
    rewrite: false,
    ..simple(
        EntityKind::User,
        ListSpec {
            method: ListMethod::Post(empty_filter),
            path: "/ng/api/user/aggregate",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "/user",
        CreateSpec {
            path: "/ng/api/user/users",
            body: BodySpec::Custom(user_body),
        },
    )
};

static USER_GROUP: KindDescriptor = KindDescriptor {
    managed: HARNESS_MANAGED,
    ..simple(
        EntityKind::UserGroup,
        ListSpec {
            method: ListMethod::Get,
            path: "/ng/api/user-groups",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/ng/api/user-groups",
            body: PLAIN_JSON,
        },
    )
};

static SERVICE_ACCOUNT: KindDescriptor = simple(
    EntityKind::ServiceAccount,
    ListSpec {
        method: ListMethod::Get,
        path: "/ng/api/serviceaccount",
        content: "/data",
        paging: None,
        query: &[],
    },
    "",
    CreateSpec {
        path: "/ng/api/serviceaccount",
        body: PLAIN_JSON,
    },
);

static ROLE: KindDescriptor = KindDescriptor {
    managed: HARNESS_MANAGED,
    ..simple(
        EntityKind::Role,
        ListSpec {
            method: ListMethod::Get,
            path: "/authz/api/roles",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "/role",
        CreateSpec {
            path: "/authz/api/roles",
            body: PLAIN_JSON,
        },
    )
};

static RESOURCE_GROUP: KindDescriptor = KindDescriptor {
    managed: HARNESS_MANAGED,
    ..simple(
        EntityKind::ResourceGroup,
        ListSpec {
            method: ListMethod::Get,
            path: "/resourcegroup/api/v2/resourcegroup",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "/resourceGroup",
        CreateSpec {
            path: "/resourcegroup/api/v2/resourcegroup",
            body: BodySpec::Json {
                wrap: Some("resourceGroup"),
                yaml_field: None,
            },
        },
    )
};

static ROLE_ASSIGNMENT: KindDescriptor = KindDescriptor {
    managed: &["/harnessManaged", "/roleAssignment/managed"],
    ..simple(
        EntityKind::RoleAssignment,
        ListSpec {
            method: ListMethod::Get,
            path: "/authz/api/roleassignments",
            content: "/data/content",
            paging: NG_PAGING,
            query: &[],
        },
        "/roleAssignment",
        CreateSpec {
            path: "/authz/api/roleassignments",
            body: PLAIN_JSON,
        },
    )
};

static TRIGGER: KindDescriptor = KindDescriptor {
    parent: Some(ParentSpec {
        kind: EntityKind::Pipeline,
        param: "targetIdentifier",
    }),
    detail: Some(DetailSpec {
        path: "/pipeline/api/triggers/{id}",
        data: "/data",
        query: &[],
    }),
    ..simple(
        EntityKind::Trigger,
        ListSpec {
            method: ListMethod::Get,
            path: "/pipeline/api/triggers",
            content: "/data/content",
            paging: SPRING_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/pipeline/api/triggers",
            body: BodySpec::Yaml { field: "/yaml" },
        },
    )
};

fn feature_flag_body(record: &EntityRecord, _source: &Scope, target: &Scope) -> Value {
    let entity = &record.entity;
    json!({
        "identifier": record.identifier,
        "name": record.name,
        "description": record.field("/description"),
        "kind": record.field("/kind"),
        "permanent": entity.get("permanent").cloned().unwrap_or(Value::Bool(false)),
        "variations": entity.get("variations").cloned().unwrap_or_else(|| json!([])),
        "defaultOnVariation": record.field("/defaultOnVariation"),
        "defaultOffVariation": record.field("/defaultOffVariation"),
        "tags": entity.get("tags").cloned().unwrap_or_else(|| json!([])),
        "project": target.project,
    })
}

static FEATURE_FLAG: KindDescriptor = KindDescriptor {
    rewrite: false,
    ..simple(
        EntityKind::FeatureFlag,
        ListSpec {
            method: ListMethod::Get,
            path: "/cf/admin/features",
            content: "/features",
            paging: FF_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/cf/admin/features",
            body: BodySpec::Custom(feature_flag_body),
        },
    )
};

fn target_body(record: &EntityRecord, _source: &Scope, target: &Scope) -> Value {
    let entity = &record.entity;
    json!({
        "identifier": record.identifier,
        "name": record.name,
        "environment": record.parent,
        "project": target.project,
        "org": target.org,
        "anonymous": entity.get("anonymous").cloned().unwrap_or(Value::Bool(false)),
        "attributes": entity.get("attributes").cloned().unwrap_or_else(|| json!({})),
    })
}

static TARGET: KindDescriptor = KindDescriptor {
    parent: ENVIRONMENT_PARENT,
    rewrite: false,
    ..simple(
        EntityKind::Target,
        ListSpec {
            method: ListMethod::Get,
            path: "/cf/admin/targets",
            content: "/targets",
            paging: FF_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/cf/admin/targets",
            body: BodySpec::Custom(target_body),
        },
    )
};

fn target_group_body(record: &EntityRecord, _source: &Scope, target: &Scope) -> Value {
    let entity = &record.entity;
    let refs = |field: &str| -> Vec<Value> {
        entity
            .get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("identifier").cloned())
                    .collect()
            })
            .unwrap_or_default()
    };
    json!({
        "identifier": record.identifier,
        "name": record.name,
        "environment": record.parent,
        "project": target.project,
        "included": refs("included"),
        "excluded": refs("excluded"),
        "rules": entity.get("rules").cloned().unwrap_or_else(|| json!([])),
        "tags": entity.get("tags").cloned().unwrap_or_else(|| json!([])),
    })
}

static TARGET_GROUP: KindDescriptor = KindDescriptor {
    parent: ENVIRONMENT_PARENT,
    rewrite: false,
    ..simple(
        EntityKind::TargetGroup,
        ListSpec {
            method: ListMethod::Get,
            path: "/cf/admin/segments",
            content: "/segments",
            paging: FF_PAGING,
            query: &[],
        },
        "",
        CreateSpec {
            path: "/cf/admin/segments",
            body: BodySpec::Custom(target_group_body),
        },
    )
};
