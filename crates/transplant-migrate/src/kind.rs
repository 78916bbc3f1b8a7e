//! Entity kinds and the feature areas that select them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every kind of project-scoped entity the pipeline knows how to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Connector,
    Environment,
    EnvironmentGroup,
    Service,
    ServiceOverride,
    Pipeline,
    InputSet,
    Template,
    Variable,
    FileStore,
    Infrastructure,
    Tag,
    User,
    UserGroup,
    ServiceAccount,
    Role,
    RoleAssignment,
    ResourceGroup,
    Trigger,
    FeatureFlag,
    Target,
    TargetGroup,
}

/// Which feature area a kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Needed by both delivery and feature-flag entities.
    Shared,
    ContinuousDelivery,
    FeatureFlags,
}

impl EntityKind {
    /// Number of kinds.
    pub const COUNT: usize = 22;

    /// All kinds, in declaration order.
    pub const ALL: [EntityKind; 22] = [
        EntityKind::Connector,
        EntityKind::Environment,
        EntityKind::EnvironmentGroup,
        EntityKind::Service,
        EntityKind::ServiceOverride,
        EntityKind::Pipeline,
        EntityKind::InputSet,
        EntityKind::Template,
        EntityKind::Variable,
        EntityKind::FileStore,
        EntityKind::Infrastructure,
        EntityKind::Tag,
        EntityKind::User,
        EntityKind::UserGroup,
        EntityKind::ServiceAccount,
        EntityKind::Role,
        EntityKind::RoleAssignment,
        EntityKind::ResourceGroup,
        EntityKind::Trigger,
        EntityKind::FeatureFlag,
        EntityKind::Target,
        EntityKind::TargetGroup,
    ];

    /// Kinds with their own copy operation, in the order they must run.
    ///
    /// A kind only appears after every kind it can reference by identifier.
    /// Tags have no operation of their own; they travel with services.
    pub const COPY_ORDER: [EntityKind; 21] = [
        EntityKind::Connector,
        EntityKind::Environment,
        EntityKind::EnvironmentGroup,
        EntityKind::Variable,
        EntityKind::FileStore,
        EntityKind::Infrastructure,
        EntityKind::Service,
        EntityKind::ServiceOverride,
        EntityKind::Template,
        EntityKind::Pipeline,
        EntityKind::InputSet,
        EntityKind::User,
        EntityKind::UserGroup,
        EntityKind::ServiceAccount,
        EntityKind::Role,
        EntityKind::ResourceGroup,
        EntityKind::RoleAssignment,
        EntityKind::Trigger,
        EntityKind::FeatureFlag,
        EntityKind::Target,
        EntityKind::TargetGroup,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Lower-case label used as the `kind` field in log events.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Connector => "connector",
            EntityKind::Environment => "environment",
            EntityKind::EnvironmentGroup => "environment group",
            EntityKind::Service => "service",
            EntityKind::ServiceOverride => "service override",
            EntityKind::Pipeline => "pipeline",
            EntityKind::InputSet => "input set",
            EntityKind::Template => "template",
            EntityKind::Variable => "variable",
            EntityKind::FileStore => "file store",
            EntityKind::Infrastructure => "infrastructure",
            EntityKind::Tag => "tag",
            EntityKind::User => "user",
            EntityKind::UserGroup => "user group",
            EntityKind::ServiceAccount => "service account",
            EntityKind::Role => "role",
            EntityKind::RoleAssignment => "role assignment",
            EntityKind::ResourceGroup => "resource group",
            EntityKind::Trigger => "trigger",
            EntityKind::FeatureFlag => "feature flag",
            EntityKind::Target => "target",
            EntityKind::TargetGroup => "target group",
        }
    }

    /// Plural heading for reports.
    pub fn heading(self) -> &'static str {
        match self {
            EntityKind::Connector => "Connectors",
            EntityKind::Environment => "Environments",
            EntityKind::EnvironmentGroup => "Environment Groups",
            EntityKind::Service => "Services",
            EntityKind::ServiceOverride => "Service Overrides",
            EntityKind::Pipeline => "Pipelines",
            EntityKind::InputSet => "Input Sets",
            EntityKind::Template => "Templates",
            EntityKind::Variable => "Variables",
            EntityKind::FileStore => "File Stores",
            EntityKind::Infrastructure => "Infrastructure",
            EntityKind::Tag => "Tags",
            EntityKind::User => "Users",
            EntityKind::UserGroup => "User Groups",
            EntityKind::ServiceAccount => "Service Accounts",
            EntityKind::Role => "Roles",
            EntityKind::RoleAssignment => "Role Assignments",
            EntityKind::ResourceGroup => "Resource Groups",
            EntityKind::Trigger => "Triggers",
            EntityKind::FeatureFlag => "Feature Flags",
            EntityKind::Target => "Targets",
            EntityKind::TargetGroup => "Target Groups",
        }
    }

    pub fn family(self) -> Family {
        match self {
            EntityKind::Connector | EntityKind::Environment | EntityKind::EnvironmentGroup => {
                Family::Shared
            }
            EntityKind::FeatureFlag | EntityKind::Target | EntityKind::TargetGroup => {
                Family::FeatureFlags
            }
            _ => Family::ContinuousDelivery,
        }
    }

    /// Whether this kind is copied when the given areas are enabled.
    pub fn in_scope(self, areas: FeatureAreas) -> bool {
        match self.family() {
            Family::Shared => areas.continuous_delivery || areas.feature_flags,
            Family::ContinuousDelivery => areas.continuous_delivery,
            Family::FeatureFlags => areas.feature_flags,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Feature areas enabled for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureAreas {
    pub continuous_delivery: bool,
    pub feature_flags: bool,
}

impl FeatureAreas {
    /// Kinds in scope for these areas, in declaration order.
    pub fn kinds(self) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| kind.in_scope(self))
            .collect()
    }

    /// Kinds with a copy operation in scope, in copy order.
    pub fn copy_order(self) -> Vec<EntityKind> {
        EntityKind::COPY_ORDER
            .into_iter()
            .filter(|kind| kind.in_scope(self))
            .collect()
    }
}
