//! Resource types and the command specifications mapped from them
//!
//! Every block in the configuration document names a resource type. The set
//! of types the `tw` CLI understands is closed here as an enum; block names
//! outside the set still work through [`ResourceType::Custom`] and generic
//! flag mapping, so the CLI surface can grow without code changes.

use std::fmt;

pub mod mapper;
pub mod policy;

/// A single item under a configuration block: field name to value, in
/// document order. Order is significant and preserved through mapping.
pub type ResourceItem = serde_yaml::Mapping;

/// A category of remote entity managed through the `tw` command surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Organizations,
    Teams,
    Workspaces,
    Participants,
    Credentials,
    Secrets,
    ComputeEnvs,
    Actions,
    Datasets,
    Pipelines,
    Launch,
    /// Any other block name; mapped generically, dispatched with `add`.
    Custom(String),
}

/// Creation order for a full-document run. Dependent resources come after
/// their prerequisites (a team before its members, a workspace before the
/// credentials scoped to it).
pub const PROVISION_ORDER: &[ResourceType] = &[
    ResourceType::Organizations,
    ResourceType::Teams,
    ResourceType::Workspaces,
    ResourceType::Participants,
    ResourceType::Credentials,
    ResourceType::Secrets,
    ResourceType::ComputeEnvs,
    ResourceType::Actions,
    ResourceType::Datasets,
    ResourceType::Pipelines,
    ResourceType::Launch,
];

impl ResourceType {
    /// Parse a block name. Unknown names become [`ResourceType::Custom`]
    /// rather than an error.
    pub fn from_block_name(name: &str) -> Self {
        match name {
            "organizations" => Self::Organizations,
            "teams" => Self::Teams,
            "workspaces" => Self::Workspaces,
            "participants" => Self::Participants,
            "credentials" => Self::Credentials,
            "secrets" => Self::Secrets,
            "compute-envs" => Self::ComputeEnvs,
            "actions" => Self::Actions,
            "datasets" => Self::Datasets,
            "pipelines" => Self::Pipelines,
            "launch" => Self::Launch,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The `tw` subcommand / block name for this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Organizations => "organizations",
            Self::Teams => "teams",
            Self::Workspaces => "workspaces",
            Self::Participants => "participants",
            Self::Credentials => "credentials",
            Self::Secrets => "secrets",
            Self::ComputeEnvs => "compute-envs",
            Self::Actions => "actions",
            Self::Datasets => "datasets",
            Self::Pipelines => "pipelines",
            Self::Launch => "launch",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of mapping one resource item: the ordered `tw` argument list
/// (positional tokens first, then `--flag value` pairs) plus the local
/// overwrite decision. The overwrite flag never appears in `args`; the
/// remote CLI has no `--overwrite`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub args: Vec<String>,
    pub overwrite: bool,
    /// For `teams` only: one argument list per declared member, each an
    /// independent `teams members` invocation issued after team creation.
    pub member_args: Vec<Vec<String>>,
}

impl CommandSpec {
    pub fn new(args: Vec<String>, overwrite: bool) -> Self {
        Self {
            args,
            overwrite,
            member_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_name_round_trips_for_known_types() {
        for ty in PROVISION_ORDER {
            assert_eq!(&ResourceType::from_block_name(ty.as_str()), ty);
        }
    }

    #[test]
    fn unknown_block_name_is_custom() {
        let ty = ResourceType::from_block_name("runs");
        assert_eq!(ty, ResourceType::Custom("runs".to_string()));
        assert_eq!(ty.as_str(), "runs");
    }
}
