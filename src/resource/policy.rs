//! Per-type deletion policies for overwrite reconciliation
//!
//! The `tw` CLI has no `--overwrite`, so overwriting means: list what exists,
//! find a match by name, delete it, then create. Each resource type declares
//! which fields identify it, how its listing is scoped, and what its delete
//! command needs. Most types share the name-plus-workspace policy; four have
//! bespoke identity semantics.

use super::ResourceType;

/// How the existence-check listing is scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// `tw <type> list -w <workspace>`
    Workspace,
    /// `tw <type> list -o <organization>`
    Organization,
    /// `tw <type> list` across everything visible to the token
    Unscoped,
}

/// How the delete command identifies its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBy {
    /// `delete --name <name> --workspace <workspace>`
    NameAndWorkspace,
    /// `delete --name <name>`
    NameOnly,
    /// `delete --name <name> --type <type> --workspace <workspace>`
    NameTypeWorkspace,
    /// Teams delete by opaque id: resolve the team name to its `teamId` via
    /// the listing, then `delete --id <id> --organization <org>`.
    TeamId,
    /// Workspace display names are only unique per organization: resolve
    /// (organization, name) to `workspaceId`, then `delete --id <id>`.
    WorkspaceId,
}

/// Rule set describing how to detect and delete an existing resource.
#[derive(Debug, Clone, Copy)]
pub struct DeletionPolicy {
    /// Item fields needed to look up and delete existing resources. These
    /// are recovered from the mapped argument list, so every key here must
    /// survive mapping as a `--key value` pair.
    pub keys: &'static [&'static str],
    /// Listing-record field compared against the declared name.
    pub name_key: &'static str,
    pub scope: ListScope,
    pub delete_by: DeleteBy,
}

const GENERIC: DeletionPolicy = DeletionPolicy {
    keys: &["name", "workspace"],
    name_key: "name",
    scope: ListScope::Workspace,
    delete_by: DeleteBy::NameAndWorkspace,
};

/// The deletion policy for a resource type, or `None` for types that do not
/// support overwrite (launch is an action, not a stateful resource; custom
/// blocks have unknown identity semantics).
pub fn deletion_policy(resource_type: &ResourceType) -> Option<DeletionPolicy> {
    let policy = match resource_type {
        ResourceType::Credentials
        | ResourceType::Secrets
        | ResourceType::ComputeEnvs
        | ResourceType::Datasets
        | ResourceType::Actions
        | ResourceType::Pipelines => GENERIC,
        ResourceType::Organizations => DeletionPolicy {
            keys: &["name"],
            name_key: "orgName",
            scope: ListScope::Unscoped,
            delete_by: DeleteBy::NameOnly,
        },
        ResourceType::Teams => DeletionPolicy {
            keys: &["name", "organization"],
            name_key: "name",
            scope: ListScope::Organization,
            delete_by: DeleteBy::TeamId,
        },
        ResourceType::Participants => DeletionPolicy {
            keys: &["name", "type", "workspace"],
            name_key: "email",
            scope: ListScope::Workspace,
            delete_by: DeleteBy::NameTypeWorkspace,
        },
        ResourceType::Workspaces => DeletionPolicy {
            keys: &["name", "organization"],
            name_key: "workspaceName",
            scope: ListScope::Unscoped,
            delete_by: DeleteBy::WorkspaceId,
        },
        ResourceType::Launch | ResourceType::Custom(_) => return None,
    };
    Some(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_set_shares_name_and_workspace_policy() {
        for ty in [
            ResourceType::Credentials,
            ResourceType::Secrets,
            ResourceType::ComputeEnvs,
            ResourceType::Datasets,
            ResourceType::Actions,
            ResourceType::Pipelines,
        ] {
            let policy = deletion_policy(&ty).unwrap();
            assert_eq!(policy.keys, ["name", "workspace"]);
            assert_eq!(policy.delete_by, DeleteBy::NameAndWorkspace);
        }
    }

    #[test]
    fn launch_and_custom_have_no_policy() {
        assert!(deletion_policy(&ResourceType::Launch).is_none());
        assert!(deletion_policy(&ResourceType::Custom("runs".to_string())).is_none());
    }

    #[test]
    fn workspaces_disambiguate_by_organization() {
        let policy = deletion_policy(&ResourceType::Workspaces).unwrap();
        assert_eq!(policy.keys, ["name", "organization"]);
        assert_eq!(policy.scope, ListScope::Unscoped);
        assert_eq!(policy.delete_by, DeleteBy::WorkspaceId);
    }
}
