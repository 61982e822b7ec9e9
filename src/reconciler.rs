//! Overwrite reconciliation: delete a pre-existing resource before re-create
//!
//! Activated only when an item declares `overwrite: true`. The reconciler
//! lists existing resources of the type, looks for a record matching the
//! declared name, resolves the type's delete identifier (for teams and
//! workspaces that means a secondary id lookup), and deletes the match.
//! Absence of a match is not an error; creation proceeds either way.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::client::CommandRunner;
use crate::error::{Error, Result};
use crate::resource::policy::{deletion_policy, DeleteBy, DeletionPolicy, ListScope};
use crate::resource::{CommandSpec, ResourceType};

/// Delete any existing resource matching `spec` so the subsequent create
/// starts clean. No-op when `spec.overwrite` is false or the type has no
/// deletion policy.
pub fn reconcile<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    spec: &CommandSpec,
) -> Result<()> {
    if !spec.overwrite {
        return Ok(());
    }
    let Some(policy) = deletion_policy(resource_type) else {
        debug!("{resource_type} has no deletion policy, skipping overwrite check");
        return Ok(());
    };

    // The policy keys are recovered from the mapped argument list, not the
    // original item, so mapping must have preserved each as `--key value`.
    let values = values_from_args(&spec.args, policy.keys);
    let name = required(&values, "name", resource_type)?.to_string();

    let listing = list_existing(runner, resource_type, &policy, &values)?;
    let Some(listing) = listing else {
        debug!("empty {resource_type} listing, nothing to delete");
        return Ok(());
    };
    let records = listing_records(&listing);

    match policy.delete_by {
        DeleteBy::WorkspaceId => {
            delete_workspace_by_id(runner, resource_type, &values, &name, &records)
        }
        DeleteBy::TeamId => delete_team_by_id(runner, resource_type, &values, &name, &records),
        _ => {
            let name_key = match_key(resource_type, &policy, &values);
            if !records
                .iter()
                .any(|r| field_string(r, name_key).as_deref() == Some(name.as_str()))
            {
                debug!("no existing {resource_type} named `{name}`");
                return Ok(());
            }
            let args = simple_delete_args(resource_type, policy.delete_by, &values, &name)?;
            info!("deleting existing {resource_type} `{name}`");
            runner.run_plain(&args)?;
            Ok(())
        }
    }
}

/// One entry of the unscoped `workspaces list` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceRecord {
    #[serde(default)]
    org_name: Option<String>,
    #[serde(default)]
    workspace_name: Option<String>,
    #[serde(default)]
    workspace_id: Option<Value>,
}

/// Workspace display names are unique only within an organization, so the
/// unscoped listing is filtered by both before a delete-by-id is possible.
fn delete_workspace_by_id<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    values: &HashMap<String, String>,
    name: &str,
    records: &[&Value],
) -> Result<()> {
    let organization = required(values, "organization", resource_type)?;
    let candidates: Vec<WorkspaceRecord> = records
        .iter()
        .filter_map(|r| serde_json::from_value::<WorkspaceRecord>((*r).clone()).ok())
        .filter(|w| {
            w.org_name.as_deref() == Some(organization)
                && w.workspace_name.as_deref() == Some(name)
        })
        .collect();

    match candidates.as_slice() {
        [] => {
            debug!("no existing workspace `{organization}/{name}`");
            Ok(())
        }
        [workspace] => {
            let Some(id) = workspace.workspace_id.as_ref().and_then(id_string) else {
                warn!("workspace `{organization}/{name}` listed without workspaceId, not deleting");
                return Ok(());
            };
            info!("deleting existing workspace `{organization}/{name}` (id {id})");
            runner.run_plain(&str_args(&["workspaces", "delete", "--id", &id]))?;
            Ok(())
        }
        many => Err(Error::LookupAmbiguity {
            resource_type: resource_type.to_string(),
            name: format!("{organization}/{name}"),
            candidates: many.len(),
        }),
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Teams delete by opaque id: resolve the declared name to `teamId` in the
/// organization-scoped listing.
fn delete_team_by_id<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    values: &HashMap<String, String>,
    name: &str,
    records: &[&Value],
) -> Result<()> {
    let organization = required(values, "organization", resource_type)?;
    let candidates: Vec<&&Value> = records
        .iter()
        .filter(|r| field_string(r, "name").as_deref() == Some(name))
        .collect();

    match candidates.as_slice() {
        [] => {
            debug!("no existing team `{name}` in `{organization}`");
            Ok(())
        }
        [record] => {
            let Some(id) = field_string(record, "teamId") else {
                warn!("team `{name}` listed without teamId, not deleting");
                return Ok(());
            };
            info!("deleting existing team `{name}` (id {id})");
            runner.run_plain(&str_args(&[
                "teams",
                "delete",
                "--id",
                &id,
                "--organization",
                organization,
            ]))?;
            Ok(())
        }
        many => Err(Error::LookupAmbiguity {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            candidates: many.len(),
        }),
    }
}

fn list_existing<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    policy: &DeletionPolicy,
    values: &HashMap<String, String>,
) -> Result<Option<Value>> {
    let mut args = str_args(&[resource_type.as_str(), "list"]);
    match policy.scope {
        ListScope::Workspace => {
            args.push("-w".to_string());
            args.push(required(values, "workspace", resource_type)?.to_string());
        }
        ListScope::Organization => {
            args.push("-o".to_string());
            args.push(required(values, "organization", resource_type)?.to_string());
        }
        ListScope::Unscoped => {}
    }

    let output = runner.run_json(&args)?;
    if output.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&output)?))
}

/// Participant identity depends on the participant kind: members match on
/// `email`, TEAM participants on `teamName`.
fn match_key(
    resource_type: &ResourceType,
    policy: &DeletionPolicy,
    values: &HashMap<String, String>,
) -> &'static str {
    if *resource_type == ResourceType::Participants
        && values.get("type").map(String::as_str) == Some("TEAM")
    {
        "teamName"
    } else {
        policy.name_key
    }
}

fn simple_delete_args(
    resource_type: &ResourceType,
    delete_by: DeleteBy,
    values: &HashMap<String, String>,
    name: &str,
) -> Result<Vec<String>> {
    let mut args = str_args(&[resource_type.as_str(), "delete", "--name", name]);
    match delete_by {
        DeleteBy::NameOnly => {}
        DeleteBy::NameAndWorkspace => {
            args.push("--workspace".to_string());
            args.push(required(values, "workspace", resource_type)?.to_string());
        }
        DeleteBy::NameTypeWorkspace => {
            args.push("--type".to_string());
            args.push(required(values, "type", resource_type)?.to_string());
            args.push("--workspace".to_string());
            args.push(required(values, "workspace", resource_type)?.to_string());
        }
        DeleteBy::TeamId | DeleteBy::WorkspaceId => unreachable!("handled by id-based deletion"),
    }
    Ok(args)
}

/// Reverse-map a flat `--flag value` argument list back into the key/value
/// pairs named by `keys`. Bare positional tokens and flags outside `keys`
/// are ignored.
pub fn values_from_args(args: &[String], keys: &[&str]) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let mut pending: Option<&str> = None;
    for arg in args {
        if let Some(flag) = arg.strip_prefix("--") {
            pending = Some(flag);
        } else {
            if let Some(key) = pending {
                if keys.contains(&key) {
                    values.insert(key.to_string(), arg.clone());
                }
            }
            pending = None;
        }
    }
    values
}

/// The listing payload is a mapping with the record list under a
/// type-specific key; a missing or differently named key means no matches.
fn listing_records(listing: &Value) -> Vec<&Value> {
    match listing {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .collect(),
        _ => Vec::new(),
    }
}

fn field_string(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required<'a>(
    values: &'a HashMap<String, String>,
    key: &str,
    resource_type: &ResourceType,
) -> Result<&'a str> {
    values
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::MissingField {
            resource_type: resource_type.to_string(),
            field: key.to_string(),
        })
}

fn str_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}
