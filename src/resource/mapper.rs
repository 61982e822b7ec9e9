//! Argument mapping: resource items to ordered `tw` argument lists
//!
//! One rule per resource type, falling back to generic `--field value`
//! mapping for types with no special handling. Mapping is deterministic and
//! preserves the document order of fields, except where a type pins a fixed
//! order (datasets, pipelines, launch).

use std::io::Write;
use std::path::PathBuf;

use log::debug;
use serde_yaml::Value;

use crate::error::{Error, Result};

use super::{CommandSpec, ResourceItem, ResourceType};

/// Map one resource item (with `overwrite` already consumed by the block
/// parser) into a non-overwrite [`CommandSpec`].
pub fn map(resource_type: &ResourceType, item: &ResourceItem) -> Result<CommandSpec> {
    let spec = match resource_type {
        ResourceType::Credentials => map_with_positional(item, "type"),
        ResourceType::ComputeEnvs => map_with_positional(item, "file-path"),
        ResourceType::Teams => map_teams(item)?,
        ResourceType::Actions => map_actions(item)?,
        ResourceType::Datasets => map_datasets(item)?,
        ResourceType::Pipelines => map_repo_launchable(item, &["url", "file-path"])?,
        ResourceType::Launch => map_repo_launchable(item, &["pipeline", "url"])?,
        _ => map_generic(item),
    };
    Ok(spec)
}

/// Generic rule: every field becomes `--field value`.
fn map_generic(item: &ResourceItem) -> CommandSpec {
    let mut args = Vec::new();
    for (key, value) in item {
        push_flag(&mut args, key, value);
    }
    CommandSpec::new(args, false)
}

/// Generic rule with one field emitted as a bare positional token instead of
/// a flag (credentials `type`, compute-envs `file-path`).
fn map_with_positional(item: &ResourceItem, positional: &str) -> CommandSpec {
    let mut args = Vec::new();
    for (key, value) in item {
        if key_str(key) == Some(positional) {
            args.push(scalar_string(value));
        } else {
            push_flag(&mut args, key, value);
        }
    }
    CommandSpec::new(args, false)
}

/// Teams split into a creation command plus one `members` command per member.
/// Members need the team name and organization, so both must be declared.
fn map_teams(item: &ResourceItem) -> Result<CommandSpec> {
    const TEAM_FIELDS: [&str; 3] = ["name", "organization", "description"];

    let mut spec = CommandSpec::default();
    for (key, value) in item {
        let Some(key) = key_str(key) else { continue };
        if TEAM_FIELDS.contains(&key) {
            spec.args.push(format!("--{key}"));
            spec.args.push(scalar_string(value));
        } else if key == "members" {
            let name = require_scalar(item, "name", &ResourceType::Teams)?;
            let organization = require_scalar(item, "organization", &ResourceType::Teams)?;
            let members = value.as_sequence().cloned().unwrap_or_default();
            for member in &members {
                spec.member_args.push(vec![
                    "--team".to_string(),
                    name.clone(),
                    "--organization".to_string(),
                    organization.clone(),
                    "add".to_string(),
                    "--member".to_string(),
                    scalar_string(member),
                ]);
            }
        } else {
            debug!("ignoring unsupported teams field `{key}`");
        }
    }
    Ok(spec)
}

/// Actions: `type` is positional, `params` is written to a temp file and
/// referenced by path, everything else is a flag.
fn map_actions(item: &ResourceItem) -> Result<CommandSpec> {
    let mut args = Vec::new();
    for (key, value) in item {
        match key_str(key) {
            Some("type") => args.push(scalar_string(value)),
            Some("params") => {
                let path = write_params_file(value)?;
                args.push("--params-file".to_string());
                args.push(path.display().to_string());
            }
            _ => push_flag(&mut args, key, value),
        }
    }
    Ok(CommandSpec::new(args, false))
}

/// Datasets need `file-path`, `name`, `workspace` and `description` all
/// present, emitted in a fixed order; `header: true` appends a bare
/// `--header` with no value.
fn map_datasets(item: &ResourceItem) -> Result<CommandSpec> {
    let ty = ResourceType::Datasets;
    let file_path = require_scalar(item, "file-path", &ty)?;
    let name = require_scalar(item, "name", &ty)?;
    let workspace = require_scalar(item, "workspace", &ty)?;
    let description = require_scalar(item, "description", &ty)?;

    let mut args = vec![
        file_path,
        "--name".to_string(),
        name,
        "--workspace".to_string(),
        workspace,
        "--description".to_string(),
        description,
    ];
    if item.get("header").and_then(Value::as_bool) == Some(true) {
        args.push("--header".to_string());
    }
    Ok(CommandSpec::new(args, false))
}

/// Pipelines and launch share a shape: a positional repository reference
/// (URL, pipeline name, or exported JSON file), an optional `params` temp
/// file, then the remaining flags. Output order is always repo args, params
/// args, flags, regardless of input field order.
fn map_repo_launchable(item: &ResourceItem, repo_fields: &[&str]) -> Result<CommandSpec> {
    let mut repo_args = Vec::new();
    let mut params_args = Vec::new();
    let mut flag_args = Vec::new();

    for (key, value) in item {
        match key_str(key) {
            Some(k) if repo_fields.contains(&k) => repo_args.push(scalar_string(value)),
            Some("params") => {
                let path = write_params_file(value)?;
                params_args.push("--params-file".to_string());
                params_args.push(path.display().to_string());
            }
            _ => push_flag(&mut flag_args, key, value),
        }
    }

    let mut args = repo_args;
    args.append(&mut params_args);
    args.append(&mut flag_args);
    Ok(CommandSpec::new(args, false))
}

/// Serialize a `params` value to a uniquely named YAML file that survives
/// past this process's temp-file handle. The file is handed to `tw` via
/// `--params-file`; the OS temp dir eventually reclaims it.
fn write_params_file(params: &Value) -> Result<PathBuf> {
    let yaml = serde_yaml::to_string(params)
        .map_err(|e| Error::ConfigParse(format!("unserializable params block: {e}")))?;

    let mut file = tempfile::Builder::new()
        .prefix("twkit-params-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(yaml.as_bytes())?;

    let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
    debug!("wrote params file {}", path.display());
    Ok(path)
}

fn push_flag(args: &mut Vec<String>, key: &Value, value: &Value) {
    if let Some(key) = key_str(key) {
        args.push(format!("--{key}"));
        args.push(scalar_string(value));
    }
}

fn key_str(key: &Value) -> Option<&str> {
    key.as_str()
}

/// Render a YAML scalar as a single command-line token.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}

fn require_scalar(item: &ResourceItem, field: &str, ty: &ResourceType) -> Result<String> {
    item.get(field)
        .map(scalar_string)
        .ok_or_else(|| Error::MissingField {
            resource_type: ty.to_string(),
            field: field.to_string(),
        })
}
