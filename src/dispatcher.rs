//! Verb routing: one mapped command spec to its `tw` invocation(s)
//!
//! Most types create with a single `add`. The exceptions: compute-envs
//! always `import`; pipelines pick `add` vs `import` by inspecting the
//! arguments; participants issue `add` then `update`; teams issue the
//! creation command followed by one `members` command per declared member;
//! launch and info run without a verb.

use log::{error, warn};
use url::Url;

use crate::client::CommandRunner;
use crate::error::Result;
use crate::reconciler;
use crate::resource::{CommandSpec, ResourceType};

/// Apply one declared resource: reconcile overwrite first, then issue the
/// creating command(s). Reconciliation failures are reported and the create
/// is still attempted; a stale resource then surfaces as a create failure.
pub fn apply<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    spec: &CommandSpec,
) -> Result<()> {
    if spec.overwrite {
        if let Err(e) = reconciler::reconcile(runner, resource_type, spec) {
            error!("overwrite reconciliation for {resource_type} failed: {e}");
        }
    }
    dispatch(runner, resource_type, spec)
}

fn dispatch<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    spec: &CommandSpec,
) -> Result<()> {
    match resource_type {
        ResourceType::Teams => dispatch_teams(runner, spec),
        ResourceType::Participants => dispatch_participants(runner, spec),
        ResourceType::ComputeEnvs => {
            run_verb(runner, resource_type, Some("import"), &spec.args)
        }
        ResourceType::Pipelines => dispatch_pipelines(runner, spec),
        ResourceType::Launch => run_verb(runner, resource_type, None, &spec.args),
        ResourceType::Custom(name) if name == "info" => {
            run_verb(runner, resource_type, None, &spec.args)
        }
        _ => run_verb(runner, resource_type, Some("add"), &spec.args),
    }
}

/// Team creation, then membership: members can only be added to a team that
/// exists, so the order is fixed.
fn dispatch_teams<R: CommandRunner>(runner: &R, spec: &CommandSpec) -> Result<()> {
    run_verb(runner, &ResourceType::Teams, Some("add"), &spec.args)?;
    for member in &spec.member_args {
        run_verb(runner, &ResourceType::Teams, Some("members"), member)?;
    }
    Ok(())
}

/// Participants always exist with a default role on `add`, then have their
/// role set via `update`: `add` gets the arguments minus the `--role` pair,
/// `update` gets them all.
fn dispatch_participants<R: CommandRunner>(runner: &R, spec: &CommandSpec) -> Result<()> {
    let without_role = strip_flag(&spec.args, "--role");
    run_verb(runner, &ResourceType::Participants, Some("add"), &without_role)?;
    run_verb(runner, &ResourceType::Participants, Some("update"), &spec.args)
}

/// A pipeline declared by URL is added from source control; one declared by
/// an exported `.json` file is imported. First match wins; with neither
/// present no command is issued.
fn dispatch_pipelines<R: CommandRunner>(runner: &R, spec: &CommandSpec) -> Result<()> {
    if spec.args.iter().any(|arg| is_url(arg)) {
        return run_verb(runner, &ResourceType::Pipelines, Some("add"), &spec.args);
    }
    if spec.args.iter().any(|arg| arg.contains(".json")) {
        return run_verb(runner, &ResourceType::Pipelines, Some("import"), &spec.args);
    }
    warn!("pipelines item has neither a URL nor a .json export, issuing no command");
    Ok(())
}

fn run_verb<R: CommandRunner>(
    runner: &R,
    resource_type: &ResourceType,
    verb: Option<&str>,
    args: &[String],
) -> Result<()> {
    let mut argv = vec![resource_type.as_str().to_string()];
    if let Some(verb) = verb {
        argv.push(verb.to_string());
    }
    argv.extend(args.iter().cloned());
    runner.run_plain(&argv)?;
    Ok(())
}

/// Remove `flag` and its value from an argument list.
fn strip_flag(args: &[String], flag: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg == flag {
            skip = true;
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn is_url(arg: &str) -> bool {
    Url::parse(arg)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingRunner;

    fn spec(args: &[&str]) -> CommandSpec {
        CommandSpec::new(args.iter().map(ToString::to_string).collect(), false)
    }

    #[test]
    fn overwrite_deletes_exactly_once_before_the_create() {
        let runner = RecordingRunner::with_listing(r#"{"credentials":[{"name":"prod"}]}"#);
        let mut spec = spec(&["aws", "--name", "prod", "--workspace", "acme/main"]);
        spec.overwrite = true;
        apply(&runner, &ResourceType::Credentials, &spec).unwrap();

        let calls = runner.recorded();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0][..2], ["credentials", "list"]);
        assert_eq!(calls[1][..2], ["credentials", "delete"]);
        assert_eq!(calls[2][..2], ["credentials", "add"]);
    }

    #[test]
    fn reconciliation_failure_still_attempts_the_create() {
        let runner = RecordingRunner {
            fail_listings: true,
            ..RecordingRunner::default()
        };
        let mut spec = spec(&["--name", "prod", "--workspace", "acme/main"]);
        spec.overwrite = true;
        apply(&runner, &ResourceType::Secrets, &spec).unwrap();

        let calls = runner.recorded();
        assert_eq!(calls.last().unwrap()[..2], ["secrets", "add"]);
    }

    #[test]
    fn plain_types_create_with_add() {
        let runner = RecordingRunner::default();
        apply(
            &runner,
            &ResourceType::Organizations,
            &spec(&["--name", "acme"]),
        )
        .unwrap();
        assert_eq!(runner.recorded(), [["organizations", "add", "--name", "acme"]]);
    }

    #[test]
    fn compute_envs_always_import() {
        let runner = RecordingRunner::default();
        apply(&runner, &ResourceType::ComputeEnvs, &spec(&["ce.json"])).unwrap();
        assert_eq!(runner.recorded(), [["compute-envs", "import", "ce.json"]]);
    }

    #[test]
    fn launch_runs_without_a_verb() {
        let runner = RecordingRunner::default();
        apply(
            &runner,
            &ResourceType::Launch,
            &spec(&["rnaseq", "--workspace", "acme/main"]),
        )
        .unwrap();
        assert_eq!(
            runner.recorded(),
            [["launch", "rnaseq", "--workspace", "acme/main"]]
        );
    }

    #[test]
    fn bare_info_block_runs_verbless() {
        let runner = RecordingRunner::default();
        apply(
            &runner,
            &ResourceType::Custom("info".to_string()),
            &CommandSpec::default(),
        )
        .unwrap();
        assert_eq!(runner.recorded(), [["info"]]);
    }

    #[test]
    fn pipelines_url_selects_add() {
        let runner = RecordingRunner::default();
        apply(
            &runner,
            &ResourceType::Pipelines,
            &spec(&["https://github.com/nf-core/rnaseq", "--name", "rnaseq"]),
        )
        .unwrap();
        assert_eq!(runner.recorded()[0][..2], ["pipelines", "add"]);
    }

    #[test]
    fn pipelines_json_export_selects_import() {
        let runner = RecordingRunner::default();
        apply(
            &runner,
            &ResourceType::Pipelines,
            &spec(&["rnaseq.json", "--name", "rnaseq"]),
        )
        .unwrap();
        assert_eq!(runner.recorded()[0][..2], ["pipelines", "import"]);
    }

    #[test]
    fn pipelines_with_neither_issue_nothing() {
        let runner = RecordingRunner::default();
        apply(&runner, &ResourceType::Pipelines, &spec(&["--name", "x"])).unwrap();
        assert!(runner.recorded().is_empty());
    }

    #[test]
    fn participants_always_add_then_update() {
        let runner = RecordingRunner::default();
        apply(
            &runner,
            &ResourceType::Participants,
            &spec(&[
                "--name", "a@x.com", "--type", "MEMBER", "--workspace", "acme/main", "--role",
                "ADMIN",
            ]),
        )
        .unwrap();

        let calls = runner.recorded();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            [
                "participants",
                "add",
                "--name",
                "a@x.com",
                "--type",
                "MEMBER",
                "--workspace",
                "acme/main"
            ]
        );
        assert_eq!(
            calls[1],
            [
                "participants",
                "update",
                "--name",
                "a@x.com",
                "--type",
                "MEMBER",
                "--workspace",
                "acme/main",
                "--role",
                "ADMIN"
            ]
        );
    }

    #[test]
    fn teams_create_then_add_members_in_order() {
        let runner = RecordingRunner::default();
        let mut spec = spec(&["--name", "dev", "--organization", "acme"]);
        spec.member_args = vec![
            vec![
                "--team".to_string(),
                "dev".to_string(),
                "--organization".to_string(),
                "acme".to_string(),
                "add".to_string(),
                "--member".to_string(),
                "a@x.com".to_string(),
            ],
            vec![
                "--team".to_string(),
                "dev".to_string(),
                "--organization".to_string(),
                "acme".to_string(),
                "add".to_string(),
                "--member".to_string(),
                "b@x.com".to_string(),
            ],
        ];
        apply(&runner, &ResourceType::Teams, &spec).unwrap();

        let calls = runner.recorded();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0][..2], ["teams", "add"]);
        assert_eq!(calls[1][..2], ["teams", "members"]);
        assert_eq!(calls[1][8], "a@x.com");
        assert_eq!(calls[2][8], "b@x.com");
    }

    #[test]
    fn strip_flag_removes_the_pair_anywhere() {
        let args: Vec<String> = ["--role", "ADMIN", "--name", "x"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(strip_flag(&args, "--role"), ["--name", "x"]);
    }

    #[test]
    fn bare_tokens_are_not_urls() {
        assert!(is_url("https://github.com/nf-core/rnaseq"));
        assert!(!is_url("rnaseq.json"));
        assert!(!is_url("rnaseq"));
    }
}
