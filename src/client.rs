//! Execution of `tw` commands
//!
//! [`TwClient`] is the one place that spawns the external CLI. Everything
//! above it (reconciler, dispatcher) talks through the [`CommandRunner`]
//! trait so tests can record issued commands and serve canned listings.

use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use crate::error::{Error, Result};

/// Per-invocation options for the executor.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Prepend `-o json` so the output is machine-readable.
    pub json: bool,
    /// Forward a tw config file as `--config=<path>`.
    pub config: Option<PathBuf>,
    /// Forward a params file as `--params-file=<path>`.
    pub params_file: Option<PathBuf>,
}

/// Runs one `tw` invocation and returns its captured standard output.
pub trait CommandRunner {
    fn run(&self, args: &[String], opts: &ExecOptions) -> Result<String>;

    fn run_plain(&self, args: &[String]) -> Result<String> {
        self.run(args, &ExecOptions::default())
    }

    fn run_json(&self, args: &[String]) -> Result<String> {
        self.run(
            args,
            &ExecOptions {
                json: true,
                ..ExecOptions::default()
            },
        )
    }
}

/// The real executor: spawns the `tw` binary synchronously, blocking until
/// the process exits and its output is fully captured. No timeout; a hung
/// `tw` hangs the run.
#[derive(Debug, Clone)]
pub struct TwClient {
    bin: String,
    cli_config: Option<PathBuf>,
    dry_run: bool,
}

impl TwClient {
    pub fn new(bin: impl Into<String>, cli_config: Option<PathBuf>, dry_run: bool) -> Self {
        Self {
            bin: bin.into(),
            cli_config,
            dry_run,
        }
    }

    fn build_argv(&self, args: &[String], opts: &ExecOptions) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 4);
        if opts.json {
            argv.push("-o".to_string());
            argv.push("json".to_string());
        }
        argv.extend(args.iter().cloned());
        if let Some(config) = opts.config.as_ref().or(self.cli_config.as_ref()) {
            argv.push(format!("--config={}", config.display()));
        }
        if let Some(params) = &opts.params_file {
            argv.push(format!("--params-file={}", params.display()));
        }
        argv
    }
}

impl CommandRunner for TwClient {
    fn run(&self, args: &[String], opts: &ExecOptions) -> Result<String> {
        let argv = self.build_argv(args, opts);
        let rendered = format!("{} {}", self.bin, argv.join(" "));

        if self.dry_run {
            info!("[dry-run] {rendered}");
            return Ok(String::new());
        }
        debug!("running: {rendered}");

        let output = Command::new(&self.bin)
            .args(&argv)
            .output()
            .map_err(|e| Error::Process {
                command: rendered.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Process {
                command: rendered,
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !stdout.is_empty() {
            info!("{stdout}");
        }
        Ok(stdout)
    }
}

/// Recording runner shared by reconciler and dispatcher tests.
#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;

    use super::{CommandRunner, ExecOptions};
    use crate::error::{Error, Result};

    /// Records every issued command; answers JSON listings with a canned
    /// response and everything else with empty output.
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: RefCell<Vec<Vec<String>>>,
        pub list_response: String,
        /// When set, listing calls fail with a process error.
        pub fail_listings: bool,
    }

    impl RecordingRunner {
        pub fn with_listing(list_response: &str) -> Self {
            Self {
                list_response: list_response.to_string(),
                ..Self::default()
            }
        }

        pub fn recorded(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, args: &[String], opts: &ExecOptions) -> Result<String> {
            self.calls.borrow_mut().push(args.to_vec());
            if opts.json {
                if self.fail_listings {
                    return Err(Error::Process {
                        command: args.join(" "),
                        message: "listing failed".to_string(),
                    });
                }
                return Ok(self.list_response.clone());
            }
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn argv_prepends_json_output_and_appends_config() {
        let client = TwClient::new("tw", Some(PathBuf::from("/etc/tw.yml")), false);
        let argv = client.build_argv(
            &args(&["credentials", "list"]),
            &ExecOptions {
                json: true,
                ..ExecOptions::default()
            },
        );
        assert_eq!(
            argv,
            [
                "-o",
                "json",
                "credentials",
                "list",
                "--config=/etc/tw.yml"
            ]
        );
    }

    #[test]
    fn per_invocation_config_wins_over_client_config() {
        let client = TwClient::new("tw", Some(PathBuf::from("/etc/tw.yml")), false);
        let argv = client.build_argv(
            &args(&["launch", "rnaseq"]),
            &ExecOptions {
                config: Some(PathBuf::from("/tmp/other.yml")),
                params_file: Some(PathBuf::from("/tmp/params.yaml")),
                ..ExecOptions::default()
            },
        );
        assert_eq!(
            argv,
            [
                "launch",
                "rnaseq",
                "--config=/tmp/other.yml",
                "--params-file=/tmp/params.yaml"
            ]
        );
    }

    #[test]
    fn dry_run_spawns_nothing_and_returns_empty_output() {
        let client = TwClient::new("definitely-not-a-binary", None, true);
        let out = client.run_plain(&args(&["info"])).unwrap();
        assert!(out.is_empty());
    }
}
