use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "twkit")]
#[command(version)]
#[command(about = "Declarative provisioning for the Seqera Platform tw CLI", long_about = None)]
pub struct Cli {
    /// YAML document describing the resources to provision
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Process only these blocks, in the order given. A named block absent
    /// from the document runs its subcommand bare (e.g. `info`).
    #[arg(short, long, value_name = "BLOCK", num_args = 1..)]
    pub targets: Vec<String>,

    /// tw binary to invoke
    #[arg(long, value_name = "PATH", default_value = "tw")]
    pub tw_bin: String,

    /// tw configuration file, forwarded as `--config=<FILE>` on every call
    #[arg(long, value_name = "FILE")]
    pub cli_config: Option<PathBuf>,

    /// Log every command without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
