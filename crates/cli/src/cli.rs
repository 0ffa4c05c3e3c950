//! Command-line arguments.

use clap::{ArgAction, Args, Parser, Subcommand};
use sp_protocol::pipeline_models::Transform;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sigflow", version, about)]
pub struct Cli {
    /// TOML settings file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactively create, suspend, continue and terminate a child process
    Control(ControlArgs),

    /// Push one line from stdin through the three-stage pipeline
    Run(RunArgs),

    /// Run a single pipeline stage (spawned by `run`)
    #[command(hide = true)]
    Stage(StageArgs),
}

#[derive(Args, Debug)]
pub struct ControlArgs {
    /// Program the child runs [default: ./interface]
    #[arg(long, value_name = "PATH")]
    pub program: Option<PathBuf>,

    /// Print events as JSON lines instead of messages
    #[arg(long)]
    pub json: bool,

    /// Arguments for the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory for the named channels [default: .]
    #[arg(long, value_name = "DIR")]
    pub channel_dir: Option<PathBuf>,

    /// Largest payload in bytes, terminator included [default: 256]
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StageArgs {
    #[arg(long)]
    pub ordinal: usize,

    #[arg(long)]
    pub transform: Transform,

    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Process notified on completion
    #[arg(long)]
    pub recipient: i32,

    #[arg(long)]
    pub max_payload: usize,
}
