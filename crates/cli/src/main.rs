//! `sigflow`: process lifecycle control and a signal-synchronized pipeline.

mod cli;
mod control;
mod logging;
mod pipeline;
mod stage;

use clap::Parser;
use cli::{Cli, Command};
use sp_core::config::load_settings;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        // Workers get everything they need on the command line.
        Command::Stage(args) => stage::run(args),
        Command::Control(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            control::run(settings, args)
        }
        Command::Run(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            pipeline::run(settings, args)
        }
    }
}
