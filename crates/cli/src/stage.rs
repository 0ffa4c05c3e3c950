//! `sigflow stage`: one pipeline worker process.

use crate::cli::StageArgs;
use nix::unistd::Pid;
use sp_core::stage::StageWorker;
use sp_protocol::pipeline_models::StageDefinition;

/// Run the worker described by `args` until it exits or fails.
///
/// A failed stage exits non-zero without notifying its recipient.
pub fn run(args: StageArgs) -> color_eyre::Result<()> {
    let definition = StageDefinition {
        ordinal: args.ordinal,
        transform: args.transform,
        input: args.input,
        output: args.output,
    };

    StageWorker::new(definition, Pid::from_raw(args.recipient), args.max_payload).run()?;
    Ok(())
}
