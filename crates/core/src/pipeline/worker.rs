//! Spawning and tracking of stage worker processes.

use crate::pipeline::error::{PipelineError, PipelineResult};
use nix::unistd::Pid;
use sp_protocol::pipeline_models::StageDefinition;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{info, warn};

/// How to start a stage worker process.
///
/// Workers are separate executions of a program that understands the stage
/// arguments, normally the running binary itself with a `stage` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl WorkerCommand {
    /// Run `program` with `leading_args` before the stage arguments.
    pub fn new(program: impl Into<PathBuf>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }

    /// Re-execute the running binary as `<exe> stage ...`.
    pub fn current_exe() -> PipelineResult<Self> {
        let program = std::env::current_exe().map_err(PipelineError::WorkerProgram)?;
        Ok(Self::new(program, vec!["stage".to_string()]))
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Build the command line for one stage.
    pub fn command(&self, stage: &StageDefinition, recipient: Pid, max_payload: usize) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("--ordinal")
            .arg(stage.ordinal.to_string())
            .arg("--transform")
            .arg(stage.transform.as_str())
            .arg("--input")
            .arg(&stage.input)
            .arg("--output")
            .arg(&stage.output)
            .arg("--recipient")
            .arg(recipient.to_string())
            .arg("--max-payload")
            .arg(max_payload.to_string())
            .stdin(Stdio::null());
        cmd
    }

    /// Spawn the worker for `stage`.
    pub fn spawn(
        &self,
        stage: StageDefinition,
        recipient: Pid,
        max_payload: usize,
    ) -> PipelineResult<SpawnedStage> {
        let child = self
            .command(&stage, recipient, max_payload)
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                ordinal: stage.ordinal,
                source,
            })?;

        info!(ordinal = stage.ordinal, pid = child.id(), transform = %stage.transform, "spawned stage");
        Ok(SpawnedStage {
            definition: stage,
            child,
            exit: None,
            credited: false,
            reported_silent_exit: false,
        })
    }
}

/// A running (or finished) stage worker owned by the orchestrator.
#[derive(Debug)]
pub struct SpawnedStage {
    definition: StageDefinition,
    child: Child,
    exit: Option<ExitStatus>,
    credited: bool,
    reported_silent_exit: bool,
}

impl SpawnedStage {
    pub fn ordinal(&self) -> usize {
        self.definition.ordinal
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }

    /// Whether a completion notification has been attributed to this stage.
    pub fn is_credited(&self) -> bool {
        self.credited
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit
    }

    /// Check, without blocking, whether the worker has exited.
    ///
    /// Reap failures are logged and treated as "still running".
    pub(crate) fn poll_exit(&mut self) -> Option<ExitStatus> {
        if self.exit.is_none() {
            match self.child.try_wait() {
                Ok(status) => self.exit = status,
                Err(e) => warn!(ordinal = self.ordinal(), error = %e, "failed to poll stage"),
            }
        }
        self.exit
    }

    /// Attribute a completion notification to this stage.
    pub(crate) fn credit(&mut self) {
        self.credited = true;
    }

    /// Log, once, that the worker exited without being credited.
    pub(crate) fn report_silent_exit(&mut self) {
        if self.reported_silent_exit {
            return;
        }
        if let Some(status) = self.exit {
            if !self.credited && !status.success() {
                warn!(
                    ordinal = self.ordinal(),
                    %status,
                    "stage exited without notifying; the pipeline cannot advance"
                );
                self.reported_silent_exit = true;
            }
        }
    }

    /// Kill the worker and reap it. Used when a run is abandoned.
    pub(crate) fn kill(&mut self) {
        if self.poll_exit().is_some() {
            return;
        }
        if let Err(e) = self.child.kill() {
            warn!(ordinal = self.ordinal(), error = %e, "failed to kill stage");
        }
        self.reap();
    }

    /// Block until the worker has exited and collect its status.
    pub(crate) fn reap(&mut self) -> Option<ExitStatus> {
        match self.child.wait() {
            Ok(status) => {
                self.exit = Some(status);
                Some(status)
            }
            Err(e) => {
                warn!(ordinal = self.ordinal(), error = %e, "failed to reap stage");
                self.exit
            }
        }
    }
}
