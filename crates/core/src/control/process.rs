//! The single child process owned by the lifecycle controller.

use chrono::{DateTime, Utc};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use sp_protocol::config_models::ControllerSettings;
use sp_protocol::process_models::{ManagedProcessInfo, ProcessState};
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// A spawned child and the lifecycle state the controller tracks for it.
///
/// The child is killed if the handle is dropped without being reaped.
#[derive(Debug)]
pub struct ManagedProcess {
    child: Child,
    pid: u32,
    state: ProcessState,
    created_at: DateTime<Utc>,
}

impl ManagedProcess {
    /// Spawn `settings.program` with its arguments.
    ///
    /// The child inherits stdout and stderr but not stdin, which stays with
    /// the operator prompt.
    pub fn spawn(settings: &ControllerSettings) -> io::Result<Self> {
        let child = Command::new(&settings.program)
            .args(&settings.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child
            .id()
            .ok_or_else(|| io::Error::other("spawned child has no process id"))?;

        info!(pid, program = %settings.program.display(), "spawned managed child");
        Ok(Self {
            child,
            pid,
            state: ProcessState::Running,
            created_at: Utc::now(),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn info(&self) -> ManagedProcessInfo {
        ManagedProcessInfo {
            pid: self.pid,
            state: self.state,
            created_at: self.created_at,
        }
    }

    /// Stop the child with `SIGSTOP`.
    pub fn suspend(&mut self) -> nix::Result<()> {
        self.send(Signal::SIGSTOP)?;
        self.state = ProcessState::Suspended;
        Ok(())
    }

    /// Let a stopped child run again with `SIGCONT`.
    pub fn resume(&mut self) -> nix::Result<()> {
        self.send(Signal::SIGCONT)?;
        self.state = ProcessState::Running;
        Ok(())
    }

    /// Reap the child if it has already exited, without blocking.
    pub fn try_reap(&mut self) -> Option<ExitStatus> {
        match self.child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                warn!(pid = self.pid, error = %e, "failed to poll managed child");
                None
            }
        }
    }

    /// Kill the child with `SIGKILL` and wait for it.
    ///
    /// Kill failures are logged; the wait still happens so a child that was
    /// already gone is reaped.
    pub async fn kill_and_reap(mut self) -> Option<ExitStatus> {
        if let Err(e) = self.child.start_kill() {
            warn!(pid = self.pid, error = %e, "failed to kill managed child");
        }
        match self.child.wait().await {
            Ok(status) => {
                debug!(pid = self.pid, %status, "reaped managed child");
                Some(status)
            }
            Err(e) => {
                warn!(pid = self.pid, error = %e, "failed to reap managed child");
                None
            }
        }
    }

    fn send(&self, signal: Signal) -> nix::Result<()> {
        let pid = Pid::from_raw(self.pid as i32);
        signal::kill(pid, signal)?;
        debug!(pid = self.pid, %signal, "signalled managed child");
        Ok(())
    }
}
