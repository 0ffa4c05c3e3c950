//! Lifecycle controller state machine and command loop.

use crate::control::command::{parse_command, Input};
use crate::control::error::{ControlError, ControlResult};
use crate::control::process::ManagedProcess;
use sp_protocol::config_models::ControllerSettings;
use sp_protocol::ipc::{Event, Op, ShutdownReason};
use sp_protocol::process_models::ProcessState;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Whether the command loop keeps going after an op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Owns at most one managed child and applies operator ops to it.
///
/// Every outcome is reported on the event channel; nothing is printed here.
pub struct LifecycleController {
    settings: ControllerSettings,
    managed: Option<ManagedProcess>,
    events_tx: UnboundedSender<Event>,
}

impl LifecycleController {
    pub fn new(settings: ControllerSettings, events_tx: UnboundedSender<Event>) -> Self {
        Self {
            settings,
            managed: None,
            events_tx,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.managed
            .as_ref()
            .map_or(ProcessState::Absent, ManagedProcess::state)
    }

    pub fn managed(&self) -> Option<&ManagedProcess> {
        self.managed.as_ref()
    }

    /// Apply one op. Returns [`Flow::Exit`] once the controller has shut down.
    pub async fn handle(&mut self, op: Op) -> Flow {
        debug!(%op, state = ?self.state(), "handling op");
        match op {
            Op::Create => self.create(),
            Op::Suspend | Op::Continue => self.signal(op),
            Op::Terminate => {
                self.shutdown(ShutdownReason::Terminate).await;
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Reap the child if it exited on its own, returning to `Absent`.
    pub fn refresh(&mut self) {
        let Some(process) = self.managed.as_mut() else {
            return;
        };
        if let Some(status) = process.try_reap() {
            let pid = process.pid();
            self.managed = None;
            info!(pid, %status, "managed child exited");
            self.emit(Event::ChildExited {
                pid,
                code: status.code(),
            });
        }
    }

    /// Kill and reap the child, if any, and report the shutdown.
    pub async fn shutdown(&mut self, reason: ShutdownReason) {
        if let Some(process) = self.managed.take() {
            let pid = process.pid();
            process.kill_and_reap().await;
            self.emit(Event::ChildTerminated { pid });
        }
        info!(?reason, "controller shutting down");
        self.emit(Event::ShuttingDown { reason });
    }

    pub fn report_unknown(&self, input: &str) {
        self.emit(Event::UnknownCommand {
            input: input.to_string(),
        });
    }

    fn create(&mut self) {
        if let Some(process) = &self.managed {
            self.emit(Event::ChildAlreadyExists { pid: process.pid() });
            return;
        }
        match ManagedProcess::spawn(&self.settings) {
            Ok(process) => {
                let info = process.info();
                self.managed = Some(process);
                self.emit(Event::ChildCreated {
                    pid: info.pid,
                    created_at: info.created_at,
                });
            }
            Err(e) => self.emit(Event::SpawnFailed {
                error: e.to_string(),
            }),
        }
    }

    fn signal(&mut self, op: Op) {
        let Some(process) = self.managed.as_mut() else {
            self.emit(Event::NoActiveChild { op });
            return;
        };
        let pid = process.pid();
        let (result, signal) = match op {
            Op::Suspend => (process.suspend(), "SIGSTOP"),
            _ => (process.resume(), "SIGCONT"),
        };
        let event = match result {
            Ok(()) if op == Op::Suspend => Event::ChildSuspended { pid },
            Ok(()) => Event::ChildResumed { pid },
            Err(e) => Event::SignalFailed {
                pid,
                signal: signal.to_string(),
                error: e.to_string(),
            },
        };
        self.emit(event);
    }

    fn emit(&self, event: Event) {
        // A closed receiver means nobody is rendering; the controller carries on.
        let _ = self.events_tx.send(event);
    }
}

/// Run the command loop until terminate, end of input or `interrupt` fires.
///
/// `before_read` runs each time the loop is about to wait for a line, which
/// is where a prompt renders pending events. The child is polled before every
/// command so one that exited on its own is reported first.
///
/// # Errors
///
/// Returns [`ControlError::Input`] if reading `input` fails. The child is
/// still killed in that case, when the controller is dropped.
pub async fn drive<R, I, F>(
    controller: &mut LifecycleController,
    input: R,
    interrupt: I,
    mut before_read: F,
) -> ControlResult<ShutdownReason>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
    F: FnMut(&LifecycleController),
{
    let mut lines = input.lines();
    tokio::pin!(interrupt);

    loop {
        before_read(&*controller);

        let line = select! {
            _ = &mut interrupt => {
                controller.shutdown(ShutdownReason::Interrupted).await;
                return Ok(ShutdownReason::Interrupted);
            }
            line = lines.next_line() => line.map_err(ControlError::Input)?,
        };

        controller.refresh();

        let Some(line) = line else {
            controller.shutdown(ShutdownReason::EndOfInput).await;
            return Ok(ShutdownReason::EndOfInput);
        };

        match parse_command(&line) {
            Input::Blank => {}
            Input::Unknown(input) => controller.report_unknown(&input),
            Input::Command(op) => {
                if controller.handle(op).await == Flow::Exit {
                    return Ok(ShutdownReason::Terminate);
                }
            }
        }
    }
}
