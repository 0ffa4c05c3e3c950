//! Pipeline orchestrator.
//!
//! The orchestrator owns the four channels and the three stage workers of a
//! run. It creates the channels, spawns the workers, feeds the original
//! payload into the first channel, then starts each stage in turn and waits
//! for its completion before starting the next. The final payload is read
//! back from the last channel and compared with the original.
//!
//! Completion is attributed per stage: a stage counts as done once a
//! completion notification has been observed *and* its process has exited.
//! `SIGCHLD` wakes the waiter too, so a stage that notifies before it exits
//! is still credited when the exit lands.

pub mod error;
pub mod worker;

pub use error::{PipelineError, PipelineResult};
pub use worker::{SpawnedStage, WorkerCommand};

use crate::channel::{self, ChannelReader, ChannelWriter};
use crate::notify::{notify, NotificationFlag, NotificationWaiter, NOTIFICATION};
use nix::sys::signal::Signal;
use nix::unistd::getpid;
use sp_protocol::config_models::PipelineSettings;
use sp_protocol::pipeline_models::{StageDefinition, Verdict, CHANNEL_NAMES, STAGE_COUNT};
use std::path::PathBuf;
use std::process::ExitStatus;
use tracing::{debug, info, warn};

/// Cut `input` at its first NUL byte and to at most `max_payload - 1` bytes.
///
/// One byte of every channel transfer is reserved for the terminator.
pub fn bound_payload(input: &[u8], max_payload: usize) -> Vec<u8> {
    let end = input
        .iter()
        .position(|b| *b == channel::TERMINATOR)
        .unwrap_or(input.len());
    let limit = max_payload.saturating_sub(1);
    input[..end.min(limit)].to_vec()
}

/// How one stage worker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageExit {
    pub ordinal: usize,
    pub pid: u32,
    pub code: Option<i32>,
    pub success: bool,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Payload fed into the first channel, after bounding.
    pub original: Vec<u8>,
    /// Payload read back from the last channel.
    pub processed: Vec<u8>,
    pub verdict: Verdict,
    pub stages: Vec<StageExit>,
}

/// Sequences the three pipeline stages over named channels.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    settings: PipelineSettings,
    worker: WorkerCommand,
}

impl PipelineOrchestrator {
    pub fn new(settings: PipelineSettings, worker: WorkerCommand) -> Self {
        Self { settings, worker }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Paths of the four channels, in data-flow order.
    pub fn channel_paths(&self) -> Vec<PathBuf> {
        CHANNEL_NAMES
            .iter()
            .map(|name| self.settings.channel_dir.join(name))
            .collect()
    }

    /// Push `payload` through the pipeline and report the result.
    ///
    /// Must be called from a single-threaded process: notifications are
    /// process-directed signals and only the calling thread waits for them.
    ///
    /// # Errors
    ///
    /// Handler installation, channel and spawn failures abort the run.
    /// Channels are left in place in that case. A stage that fails without
    /// notifying leaves this call blocked.
    pub fn run(&self, payload: &[u8]) -> PipelineResult<RunReport> {
        let original = bound_payload(payload, self.settings.max_payload);

        let completion = NotificationFlag::install(NOTIFICATION)?;
        let exited = NotificationFlag::install(Signal::SIGCHLD)?;
        let waiter = NotificationWaiter::new(&[completion, exited]);

        let channels = self.channel_paths();
        for path in &channels {
            channel::create(path)?;
        }
        let mut result = ChannelReader::attach(&channels[STAGE_COUNT])?;

        let mut stages = self.spawn_stages()?;

        info!(payload = %String::from_utf8_lossy(&original), "feeding pipeline");
        let fed = ChannelWriter::open(&channels[0]).and_then(|mut w| w.write_payload(&original));
        if let Err(e) = fed {
            abandon(&mut stages);
            return Err(e.into());
        }

        for current in 0..stages.len() {
            let ordinal = stages[current].ordinal();
            let pid = stages[current].pid();

            completion.clear();
            info!(ordinal, %pid, "starting stage");
            if let Err(e) = notify(pid) {
                abandon(&mut stages);
                return Err(e.into());
            }

            let mut pending = 0;
            waiter.wait_until(|| {
                let notified = completion.take();
                exited.clear();
                settle(&mut stages, current, notified, &mut pending)
            })?;
            info!(ordinal, "stage completed");
        }

        let processed = result.read_payload(self.settings.max_payload)?;
        drop(result);
        let verdict = Verdict::compare(&original, &processed);
        info!(payload = %String::from_utf8_lossy(&processed), ?verdict, "pipeline finished");

        let stages = stages.iter_mut().map(reap).collect();

        for path in &channels {
            channel::remove(path);
        }

        Ok(RunReport {
            original,
            processed,
            verdict,
            stages,
        })
    }

    fn spawn_stages(&self) -> PipelineResult<Vec<SpawnedStage>> {
        let recipient = getpid();
        let mut stages = Vec::with_capacity(STAGE_COUNT);

        for definition in StageDefinition::chain(&self.settings.channel_dir) {
            match self
                .worker
                .spawn(definition, recipient, self.settings.max_payload)
            {
                Ok(stage) => stages.push(stage),
                Err(e) => {
                    abandon(&mut stages);
                    return Err(e);
                }
            }
        }
        Ok(stages)
    }
}

/// Attribute completions observed so far and report whether stage `current`
/// is done.
///
/// `notified` says whether a completion notification arrived since the last
/// call; unattributed notifications accumulate in `pending`. A notification
/// is credited to the current stage once its process has exited.
fn settle(stages: &mut [SpawnedStage], current: usize, notified: bool, pending: &mut usize) -> bool {
    if notified {
        *pending += 1;
    }

    for stage in stages.iter_mut() {
        if stage.poll_exit().is_some() {
            stage.report_silent_exit();
        }
    }

    let stage = &mut stages[current];
    if !stage.is_credited() && *pending > 0 && stage.exit_status().is_some() {
        stage.credit();
        *pending -= 1;
        debug!(ordinal = stage.ordinal(), "credited completion");
    }
    stage.is_credited()
}

fn reap(stage: &mut SpawnedStage) -> StageExit {
    let status = stage.reap();
    let exit = StageExit {
        ordinal: stage.ordinal(),
        pid: stage.id(),
        code: status.as_ref().and_then(ExitStatus::code),
        success: status.is_some_and(|s| s.success()),
    };
    if !exit.success {
        warn!(ordinal = exit.ordinal, code = ?exit.code, "stage did not exit cleanly");
    }
    exit
}

fn abandon(stages: &mut [SpawnedStage]) {
    for stage in stages.iter_mut() {
        stage.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn finished_stages(program: &str) -> Vec<SpawnedStage> {
        let worker = WorkerCommand::new(program, Vec::new());
        StageDefinition::chain(Path::new("."))
            .into_iter()
            .map(|definition| {
                let mut stage = worker
                    .spawn(definition, nix::unistd::Pid::from_raw(1), 256)
                    .expect("spawn");
                stage.reap();
                stage
            })
            .collect()
    }

    #[test]
    fn test_bound_payload_reserves_terminator() {
        assert_eq!(bound_payload(b"Hola", 256), b"Hola");
        assert_eq!(bound_payload(b"abcdefgh", 5), b"abcd");
        assert_eq!(bound_payload(b"ab", 3), b"ab");
        assert!(bound_payload(b"abc", 1).is_empty());
    }

    #[test]
    fn test_bound_payload_stops_at_nul() {
        assert_eq!(bound_payload(b"Ho\0la", 256), b"Ho");
        assert!(bound_payload(b"", 256).is_empty());
    }

    #[test]
    fn test_channel_paths_follow_settings() {
        let settings = PipelineSettings {
            channel_dir: PathBuf::from("/tmp/run"),
            ..PipelineSettings::default()
        };
        let orchestrator = PipelineOrchestrator::new(settings, WorkerCommand::new("true", Vec::new()));

        assert_eq!(
            orchestrator.channel_paths(),
            vec![
                PathBuf::from("/tmp/run/fifo_message"),
                PathBuf::from("/tmp/run/fifo_encrypt"),
                PathBuf::from("/tmp/run/fifo_decrypt"),
                PathBuf::from("/tmp/run/fifo_result"),
            ]
        );
    }

    #[test]
    fn test_exit_alone_does_not_credit() {
        let mut stages = finished_stages("true");
        let mut pending = 0;

        assert!(!settle(&mut stages, 0, false, &mut pending));
        assert!(settle(&mut stages, 0, true, &mut pending));
        assert_eq!(pending, 0);
    }

    #[test]
    fn test_notification_waits_for_exit_of_current_stage() {
        let mut stages = finished_stages("true");
        let mut pending = 0;

        assert!(settle(&mut stages, 0, true, &mut pending));
        // A second notification is credited to the next stage only.
        assert!(settle(&mut stages, 1, true, &mut pending));
        assert!(!stages[2].is_credited());
        assert!(!settle(&mut stages, 2, false, &mut pending));
    }

    #[test]
    fn test_failed_exit_is_never_credited_without_notification() {
        let mut stages = finished_stages("false");
        let mut pending = 0;

        for _ in 0..3 {
            assert!(!settle(&mut stages, 0, false, &mut pending));
        }
        assert!(!stages[0].is_credited());
    }

    #[test]
    fn test_reap_reports_exit_code() {
        let mut stages = finished_stages("false");
        let exit = reap(&mut stages[1]);

        assert_eq!(exit.ordinal, 2);
        assert_eq!(exit.code, Some(1));
        assert!(!exit.success);
    }
}
