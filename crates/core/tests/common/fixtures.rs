//! Test fixtures: settings, channel directories and helper processes.

use sp_core::channel;
use sp_protocol::config_models::ControllerSettings;
use sp_protocol::pipeline_models::StageDefinition;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Controller settings that run `sleep <seconds>`.
#[allow(dead_code)]
pub fn sleeper(seconds: u32) -> ControllerSettings {
    ControllerSettings {
        program: PathBuf::from("sleep"),
        args: vec![seconds.to_string()],
    }
}

/// A temporary directory with all four pipeline channels created.
///
/// Returns the directory, which must be kept alive for the test duration,
/// and the stage definitions wired to it.
#[allow(dead_code)]
pub fn channel_dir() -> std::io::Result<(TempDir, Vec<StageDefinition>)> {
    let dir = tempfile::tempdir()?;
    let stages = StageDefinition::chain(dir.path());
    for stage in &stages {
        channel::create(&stage.input).map_err(std::io::Error::other)?;
        channel::create(&stage.output).map_err(std::io::Error::other)?;
    }
    Ok((dir, stages))
}

/// A long-running process that stands in for a notification recipient.
///
/// The default action of the notification signal terminates it, so its exit
/// status shows whether it was notified.
#[allow(dead_code)]
pub fn spawn_recipient() -> std::io::Result<Child> {
    Command::new("sleep").arg("30").spawn()
}

/// The one-letter scheduler state of `pid` from `/proc/<pid>/stat`.
///
/// `R`/`S` for a live process, `T` for a stopped one, `None` once it is gone.
#[allow(dead_code)]
pub fn scheduler_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // The command name is parenthesised and may contain spaces.
    let after_name = &stat[stat.rfind(')')? + 1..];
    after_name.trim_start().chars().next()
}

/// Poll `check` every 20ms until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn wait_for<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    check()
}
