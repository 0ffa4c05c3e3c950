//! Settings models for the controller and the pipeline.
//!
//! Nothing is read from disk unless a settings file is passed explicitly on
//! the command line; the defaults reproduce the fixed constants both tools
//! were built around.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// Default payload bound, terminator included.
pub const DEFAULT_MAX_PAYLOAD: usize = 256;

/// Default external program run by the managed child.
pub const DEFAULT_PROGRAM: &str = "./interface";

/// All settings, as loaded from an optional TOML file.
///
/// # Example
///
/// ```toml
/// [pipeline]
/// channel-dir = "/tmp/run"
/// max-payload = 128
///
/// [controller]
/// program = "/bin/sleep"
/// args = ["30"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub controller: ControllerSettings,
}

/// Settings for the pipeline orchestrator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct PipelineSettings {
    /// Directory in which the four named channels are created.
    pub channel_dir: PathBuf,

    /// Maximum payload length in bytes, including the terminator.
    ///
    /// Longer input is truncated, not rejected.
    pub max_payload: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            channel_dir: PathBuf::from("."),
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Settings for the lifecycle controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ControllerSettings {
    /// Program the managed child replaces itself with.
    ///
    /// Relative paths resolve against the current working directory.
    pub program: PathBuf,

    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            args: Vec::new(),
        }
    }
}
