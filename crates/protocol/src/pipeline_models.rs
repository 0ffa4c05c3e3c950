//! Pipeline models: transforms, stage definitions and run outcomes.
//!
//! The pipeline is a fixed chain of three stages. Each stage reads one named
//! channel, applies a [`Transform`], and writes the next channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Byte offset applied by the shift transforms.
pub const SHIFT: u8 = 3;

/// Number of stages in a pipeline run.
pub const STAGE_COUNT: usize = 3;

/// Well-known channel names, in data-flow order.
///
/// Channel `n` is the input of stage `n + 1`; the last one carries the
/// result back to the orchestrator.
pub const CHANNEL_NAMES: [&str; STAGE_COUNT + 1] =
    ["fifo_message", "fifo_encrypt", "fifo_decrypt", "fifo_result"];

/// The behavior a stage applies to its payload.
///
/// Every transform is pure and total over bytes. Shifts wrap around the byte
/// range, so `Decrypt` always undoes `Encrypt`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// Add [`SHIFT`] to every byte.
    Encrypt,

    /// Reverse the byte order.
    Reverse,

    /// Subtract [`SHIFT`] from every byte.
    Decrypt,
}

impl Transform {
    /// The transforms of a pipeline run, in stage order.
    pub const CHAIN: [Transform; STAGE_COUNT] =
        [Transform::Encrypt, Transform::Reverse, Transform::Decrypt];

    /// Apply the transform in place.
    pub fn apply(self, payload: &mut [u8]) {
        match self {
            Transform::Encrypt => payload.iter_mut().for_each(|b| *b = b.wrapping_add(SHIFT)),
            Transform::Reverse => payload.reverse(),
            Transform::Decrypt => payload.iter_mut().for_each(|b| *b = b.wrapping_sub(SHIFT)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transform::Encrypt => "encrypt",
            Transform::Reverse => "reverse",
            Transform::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "encrypt" => Ok(Transform::Encrypt),
            "reverse" => Ok(Transform::Reverse),
            "decrypt" => Ok(Transform::Decrypt),
            other => Err(format!(
                "unknown transform '{other}' (expected encrypt, reverse or decrypt)"
            )),
        }
    }
}

/// Static description of one pipeline stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StageDefinition {
    /// One-based position in the pipeline.
    pub ordinal: usize,

    /// Behavior applied to the payload.
    pub transform: Transform,

    /// Channel the stage reads from.
    pub input: PathBuf,

    /// Channel the stage writes to.
    pub output: PathBuf,
}

impl StageDefinition {
    /// Build the three stage definitions for channels located in `dir`.
    pub fn chain(dir: &Path) -> Vec<StageDefinition> {
        Transform::CHAIN
            .iter()
            .enumerate()
            .map(|(index, transform)| StageDefinition {
                ordinal: index + 1,
                transform: *transform,
                input: dir.join(CHANNEL_NAMES[index]),
                output: dir.join(CHANNEL_NAMES[index + 1]),
            })
            .collect()
    }
}

/// States of a pipeline worker.
///
/// Transitions are strictly sequential:
/// AwaitingStart -> ReadingInput -> Transforming -> WritingOutput -> Notifying -> Exited
///
/// Any non-terminal state may move to Failed instead.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageState {
    AwaitingStart,
    ReadingInput,
    Transforming,
    WritingOutput,
    Notifying,
    Exited,
    Failed,
}

impl StageState {
    /// The state that follows this one on the success path.
    ///
    /// Terminal states have no successor.
    pub fn next(self) -> Option<StageState> {
        match self {
            StageState::AwaitingStart => Some(StageState::ReadingInput),
            StageState::ReadingInput => Some(StageState::Transforming),
            StageState::Transforming => Some(StageState::WritingOutput),
            StageState::WritingOutput => Some(StageState::Notifying),
            StageState::Notifying => Some(StageState::Exited),
            StageState::Exited | StageState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

/// Outcome of comparing the final payload with the original one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Match,
    Mismatch,
}

impl Verdict {
    pub fn compare(original: &[u8], processed: &[u8]) -> Self {
        if original == processed {
            Verdict::Match
        } else {
            Verdict::Mismatch
        }
    }
}
