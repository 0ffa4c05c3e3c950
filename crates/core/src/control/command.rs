//! Operator command parsing.

use sp_protocol::ipc::Op;

/// One line of operator input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Empty or whitespace-only line.
    Blank,
    Command(Op),
    /// Anything else, trimmed.
    Unknown(String),
}

/// Classify `line` by its first non-whitespace character, case-insensitively.
///
/// Characters after the first one are ignored, so `"create"` means `C`.
pub fn parse_command(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed.chars().next() {
        None => Input::Blank,
        Some(key) => match Op::from_key(key) {
            Some(op) => Input::Command(op),
            None => Input::Unknown(trimmed.to_string()),
        },
    }
}
