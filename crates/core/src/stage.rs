//! Pipeline stage worker.
//!
//! A worker runs in its own process and walks a fixed sequence of states:
//! wait for the start notification, read its input channel, transform the
//! payload, write its output channel, notify the recipient, exit. Any channel
//! failure or an empty input ends the worker in the failed state without
//! notifying anyone.

use crate::channel::{ChannelError, ChannelReader, ChannelWriter};
use crate::notify::{notify, NotificationFlag, NotificationWaiter, NotifyError, NOTIFICATION};
use nix::unistd::{getpid, Pid};
use sp_protocol::pipeline_models::{StageDefinition, StageState, Transform};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Result type for stage execution.
pub type StageResult<T> = Result<T, StageError>;

/// Errors that end a stage worker in the failed state.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// The input channel delivered an empty payload.
    #[error("Stage {ordinal} received an empty payload")]
    EmptyPayload { ordinal: usize },
}

/// Apply `transform` to a payload read by stage `ordinal`.
///
/// An empty payload is a contract violation, not a valid input.
pub fn process_payload(
    ordinal: usize,
    transform: Transform,
    mut payload: Vec<u8>,
) -> StageResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(StageError::EmptyPayload { ordinal });
    }
    transform.apply(&mut payload);
    Ok(payload)
}

/// One pipeline stage, driven to completion by [`StageWorker::run`].
#[derive(Debug)]
pub struct StageWorker {
    definition: StageDefinition,
    recipient: Pid,
    max_payload: usize,
    state: StageState,
}

impl StageWorker {
    /// Create a worker that will report completion to `recipient`.
    pub fn new(definition: StageDefinition, recipient: Pid, max_payload: usize) -> Self {
        Self {
            definition,
            recipient,
            max_payload,
            state: StageState::AwaitingStart,
        }
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn definition(&self) -> &StageDefinition {
        &self.definition
    }

    /// Run the stage from `AwaitingStart` to a terminal state.
    ///
    /// Returns the payload written to the output channel.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the worker in [`StageState::Failed`], if
    /// the handler cannot be installed, a channel operation fails, or the
    /// input payload is empty. Failing to notify the recipient is logged but
    /// does not fail the stage.
    pub fn run(&mut self) -> StageResult<Vec<u8>> {
        let result = self.drive();
        if let Err(e) = &result {
            self.state = StageState::Failed;
            error!(ordinal = self.definition.ordinal, error = %e, "stage failed");
        }
        result
    }

    fn drive(&mut self) -> StageResult<Vec<u8>> {
        let ordinal = self.definition.ordinal;

        // The handler must be in place before the input is attached: the
        // orchestrator only sends the start notification after a writer has
        // rendezvoused with this reader.
        let start = NotificationFlag::install(NOTIFICATION)?;
        let mut input = ChannelReader::attach(&self.definition.input)?;

        info!(
            ordinal,
            pid = %getpid(),
            transform = %self.definition.transform,
            "awaiting start notification"
        );
        NotificationWaiter::new(&[start]).wait_until(|| start.take())?;

        self.advance();
        let payload = input.read_payload(self.max_payload)?;
        drop(input);
        info!(ordinal, payload = %String::from_utf8_lossy(&payload), "read input");

        self.advance();
        let payload = process_payload(ordinal, self.definition.transform, payload)?;
        info!(ordinal, payload = %String::from_utf8_lossy(&payload), "transformed payload");

        self.advance();
        ChannelWriter::open(&self.definition.output)?.write_payload(&payload)?;

        self.advance();
        if let Err(e) = notify(self.recipient) {
            warn!(ordinal, recipient = %self.recipient, error = %e, "failed to notify recipient");
        }

        self.advance();
        Ok(payload)
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            debug!(ordinal = self.definition.ordinal, from = ?self.state, to = ?next, "stage transition");
            self.state = next;
        }
    }
}
