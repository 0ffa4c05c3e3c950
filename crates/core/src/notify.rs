//! Signal-driven notifications between processes.
//!
//! A notification carries no data. The sender signals the receiver by process
//! id; the receiver's handler only records that the signal arrived, in a
//! per-signal atomic flag. The owning process clears the flag when it observes
//! it.
//!
//! Waiting is done with [`NotificationWaiter::wait_until`]: the watched
//! signals are blocked while the caller's condition is evaluated, and
//! unblocked atomically with going to sleep (`sigsuspend`). A notification
//! that lands between the check and the sleep therefore stays pending and
//! wakes the sleep immediately instead of being lost.

use nix::errno::Errno;
use nix::libc::c_int;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{trace, warn};

/// Signal used for both start and completion notifications.
pub const NOTIFICATION: Signal = Signal::SIGUSR1;

const SLOTS: usize = 65;

#[allow(clippy::declare_interior_mutable_const)]
const CLEAR: AtomicBool = AtomicBool::new(false);

/// One flag per signal number, written only by [`record`].
static RAISED: [AtomicBool; SLOTS] = [CLEAR; SLOTS];

extern "C" fn record(signal: c_int) {
    if let Some(flag) = usize::try_from(signal).ok().and_then(|slot| RAISED.get(slot)) {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur while installing, sending or waiting for notifications.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The signal handler could not be installed.
    #[error("Failed to install handler for {signal}: {source}")]
    Install { signal: Signal, source: Errno },

    /// The notification could not be delivered to the target process.
    #[error("Failed to deliver {signal} to process {pid}: {source}")]
    Deliver {
        pid: Pid,
        signal: Signal,
        source: Errno,
    },

    /// The signal mask could not be changed.
    #[error("Failed to update the signal mask: {0}")]
    Mask(Errno),

    /// Suspending until a signal arrives failed.
    #[error("Failed to wait for a notification: {0}")]
    Wait(Errno),
}

/// Edge-triggered flag raised by the delivery of one signal.
///
/// Copies of a flag all refer to the same process-wide bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationFlag {
    signal: Signal,
}

impl NotificationFlag {
    /// Install the recording handler for `signal` and return its cleared flag.
    ///
    /// Interrupted system calls are restarted. For `SIGCHLD`, stopped
    /// children do not raise the flag.
    pub fn install(signal: Signal) -> NotifyResult<Self> {
        let mut flags = SaFlags::SA_RESTART;
        if signal == Signal::SIGCHLD {
            flags |= SaFlags::SA_NOCLDSTOP;
        }
        let action = SigAction::new(SigHandler::Handler(record), flags, SigSet::empty());

        // SAFETY: `record` performs a single atomic store, which is
        // async-signal-safe, and touches no other state.
        unsafe { signal::sigaction(signal, &action) }
            .map_err(|source| NotifyError::Install { signal, source })?;

        let flag = Self { signal };
        flag.clear();
        trace!(%signal, "installed notification handler");
        Ok(flag)
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn is_set(&self) -> bool {
        self.slot().load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.slot().store(false, Ordering::SeqCst);
    }

    /// Observe and clear the flag in one step.
    pub fn take(&self) -> bool {
        self.slot().swap(false, Ordering::SeqCst)
    }

    fn slot(&self) -> &'static AtomicBool {
        &RAISED[self.signal as usize]
    }
}

/// Blocks the calling thread until a condition over notification flags holds.
#[derive(Debug)]
pub struct NotificationWaiter {
    signals: Vec<Signal>,
    watched: SigSet,
}

impl NotificationWaiter {
    /// Create a waiter woken by the signals behind `flags`.
    pub fn new(flags: &[NotificationFlag]) -> Self {
        let signals: Vec<Signal> = flags.iter().map(NotificationFlag::signal).collect();
        let mut watched = SigSet::empty();
        for signal in &signals {
            watched.add(*signal);
        }
        Self { signals, watched }
    }

    /// Block until `ready` returns true.
    ///
    /// `ready` is evaluated once up front and again after every delivery of
    /// a watched signal; it is responsible for observing and clearing flags.
    /// The caller's signal mask is restored before returning.
    pub fn wait_until<F>(&self, mut ready: F) -> NotifyResult<()>
    where
        F: FnMut() -> bool,
    {
        let previous = self
            .watched
            .thread_swap_mask(SigmaskHow::SIG_BLOCK)
            .map_err(NotifyError::Mask)?;

        let outcome = self.suspend_until(&mut ready);

        if let Err(e) = previous.thread_set_mask() {
            warn!(error = %e, "failed to restore signal mask");
        }
        outcome
    }

    fn suspend_until<F>(&self, ready: &mut F) -> NotifyResult<()>
    where
        F: FnMut() -> bool,
    {
        let mut sleeping_mask = SigSet::thread_get_mask().map_err(NotifyError::Mask)?;
        for signal in &self.signals {
            sleeping_mask.remove(*signal);
        }

        while !ready() {
            match sleeping_mask.suspend() {
                Ok(()) | Err(Errno::EINTR) => trace!("woken by notification"),
                Err(e) => return Err(NotifyError::Wait(e)),
            }
        }
        Ok(())
    }
}

/// Send a notification to `pid`.
pub fn notify(pid: Pid) -> NotifyResult<()> {
    signal::kill(pid, NOTIFICATION).map_err(|source| NotifyError::Deliver {
        pid,
        signal: NOTIFICATION,
        source,
    })?;
    trace!(%pid, "sent notification");
    Ok(())
}
