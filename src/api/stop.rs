use std::{
    thread,
    time::{Duration, Instant},
};

use tokio_util::sync::CancellationToken;

use super::errors::ApiClientError;

/// Longest uninterrupted sleep while waiting for the next request.
const CHECK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

/// Conditions under which a solve must stop: a cancelled token or an
/// elapsed solve timeout.
///
/// Waits between requests go through [`StopSignal::pause`] so that
/// either condition interrupts them within [`CHECK_INTERVAL`].
#[derive(Clone, Debug)]
pub(crate) struct StopSignal {
    cancel: CancellationToken,
    deadline: Option<Deadline>,
}

impl StopSignal {
    /// A signal that never fires.
    pub(crate) fn never() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    /// A timeout too large to be represented as an `Instant` means no
    /// deadline at all.
    pub(crate) fn new(cancel: CancellationToken, timeout: Option<Duration>) -> Self {
        let deadline = timeout.and_then(|limit| {
            Instant::now()
                .checked_add(limit)
                .map(|at| Deadline { at, limit })
        });
        Self { cancel, deadline }
    }

    /// # Errors
    ///
    /// Returns [`ApiClientError::Cancelled`] or [`ApiClientError::TimedOut`]
    /// once the corresponding condition holds. Cancellation wins.
    pub(crate) fn check(&self) -> Result<(), ApiClientError> {
        if self.cancel.is_cancelled() {
            return Err(ApiClientError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline.at => {
                Err(ApiClientError::TimedOut(deadline.limit))
            }
            _ => Ok(()),
        }
    }

    /// Sleeps for `dur`, returning early once the signal fires.
    pub(crate) fn pause(&self, dur: Duration) {
        let start = Instant::now();
        while self.check().is_ok() {
            let elapsed = start.elapsed();
            if elapsed >= dur {
                return;
            }
            thread::sleep((dur - elapsed).min(CHECK_INTERVAL));
        }
    }
}
