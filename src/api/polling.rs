use std::fmt::Display;

use tokio_util::sync::CancellationToken;

use super::client::ApiClient;
use super::errors::ApiClientError;
use super::models::{Job, Solution};
use super::stop::StopSignal;
use super::transport::Transport;
use super::types::PollStatus;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SolveState {
    Submitting,
    /// Entered once the upload succeeds and re-entered after every
    /// status check that came back pending.
    Polling { job: Job, polls: u32 },
    Solved,
    Failed,
}

impl SolveState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Solved | Self::Failed)
    }
}

impl Display for SolveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitting => write!(f, "Submitting"),
            Self::Polling { job, polls } => write!(f, "Polling job {} ({polls} checks)", job.id()),
            Self::Solved => write!(f, "Solved"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Drives one captcha from upload to answer.
///
/// Waits one poll interval between status checks and stops at the first
/// answer or error. `run` consumes the workflow, so each instance solves
/// exactly one image.
pub struct SolveWorkflow<'a, T: Transport> {
    api: &'a ApiClient<T>,
    cancel: CancellationToken,
    observer: Option<Box<dyn FnMut(&SolveState) + 'a>>,
}

impl<'a, T: Transport> SolveWorkflow<'a, T> {
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            cancel: CancellationToken::new(),
            observer: None,
        }
    }

    /// Stops with [`ApiClientError::Cancelled`] once `cancel` is
    /// triggered, including while waiting out a busy service.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Calls `observer` on every state the workflow enters.
    #[must_use]
    pub fn on_transition(mut self, observer: impl FnMut(&SolveState) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// # Errors
    ///
    /// Will return `Err` if the upload or a status check fails, if the
    /// workflow is cancelled or if the configured solve timeout elapses.
    pub fn run(mut self, image: &[u8]) -> Result<Solution, ApiClientError> {
        let stop = StopSignal::new(self.cancel.clone(), self.api.config().solve_timeout());

        let result = self.drive(image, &stop);
        match &result {
            Ok(solution) => {
                log::debug!("Job {} solved after {} checks", solution.job.id(), solution.polls);
                self.enter(SolveState::Solved);
            }
            Err(e) => {
                log::debug!("Solving failed: {e}");
                self.enter(SolveState::Failed);
            }
        }
        result
    }

    fn drive(&mut self, image: &[u8], stop: &StopSignal) -> Result<Solution, ApiClientError> {
        stop.check()?;
        self.enter(SolveState::Submitting);
        let job = self.api.upload_image_until(image, stop)?;

        let mut polls = 0;
        self.enter(SolveState::Polling {
            job: job.clone(),
            polls,
        });

        loop {
            stop.pause(self.api.config().poll_interval());
            stop.check()?;
            polls += 1;

            match self.api.get_status_until(job.id(), stop)? {
                PollStatus::Solved(text) => return Ok(Solution { job, text, polls }),
                PollStatus::Pending => self.enter(SolveState::Polling {
                    job: job.clone(),
                    polls,
                }),
            }
        }
    }

    fn enter(&mut self, state: SolveState) {
        log::debug!("Solve workflow: {state}");
        if let Some(observer) = self.observer.as_mut() {
            observer(&state);
        }
    }
}
