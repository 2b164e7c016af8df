use std::{cell::Cell, time::Duration};

use backon::{BlockingRetryable, ConstantBuilder};
use base64::{engine::general_purpose::STANDARD, Engine};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{ClientConfig, ConfigError};

use super::errors::ApiClientError;
use super::models::{Job, LoadStat};
use super::polling::SolveWorkflow;
use super::stop::StopSignal;
use super::transport::{HttpTransport, Transport, TransportError};
use super::types::{ClassifiedResponse, PollStatus, NOT_READY};

const UPLOAD_ENDPOINT: &str = "in.php";
const RESULT_ENDPOINT: &str = "res.php";
const LOAD_ENDPOINT: &str = "load.php";

/// Outcome of one attempt inside a rate-limit retry loop.
enum Attempt {
    NoSlot,
    Finished(ApiClientError),
}

impl Attempt {
    const fn is_no_slot(&self) -> bool {
        matches!(self, Self::NoSlot)
    }
}

impl From<ApiClientError> for Attempt {
    fn from(err: ApiClientError) -> Self {
        Self::Finished(err)
    }
}

impl From<TransportError> for Attempt {
    fn from(err: TransportError) -> Self {
        Self::Finished(ApiClientError::from(err))
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<HttpTransport> {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiClientError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> ApiClient<T> {
    pub const fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// # Errors
    ///
    /// Will return `Err` if the base URL cannot be a base.
    pub fn upload_url(&self) -> Result<Url, ApiClientError> {
        endpoint_url(self.config.base_url(), UPLOAD_ENDPOINT)
    }

    /// # Errors
    ///
    /// Will return `Err` if the base URL cannot be a base.
    pub fn status_url(&self, job_id: u64) -> Result<Url, ApiClientError> {
        let mut url = endpoint_url(self.config.base_url(), RESULT_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("key", self.config.key())
            .append_pair("action", "get")
            .append_pair("id", &job_id.to_string());
        Ok(url)
    }

    /// # Errors
    ///
    /// Will return `Err` if the base URL cannot be a base.
    pub fn balance_url(&self) -> Result<Url, ApiClientError> {
        let mut url = endpoint_url(self.config.base_url(), RESULT_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("key", self.config.key())
            .append_pair("action", "getbalance");
        Ok(url)
    }

    /// Uploads `image` and returns the job the service created for it.
    ///
    /// # Errors
    ///
    /// Will return `Err` on transport failure, on a service rejection,
    /// if no slot became available within the retry budget or if the
    /// job id is not a number.
    pub fn upload_image(&self, image: &[u8]) -> Result<Job, ApiClientError> {
        self.upload_image_until(image, &StopSignal::never())
    }

    pub(crate) fn upload_image_until(
        &self,
        image: &[u8],
        stop: &StopSignal,
    ) -> Result<Job, ApiClientError> {
        let url = self.upload_url()?;
        let body = STANDARD.encode(image);
        let form = [
            ("key", self.config.key()),
            ("method", "base64"),
            ("body", body.as_str()),
        ];

        let id = self.retry_on_no_slot(stop, || {
            let response = self.transport.post_form(&url, &form)?;
            log::debug!("Upload response: {response}");

            match ClassifiedResponse::classify(&response) {
                ClassifiedResponse::Solved { text } => text
                    .parse::<u64>()
                    .map_err(|_| Attempt::from(ApiClientError::malformed("job id", text))),
                ClassifiedResponse::RateLimited => Err(Attempt::NoSlot),
                // Only res.php may answer "not ready"
                ClassifiedResponse::Pending => {
                    Err(Attempt::from(ApiClientError::Rejected(NOT_READY.to_owned())))
                }
                ClassifiedResponse::Failed { reason } => {
                    Err(Attempt::from(ApiClientError::Rejected(reason)))
                }
            }
        })?;

        log::debug!("Captcha uploaded as job {id}");
        Ok(Job::new(id))
    }

    /// Checks once whether `job_id` has been solved.
    ///
    /// # Errors
    ///
    /// Will return `Err` on transport failure, on a service rejection or
    /// if no slot became available within the retry budget. A job that
    /// is still being worked on is [`PollStatus::Pending`], not an error.
    pub fn get_status(&self, job_id: u64) -> Result<PollStatus, ApiClientError> {
        self.get_status_until(job_id, &StopSignal::never())
    }

    pub(crate) fn get_status_until(
        &self,
        job_id: u64,
        stop: &StopSignal,
    ) -> Result<PollStatus, ApiClientError> {
        let url = self.status_url(job_id)?;

        self.retry_on_no_slot(stop, || {
            let response = self.transport.get(&url)?;
            log::debug!("Status response for job {job_id}: {response}");

            match ClassifiedResponse::classify(&response) {
                ClassifiedResponse::Solved { text } => Ok(PollStatus::Solved(text)),
                ClassifiedResponse::Pending => Ok(PollStatus::Pending),
                ClassifiedResponse::RateLimited => Err(Attempt::NoSlot),
                ClassifiedResponse::Failed { reason } => {
                    Err(Attempt::from(ApiClientError::Rejected(reason)))
                }
            }
        })
    }

    /// # Errors
    ///
    /// Will return `Err` on transport failure or if the body is not a
    /// number. Error tokens such as `ERROR_KEY_DOES_NOT_EXIST` are kept
    /// verbatim in the [`ApiClientError::Malformed`] body.
    pub fn get_balance(&self) -> Result<f64, ApiClientError> {
        let url = self.balance_url()?;
        let response = self.transport.get(&url)?;
        log::debug!("Balance response: {response}");

        response
            .trim()
            .parse::<f64>()
            .map_err(|_| ApiClientError::malformed("balance", response.clone()))
    }

    /// # Errors
    ///
    /// See [`get_load_stats`].
    pub fn load_stats(&self) -> Result<LoadStat, ApiClientError> {
        get_load_stats(&self.transport, self.config.base_url())
    }

    /// Uploads `image` and waits until the service solves it.
    ///
    /// # Errors
    ///
    /// Any error from [`ApiClient::upload_image`] or
    /// [`ApiClient::get_status`], or [`ApiClientError::TimedOut`] when the
    /// configured solve timeout elapses.
    pub fn solve(&self, image: &[u8]) -> Result<String, ApiClientError> {
        SolveWorkflow::new(self).run(image).map(|solution| solution.text)
    }

    /// Like [`ApiClient::solve`], but gives up with
    /// [`ApiClientError::Cancelled`] once `cancel` is triggered.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::solve`].
    pub fn solve_with_cancel(
        &self,
        image: &[u8],
        cancel: CancellationToken,
    ) -> Result<String, ApiClientError> {
        SolveWorkflow::new(self)
            .with_cancellation(cancel)
            .run(image)
            .map(|solution| solution.text)
    }

    /// Runs `op` until it stops reporting a busy service, at most
    /// `max_retries` more times. Waits between attempts end early once
    /// `stop` fires, and no request is sent after that.
    fn retry_on_no_slot<R>(
        &self,
        stop: &StopSignal,
        mut op: impl FnMut() -> Result<R, Attempt>,
    ) -> Result<R, ApiClientError> {
        let attempts = Cell::new(0_u32);
        let fetch = || -> Result<R, Attempt> {
            stop.check()?;
            attempts.set(attempts.get() + 1);
            op()
        };

        let sleeper = stop.clone();
        let max_retries = usize::try_from(self.config.max_retries()).unwrap_or(usize::MAX);
        fetch
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.config.retry_interval())
                    .with_max_times(max_retries),
            )
            .sleep(move |dur: Duration| sleeper.pause(dur))
            .when(|err: &Attempt| err.is_no_slot() && stop.check().is_ok())
            .notify(|_, dur: Duration| {
                log::warn!("No slot available, retrying in {dur:?}");
            })
            .call()
            .map_err(|err| match err {
                Attempt::NoSlot => match stop.check() {
                    Err(stopped) => stopped,
                    Ok(()) => ApiClientError::RateLimited {
                        attempts: attempts.get(),
                    },
                },
                Attempt::Finished(e) => e,
            })
    }
}

/// Fetches the service load statistics. The endpoint needs no key.
///
/// # Errors
///
/// Will return `Err` on transport failure or if the document cannot be
/// decoded.
pub fn get_load_stats<T: Transport>(transport: &T, base: &Url) -> Result<LoadStat, ApiClientError> {
    let url = endpoint_url(base, LOAD_ENDPOINT)?;
    let response = transport.get(&url)?;
    log::debug!("Load statistics response: {response}");

    quick_xml::de::from_str::<LoadStat>(&response).map_err(|e| {
        log::error!("Failed to decode load statistics: {e}");
        ApiClientError::malformed("load statistics", response.clone())
    })
}

fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url, ApiClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ConfigError::CannotBeBase(base.clone()))?
        .pop_if_empty()
        .push(endpoint);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::builder("k3y")
            .base_url(base)
            .build()
            .unwrap();
        ApiClient::new(config).unwrap()
    }

    #[test]
    fn test_upload_url() {
        let api = client("http://anti-captcha.com");
        assert_eq!(api.upload_url().unwrap().as_str(), "http://anti-captcha.com/in.php");
    }

    #[test]
    fn test_endpoint_under_base_path() {
        let api = client("https://captcha.example.com/api/");
        assert_eq!(
            api.upload_url().unwrap().as_str(),
            "https://captcha.example.com/api/in.php"
        );
    }

    #[test]
    fn test_status_url() {
        let api = client("http://anti-captcha.com");
        assert_eq!(
            api.status_url(42).unwrap().as_str(),
            "http://anti-captcha.com/res.php?key=k3y&action=get&id=42"
        );
    }

    #[test]
    fn test_balance_url() {
        let api = client("http://anti-captcha.com");
        assert_eq!(
            api.balance_url().unwrap().as_str(),
            "http://anti-captcha.com/res.php?key=k3y&action=getbalance"
        );
    }
}
