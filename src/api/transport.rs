use std::time::Duration;

use reqwest::blocking::{self, Response};
use thiserror::Error;
use url::Url;

use crate::errors::RequestFailure;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("[E006] Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Failure(#[from] RequestFailure),
}

/// Moves request bodies to and from the service.
///
/// Implementations return the response body as text and turn non-success
/// HTTP statuses into [`TransportError::Failure`]. Retrying is never the
/// transport's job.
pub trait Transport {
    /// # Errors
    ///
    /// Will return `Err` on network failure or a non-success status.
    fn get(&self, url: &Url) -> Result<String, TransportError>;

    /// Sends `form` as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or a non-success status.
    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        (**self).get(url)
    }

    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<String, TransportError> {
        (**self).post_form(url, form)
    }
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: blocking::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn read_body(url: &Url, response: Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text()?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::from(RequestFailure::new(
                url.clone(),
                status,
                body,
            )))
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        let response = self.client.get(url.clone()).send()?;
        Self::read_body(url, response)
    }

    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<String, TransportError> {
        let response = self.client.post(url.clone()).form(form).send()?;
        Self::read_body(url, response)
    }
}
