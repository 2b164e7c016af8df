use reqwest::StatusCode;
use std::fmt::{self, Formatter};
use thiserror::Error;
use url::Url;

/// The service answered, but not with a success status.
///
/// The anti-captcha endpoints report every application level condition
/// in a `200 OK` body, so anything else means a proxy, a gateway or the
/// web server itself refused the request.
#[derive(Debug, Error)]
pub struct RequestFailure {
    pub url: Url,
    pub status: StatusCode,
    pub msg: String,
}

impl RequestFailure {
    pub fn new(url: Url, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            url,
            status,
            msg: msg.into(),
        }
    }

    fn suggestions(&self) -> &'static [&'static str] {
        match self.status {
            StatusCode::NOT_FOUND => &[
                "Check that the base URL points at an anti-captcha compatible service",
                "Make sure the URL does not already contain `in.php` or `res.php`",
            ],
            StatusCode::TOO_MANY_REQUESTS => &[
                "Wait a moment before retrying",
                "Consider increasing --check-interval",
            ],
            status if status.is_server_error() => &[
                "The service is having trouble, try again later",
            ],
            _ => &["Check the base URL and your network connection"],
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        writeln!(
            formatter,
            "[E006] {} returned {}",
            self.url.as_str(),
            self.status
        )?;
        if !self.msg.is_empty() {
            writeln!(formatter, "Server response: {}", self.msg)?;
        }
        writeln!(formatter, "\nSuggestions:")?;
        for suggestion in self.suggestions() {
            writeln!(formatter, "  • {suggestion}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failure_mentions_status_and_body() {
        let url = Url::parse("http://anti-captcha.com/in.php").unwrap();
        let failure = RequestFailure::new(url, StatusCode::BAD_GATEWAY, "upstream down");
        let message = failure.to_string();

        assert!(message.contains("[E006]"));
        assert!(message.contains("502"));
        assert!(message.contains("Server response: upstream down"));
        assert!(message.contains("try again later"));
    }

    #[test]
    fn test_request_failure_without_body() {
        let url = Url::parse("http://anti-captcha.com/load.php").unwrap();
        let failure = RequestFailure::new(url, StatusCode::NOT_FOUND, "");
        let message = failure.to_string();

        assert!(!message.contains("Server response"));
        assert!(message.contains("in.php"));
    }
}
