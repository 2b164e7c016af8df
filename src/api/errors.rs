use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

use super::transport::TransportError;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("[E003] Service rejected the request: {0}")]
    Rejected(String),

    #[error("[E004] No slots available after {attempts} attempts\n\nSuggestions:\n  • The service is overloaded, try again later\n  • Increase --max-retries or --retry-interval")]
    RateLimited { attempts: u32 },

    #[error("[E005] Malformed {what} in response: {body:?}")]
    Malformed { what: &'static str, body: String },

    #[error("[E007] Solving was cancelled")]
    Cancelled,

    #[error("[E008] Captcha was not solved within {0:?}\n\nSuggestions:\n  • Increase --timeout\n  • Check the service load with `decaptcha stats`")]
    TimedOut(Duration),
}

impl ApiClientError {
    pub(crate) fn malformed(what: &'static str, body: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            body: body.into(),
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(c) => c.error_code(),
            Self::Transport(_) => "E006",
            Self::Rejected(_) => "E003",
            Self::RateLimited { .. } => "E004",
            Self::Malformed { .. } => "E005",
            Self::Cancelled => "E007",
            Self::TimedOut(_) => "E008",
        }
    }

    /// The token the service answered with, for service rejections.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Rejected(token) => rejection_suggestions(token),
            Self::Malformed { .. } => vec![
                "The service answered in an unexpected format",
                "Check that the base URL points at an anti-captcha compatible service",
            ],
            Self::Transport(_) => vec![
                "Check your network connection",
                "Verify the base URL is reachable",
            ],
            _ => vec![],
        }
    }
}

fn rejection_suggestions(token: &str) -> Vec<&'static str> {
    match token {
        "ERROR_KEY_DOES_NOT_EXIST" | "ERROR_WRONG_USER_KEY" => vec![
            "Check the API key in your account settings",
            "Make sure ANTIGATE_KEY is not stale",
        ],
        "ERROR_ZERO_BALANCE" => vec!["Top up your account balance"],
        "ERROR_IP_NOT_ALLOWED" => vec!["Allow this IP address in your account settings"],
        "ERROR_ZERO_CAPTCHA_FILESIZE" | "ERROR_TOO_BIG_CAPTCHA_FILESIZE" => vec![
            "Check that the downloaded image is not empty or truncated",
            "Images must be smaller than 100 kB",
        ],
        "ERROR_WRONG_FILE_EXTENSION" | "ERROR_IMAGE_TYPE_NOT_SUPPORTED" => {
            vec!["Submit a JPEG, GIF or PNG image"]
        }
        "ERROR_WRONG_ID_FORMAT" | "ERROR_NO_SUCH_CAPCHA_ID" => vec![
            "Check the captcha id returned by the upload",
            "The job may have expired on the service side",
        ],
        "ERROR_CAPTCHA_UNSOLVABLE" => vec!["Workers could not read this image, submit a new one"],
        _ => vec!["See the service documentation for the meaning of this token"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_carries_service_token() {
        let err = ApiClientError::Rejected("ERROR_ZERO_BALANCE".to_owned());
        assert_eq!(err.service_message(), Some("ERROR_ZERO_BALANCE"));
        assert_eq!(err.error_code(), "E003");
        assert_eq!(err.suggestions(), vec!["Top up your account balance"]);
    }

    #[test]
    fn test_unknown_rejection_still_has_a_hint() {
        let err = ApiClientError::Rejected("ERROR_BRAND_NEW".to_owned());
        assert_eq!(err.suggestions().len(), 1);
        assert!(err.to_string().ends_with("ERROR_BRAND_NEW"));
    }

    #[test]
    fn test_non_rejections_have_no_service_message() {
        assert_eq!(ApiClientError::Cancelled.service_message(), None);
        assert_eq!(
            ApiClientError::RateLimited { attempts: 3 }.service_message(),
            None
        );
    }
}
