use std::fmt::Display;

/// Prefix of every successful answer, followed by the job id or the
/// recognised text.
pub const OK_PREFIX: &str = "OK|";
pub const NOT_READY: &str = "CAPCHA_NOT_READY";
pub const NO_SLOT_AVAILABLE: &str = "ERROR_NO_SLOT_AVAILABLE";

/// Meaning of a raw response body from `in.php` or `res.php`.
///
/// The service signals errors with plain text tokens and new tokens
/// appear over time, so anything unrecognised lands in
/// [`ClassifiedResponse::Failed`] with the body kept verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClassifiedResponse {
    Solved { text: String },
    Pending,
    RateLimited,
    Failed { reason: String },
}

impl ClassifiedResponse {
    pub fn classify(body: &str) -> Self {
        if let Some(text) = body.strip_prefix(OK_PREFIX) {
            return Self::Solved {
                text: text.to_owned(),
            };
        }

        match body {
            NOT_READY => Self::Pending,
            NO_SLOT_AVAILABLE => Self::RateLimited,
            _ => Self::Failed {
                reason: body.to_owned(),
            },
        }
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl Display for ClassifiedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solved { text } => write!(f, "Solved({text})"),
            Self::Pending => write!(f, "Pending"),
            Self::RateLimited => write!(f, "RateLimited"),
            Self::Failed { reason } => write!(f, "Failed({reason})"),
        }
    }
}

/// Outcome of a single status check that did not fail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PollStatus {
    Pending,
    Solved(String),
}

impl PollStatus {
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Solved(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Solved(text) => Some(text.as_str()),
        }
    }
}

impl Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Solved(_) => write!(f, "Solved"),
        }
    }
}
