use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Handle for a captcha accepted by `in.php`.
///
/// Only meaningful together with the key and base URL that created it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    id: u64,
    submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            submitted_at: Utc::now(),
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// Result of a finished solve.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Solution {
    pub job: Job,
    pub text: String,
    /// Number of status checks it took, including the final one.
    pub polls: u32,
}

/// Service load as reported by `load.php`.
///
/// The `*_ru` fields describe the Russian-speaking worker pool.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LoadStat {
    pub waiting: i64,
    #[serde(rename = "waitingRU")]
    pub waiting_ru: i64,
    pub load: f32,
    pub minbid: f64,
    #[serde(rename = "minbidRU")]
    pub minbid_ru: f64,
    #[serde(rename = "averageRecognitionTime")]
    pub average_recognition_time: f64,
    #[serde(rename = "averageRecognitionTimeRU")]
    pub average_recognition_time_ru: f64,
}
