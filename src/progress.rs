use antigate::api::SolveState;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner(template: &str, tick_chars: &str, message: &str, tick: Duration) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(tick_chars),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(tick);
    bar
}

pub struct ProgressIndicator {
    bar: ProgressBar,
}

impl ProgressIndicator {
    pub fn new_spinner(message: &str) -> Self {
        Self {
            bar: spinner(
                "{spinner:.green} {msg}",
                "⠁⠂⠄⡀⢀⠠⠐⠈ ",
                message,
                Duration::from_millis(100),
            ),
        }
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner that follows a solve workflow through its states.
pub struct SolveProgress {
    bar: ProgressBar,
}

impl SolveProgress {
    pub fn new() -> Self {
        Self {
            bar: spinner(
                "⏳ {msg} {spinner:.yellow}",
                "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ",
                "Preparing captcha...",
                Duration::from_millis(120),
            ),
        }
    }

    pub fn update(&self, state: &SolveState) {
        match state {
            SolveState::Submitting => self.bar.set_message("Uploading captcha..."),
            SolveState::Polling { job, polls: 0 } => {
                self.bar
                    .set_message(format!("Captcha {} uploaded, waiting for workers...", job.id()));
            }
            SolveState::Polling { job, polls } => {
                self.bar.set_message(format!(
                    "Captcha {} not ready yet ({polls} checks)...",
                    job.id()
                ));
            }
            SolveState::Solved | SolveState::Failed => self.bar.finish_and_clear(),
        }
    }
}
