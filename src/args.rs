use std::{path::PathBuf, time::Duration};

use antigate::config::{ClientConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};
use reqwest::Url;

#[derive(clap::Parser)]
#[command(name = "decaptcha")]
#[command(version)]
#[command(about = "Solve image captchas with the anti-captcha service")]
#[command(long_about = "
A command-line client for the anti-captcha image recognition service.

The captcha image is uploaded to the service and polled until a worker
has typed its text, which is then printed on standard output.

Examples:
  # Solve a captcha served over HTTP and keep a copy of the image
  decaptcha --antigate-key <KEY> solve \\
    --captcha-url https://example.com/captcha.png \\
    --output-image captcha.png

  # Solve a local image, giving up after two minutes
  ANTIGATE_KEY=<KEY> decaptcha --timeout 120 solve --image captcha.png

  # Check the account balance
  decaptcha --antigate-key <KEY> balance

  # Show the service load (no key needed)
  decaptcha stats
")]
pub struct Args {
    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Upload a captcha image and print its text
    ///
    /// The image is either downloaded from --captcha-url or read from
    /// --image. Exactly one of them must be given.
    Solve(SolveArgs),

    /// Check once whether a previously uploaded captcha is solved
    Status(StatusArgs),

    /// Print the account balance
    Balance,

    /// Print the service load statistics
    Stats,
}

#[derive(clap::Args)]
pub struct ClientArgs {
    /// Antigate API key
    #[arg(
        long = "antigate-key",
        value_name = "KEY",
        env = "ANTIGATE_KEY",
        hide_env_values = true,
        global = true
    )]
    pub key: Option<String>,

    /// Service base URL
    #[arg(
        long,
        value_name = "URL",
        env = "ANTIGATE_URL",
        value_hint = clap::ValueHint::Url,
        default_value = DEFAULT_BASE_URL,
        global = true
    )]
    pub url: String,

    /// Delay between status checks, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 500, global = true)]
    pub check_interval: u64,

    /// Delay before retrying when no slot is available, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 500, global = true)]
    pub retry_interval: u64,

    /// How many times to retry when no slot is available
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    pub max_retries: u32,

    /// Give up solving after this many seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,
}

impl ClientArgs {
    pub fn config(&self) -> Result<ClientConfig, ConfigError> {
        let key = self.key.clone().ok_or(ConfigError::MissingKey)?;

        ClientConfig::builder(key)
            .base_url(self.url.as_str())
            .poll_interval(Duration::from_millis(self.check_interval))
            .retry_interval(Duration::from_millis(self.retry_interval))
            .max_retries(self.max_retries)
            .solve_timeout(self.timeout.map(Duration::from_secs))
            .build()
    }
}

#[derive(clap::Args)]
pub struct SolveArgs {
    /// Captcha image URL
    #[arg(
        long,
        value_name = "URL",
        value_hint = clap::ValueHint::Url,
        value_parser = Url::parse,
        required_unless_present = "image",
        conflicts_with = "image"
    )]
    pub captcha_url: Option<Url>,

    /// Captcha image file
    #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub image: Option<PathBuf>,

    /// Save the downloaded image to this path
    #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub output_image: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    /// Captcha id returned by the upload
    #[arg(long, value_name = "ID")]
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_solve_from_url() {
        let args = Args::try_parse_from([
            "decaptcha",
            "--antigate-key",
            "k3y",
            "solve",
            "--captcha-url",
            "https://example.com/c.png",
            "--output-image",
            "c.png",
        ])
        .unwrap();

        let Commands::Solve(solve) = args.command else {
            panic!("expected solve command");
        };
        assert_eq!(
            solve.captcha_url.unwrap().as_str(),
            "https://example.com/c.png"
        );
        assert_eq!(solve.output_image, Some(PathBuf::from("c.png")));
        assert_eq!(args.client.key.as_deref(), Some("k3y"));
    }

    #[test]
    fn test_solve_requires_an_image_source() {
        assert!(Args::try_parse_from(["decaptcha", "solve"]).is_err());
    }

    #[test]
    fn test_solve_rejects_both_sources() {
        let result = Args::try_parse_from([
            "decaptcha",
            "solve",
            "--captcha-url",
            "https://example.com/c.png",
            "--image",
            "c.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_args_build_config() {
        let args = Args::try_parse_from([
            "decaptcha",
            "--antigate-key",
            "k3y",
            "--check-interval",
            "250",
            "--max-retries",
            "3",
            "--timeout",
            "90",
            "balance",
        ])
        .unwrap();

        let config = args.client.config().unwrap();
        assert_eq!(config.key(), "k3y");
        assert_eq!(config.base_url().as_str(), "http://anti-captcha.com/");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.retry_interval(), Duration::from_millis(500));
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.solve_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_missing_key_is_a_config_error() {
        let args = ClientArgs {
            key: None,
            url: DEFAULT_BASE_URL.to_owned(),
            check_interval: 500,
            retry_interval: 500,
            max_retries: 35,
            timeout: None,
        };
        assert!(matches!(args.config(), Err(ConfigError::MissingKey)));
    }

    #[test]
    fn test_bad_url_is_a_config_error() {
        let args = Args::try_parse_from([
            "decaptcha",
            "--antigate-key",
            "k3y",
            "--url",
            "not a url",
            "balance",
        ])
        .unwrap();

        assert!(matches!(args.client.config(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_status_takes_an_id() {
        let args = Args::try_parse_from(["decaptcha", "status", "--id", "12345"]).unwrap();

        let Commands::Status(status) = args.command else {
            panic!("expected status command");
        };
        assert_eq!(status.id, 12345);
    }
}
