mod args;
mod progress;

use crate::args::{Args, ClientArgs, Commands, SolveArgs};
use crate::progress::{ProgressIndicator, SolveProgress};

use antigate::{
    api::{get_load_stats, ApiClient, ApiClientError, HttpTransport, PollStatus, SolveWorkflow},
    config::{ConfigError, DEFAULT_REQUEST_TIMEOUT},
    errors::RequestFailure,
};
use clap::Parser;
use reqwest::Url;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("http error: {0}")]
    Download(#[from] reqwest::Error),

    #[error(transparent)]
    DownloadFailed(#[from] RequestFailure),

    #[error("read error: {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("save error: {}: {source}", path.display())]
    Save { path: PathBuf, source: io::Error },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let Args {
        client,
        command: cmd,
    } = Args::parse();

    match &cmd {
        Commands::Solve(args) => {
            let text = solve(&client, args)?;
            println!("{text}");
        }
        Commands::Status(args) => {
            let api = ApiClient::new(client.config()?)?;
            match api.get_status(args.id)? {
                PollStatus::Solved(text) => println!("{text}"),
                PollStatus::Pending => println!("Captcha {} is not ready yet", args.id),
            }
        }
        Commands::Balance => {
            let api = ApiClient::new(client.config()?)?;
            println!("{}", api.get_balance()?);
        }
        Commands::Stats => {
            let base = Url::parse(&client.url).map_err(ConfigError::from)?;
            let transport = HttpTransport::new(DEFAULT_REQUEST_TIMEOUT).map_err(ApiClientError::from)?;
            let stats = get_load_stats(&transport, &base)?;
            println!("waiting:                      {}", stats.waiting);
            println!("waiting (RU):                 {}", stats.waiting_ru);
            println!("load:                         {}%", stats.load);
            println!("minimum bid:                  {}", stats.minbid);
            println!("minimum bid (RU):             {}", stats.minbid_ru);
            println!("average recognition time:     {}s", stats.average_recognition_time);
            println!("average recognition time (RU): {}s", stats.average_recognition_time_ru);
        }
    }
    Ok(())
}

fn solve(client: &ClientArgs, args: &SolveArgs) -> Result<String, CliError> {
    // Fail on a missing key before touching the network
    let config = client.config()?;

    // clap requires exactly one of the two sources
    let image = match &args.captcha_url {
        Some(url) => download_image(url)?,
        None => {
            let path = args.image.clone().unwrap_or_default();
            fs::read(&path).map_err(|source| CliError::Read { path, source })?
        }
    };

    if let Some(path) = &args.output_image {
        save_image(path, &image)?;
    }

    let api = ApiClient::new(config)?;
    let progress = SolveProgress::new();
    let solution = SolveWorkflow::new(&api)
        .on_transition(|state| progress.update(state))
        .run(&image)?;

    log::info!(
        "Captcha {} solved after {} checks",
        solution.job.id(),
        solution.polls
    );
    Ok(solution.text)
}

fn download_image(url: &Url) -> Result<Vec<u8>, CliError> {
    let progress = ProgressIndicator::new_spinner("Downloading captcha image...");
    let response = reqwest::blocking::get(url.clone());
    progress.finish_and_clear();

    let response = response?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::from(RequestFailure::new(
            url.clone(),
            status,
            response.text().unwrap_or_default(),
        )));
    }
    Ok(response.bytes()?.to_vec())
}

fn save_image(path: &Path, image: &[u8]) -> Result<(), CliError> {
    fs::write(path, image).map_err(|source| CliError::Save {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_image_writes_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("captcha.png");

        save_image(&path, b"\x89PNG\r\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG\r\n");
    }

    #[test]
    fn test_save_image_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("captcha.png");

        let err = save_image(&path, b"data").unwrap_err();
        assert!(err.to_string().starts_with("save error:"));
        assert!(err.to_string().contains("captcha.png"));
    }
}
